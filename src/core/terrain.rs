//! Terrain dice
//!
//! Each terrain die shows a face from 1 to 8. The face determines which
//! action the armies there may take; the eighth face grants its
//! controlling army extra advantages for as long as that army occupies it.

use crate::core::{Element, EntityId, GameEntity, PlayerId, TerrainTypeId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type TerrainId = EntityId<Terrain>;

/// The action icon a terrain face shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainFaceIcon {
    Maneuver,
    Melee,
    Missile,
    Magic,
}

/// The special advantage printed on a terrain's eighth face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EighthFaceKind {
    /// Recruit a small (1-health) unit or promote one unit each turn
    City,
    /// Count magic results as any element
    StandingStones,
    /// Dead units may not be buried; the controller may force a burial
    Temple,
    /// Missile attacks may target any terrain
    Tower,
    /// Double ID results (vortex and the like)
    Vortex,
}

/// A terrain die on the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    /// Unique ID for this terrain
    pub id: TerrainId,

    /// Display name (e.g. "Highland City")
    pub name: String,

    /// Reference-data id this terrain was built from
    pub terrain_type: TerrainTypeId,

    /// Current face, 1-8, persisted across turns
    pub face: u8,

    /// Controlling army's owner, set when the terrain is captured at its
    /// eighth face. None while contested.
    pub controller: Option<PlayerId>,

    /// Elements of the terrain
    pub elements: SmallVec<[Element; 2]>,

    /// Per-face action icons, index 0 = face 1. Face 8 carries the eighth
    /// face advantage instead.
    pub face_icons: SmallVec<[TerrainFaceIcon; 7]>,

    /// What the eighth face grants
    pub eighth_face: EighthFaceKind,
}

impl Terrain {
    /// Eighth-face advantages exist iff the die shows 8 and a controlling
    /// army still occupies it.
    pub fn eighth_face_active(&self) -> bool {
        self.face == 8 && self.controller.is_some()
    }

    /// The action icon currently showing, None on the eighth face (the
    /// controller may take any action there).
    pub fn current_icon(&self) -> Option<TerrainFaceIcon> {
        if self.face == 8 {
            None
        } else {
            self.face_icons.get((self.face - 1) as usize).copied()
        }
    }

    /// Losing control reverts the die to face 7.
    pub fn lose_control(&mut self) {
        if self.controller.take().is_some() && self.face == 8 {
            self.face = 7;
        }
    }
}

impl GameEntity<Terrain> for Terrain {
    fn id(&self) -> TerrainId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_terrain(face: u8, controller: Option<PlayerId>) -> Terrain {
        Terrain {
            id: TerrainId::new(1),
            name: "Highland City".to_string(),
            terrain_type: TerrainTypeId::new("highland_city"),
            face,
            controller,
            elements: SmallVec::from_vec(vec![Element::Fire, Element::Earth]),
            face_icons: SmallVec::from_vec(vec![
                TerrainFaceIcon::Maneuver,
                TerrainFaceIcon::Magic,
                TerrainFaceIcon::Melee,
                TerrainFaceIcon::Missile,
                TerrainFaceIcon::Magic,
                TerrainFaceIcon::Melee,
                TerrainFaceIcon::Missile,
            ]),
            eighth_face: EighthFaceKind::City,
        }
    }

    #[test]
    fn test_eighth_face_requires_controller() {
        assert!(!sample_terrain(8, None).eighth_face_active());
        assert!(sample_terrain(8, Some(PlayerId::new(0))).eighth_face_active());
        assert!(!sample_terrain(7, Some(PlayerId::new(0))).eighth_face_active());
    }

    #[test]
    fn test_lose_control_reverts_to_seven() {
        let mut terrain = sample_terrain(8, Some(PlayerId::new(0)));
        terrain.lose_control();
        assert_eq!(terrain.face, 7);
        assert_eq!(terrain.controller, None);
    }

    #[test]
    fn test_current_icon() {
        let terrain = sample_terrain(3, None);
        assert_eq!(terrain.current_icon(), Some(TerrainFaceIcon::Melee));
        assert_eq!(sample_terrain(8, Some(PlayerId::new(0))).current_icon(), None);
    }
}
