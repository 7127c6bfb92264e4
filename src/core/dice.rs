//! Die faces, icon kinds, and result types
//!
//! A unit die face either shows a plain action icon (melee, missile, ...),
//! the unit's ID icon, or a Special Action Icon (SAI). SAIs are
//! roll-purpose dependent: the same face can count as different result
//! types depending on what is being rolled for, and some leave the roller
//! a choice. All of that purpose-dependent shaping is resolved in one
//! place, the roll pipeline, via the interpretation tables here.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// The five elements units and terrains are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    Air,
    Death,
    Earth,
    Fire,
    Water,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Element::Air => "Air",
            Element::Death => "Death",
            Element::Earth => "Earth",
            Element::Fire => "Fire",
            Element::Water => "Water",
        };
        write!(f, "{s}")
    }
}

/// Countable result types a roll can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResultType {
    Maneuver,
    Melee,
    Missile,
    Magic,
    Save,
}

impl ResultType {
    pub const ALL: [ResultType; 5] = [
        ResultType::Maneuver,
        ResultType::Melee,
        ResultType::Missile,
        ResultType::Magic,
        ResultType::Save,
    ];
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultType::Maneuver => "maneuver",
            ResultType::Melee => "melee",
            ResultType::Missile => "missile",
            ResultType::Magic => "magic",
            ResultType::Save => "save",
        };
        write!(f, "{s}")
    }
}

/// What a roll is being made for
///
/// A combination roll tallies more than one result type at once (the
/// defending army's melee/missile/save response to a dragon attack is the
/// common case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollPurpose {
    Single(ResultType),
    Combination(Vec<ResultType>),
}

impl RollPurpose {
    /// The result types this roll counts
    pub fn counted_types(&self) -> &[ResultType] {
        match self {
            RollPurpose::Single(t) => std::slice::from_ref(t),
            RollPurpose::Combination(ts) => ts,
        }
    }

    pub fn counts(&self, result_type: ResultType) -> bool {
        self.counted_types().contains(&result_type)
    }

    pub fn is_combination(&self) -> bool {
        matches!(self, RollPurpose::Combination(_))
    }
}

impl fmt::Display for RollPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollPurpose::Single(t) => write!(f, "{t}"),
            RollPurpose::Combination(ts) => {
                let names: Vec<String> = ts.iter().map(|t| t.to_string()).collect();
                write!(f, "combination({})", names.join("/"))
            }
        }
    }
}

/// Special Action Icons with engine-visible behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaiKind {
    /// Counts as melee on melee rolls, saves on save rolls
    Bash,
    /// Counts as missile on missile rolls
    Bullseye,
    /// Counts as magic on magic rolls and on save rolls (cantrip spells)
    Cantrip,
    /// Counts as saves on save rolls, melee on melee rolls
    Counter,
    /// Counts as maneuver or save, roller's choice
    Fly,
    /// Counts as melee on melee rolls
    Smite,
}

impl SaiKind {
    /// Result types this SAI may count as for the given counted type.
    ///
    /// More than one entry means the roller chooses. Empty means the icon
    /// generates nothing when that type is being counted.
    pub fn interpretations(&self, counted: ResultType) -> SmallVec<[ResultType; 2]> {
        use ResultType::*;
        let types: &[ResultType] = match (self, counted) {
            (SaiKind::Bash, Melee) => &[Melee],
            (SaiKind::Bash, Save) => &[Save],
            (SaiKind::Bullseye, Missile) => &[Missile],
            (SaiKind::Cantrip, Magic) => &[Magic],
            (SaiKind::Cantrip, Save) => &[Magic],
            (SaiKind::Counter, Save) => &[Save],
            (SaiKind::Counter, Melee) => &[Melee],
            (SaiKind::Fly, Maneuver) => &[Maneuver, Save],
            (SaiKind::Fly, Save) => &[Save, Maneuver],
            (SaiKind::Smite, Melee) => &[Melee],
            _ => &[],
        };
        SmallVec::from_slice(types)
    }
}

impl fmt::Display for SaiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiKind::Bash => "Bash",
            SaiKind::Bullseye => "Bullseye",
            SaiKind::Cantrip => "Cantrip",
            SaiKind::Counter => "Counter",
            SaiKind::Fly => "Fly",
            SaiKind::Smite => "Smite",
        };
        write!(f, "{s}")
    }
}

/// One face of a unit die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DieFace {
    /// Plain action icon worth `count` results of the given type
    Icon { result: ResultType, count: u8 },
    /// ID icon: generates whichever type is being counted, scaled to the
    /// unit's health
    Id,
    /// Special Action Icon worth `count` results per interpretation
    Sai { kind: SaiKind, count: u8 },
}

impl DieFace {
    pub fn icon(result: ResultType, count: u8) -> Self {
        DieFace::Icon { result, count }
    }

    pub fn sai(kind: SaiKind, count: u8) -> Self {
        DieFace::Sai { kind, count }
    }

    pub fn is_id(&self) -> bool {
        matches!(self, DieFace::Id)
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DieFace::Icon { result, count } if *count == 1 => write!(f, "{result}"),
            DieFace::Icon { result, count } => write!(f, "{result}:{count}"),
            DieFace::Id => write!(f, "ID"),
            DieFace::Sai { kind, count } if *count == 1 => write!(f, "SAI:{kind}"),
            DieFace::Sai { kind, count } => write!(f, "SAI:{kind}:{count}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sai_interpretations_by_purpose() {
        // Bash is melee on a melee count and a save on a save count
        assert_eq!(
            SaiKind::Bash.interpretations(ResultType::Melee).as_slice(),
            &[ResultType::Melee]
        );
        assert_eq!(
            SaiKind::Bash.interpretations(ResultType::Save).as_slice(),
            &[ResultType::Save]
        );
        // and nothing at all on a missile count
        assert!(SaiKind::Bash.interpretations(ResultType::Missile).is_empty());
    }

    #[test]
    fn test_fly_is_ambiguous() {
        let choices = SaiKind::Fly.interpretations(ResultType::Maneuver);
        assert_eq!(choices.len(), 2);
        assert!(choices.contains(&ResultType::Maneuver));
        assert!(choices.contains(&ResultType::Save));
    }

    #[test]
    fn test_combination_purpose() {
        let purpose = RollPurpose::Combination(vec![
            ResultType::Melee,
            ResultType::Missile,
            ResultType::Save,
        ]);
        assert!(purpose.counts(ResultType::Save));
        assert!(!purpose.counts(ResultType::Magic));
        assert!(purpose.is_combination());
    }
}
