//! Core game types and entities

pub mod army;
pub mod dice;
pub mod dragon;
pub mod effect;
pub mod entity;
pub mod player;
pub mod terrain;
pub mod types;
pub mod unit;

pub use army::{Army, ArmyId, ArmyLocation};
pub use dice::{DieFace, Element, ResultType, RollPurpose, SaiKind};
pub use dragon::{Dragon, DragonComposition, DragonFace, DragonId, DragonLocation};
pub use effect::{Effect, EffectId, EffectKind, EffectTarget, Expiry, Modifier, ModifierOp};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use player::{Player, PlayerId};
pub use terrain::{EighthFaceKind, Terrain, TerrainFaceIcon, TerrainId};
pub use types::{DragonTypeId, PlayerName, SpeciesName, SpellId, TerrainTypeId, UnitTypeId};
pub use unit::{Unit, UnitId};
