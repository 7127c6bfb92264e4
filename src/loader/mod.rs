//! Reference data loading (unit/terrain/dragon/spell catalogs)

pub mod database;
pub mod database_async;
pub mod definitions;
pub mod notation;

pub use database::ReferenceData;
pub use database_async::AsyncReferenceData;
pub use definitions::{
    DragonDefinition, RawUnitDefinition, SpellDefinition, SpellEffectDef, TerrainDefinition,
    UnitDefinition,
};
pub use notation::{parse_face, parse_faces};
