//! Strongly-typed wrappers for game concepts
//!
//! Newtypes to prevent type confusion between the many name-like strings
//! the engine passes around (player names, species names, definition ids).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! name_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

name_newtype! {
    /// Player name (distinct from other string types)
    PlayerName
}

name_newtype! {
    /// Species a unit belongs to (e.g. "Dwarves", "Coral Elves")
    SpeciesName
}

name_newtype! {
    /// Reference-data id of a unit type (e.g. "dwarves_footman")
    UnitTypeId
}

name_newtype! {
    /// Reference-data id of a terrain (e.g. "highland_city")
    TerrainTypeId
}

name_newtype! {
    /// Reference-data id of a dragon type (e.g. "fire_elemental_dragon")
    DragonTypeId
}

name_newtype! {
    /// Reference-data id of a spell (e.g. "hailstorm")
    SpellId
}

impl SpeciesName {
    /// Dragonkin promote from the Summoning Pool instead of the DUA
    pub fn is_dragonkin(&self) -> bool {
        self.0 == "Dragonkin"
    }
}
