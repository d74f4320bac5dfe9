//! Card data types.
//!
//! ## Key Types
//!
//! - `CardCode`: Stable string identifier for a printed card (e.g. `"01096"`)
//! - `Sphere`: Resource sphere of influence for player cards
//! - `PlayerCard`: Allies, attachments, and events in player decks
//! - `EncounterCard`: Enemies, locations, treacheries, and quest stages

pub mod encounter;
pub mod player;

pub use encounter::{EncounterCard, EncounterKind};
pub use player::{PlayerCard, PlayerCardKind};

use serde::{Deserialize, Serialize};

/// Stable identifier for a printed card.
///
/// Codes follow the set-number convention, e.g. `"01096"` is card 96 of
/// set 01. Quest stages carry a side suffix (`"01119A"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardCode(pub String);

impl CardCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The raw code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardCode {
    fn from(code: &str) -> Self {
        Self(code.to_owned())
    }
}

/// Resource sphere of influence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sphere {
    Leadership,
    Tactics,
    Spirit,
    Lore,
    Neutral,
}

impl std::fmt::Display for Sphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Sphere::Leadership => "Leadership",
            Sphere::Tactics => "Tactics",
            Sphere::Spirit => "Spirit",
            Sphere::Lore => "Lore",
            Sphere::Neutral => "Neutral",
        };
        f.write_str(name)
    }
}
