//! Engine error taxonomy.
//!
//! Illegal operations surface as explicit `EngineError` values; the engine
//! never panics on game content. Unknown card codes are deliberately NOT
//! errors: they resolve as logged no-ops so partial card pools stay playable.

use serde::{Deserialize, Serialize};

use crate::cards::CardCode;
use crate::core::player::PlayerId;

/// Everything that can go wrong when driving the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineError {
    /// The referenced player does not exist or is eliminated.
    UnknownPlayer(PlayerId),
    /// A draw or search hit an empty pile.
    EmptyPile(&'static str),
    /// The referenced card is not where the operation expected it.
    NoSuchCard(CardCode),
    /// The operation is not legal in the current state.
    IllegalOperation(String),
    /// The player cannot pay the card's cost.
    InsufficientResources { required: u32, available: u32 },
    /// The chosen target does not satisfy the card's requirements.
    InvalidTarget(String),
    /// The operation belongs to a different phase.
    NotYourPhase { expected: &'static str },
}

impl EngineError {
    /// Shorthand for an `IllegalOperation` with a formatted message.
    #[must_use]
    pub fn illegal(msg: impl Into<String>) -> Self {
        Self::IllegalOperation(msg.into())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPlayer(p) => write!(f, "unknown player: {p}"),
            Self::EmptyPile(pile) => write!(f, "cannot draw from empty pile: {pile}"),
            Self::NoSuchCard(code) => write!(f, "no such card: {code}"),
            Self::IllegalOperation(msg) => write!(f, "illegal operation: {msg}"),
            Self::InsufficientResources {
                required,
                available,
            } => write!(
                f,
                "insufficient resources: need {required}, have {available}"
            ),
            Self::InvalidTarget(msg) => write!(f, "invalid target: {msg}"),
            Self::NotYourPhase { expected } => {
                write!(f, "operation requires the {expected} phase")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = EngineError::InsufficientResources {
            required: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient resources: need 3, have 1"
        );

        let err = EngineError::NotYourPhase {
            expected: "planning",
        };
        assert!(err.to_string().contains("planning"));
    }
}
