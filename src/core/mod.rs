//! Core engine types: players, characters, state, errors, RNG.

pub mod error;
pub mod player;
pub mod rng;
pub mod state;

pub use error::EngineError;
pub use player::{Ally, Attachment, Hero, PlayerArea, PlayerId};
pub use rng::{GameRng, GameRngState};
pub use state::{
    ActiveEnemy, ActiveLocation, CharacterRef, CombatState, CombatStep, GameState, Phase,
    PlayerState, StagingEntry, StepResult, UsageTable, MAX_THREAT, STARTING_HAND_SIZE,
};
