//! # mirkwood
//!
//! A headless rules engine for the cooperative card scenario Passage
//! Through Mirkwood.
//!
//! ## Design Principles
//!
//! 1. **Pure stepping**: [`engine::advance`] never mutates its input.
//!    Each step returns a successor state plus a readable log, so a
//!    caller can branch a game, explore a line of play, and discard it.
//!
//! 2. **Data over scripts**: cards are static stat blocks; behavior
//!    lives in [`abilities::Session`] registries keyed by card code.
//!    An unregistered code is never an error, just a printed-numbers
//!    card.
//!
//! 3. **Seeded determinism**: every shuffle and random discard goes
//!    through one [`core::GameRng`]; equal seeds replay equal games.
//!
//! ## Architecture
//!
//! - **Persistent piles**: decks and hands are `im::Vector`, so cloning
//!   a whole game state is O(1).
//!
//! - **Interactive combat**: the combat phase is a sub-state machine
//!   with explicit defender and attacker declarations; `advance` can
//!   also auto-resolve it with default choices.
//!
//! ## Modules
//!
//! - `core`: players, game state, errors, RNG
//! - `cards`: card codes, player and encounter card data
//! - `keywords`: Surge and Doomed parsing
//! - `abilities`: resolver registries and the scripted card pool
//! - `engine`: the round state machine, combat, card play, setup
//! - `scenario`: built-in Passage Through Mirkwood data

pub mod abilities;
pub mod cards;
pub mod core;
pub mod engine;
pub mod keywords;
pub mod scenario;

// Re-export commonly used types
pub use crate::core::{
    ActiveEnemy, ActiveLocation, CharacterRef, CombatState, CombatStep, EngineError, GameRng,
    GameRngState, GameState, Hero, Phase, PlayerArea, PlayerId, PlayerState, StagingEntry,
    StepResult, MAX_THREAT, STARTING_HAND_SIZE,
};

pub use crate::cards::{CardCode, EncounterCard, EncounterKind, PlayerCard, PlayerCardKind, Sphere};

pub use crate::abilities::{AbilityOutcome, Session, Target, TreacheryOutcome, UseLimit};

pub use crate::engine::play::{play_card, PlayOutcome};
pub use crate::engine::setup::{mulligan, setup, PlayerSetup};
pub use crate::engine::{advance, engage_enemy};

pub use crate::scenario::{core_set, passage_through_mirkwood, starter_deck, starter_heroes};
