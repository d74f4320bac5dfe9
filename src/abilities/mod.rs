//! Ability resolution: registries, limits, and the activation contract.
//!
//! ## Session
//!
//! A `Session` owns every resolver registry: player-card abilities, ally
//! enter-play effects, enemy abilities, location rules, treachery and
//! event resolvers, and quest stage rules. Sessions are built by pure
//! constructor functions (see [`crate::scenario::core_set`]); nothing is
//! registered as a side effect of loading a module.
//!
//! Registries are keyed by [`CardCode`]. A code with no entry is never an
//! error: the engine logs it and moves on, so a partial card pool still
//! plays.
//!
//! ## Activation contract
//!
//! [`activate`] runs the full sequence for an activated ability: limit
//! check, legality check, resolution, then usage bookkeeping. Usage
//! windows live in the game state so cloned states keep their history.

pub mod enemies;
pub mod events;
pub mod heroes;
pub mod locations;
pub mod quests;
pub mod treacheries;

use rustc_hash::FxHashMap;

use crate::cards::CardCode;
use crate::core::{CharacterRef, EngineError, GameState, PlayerId, StepResult};

/// How often an ability may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseLimit {
    Unlimited,
    OncePerPhase,
    OncePerRound,
    OncePerGame,
}

/// Context for an activated ability: who is using it and which of their
/// heroes carries it (directly or as an attachment).
#[derive(Clone, Copy, Debug)]
pub struct AbilityCtx {
    pub player: PlayerId,
    pub hero_index: usize,
}

/// An activated player-card ability.
#[derive(Clone, Copy)]
pub struct CardAbility {
    pub limit: UseLimit,
    pub can_use: fn(&GameState, &AbilityCtx) -> bool,
    pub resolve: fn(&mut GameState, &AbilityCtx, &mut Vec<String>) -> Result<(), EngineError>,
}

/// Outcome of an effect that may require a player decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbilityOutcome {
    Resolved,
    /// The effect needs a choice; the strings describe the options.
    /// Call again with the chosen index to resolve.
    NeedsChoice(Vec<String>),
}

/// Effect fired when an ally enters play.
pub type EnterPlayFn = fn(
    &mut GameState,
    PlayerId,
    Option<usize>,
    &mut Vec<String>,
) -> Result<AbilityOutcome, EngineError>;

/// A response that fires after an enemy is destroyed.
///
/// `matches` inspects the destroyed card and the attackers; a passing
/// response resolves automatically.
#[derive(Clone, Copy)]
pub struct DestroyResponse {
    pub matches: fn(&GameState, &crate::cards::EncounterCard, &[CharacterRef]) -> bool,
    pub resolve: fn(&mut GameState, PlayerId, &mut Vec<String>),
}

/// Enemy keyword-less abilities, by timing.
#[derive(Clone, Copy, Default)]
pub struct EnemyAbilitySet {
    /// Fires when the enemy is revealed from the encounter deck.
    pub when_revealed: Option<fn(&mut GameState, &mut Vec<String>)>,
    /// Fires when the enemy engages a player. Receives the enemy's uid.
    pub when_engaged: Option<fn(&mut GameState, PlayerId, u32, &mut Vec<String>)>,
    /// Fires at the end of the combat phase while the enemy is staged.
    pub end_of_combat: Option<fn(&mut GameState, u32, &mut Vec<String>)>,
}

/// Location travel rules.
#[derive(Clone, Copy)]
pub struct LocationRules {
    /// True if the travel cost can currently be paid.
    pub can_travel: fn(&GameState) -> bool,
    /// Pay the travel cost and apply after-travel effects.
    pub on_travel: fn(&mut GameState, &mut Vec<String>),
}

/// What happens to a treachery card after its effect resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreacheryOutcome {
    /// Card goes to the encounter discard pile.
    Discard,
    /// Card attached itself to something and stays in play.
    Attached,
}

/// Treachery when-revealed resolver.
pub type TreacheryFn =
    fn(&mut GameState, &crate::cards::EncounterCard, &mut Vec<String>) -> TreacheryOutcome;

/// A target supplied when playing a card or event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    None,
    Hero { player: PlayerId, index: usize },
    Ally { player: PlayerId, index: usize },
    /// A card in some player's hand.
    HandCard { player: PlayerId, index: usize },
    /// A card in some player's discard pile.
    DiscardCard { player: PlayerId, index: usize },
    /// An enemy in play, by uid.
    Enemy(u32),
}

/// An event card's play rules.
#[derive(Clone, Copy)]
pub struct EventCard {
    pub can_play: fn(&GameState, PlayerId) -> bool,
    pub resolve:
        fn(&mut GameState, PlayerId, Target, &mut Vec<String>) -> Result<(), EngineError>,
}

/// Quest stage rules.
#[derive(Clone, Copy, Default)]
pub struct QuestRules {
    /// Extra encounter cards revealed during staging, on top of one per
    /// alive player.
    pub extra_reveals: u32,
    /// Fires when the stage is turned over.
    pub on_reveal: Option<fn(&mut GameState, &mut Vec<String>)>,
    /// Forced effect at the end of the encounter phase. Receives the
    /// session so it can reveal and resolve further encounter cards.
    pub end_of_encounter: Option<fn(&Session, &mut GameState, &mut Vec<String>)>,
    /// Alternative victory check, evaluated every step while this stage
    /// is current.
    pub check_victory: Option<fn(&GameState) -> bool>,
}

/// Immutable resolver registries for one scenario and card pool.
///
/// Cheap to share; all mutable bookkeeping (usage limits) lives in the
/// game state itself.
#[derive(Default)]
pub struct Session {
    card_abilities: FxHashMap<CardCode, CardAbility>,
    enter_play: FxHashMap<CardCode, EnterPlayFn>,
    destroy_responses: FxHashMap<CardCode, DestroyResponse>,
    enemies: FxHashMap<CardCode, EnemyAbilitySet>,
    locations: FxHashMap<CardCode, LocationRules>,
    treacheries: FxHashMap<CardCode, TreacheryFn>,
    events: FxHashMap<CardCode, EventCard>,
    quests: FxHashMap<CardCode, QuestRules>,
}

impl Session {
    /// An empty session with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_ability(&mut self, code: &str, ability: CardAbility) {
        self.card_abilities.insert(CardCode::from(code), ability);
    }

    pub fn register_enter_play(&mut self, code: &str, effect: EnterPlayFn) {
        self.enter_play.insert(CardCode::from(code), effect);
    }

    pub fn register_destroy_response(&mut self, code: &str, response: DestroyResponse) {
        self.destroy_responses.insert(CardCode::from(code), response);
    }

    pub fn register_enemy(&mut self, code: &str, abilities: EnemyAbilitySet) {
        self.enemies.insert(CardCode::from(code), abilities);
    }

    pub fn register_location(&mut self, code: &str, rules: LocationRules) {
        self.locations.insert(CardCode::from(code), rules);
    }

    pub fn register_treachery(&mut self, code: &str, effect: TreacheryFn) {
        self.treacheries.insert(CardCode::from(code), effect);
    }

    pub fn register_event(&mut self, code: &str, event: EventCard) {
        self.events.insert(CardCode::from(code), event);
    }

    pub fn register_quest(&mut self, code: &str, rules: QuestRules) {
        self.quests.insert(CardCode::from(code), rules);
    }

    #[must_use]
    pub fn ability(&self, code: &CardCode) -> Option<&CardAbility> {
        self.card_abilities.get(code)
    }

    #[must_use]
    pub fn enter_play_effect(&self, code: &CardCode) -> Option<EnterPlayFn> {
        self.enter_play.get(code).copied()
    }

    /// All registered destroy responses, for the post-combat scan.
    pub fn destroy_responses(&self) -> impl Iterator<Item = (&CardCode, &DestroyResponse)> {
        self.destroy_responses.iter()
    }

    #[must_use]
    pub fn enemy(&self, code: &CardCode) -> EnemyAbilitySet {
        self.enemies.get(code).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn location(&self, code: &CardCode) -> Option<&LocationRules> {
        self.locations.get(code)
    }

    #[must_use]
    pub fn treachery(&self, code: &CardCode) -> Option<TreacheryFn> {
        self.treacheries.get(code).copied()
    }

    #[must_use]
    pub fn event(&self, code: &CardCode) -> Option<&EventCard> {
        self.events.get(code)
    }

    #[must_use]
    pub fn quest(&self, code: &CardCode) -> QuestRules {
        self.quests.get(code).copied().unwrap_or_default()
    }
}

/// Activate a player-card ability by code.
///
/// Runs the full contract: limit check, legality check, resolution,
/// usage bookkeeping. The ability must be printed on one of the player's
/// heroes or their attachments.
pub fn activate(
    session: &Session,
    state: &GameState,
    player: PlayerId,
    code: &CardCode,
    hero_index: usize,
) -> Result<StepResult, EngineError> {
    let ability = session
        .ability(code)
        .ok_or_else(|| EngineError::NoSuchCard(code.clone()))?;

    let owner = &state.players[player];
    if owner.eliminated {
        return Err(EngineError::UnknownPlayer(player));
    }
    let hero = owner
        .heroes
        .get(hero_index)
        .ok_or_else(|| EngineError::InvalidTarget(format!("no hero at index {hero_index}")))?;
    let printed_here = hero.code == *code || hero.has_attachment(code.as_str());
    if !printed_here {
        return Err(EngineError::InvalidTarget(format!(
            "{} does not carry {code}",
            hero.name
        )));
    }

    let within_limit = match ability.limit {
        UseLimit::Unlimited => true,
        UseLimit::OncePerPhase => state.usage.phase_uses(player, code) == 0,
        UseLimit::OncePerRound => state.usage.round_uses(player, code) == 0,
        UseLimit::OncePerGame => state.usage.game_uses(player, code) == 0,
    };
    if !within_limit {
        return Err(EngineError::illegal(format!(
            "{code} has already been used this window"
        )));
    }

    let ctx = AbilityCtx { player, hero_index };
    if !(ability.can_use)(state, &ctx) {
        return Err(EngineError::illegal(format!(
            "{code} cannot be used right now"
        )));
    }

    let mut next = state.clone();
    let mut log = Vec::new();
    (ability.resolve)(&mut next, &ctx, &mut log)?;
    next.usage.record(player, code);
    Ok(StepResult::new(next, log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{EncounterCard, Sphere};
    use crate::core::{Hero, PlayerState};
    use im::Vector;

    fn test_state() -> GameState {
        let hero = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        let player = PlayerState::new(vec![hero], Vector::new());
        let stage = EncounterCard::quest("01119A", "Flies and Spiders", 1, 8);
        GameState::new(vec![player], stage, 1)
    }

    fn ready_ability() -> CardAbility {
        CardAbility {
            limit: UseLimit::OncePerPhase,
            can_use: |state, ctx| state.players[ctx.player].heroes[ctx.hero_index].exhausted,
            resolve: |state, ctx, log| {
                let hero = &mut state.players[ctx.player].heroes[ctx.hero_index];
                hero.exhausted = false;
                log.push(format!("{} readies.", hero.name));
                Ok(())
            },
        }
    }

    #[test]
    fn test_activate_runs_limit_and_legality() {
        let mut session = Session::new();
        session.register_ability("01001", ready_ability());

        let mut state = test_state();
        let p = PlayerId::new(0);
        let code = CardCode::from("01001");

        // Not exhausted yet: legality check fails.
        let err = activate(&session, &state, p, &code, 0).unwrap_err();
        assert!(matches!(err, EngineError::IllegalOperation(_)));

        state.players[p].heroes[0].exhausted = true;
        let result = activate(&session, &state, p, &code, 0).unwrap();
        assert!(!result.state.players[p].heroes[0].exhausted);
        assert_eq!(result.state.usage.phase_uses(p, &code), 1);

        // Second use in the same phase is over the limit.
        let mut again = result.state.clone();
        again.players[p].heroes[0].exhausted = true;
        let err = activate(&session, &again, p, &code, 0).unwrap_err();
        assert!(matches!(err, EngineError::IllegalOperation(_)));
    }

    #[test]
    fn test_activate_unknown_code_is_error() {
        let session = Session::new();
        let state = test_state();
        let err = activate(
            &session,
            &state,
            PlayerId::new(0),
            &CardCode::from("99999"),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NoSuchCard(_)));
    }

    #[test]
    fn test_unregistered_enemy_is_default_no_op() {
        let session = Session::new();
        let set = session.enemy(&CardCode::from("99999"));
        assert!(set.when_revealed.is_none());
        assert!(set.when_engaged.is_none());
        assert!(set.end_of_combat.is_none());
    }
}
