//! Game state for a cooperative scenario.
//!
//! ## GameState
//!
//! The single source of truth for a game in progress. Piles use
//! `im::Vector` so cloning a whole state is O(1); callers can branch a
//! game, try a line of play, and throw the clone away.
//!
//! ## StagingEntry
//!
//! Cards in the staging area are a tagged union: locations and
//! treacheries sit there as plain cards, enemies as `ActiveEnemy` so they
//! keep damage and bonuses while staged.
//!
//! ## CombatState
//!
//! Sub-state for the interactive combat loop, ordered by engagement.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::{CardCode, EncounterCard, EncounterKind, PlayerCard};
use crate::core::player::{Ally, Hero, PlayerArea, PlayerId};
use crate::core::rng::GameRng;

/// Threat ceiling. Reaching it eliminates the player.
pub const MAX_THREAT: u32 = 50;

/// Cards drawn into the opening hand.
pub const STARTING_HAND_SIZE: usize = 6;

/// The phases of a game round, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Resource,
    Planning,
    QuestCommit,
    QuestStaging,
    QuestResolve,
    Travel,
    Encounter,
    Combat,
    Refresh,
    GameOver,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Resource => "Resource",
            Phase::Planning => "Planning",
            Phase::QuestCommit => "Quest (commit)",
            Phase::QuestStaging => "Quest (staging)",
            Phase::QuestResolve => "Quest (resolve)",
            Phase::Travel => "Travel",
            Phase::Encounter => "Encounter",
            Phase::Combat => "Combat",
            Phase::Refresh => "Refresh",
            Phase::GameOver => "Game over",
        };
        f.write_str(name)
    }
}

/// An enemy in play, staged or engaged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEnemy {
    /// Unique per game, assigned when the enemy enters play.
    pub uid: u32,
    pub card: EncounterCard,
    pub damage: u32,
    /// Attack bonus that expires during refresh.
    pub round_attack_bonus: u32,
    pub exhausted: bool,
    /// Set by combat tricks; a feinted enemy skips its attack this round.
    pub feinted: bool,
    /// Face-down shadow card dealt for this combat.
    pub shadow: Option<EncounterCard>,
}

impl ActiveEnemy {
    #[must_use]
    pub fn new(uid: u32, card: EncounterCard) -> Self {
        Self {
            uid,
            card,
            damage: 0,
            round_attack_bonus: 0,
            exhausted: false,
            feinted: false,
            shadow: None,
        }
    }

    /// True once damage meets or exceeds hit points.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.damage >= self.card.hit_points
    }
}

/// The active location being explored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLocation {
    pub card: EncounterCard,
    pub progress: u32,
}

impl ActiveLocation {
    #[must_use]
    pub fn new(card: EncounterCard) -> Self {
        Self { card, progress: 0 }
    }

    /// True once progress meets or exceeds quest points.
    #[must_use]
    pub fn is_explored(&self) -> bool {
        self.progress >= self.card.quest_points
    }
}

/// A card in the staging area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagingEntry {
    Card(EncounterCard),
    Enemy(ActiveEnemy),
}

impl StagingEntry {
    /// Threat this entry contributes during quest resolution.
    #[must_use]
    pub fn threat(&self) -> u32 {
        match self {
            StagingEntry::Card(card) => card.threat,
            StagingEntry::Enemy(enemy) => enemy.card.threat,
        }
    }

    /// The underlying printed card.
    #[must_use]
    pub fn card(&self) -> &EncounterCard {
        match self {
            StagingEntry::Card(card) => card,
            StagingEntry::Enemy(enemy) => &enemy.card,
        }
    }
}

/// A character in play, addressed by owner and position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterRef {
    Hero { player: PlayerId, index: usize },
    Ally { player: PlayerId, index: usize },
}

impl CharacterRef {
    #[must_use]
    pub const fn player(self) -> PlayerId {
        match self {
            CharacterRef::Hero { player, .. } | CharacterRef::Ally { player, .. } => player,
        }
    }
}

/// Which half of the combat phase the loop is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStep {
    /// Engaged enemies attack, one at a time.
    EnemyAttacks,
    /// Players declare attacks back.
    PlayerAttacks,
}

/// Interactive combat sub-state.
///
/// Enemies are queued by uid in engagement order and resolved one at a
/// time; `current` indexes into `queue`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub queue: Vec<u32>,
    pub current: usize,
    pub step: CombatStep,
    pub selected_defender: Option<CharacterRef>,
    pub selected_attackers: SmallVec<[CharacterRef; 4]>,
    pub shadow_revealed: bool,
    pub resolved: Vec<u32>,
}

impl CombatState {
    #[must_use]
    pub fn new(queue: Vec<u32>) -> Self {
        Self {
            queue,
            current: 0,
            step: CombatStep::EnemyAttacks,
            selected_defender: None,
            selected_attackers: SmallVec::new(),
            shadow_revealed: false,
            resolved: Vec::new(),
        }
    }

    /// The uid of the enemy currently being resolved, if any remain.
    #[must_use]
    pub fn current_enemy(&self) -> Option<u32> {
        self.queue.get(self.current).copied()
    }
}

/// Tracks ability activations against their printed limits.
///
/// Keys are `"{player}:{code}"`; the phase and round windows are cleared
/// at the matching boundaries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTable {
    per_phase: FxHashMap<String, u32>,
    per_round: FxHashMap<String, u32>,
    per_game: FxHashMap<String, u32>,
}

impl UsageTable {
    fn key(player: PlayerId, code: &CardCode) -> String {
        format!("{}:{}", player.index(), code)
    }

    /// Uses recorded in the current phase.
    #[must_use]
    pub fn phase_uses(&self, player: PlayerId, code: &CardCode) -> u32 {
        *self.per_phase.get(&Self::key(player, code)).unwrap_or(&0)
    }

    /// Uses recorded in the current round.
    #[must_use]
    pub fn round_uses(&self, player: PlayerId, code: &CardCode) -> u32 {
        *self.per_round.get(&Self::key(player, code)).unwrap_or(&0)
    }

    /// Uses recorded this game.
    #[must_use]
    pub fn game_uses(&self, player: PlayerId, code: &CardCode) -> u32 {
        *self.per_game.get(&Self::key(player, code)).unwrap_or(&0)
    }

    /// Record one activation in every window.
    pub fn record(&mut self, player: PlayerId, code: &CardCode) {
        let key = Self::key(player, code);
        *self.per_phase.entry(key.clone()).or_insert(0) += 1;
        *self.per_round.entry(key.clone()).or_insert(0) += 1;
        *self.per_game.entry(key).or_insert(0) += 1;
    }

    /// Clear the per-phase window.
    pub fn reset_phase(&mut self) {
        self.per_phase.clear();
    }

    /// Clear the per-phase and per-round windows.
    pub fn reset_round(&mut self) {
        self.per_phase.clear();
        self.per_round.clear();
    }
}

/// One player's side of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub threat: u32,
    pub heroes: Vec<Hero>,
    pub allies: Vec<Ally>,
    pub hand: Vector<PlayerCard>,
    pub deck: Vector<PlayerCard>,
    pub discard: Vector<PlayerCard>,
    pub engaged: Vec<ActiveEnemy>,
    pub eliminated: bool,
    pub mulligan_taken: bool,
}

impl PlayerState {
    #[must_use]
    pub fn new(heroes: Vec<Hero>, deck: Vector<PlayerCard>) -> Self {
        let threat = heroes.iter().map(|h| h.threat_cost).sum();
        Self {
            threat,
            heroes,
            allies: Vec::new(),
            hand: Vector::new(),
            deck,
            discard: Vector::new(),
            engaged: Vec::new(),
            eliminated: false,
            mulligan_taken: false,
        }
    }

    /// Draw one card from deck to hand. Returns false if the deck is empty.
    pub fn draw_card(&mut self) -> bool {
        match self.deck.pop_front() {
            Some(card) => {
                self.hand.push_back(card);
                true
            }
            None => false,
        }
    }

    /// Heroes still standing.
    pub fn alive_heroes(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter().filter(|h| !h.is_defeated())
    }

    /// True once every hero is defeated.
    #[must_use]
    pub fn all_heroes_defeated(&self) -> bool {
        self.heroes.iter().all(Hero::is_defeated)
    }
}

/// Result of one engine step: the successor state plus a player-readable
/// log of what happened.
#[derive(Clone, Debug)]
pub struct StepResult {
    pub state: GameState,
    pub log: Vec<String>,
}

impl StepResult {
    #[must_use]
    pub fn new(state: GameState, log: Vec<String>) -> Self {
        Self { state, log }
    }
}

/// Complete state of a game in progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub players: PlayerArea<PlayerState>,
    pub encounter_deck: Vector<EncounterCard>,
    pub encounter_discard: Vector<EncounterCard>,
    pub staging: Vector<StagingEntry>,
    pub active_location: Option<ActiveLocation>,
    pub quest_deck: Vector<EncounterCard>,
    pub current_stage: EncounterCard,
    pub quest_progress: u32,
    /// Willpower committed this quest phase, summed at commit time.
    pub committed_willpower: u32,
    /// Cards set aside during setup, waiting on a stage effect.
    pub set_aside: Vector<EncounterCard>,
    /// Defeated cards worth victory points.
    pub victory_display: Vector<EncounterCard>,
    pub phase: Phase,
    pub round: u32,
    pub first_player: PlayerId,
    pub combat: Option<CombatState>,
    pub game_over: bool,
    pub victory: bool,
    pub usage: UsageTable,
    /// Allies that return to hand at the end of the planning phase.
    pub pending_returns: Vec<(PlayerId, PlayerCard)>,
    /// Consumed by the next encounter reveal; its when-revealed effect is
    /// skipped.
    pub cancel_next_when_revealed: bool,
    next_uid: u32,
    pub rng: GameRng,
}

impl GameState {
    /// Build a fresh state. Scenario setup fills the piles afterwards.
    #[must_use]
    pub fn new(players: Vec<PlayerState>, current_stage: EncounterCard, seed: u64) -> Self {
        let count = players.len();
        let mut players = players.into_iter();
        let area = PlayerArea::new(count, |_| {
            players.next().expect("player list matches player count")
        });
        Self {
            players: area,
            encounter_deck: Vector::new(),
            encounter_discard: Vector::new(),
            staging: Vector::new(),
            active_location: None,
            quest_deck: Vector::new(),
            current_stage,
            quest_progress: 0,
            committed_willpower: 0,
            set_aside: Vector::new(),
            victory_display: Vector::new(),
            phase: Phase::Resource,
            round: 1,
            first_player: PlayerId::new(0),
            combat: None,
            game_over: false,
            victory: false,
            usage: UsageTable::default(),
            pending_returns: Vec::new(),
            cancel_next_when_revealed: false,
            next_uid: 0,
            rng: GameRng::new(seed),
        }
    }

    /// Allocate a uid for an enemy entering play.
    pub fn next_enemy_uid(&mut self) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    /// Total threat in the staging area.
    #[must_use]
    pub fn staging_threat(&self) -> u32 {
        self.staging.iter().map(StagingEntry::threat).sum()
    }

    /// Raise a player's threat, clamped to [`MAX_THREAT`].
    ///
    /// Hitting the ceiling eliminates the player; when every player is
    /// eliminated the game is over.
    pub fn raise_threat(&mut self, player: PlayerId, amount: u32, log: &mut Vec<String>) {
        let state = &mut self.players[player];
        if state.eliminated {
            return;
        }
        state.threat = (state.threat + amount).min(MAX_THREAT);
        log.push(format!("{player} threat rises to {}.", state.threat));
        if state.threat >= MAX_THREAT {
            state.eliminated = true;
            log.push(format!("{player} is eliminated at {MAX_THREAT} threat."));
        }
        self.check_defeat(log);
    }

    /// Lower a player's threat, saturating at zero.
    pub fn reduce_threat(&mut self, player: PlayerId, amount: u32, log: &mut Vec<String>) {
        let state = &mut self.players[player];
        state.threat = state.threat.saturating_sub(amount);
        log.push(format!("{player} threat falls to {}.", state.threat));
    }

    /// Mark the game lost if every player is eliminated or heroless.
    pub fn check_defeat(&mut self, log: &mut Vec<String>) {
        for (_, player) in self.players.iter_mut() {
            if !player.eliminated && player.all_heroes_defeated() {
                player.eliminated = true;
            }
        }
        let all_out = self.players.iter().all(|(_, p)| p.eliminated);
        if all_out && !self.game_over {
            self.game_over = true;
            self.phase = Phase::GameOver;
            log.push("All players are eliminated. The quest is lost.".to_owned());
        }
    }

    /// Mark the game won.
    pub fn declare_victory(&mut self, log: &mut Vec<String>, reason: &str) {
        if !self.game_over {
            self.game_over = true;
            self.victory = true;
            self.phase = Phase::GameOver;
            log.push(format!("The players win the game! {reason}"));
        }
    }

    /// Draw the top encounter card, reshuffling the discard pile into the
    /// deck if the deck is empty. Returns `None` only when both are empty.
    pub fn draw_encounter_card(&mut self) -> Option<EncounterCard> {
        if self.encounter_deck.is_empty() && !self.encounter_discard.is_empty() {
            let discard = std::mem::take(&mut self.encounter_discard);
            self.encounter_deck = self.rng.shuffle_vector(&discard);
        }
        self.encounter_deck.pop_front()
    }

    /// Count cards in play matching a predicate over printed cards.
    ///
    /// Scans staging, engaged enemies, and the active location.
    #[must_use]
    pub fn count_in_play(&self, pred: impl Fn(&EncounterCard) -> bool) -> u32 {
        let mut count = 0;
        for entry in &self.staging {
            if pred(entry.card()) {
                count += 1;
            }
        }
        for (_, player) in self.players.iter() {
            for enemy in &player.engaged {
                if pred(&enemy.card) {
                    count += 1;
                }
            }
        }
        if let Some(active) = &self.active_location {
            if pred(&active.card) {
                count += 1;
            }
        }
        count
    }

    /// True if any enemy is in play, staged or engaged.
    #[must_use]
    pub fn any_enemy_in_play(&self) -> bool {
        self.count_in_play(|c| c.kind == EncounterKind::Enemy) > 0
    }

    /// Find an engaged enemy by uid.
    #[must_use]
    pub fn find_engaged(&self, uid: u32) -> Option<(PlayerId, &ActiveEnemy)> {
        for (id, player) in self.players.iter() {
            if let Some(enemy) = player.engaged.iter().find(|e| e.uid == uid) {
                return Some((id, enemy));
            }
        }
        None
    }

    /// Find an engaged enemy by uid, mutably.
    pub fn find_engaged_mut(&mut self, uid: u32) -> Option<(PlayerId, &mut ActiveEnemy)> {
        for (id, player) in self.players.iter_mut() {
            if let Some(enemy) = player.engaged.iter_mut().find(|e| e.uid == uid) {
                return Some((id, enemy));
            }
        }
        None
    }

    /// Players still in the game, in seating order.
    pub fn alive_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(|(_, p)| !p.eliminated)
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Sphere;

    fn solo_state() -> GameState {
        let hero = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        let player = PlayerState::new(vec![hero], Vector::new());
        let stage = EncounterCard::quest("01119A", "Flies and Spiders", 1, 8);
        GameState::new(vec![player], stage, 42)
    }

    #[test]
    fn test_starting_threat_is_hero_cost_sum() {
        let heroes = vec![
            Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5),
            Hero::new("01005", "Legolas", Sphere::Tactics, 9, 1, 3, 1, 4),
            Hero::new("01004", "Gimli", Sphere::Tactics, 11, 2, 2, 2, 5),
        ];
        let player = PlayerState::new(heroes, Vector::new());
        assert_eq!(player.threat, 32);
    }

    #[test]
    fn test_raise_threat_clamps_and_eliminates() {
        let mut state = solo_state();
        let mut log = Vec::new();
        state.players[PlayerId::new(0)].threat = 49;

        state.raise_threat(PlayerId::new(0), 5, &mut log);

        let player = &state.players[PlayerId::new(0)];
        assert_eq!(player.threat, MAX_THREAT);
        assert!(player.eliminated);
        assert!(state.game_over);
        assert!(!state.victory);
    }

    #[test]
    fn test_reduce_threat_saturates() {
        let mut state = solo_state();
        let mut log = Vec::new();
        state.players[PlayerId::new(0)].threat = 3;

        state.reduce_threat(PlayerId::new(0), 6, &mut log);
        assert_eq!(state.players[PlayerId::new(0)].threat, 0);
    }

    #[test]
    fn test_staging_threat_sums_cards_and_enemies() {
        let mut state = solo_state();
        state
            .staging
            .push_back(StagingEntry::Card(EncounterCard::location(
                "01099",
                "Old Forest Road",
                1,
                3,
                2,
            )));
        let uid = state.next_enemy_uid();
        state.staging.push_back(StagingEntry::Enemy(ActiveEnemy::new(
            uid,
            EncounterCard::enemy("01096", "Forest Spider", 25, 2, 2, 1, 4, 4),
        )));

        assert_eq!(state.staging_threat(), 3);
    }

    #[test]
    fn test_draw_encounter_reshuffles_discard() {
        let mut state = solo_state();
        state
            .encounter_discard
            .push_back(EncounterCard::treachery("01104", "Despair", 2));

        let drawn = state.draw_encounter_card();
        assert!(drawn.is_some());
        assert!(state.encounter_deck.is_empty());
        assert!(state.encounter_discard.is_empty());

        assert!(state.draw_encounter_card().is_none());
    }

    #[test]
    fn test_usage_table_windows() {
        let mut usage = UsageTable::default();
        let code = CardCode::from("01001");
        let p = PlayerId::new(0);

        usage.record(p, &code);
        assert_eq!(usage.phase_uses(p, &code), 1);
        assert_eq!(usage.round_uses(p, &code), 1);
        assert_eq!(usage.game_uses(p, &code), 1);

        usage.reset_phase();
        assert_eq!(usage.phase_uses(p, &code), 0);
        assert_eq!(usage.round_uses(p, &code), 1);

        usage.reset_round();
        assert_eq!(usage.round_uses(p, &code), 0);
        assert_eq!(usage.game_uses(p, &code), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut state = solo_state();
        state
            .staging
            .push_back(StagingEntry::Card(EncounterCard::location(
                "01100",
                "Forest Gate",
                2,
                4,
                2,
            )));

        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.staging_threat(), state.staging_threat());
        assert_eq!(back.round, state.round);
        assert_eq!(back.phase, state.phase);
    }
}
