//! Game setup: decks, opening hands, and the scenario's staging start.

use im::Vector;

use crate::cards::{CardCode, EncounterKind, PlayerCard};
use crate::core::{
    ActiveEnemy, EngineError, GameState, Hero, Phase, PlayerId, PlayerState, StagingEntry,
    StepResult, STARTING_HAND_SIZE,
};
use crate::scenario::Scenario;

/// One player's starting lineup.
#[derive(Clone, Debug)]
pub struct PlayerSetup {
    pub heroes: Vec<Hero>,
    pub deck: Vec<PlayerCard>,
}

fn take_one(deck: &mut Vec<crate::cards::EncounterCard>, code: &CardCode) -> Option<crate::cards::EncounterCard> {
    deck.iter()
        .position(|c| c.code == *code)
        .map(|ix| deck.remove(ix))
}

/// Build a ready-to-play game state for a scenario.
///
/// Expands the encounter deck by printed quantity, performs the
/// scenario's setup searches, shuffles everything with the seeded rng,
/// and deals opening hands.
pub fn setup(
    scenario: &Scenario,
    players: Vec<PlayerSetup>,
    seed: u64,
) -> Result<GameState, EngineError> {
    let mut stages = scenario.quest_stages.iter();
    let first_stage = stages
        .next()
        .cloned()
        .ok_or(EngineError::EmptyPile("quest deck"))?;

    let player_states: Vec<PlayerState> = players
        .into_iter()
        .map(|p| PlayerState::new(p.heroes, p.deck.into_iter().collect()))
        .collect();
    let mut state = GameState::new(player_states, first_stage, seed);
    state.quest_deck = stages.cloned().collect();

    // One physical copy per point of printed quantity.
    let mut encounter_deck: Vec<crate::cards::EncounterCard> = Vec::new();
    for card in &scenario.encounter_cards {
        for _ in 0..card.quantity.max(1) {
            encounter_deck.push(card.clone());
        }
    }

    // Setup searches: named cards start in the staging area or set aside.
    for code in &scenario.staging_setup {
        let card = take_one(&mut encounter_deck, code)
            .ok_or_else(|| EngineError::NoSuchCard(code.clone()))?;
        let entry = if card.kind == EncounterKind::Enemy {
            let uid = state.next_enemy_uid();
            StagingEntry::Enemy(ActiveEnemy::new(uid, card))
        } else {
            StagingEntry::Card(card)
        };
        state.staging.push_back(entry);
    }
    for code in &scenario.set_aside {
        let card = take_one(&mut encounter_deck, code)
            .ok_or_else(|| EngineError::NoSuchCard(code.clone()))?;
        state.set_aside.push_back(card);
    }

    let deck: Vector<crate::cards::EncounterCard> = encounter_deck.into_iter().collect();
    state.encounter_deck = state.rng.shuffle_vector(&deck);

    // Shuffle player decks and deal opening hands.
    for id in state.players.player_ids().collect::<Vec<_>>() {
        let deck = state.rng.shuffle_vector(&state.players[id].deck);
        state.players[id].deck = deck;
        for _ in 0..STARTING_HAND_SIZE {
            state.players[id].draw_card();
        }
    }

    state.phase = Phase::Resource;
    state.round = 1;
    Ok(state)
}

/// Take the one allowed mulligan: shuffle the hand back and redraw.
///
/// Only legal before the first resource phase has been stepped.
pub fn mulligan(state: &GameState, player: PlayerId) -> Result<StepResult, EngineError> {
    if state.round != 1 || state.phase != Phase::Resource {
        return Err(EngineError::illegal("the mulligan window has passed"));
    }
    if state.players[player].mulligan_taken {
        return Err(EngineError::illegal("the mulligan is once per game"));
    }

    let mut next = state.clone();
    let mut log = Vec::new();
    let hand = std::mem::take(&mut next.players[player].hand);
    let mut deck = next.players[player].deck.clone();
    deck.append(hand);
    next.players[player].deck = next.rng.shuffle_vector(&deck);
    for _ in 0..STARTING_HAND_SIZE {
        next.players[player].draw_card();
    }
    next.players[player].mulligan_taken = true;
    log.push(format!("{player} takes a mulligan."));
    Ok(StepResult::new(next, log))
}
