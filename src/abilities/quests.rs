//! Quest progress placement and the stage rules for this scenario.
//!
//! Progress from any source routes through [`place_progress`], which
//! applies the location-first rule: the active location absorbs progress
//! up to its remaining quest points before the stage sees any.

use crate::abilities::{QuestRules, Session};
use crate::cards::CardCode;
use crate::core::{GameState, StagingEntry};

use super::locations;

/// Caught in a Web, set aside during setup for stage 2.
const CAUGHT_IN_A_WEB: &str = "01078";

/// Place progress, active location first.
///
/// `via_card_effect` marks progress from card effects rather than quest
/// resolution; Mountains of Mirkwood blocks that kind entirely.
pub fn place_progress(
    state: &mut GameState,
    amount: u32,
    via_card_effect: bool,
    log: &mut Vec<String>,
) {
    if amount == 0 {
        return;
    }
    if via_card_effect && locations::card_progress_blocked(state) {
        log.push(
            "Mountains of Mirkwood: card effects cannot place progress on the quest.".to_owned(),
        );
        return;
    }

    let mut remaining = amount;
    if let Some(active) = &mut state.active_location {
        let room = active.card.quest_points.saturating_sub(active.progress);
        let absorbed = remaining.min(room);
        if absorbed > 0 {
            active.progress += absorbed;
            remaining -= absorbed;
            log.push(format!(
                "{} absorbs {absorbed} progress ({}/{}).",
                active.card.name, active.progress, active.card.quest_points
            ));
        }
        if active.is_explored() {
            let explored = state.active_location.take();
            if let Some(explored) = explored {
                log.push(format!("{} is explored and discarded.", explored.card.name));
                state.encounter_discard.push_back(explored.card);
            }
        }
    }

    if remaining > 0 {
        state.quest_progress += remaining;
        log.push(format!(
            "{remaining} progress on {} ({}/{}).",
            state.current_stage.name, state.quest_progress, state.current_stage.quest_points
        ));
    }
}

/// Advance the quest if the current stage is complete.
///
/// Stages with zero quest points never complete this way; they end by
/// their own victory condition.
pub fn check_stage_completion(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    if state.game_over || state.current_stage.quest_points == 0 {
        return;
    }
    if state.quest_progress < state.current_stage.quest_points {
        return;
    }

    log.push(format!("Stage defeated: {}.", state.current_stage.name));
    match state.quest_deck.pop_front() {
        Some(next) => {
            state.current_stage = next;
            state.quest_progress = 0;
            log.push(format!(
                "Advance to stage {}: {}.",
                state.current_stage.stage, state.current_stage.name
            ));
            let rules = session.quest(&state.current_stage.code.clone());
            if let Some(on_reveal) = rules.on_reveal {
                on_reveal(state, log);
            }
        }
        None => {
            state.declare_victory(log, "The quest deck is exhausted.");
        }
    }
}

/// Evaluate the current stage's alternative victory condition.
pub fn check_quest_victory(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    if state.game_over {
        return;
    }
    let rules = session.quest(&state.current_stage.code);
    if let Some(check) = rules.check_victory {
        if check(state) {
            let name = state.current_stage.name.clone();
            state.declare_victory(log, &format!("{name} is complete."));
        }
    }
}

fn stage_two_reveal(state: &mut GameState, log: &mut Vec<String>) {
    let code = CardCode::from(CAUGHT_IN_A_WEB);
    if let Some(pos) = state.set_aside.iter().position(|c| c.code == code) {
        let card = state.set_aside.remove(pos);
        log.push(format!("{} is added to the staging area.", card.name));
        state.staging.push_back(StagingEntry::Card(card));
    }
}

fn stage_two_end_of_encounter(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    if !state.any_enemy_in_play() {
        log.push(
            "A Fork in the Road: no enemies in play, reveal the top card of the encounter deck."
                .to_owned(),
        );
        crate::engine::reveal_encounter_card(session, state, log);
    }
}

fn stage_three_victory(state: &GameState) -> bool {
    state.encounter_deck.is_empty() && state.encounter_discard.is_empty()
}

/// Register the Passage Through Mirkwood stage rules.
pub fn register_all(session: &mut Session) {
    session.register_quest("01119A", QuestRules::default());
    session.register_quest(
        "01120A",
        QuestRules {
            on_reveal: Some(stage_two_reveal),
            end_of_encounter: Some(stage_two_end_of_encounter),
            ..QuestRules::default()
        },
    );
    session.register_quest(
        "01121A",
        QuestRules {
            extra_reveals: 1,
            check_victory: Some(stage_three_victory),
            ..QuestRules::default()
        },
    );
}
