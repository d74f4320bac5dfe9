//! Location travel costs and while-active effects.
//!
//! Travel costs go through the [`LocationRules`] registry. While-active
//! effects are queries over the active location, re-evaluated wherever
//! the affected stat or rule is read.

use crate::abilities::{LocationRules, Session};
use crate::core::{GameState, PlayerId};

/// Enchanted Stream appears in two encounter sets with different codes
/// and different while-active effects.
const ENCHANTED_STREAM_WILLPOWER: &str = "01095";
const ENCHANTED_STREAM_NO_DRAW: &str = "01093";
/// Mountains of Mirkwood.
const MOUNTAINS_OF_MIRKWOOD: &str = "01101";

/// While Enchanted Stream (01095) is active, each character gets -1
/// willpower.
#[must_use]
pub fn willpower_penalty_active(state: &GameState) -> bool {
    state
        .active_location
        .as_ref()
        .is_some_and(|a| a.card.code.as_str() == ENCHANTED_STREAM_WILLPOWER)
}

/// While Enchanted Stream (01093) is active, players cannot draw cards.
#[must_use]
pub fn draw_blocked(state: &GameState) -> bool {
    state
        .active_location
        .as_ref()
        .is_some_and(|a| a.card.code.as_str() == ENCHANTED_STREAM_NO_DRAW)
}

/// While Mountains of Mirkwood is active, card effects cannot place
/// progress on the quest.
#[must_use]
pub fn card_progress_blocked(state: &GameState) -> bool {
    state
        .active_location
        .as_ref()
        .is_some_and(|a| a.card.code.as_str() == MOUNTAINS_OF_MIRKWOOD)
}

/// The alive player with the highest threat, ties to seating order.
fn highest_threat_player(state: &GameState) -> Option<PlayerId> {
    state
        .players
        .iter()
        .filter(|(_, p)| !p.eliminated)
        .max_by_key(|(id, p)| (p.threat, std::cmp::Reverse(id.index())))
        .map(|(id, _)| id)
}

fn old_forest_road() -> LocationRules {
    LocationRules {
        can_travel: |_| true,
        on_travel: |state, log| {
            // After traveling, ready 1 exhausted character.
            for (_, player) in state.players.iter_mut() {
                if let Some(hero) = player.heroes.iter_mut().find(|h| h.exhausted) {
                    hero.exhausted = false;
                    log.push(format!("Old Forest Road: {} readies.", hero.name));
                    return;
                }
                if let Some(ally) = player.allies.iter_mut().find(|a| a.exhausted) {
                    ally.exhausted = false;
                    log.push(format!("Old Forest Road: {} readies.", ally.name));
                    return;
                }
            }
        },
    }
}

fn forest_gate() -> LocationRules {
    LocationRules {
        can_travel: |state| {
            highest_threat_player(state).is_some_and(|id| {
                state.players[id]
                    .heroes
                    .iter()
                    .any(|h| !h.exhausted && !h.is_defeated())
            })
        },
        on_travel: |state, log| {
            if let Some(id) = highest_threat_player(state) {
                let player = &mut state.players[id];
                if let Some(hero) = player
                    .heroes
                    .iter_mut()
                    .find(|h| !h.exhausted && !h.is_defeated())
                {
                    hero.exhausted = true;
                    log.push(format!(
                        "Forest Gate: {id} exhausts {} to travel here.",
                        hero.name
                    ));
                }
            }
        },
    }
}

fn necromancers_pass() -> LocationRules {
    LocationRules {
        can_travel: |_| true,
        on_travel: |state, log| {
            // The first player discards 2 random cards from hand.
            let id = state.first_player;
            for _ in 0..2 {
                let hand_size = state.players[id].hand.len();
                if hand_size == 0 {
                    break;
                }
                let pick = state.rng.gen_range_usize(0..hand_size);
                let card = state.players[id].hand.remove(pick);
                log.push(format!("Necromancer's Pass: {id} discards {}.", card.name));
                state.players[id].discard.push_back(card);
            }
        },
    }
}

fn mountains_of_mirkwood() -> LocationRules {
    // The while-active restriction is handled by `card_progress_blocked`.
    LocationRules {
        can_travel: |_| true,
        on_travel: |_, _| {},
    }
}

/// Register the travel rules for this scenario's locations.
pub fn register_all(session: &mut Session) {
    session.register_location("01099", old_forest_road());
    session.register_location("01100", forest_gate());
    session.register_location("01092", necromancers_pass());
    session.register_location(MOUNTAINS_OF_MIRKWOOD, mountains_of_mirkwood());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardCode, EncounterCard, Sphere};
    use crate::core::{ActiveLocation, Hero, PlayerState};
    use im::Vector;

    fn state_with_active(code: &str, name: &str) -> GameState {
        let hero = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        let player = PlayerState::new(vec![hero], Vector::new());
        let stage = EncounterCard::quest("01119A", "Flies and Spiders", 1, 8);
        let mut state = GameState::new(vec![player], stage, 3);
        state.active_location = Some(ActiveLocation::new(EncounterCard::location(
            code, name, 2, 3, 1,
        )));
        state
    }

    #[test]
    fn test_enchanted_streams_have_distinct_effects() {
        let state = state_with_active(ENCHANTED_STREAM_WILLPOWER, "Enchanted Stream");
        assert!(willpower_penalty_active(&state));
        assert!(!draw_blocked(&state));

        let state = state_with_active(ENCHANTED_STREAM_NO_DRAW, "Enchanted Stream");
        assert!(draw_blocked(&state));
        assert!(!willpower_penalty_active(&state));

        let state = state_with_active("01099", "Old Forest Road");
        assert!(!willpower_penalty_active(&state));
        assert!(!draw_blocked(&state));
    }

    #[test]
    fn test_forest_gate_requires_ready_hero() {
        let mut session = Session::new();
        register_all(&mut session);
        let rules = *session.location(&CardCode::from("01100")).unwrap();

        let mut state = state_with_active("01099", "Old Forest Road");
        assert!((rules.can_travel)(&state));

        state.players[PlayerId::new(0)].heroes[0].exhausted = true;
        assert!(!(rules.can_travel)(&state));
    }

    #[test]
    fn test_forest_gate_cost_exhausts_highest_threat_player() {
        let mut session = Session::new();
        register_all(&mut session);
        let rules = *session.location(&CardCode::from("01100")).unwrap();

        let mut state = state_with_active("01099", "Old Forest Road");
        let mut log = Vec::new();
        (rules.on_travel)(&mut state, &mut log);
        assert!(state.players[PlayerId::new(0)].heroes[0].exhausted);
    }

    #[test]
    fn test_old_forest_road_readies_a_character() {
        let mut session = Session::new();
        register_all(&mut session);
        let rules = *session.location(&CardCode::from("01099")).unwrap();

        let mut state = state_with_active("01099", "Old Forest Road");
        state.players[PlayerId::new(0)].heroes[0].exhausted = true;
        let mut log = Vec::new();
        (rules.on_travel)(&mut state, &mut log);
        assert!(!state.players[PlayerId::new(0)].heroes[0].exhausted);
    }
}
