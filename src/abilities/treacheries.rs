//! Treachery when-revealed effects.
//!
//! Every resolver reports whether the card is discarded afterwards or
//! stayed in play as an attachment. Condition treacheries attach to a
//! hero and are NOT discarded.

use crate::abilities::{Session, TreacheryOutcome};
use crate::cards::EncounterCard;
use crate::core::{GameState, PlayerId};

use super::quests;

fn necromancers_reach(
    state: &mut GameState,
    _card: &EncounterCard,
    log: &mut Vec<String>,
) -> TreacheryOutcome {
    log.push("The Necromancer's Reach: 1 damage to each exhausted character.".to_owned());
    for (_, player) in state.players.iter_mut() {
        for hero in player.heroes.iter_mut().filter(|h| h.exhausted) {
            hero.damage += 1;
            log.push(format!("{} takes 1 damage.", hero.name));
            if hero.is_defeated() {
                log.push(format!("{} falls.", hero.name));
            }
        }
        let mut ix = 0;
        while ix < player.allies.len() {
            if player.allies[ix].exhausted {
                player.allies[ix].damage += 1;
                if player.allies[ix].is_defeated() {
                    let ally = player.allies.remove(ix);
                    log.push(format!("{} is destroyed.", ally.name));
                    continue;
                }
            }
            ix += 1;
        }
    }
    state.check_defeat(log);
    TreacheryOutcome::Discard
}

fn driven_by_shadow(
    state: &mut GameState,
    _card: &EncounterCard,
    log: &mut Vec<String>,
) -> TreacheryOutcome {
    let staged = state.staging.len() as u32;
    log.push(format!(
        "Driven by Shadow: {staged} cards in the staging area."
    ));
    quests::place_progress(state, staged, true, log);
    TreacheryOutcome::Discard
}

fn despair(
    state: &mut GameState,
    _card: &EncounterCard,
    log: &mut Vec<String>,
) -> TreacheryOutcome {
    log.push("Despair: each player raises their threat by 3.".to_owned());
    let players: Vec<PlayerId> = state.alive_players().collect();
    for id in players {
        state.raise_threat(id, 3, log);
    }
    TreacheryOutcome::Discard
}

/// Attach a condition treachery to the first standing hero.
fn attach_condition(
    state: &mut GameState,
    card: &EncounterCard,
    log: &mut Vec<String>,
) -> TreacheryOutcome {
    for (id, player) in state.players.iter_mut() {
        if player.eliminated {
            continue;
        }
        if let Some(hero) = player.heroes.iter_mut().find(|h| !h.is_defeated()) {
            log.push(format!("{} attaches to {id}'s {}.", card.name, hero.name));
            hero.conditions.push(card.clone());
            return TreacheryOutcome::Attached;
        }
    }
    log.push(format!("{} has no hero to attach to.", card.name));
    TreacheryOutcome::Discard
}

/// Register the treachery resolvers.
///
/// The Necromancer's Reach appears under two codes, one per encounter
/// set.
pub fn register_all(session: &mut Session) {
    session.register_treachery("01102", necromancers_reach);
    session.register_treachery("01094", necromancers_reach);
    session.register_treachery("01103", driven_by_shadow);
    session.register_treachery("01104", despair);
    session.register_treachery("01077", attach_condition);
    session.register_treachery("01078", attach_condition);
}
