//! Playing cards from hand: cost payment and per-kind entry rules.
//!
//! Costs are paid from hero resource pools. A card's sphere restricts
//! which pools can pay for it; neutral cards draw from any pool. Payment
//! spreads greedily across matching heroes, so callers never pick which
//! pool pays.

use crate::abilities::{AbilityOutcome, Session, Target};
use crate::cards::{PlayerCard, PlayerCardKind, Sphere};
use crate::core::{Ally, Attachment, EngineError, GameState, Phase, PlayerId, StepResult};

/// Outcome of playing a card.
#[derive(Clone, Debug)]
pub enum PlayOutcome {
    Played(StepResult),
    /// An enter-play effect needs a decision. The strings describe the
    /// options; call [`play_card`] again with the chosen index.
    NeedsChoice(Vec<String>),
}

/// Total resources the player can put toward a card of this sphere.
#[must_use]
pub fn available_resources(state: &GameState, player: PlayerId, sphere: Sphere) -> u32 {
    state.players[player]
        .heroes
        .iter()
        .filter(|h| !h.is_defeated() && (sphere == Sphere::Neutral || h.sphere == sphere))
        .map(|h| h.resources)
        .sum()
}

fn pay(state: &mut GameState, player: PlayerId, sphere: Sphere, cost: u32) -> Result<(), EngineError> {
    let available = available_resources(state, player, sphere);
    if available < cost {
        return Err(EngineError::InsufficientResources {
            required: cost,
            available,
        });
    }
    let mut remaining = cost;
    for hero in state.players[player].heroes.iter_mut() {
        if remaining == 0 {
            break;
        }
        if hero.is_defeated() || (sphere != Sphere::Neutral && hero.sphere != sphere) {
            continue;
        }
        let spend = hero.resources.min(remaining);
        hero.resources -= spend;
        remaining -= spend;
    }
    Ok(())
}

/// Pay a cost from any hero's pool, ignoring sphere.
///
/// Used by effects that put cards into play from unusual places.
pub fn pay_resources_any(
    state: &mut GameState,
    player: PlayerId,
    cost: u32,
) -> Result<(), EngineError> {
    pay(state, player, Sphere::Neutral, cost)
}

/// Sphere-matched payment for a card.
pub fn pay_for_card(
    state: &mut GameState,
    player: PlayerId,
    card: &PlayerCard,
) -> Result<(), EngineError> {
    pay(state, player, card.sphere, card.cost)
}

/// Play a card from hand during the planning phase (events also during
/// quest and combat phases, per their own play windows).
///
/// `target` names what the card attaches to or affects; `choice` answers
/// a pending enter-play decision on a second call.
pub fn play_card(
    session: &Session,
    state: &GameState,
    player: PlayerId,
    hand_index: usize,
    target: Target,
    choice: Option<usize>,
) -> Result<PlayOutcome, EngineError> {
    let owner = &state.players[player];
    if owner.eliminated {
        return Err(EngineError::UnknownPlayer(player));
    }
    let card = owner
        .hand
        .get(hand_index)
        .ok_or_else(|| EngineError::InvalidTarget(format!("no card at hand index {hand_index}")))?
        .clone();

    match card.kind {
        PlayerCardKind::Ally => play_ally(session, state, player, hand_index, &card, choice),
        PlayerCardKind::Attachment => play_attachment(state, player, hand_index, &card, target),
        PlayerCardKind::Event => play_event(session, state, player, hand_index, &card, target),
    }
}

fn require_planning(state: &GameState) -> Result<(), EngineError> {
    if state.phase != Phase::Planning {
        return Err(EngineError::NotYourPhase {
            expected: "planning",
        });
    }
    Ok(())
}

fn play_ally(
    session: &Session,
    state: &GameState,
    player: PlayerId,
    hand_index: usize,
    card: &PlayerCard,
    choice: Option<usize>,
) -> Result<PlayOutcome, EngineError> {
    require_planning(state)?;

    let mut next = state.clone();
    let mut log = Vec::new();
    pay_for_card(&mut next, player, card)?;
    next.players[player].hand.remove(hand_index);
    next.players[player].allies.push(Ally::from_card(card));
    log.push(format!("{player} plays {}.", card.name));

    if let Some(effect) = session.enter_play_effect(&card.code) {
        match effect(&mut next, player, choice, &mut log)? {
            AbilityOutcome::Resolved => {}
            AbilityOutcome::NeedsChoice(options) => return Ok(PlayOutcome::NeedsChoice(options)),
        }
    }
    Ok(PlayOutcome::Played(StepResult::new(next, log)))
}

fn play_attachment(
    state: &GameState,
    player: PlayerId,
    hand_index: usize,
    card: &PlayerCard,
    target: Target,
) -> Result<PlayOutcome, EngineError> {
    require_planning(state)?;

    let Target::Hero {
        player: owner,
        index,
    } = target
    else {
        return Err(EngineError::InvalidTarget(
            "attachments need a hero target".to_owned(),
        ));
    };
    let standing = state.players[owner]
        .heroes
        .get(index)
        .is_some_and(|h| !h.is_defeated());
    if !standing {
        return Err(EngineError::InvalidTarget(
            "that hero cannot take attachments".to_owned(),
        ));
    }

    let mut next = state.clone();
    let mut log = Vec::new();
    pay_for_card(&mut next, player, card)?;
    next.players[player].hand.remove(hand_index);
    let hero = &mut next.players[owner].heroes[index];
    log.push(format!("{player} attaches {} to {}.", card.name, hero.name));
    hero.attachments.push(Attachment::new(card.clone()));
    Ok(PlayOutcome::Played(StepResult::new(next, log)))
}

fn play_event(
    session: &Session,
    state: &GameState,
    player: PlayerId,
    hand_index: usize,
    card: &PlayerCard,
    target: Target,
) -> Result<PlayOutcome, EngineError> {
    let mut next = state.clone();
    let mut log = Vec::new();

    match session.event(&card.code) {
        Some(event) => {
            if !(event.can_play)(state, player) {
                return Err(EngineError::illegal(format!(
                    "{} cannot be played right now",
                    card.name
                )));
            }
            pay_for_card(&mut next, player, card)?;
            next.players[player].hand.remove(hand_index);
            log.push(format!("{player} plays {}.", card.name));
            (event.resolve)(&mut next, player, target, &mut log)?;
        }
        None => {
            // An unscripted event still costs resources and is discarded.
            require_planning(state)?;
            pay_for_card(&mut next, player, card)?;
            next.players[player].hand.remove(hand_index);
            log.push(format!("{player} plays {}; it has no effect.", card.name));
        }
    }

    next.players[player].discard.push_back(card.clone());
    Ok(PlayOutcome::Played(StepResult::new(next, log)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::heroes;
    use crate::cards::EncounterCard;
    use crate::core::{Hero, PlayerState};
    use im::Vector;

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    fn planning_state(hand: Vec<PlayerCard>) -> GameState {
        let heroes = vec![
            Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5),
            Hero::new("01005", "Legolas", Sphere::Tactics, 9, 1, 3, 1, 4),
        ];
        let player = PlayerState::new(heroes, Vector::new());
        let stage = EncounterCard::quest("01119A", "Flies and Spiders", 1, 8);
        let mut state = GameState::new(vec![player], stage, 9);
        state.phase = Phase::Planning;
        for card in hand {
            state.players[p0()].hand.push_back(card);
        }
        state
    }

    fn scout() -> PlayerCard {
        PlayerCard::ally("01016", "Snowbourn Scout", Sphere::Leadership, 1, 0, 0, 1, 1)
    }

    #[test]
    fn test_sphere_matched_payment() {
        let mut state = planning_state(Vec::new());
        state.players[p0()].heroes[0].resources = 2;
        state.players[p0()].heroes[1].resources = 2;

        // Leadership cost 1: only Aragorn's pool can pay.
        assert_eq!(available_resources(&state, p0(), Sphere::Leadership), 2);
        assert_eq!(available_resources(&state, p0(), Sphere::Spirit), 0);
        assert_eq!(available_resources(&state, p0(), Sphere::Neutral), 4);

        pay_for_card(&mut state, p0(), &scout()).unwrap();
        assert_eq!(state.players[p0()].heroes[0].resources, 1);
        assert_eq!(state.players[p0()].heroes[1].resources, 2);
    }

    #[test]
    fn test_insufficient_resources_is_an_error() {
        let mut state = planning_state(Vec::new());
        let err = pay_for_card(&mut state, p0(), &scout()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientResources {
                required: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_neutral_cost_spreads_across_pools() {
        let mut state = planning_state(Vec::new());
        state.players[p0()].heroes[0].resources = 2;
        state.players[p0()].heroes[1].resources = 2;

        pay_resources_any(&mut state, p0(), 3).unwrap();
        let total: u32 = state.players[p0()].heroes.iter().map(|h| h.resources).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_play_ally_enters_play() {
        let session = Session::new();
        let mut state = planning_state(vec![scout()]);
        state.players[p0()].heroes[0].resources = 1;

        let outcome = play_card(&session, &state, p0(), 0, Target::None, None).unwrap();
        let PlayOutcome::Played(result) = outcome else {
            panic!("expected the ally to enter play");
        };
        assert_eq!(result.state.players[p0()].allies.len(), 1);
        assert!(result.state.players[p0()].hand.is_empty());
    }

    #[test]
    fn test_play_attachment_needs_a_hero() {
        let session = Session::new();
        let steward =
            PlayerCard::attachment("01026", "Steward of Gondor", Sphere::Leadership, 2);
        let mut state = planning_state(vec![steward]);
        state.players[p0()].heroes[0].resources = 2;

        let err = play_card(&session, &state, p0(), 0, Target::None, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTarget(_)));

        let target = Target::Hero {
            player: p0(),
            index: 0,
        };
        let outcome = play_card(&session, &state, p0(), 0, target, None).unwrap();
        let PlayOutcome::Played(result) = outcome else {
            panic!("expected the attachment to land");
        };
        assert!(result.state.players[p0()].heroes[0].has_attachment("01026"));
    }

    #[test]
    fn test_ally_outside_planning_is_rejected() {
        let session = Session::new();
        let mut state = planning_state(vec![scout()]);
        state.players[p0()].heroes[0].resources = 1;
        state.phase = Phase::Combat;

        let err = play_card(&session, &state, p0(), 0, Target::None, None).unwrap_err();
        assert!(matches!(err, EngineError::NotYourPhase { .. }));
    }

    #[test]
    fn test_unscripted_event_is_paid_and_discarded() {
        let session = Session::new();
        let event = PlayerCard::event("99999", "Forgotten Trick", Sphere::Leadership, 1);
        let mut state = planning_state(vec![event]);
        state.players[p0()].heroes[0].resources = 1;

        let outcome = play_card(&session, &state, p0(), 0, Target::None, None).unwrap();
        let PlayOutcome::Played(result) = outcome else {
            panic!("expected the event to resolve");
        };
        assert!(result.state.players[p0()].hand.is_empty());
        assert_eq!(result.state.players[p0()].discard.len(), 1);
        assert_eq!(result.state.players[p0()].heroes[0].resources, 0);
    }

    #[test]
    fn test_gandalf_enter_play_offers_a_choice() {
        let mut session = Session::new();
        heroes::register_all(&mut session);

        let gandalf = PlayerCard::ally("01073", "Gandalf", Sphere::Neutral, 5, 4, 4, 4, 4);
        let mut state = planning_state(vec![gandalf]);
        state.players[p0()].heroes[0].resources = 3;
        state.players[p0()].heroes[1].resources = 2;
        state.players[p0()].threat = 30;

        let outcome = play_card(&session, &state, p0(), 0, Target::None, None).unwrap();
        assert!(matches!(outcome, PlayOutcome::NeedsChoice(_)));

        // Choice 2: reduce threat by 5.
        let outcome = play_card(&session, &state, p0(), 0, Target::None, Some(2)).unwrap();
        let PlayOutcome::Played(result) = outcome else {
            panic!("expected Gandalf to resolve");
        };
        assert_eq!(result.state.players[p0()].threat, 25);
        assert_eq!(result.state.players[p0()].allies.len(), 1);
    }
}
