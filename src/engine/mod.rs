//! The round state machine.
//!
//! [`advance`] drives the game one phase at a time. Each call consumes a
//! state by reference and returns a fresh [`StepResult`] holding the
//! successor state and an ordered log; the input state is never mutated,
//! so callers can keep any number of past states around.
//!
//! ## Round structure
//!
//! Resource, Planning, Quest (commit / staging / resolve), Travel,
//! Encounter, Combat, Refresh. The combat phase is special: `advance`
//! into it deals shadow cards and builds the interactive
//! [`crate::core::CombatState`]; the next `advance` auto-resolves
//! whatever combat remains, while [`combat`] exposes the manual
//! operations for interactive play.

pub mod combat;
pub mod play;
pub mod setup;

use crate::abilities::{heroes, locations, quests, Session, TreacheryOutcome};
use crate::cards::EncounterKind;
use crate::core::{
    ActiveEnemy, ActiveLocation, EngineError, GameState, Phase, PlayerId, StagingEntry,
    StepResult,
};
use crate::keywords::parse_keywords;

/// Drive the game one phase step forward.
///
/// A finished game is a no-op that reports the outcome.
pub fn advance(session: &Session, state: &GameState) -> Result<StepResult, EngineError> {
    let mut next = state.clone();
    let mut log = Vec::new();

    if next.game_over {
        log.push(if next.victory {
            "The game is over: the players won.".to_owned()
        } else {
            "The game is over: the players were defeated.".to_owned()
        });
        return Ok(StepResult::new(next, log));
    }

    match next.phase {
        Phase::Resource => step_resource(&mut next, &mut log),
        Phase::Planning => step_end_of_planning(&mut next, &mut log),
        Phase::QuestCommit => step_quest_commit(&mut next, &mut log),
        Phase::QuestStaging => step_quest_staging(session, &mut next, &mut log),
        Phase::QuestResolve => step_quest_resolve(session, &mut next, &mut log),
        Phase::Travel => step_travel(session, &mut next, &mut log),
        Phase::Encounter => step_encounter(session, &mut next, &mut log),
        Phase::Combat => combat::auto_resolve(session, &mut next, &mut log)?,
        Phase::Refresh => step_refresh(&mut next, &mut log),
        Phase::GameOver => {}
    }

    quests::check_quest_victory(session, &mut next, &mut log);
    if next.game_over {
        next.phase = Phase::GameOver;
    }
    Ok(StepResult::new(next, log))
}

fn step_resource(state: &mut GameState, log: &mut Vec<String>) {
    log.push(format!("Round {}: resource phase.", state.round));
    let draw_blocked = locations::draw_blocked(state);
    let no_resources = "01078"; // Caught in a Web blocks resource collection

    for (id, player) in state.players.iter_mut() {
        if player.eliminated {
            continue;
        }
        for hero in player.heroes.iter_mut().filter(|h| !h.is_defeated()) {
            if hero.has_condition(no_resources) {
                log.push(format!(
                    "Caught in a Web: {} collects no resources.",
                    hero.name
                ));
                continue;
            }
            hero.resources += 1;
        }
        if draw_blocked {
            log.push(format!("Enchanted Stream: {id} cannot draw."));
        } else if player.draw_card() {
            log.push(format!("{id} draws a card."));
        } else {
            log.push(format!("{id} has no cards left to draw."));
        }
    }
    state.usage.reset_phase();
    state.phase = Phase::Planning;
}

/// Close the planning phase: allies on loan from hand go back.
fn step_end_of_planning(state: &mut GameState, log: &mut Vec<String>) {
    let returns = std::mem::take(&mut state.pending_returns);
    for (player, card) in returns {
        let allies = &mut state.players[player].allies;
        if let Some(pos) = allies.iter().position(|a| a.code == card.code) {
            allies.remove(pos);
            log.push(format!("{} returns to {player}'s hand.", card.name));
            state.players[player].hand.push_back(card);
        }
    }
    state.usage.reset_phase();
    state.phase = Phase::QuestCommit;
}

fn step_quest_commit(state: &mut GameState, log: &mut Vec<String>) {
    let cannot_commit = "01077"; // Great Forest Web holds the hero back
    let mut total = 0;

    let player_ids: Vec<PlayerId> = state.alive_players().collect();
    for id in player_ids {
        for ix in 0..state.players[id].heroes.len() {
            let hero = &state.players[id].heroes[ix];
            if hero.exhausted || hero.is_defeated() {
                continue;
            }
            if hero.has_condition(cannot_commit) {
                log.push(format!(
                    "Great Forest Web: {} cannot commit to the quest.",
                    hero.name
                ));
                continue;
            }
            let willpower = heroes::effective_hero_willpower(state, hero);
            let hero = &mut state.players[id].heroes[ix];
            hero.exhausted = true;
            total += willpower;
            log.push(format!(
                "{} commits to the quest ({willpower} willpower).",
                hero.name
            ));
        }
        for ix in 0..state.players[id].allies.len() {
            let ally = &state.players[id].allies[ix];
            if ally.exhausted || ally.is_defeated() || ally.willpower == 0 {
                continue;
            }
            let willpower = heroes::effective_ally_willpower(state, ally);
            let ally = &mut state.players[id].allies[ix];
            ally.exhausted = true;
            total += willpower;
            log.push(format!(
                "{} commits to the quest ({willpower} willpower).",
                ally.name
            ));
        }
    }

    state.committed_willpower = total;
    log.push(format!("Committed willpower: {total}."));
    state.phase = Phase::QuestStaging;
}

fn step_quest_staging(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    let rules = session.quest(&state.current_stage.code);
    let reveals = state.alive_players().count() as u32 + rules.extra_reveals;
    log.push(format!("Staging: reveal {reveals} encounter cards."));
    for _ in 0..reveals {
        if state.game_over {
            return;
        }
        reveal_encounter_card(session, state, log);
    }
    state.phase = Phase::QuestResolve;
}

/// Reveal and resolve one encounter card, following Surge chains.
///
/// Doomed resolves before anything else on the card; Surge queues
/// another reveal after the card finishes. Unknown treacheries are
/// logged no-ops.
pub fn reveal_encounter_card(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    loop {
        let Some(card) = state.draw_encounter_card() else {
            log.push("The encounter deck and discard pile are empty.".to_owned());
            return;
        };
        log.push(format!("Revealed: {}.", card.name));

        let keywords = parse_keywords(&card);
        if let Some(doomed) = keywords.doomed {
            log.push(format!("Doomed {doomed}."));
            let players: Vec<PlayerId> = state.alive_players().collect();
            for id in players {
                state.raise_threat(id, doomed, log);
            }
            if state.game_over {
                return;
            }
        }

        let cancelled = std::mem::take(&mut state.cancel_next_when_revealed);
        if cancelled {
            log.push(format!(
                "The when-revealed effect of {} is cancelled.",
                card.name
            ));
        }

        match card.kind {
            EncounterKind::Enemy => {
                if !cancelled {
                    if let Some(when_revealed) = session.enemy(&card.code).when_revealed {
                        when_revealed(state, log);
                    }
                }
                let uid = state.next_enemy_uid();
                log.push(format!("{} enters the staging area.", card.name));
                state
                    .staging
                    .push_back(StagingEntry::Enemy(ActiveEnemy::new(uid, card.clone())));
            }
            EncounterKind::Location => {
                log.push(format!("{} enters the staging area.", card.name));
                state.staging.push_back(StagingEntry::Card(card.clone()));
            }
            EncounterKind::Treachery => {
                if cancelled {
                    state.encounter_discard.push_back(card.clone());
                } else {
                    match session.treachery(&card.code) {
                        Some(effect) => match effect(state, &card, log) {
                            TreacheryOutcome::Discard => {
                                state.encounter_discard.push_back(card.clone());
                            }
                            TreacheryOutcome::Attached => {}
                        },
                        None => {
                            log.push(format!("{} has no effect.", card.name));
                            state.encounter_discard.push_back(card.clone());
                        }
                    }
                }
            }
            EncounterKind::Quest => {
                // Quest cards never sit in the encounter deck; treat a
                // stray one as inert.
                log.push(format!("{} has no effect.", card.name));
                state.encounter_discard.push_back(card.clone());
            }
        }

        if state.game_over {
            return;
        }
        if keywords.surge {
            log.push(format!("{} surges: reveal another card.", card.name));
            continue;
        }
        return;
    }
}

fn step_quest_resolve(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    let willpower = state.committed_willpower;
    let threat = state.staging_threat();
    state.committed_willpower = 0;
    log.push(format!(
        "Quest resolution: {willpower} willpower against {threat} threat."
    ));

    if willpower > threat {
        let net = willpower - threat;
        quests::place_progress(state, net, false, log);
        quests::check_stage_completion(session, state, log);
    } else if willpower < threat {
        let net = threat - willpower;
        log.push(format!("The quest fails by {net}."));
        let players: Vec<PlayerId> = state.alive_players().collect();
        for id in players {
            state.raise_threat(id, net, log);
        }
    } else {
        log.push("The quest is a stalemate.".to_owned());
    }

    if !state.game_over {
        state.phase = Phase::Travel;
    }
}

fn step_travel(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    if state.active_location.is_some() {
        log.push("A location is already active; no travel.".to_owned());
    } else {
        let candidate = state.staging.iter().enumerate().find_map(|(ix, entry)| {
            match entry {
                StagingEntry::Card(card) if card.kind == EncounterKind::Location => {
                    let can_travel = session
                        .location(&card.code)
                        .map_or(true, |rules| (rules.can_travel)(state));
                    can_travel.then_some(ix)
                }
                _ => None,
            }
        });
        match candidate {
            Some(ix) => {
                let entry = state.staging.remove(ix);
                if let StagingEntry::Card(card) = entry {
                    log.push(format!("The players travel to {}.", card.name));
                    let rules = session.location(&card.code).copied();
                    state.active_location = Some(ActiveLocation::new(card));
                    if let Some(rules) = rules {
                        (rules.on_travel)(state, log);
                    }
                }
            }
            None => log.push("No location to travel to.".to_owned()),
        }
    }
    state.usage.reset_phase();
    state.phase = Phase::Encounter;
}

/// One engagement check: the staged enemy with the highest engagement
/// cost that some player's threat meets. Ties go to staging order.
fn engagement_candidate(state: &GameState) -> Option<(usize, PlayerId)> {
    let mut best: Option<(usize, u32, PlayerId)> = None;
    for (ix, entry) in state.staging.iter().enumerate() {
        let StagingEntry::Enemy(enemy) = entry else {
            continue;
        };
        let Some(cost) = enemy.card.engagement_cost else {
            continue;
        };
        // The engaging player is the one with the highest threat that
        // meets the cost.
        let engager = state
            .players
            .iter()
            .filter(|(_, p)| !p.eliminated && p.threat >= cost)
            .max_by_key(|(id, p)| (p.threat, std::cmp::Reverse(id.index())))
            .map(|(id, _)| id);
        let Some(player) = engager else { continue };
        let better = match best {
            Some((_, best_cost, _)) => cost > best_cost,
            None => true,
        };
        if better {
            best = Some((ix, cost, player));
        }
    }
    best.map(|(ix, _, player)| (ix, player))
}

/// Move a staged enemy into engagement with a player and fire its
/// when-engaged ability.
fn engage(
    session: &Session,
    state: &mut GameState,
    staging_index: usize,
    player: PlayerId,
    log: &mut Vec<String>,
) {
    let enemy = match state.staging.remove(staging_index) {
        StagingEntry::Enemy(enemy) => enemy,
        StagingEntry::Card(card) => {
            state.staging.insert(staging_index, StagingEntry::Card(card));
            return;
        }
    };
    let uid = enemy.uid;
    let code = enemy.card.code.clone();
    log.push(format!("{} engages {player}.", enemy.card.name));
    state.players[player].engaged.push(enemy);
    if let Some(when_engaged) = session.enemy(&code).when_engaged {
        when_engaged(state, player, uid, log);
    }
}

/// Voluntarily engage a staged enemy during the encounter phase.
pub fn engage_enemy(
    session: &Session,
    state: &GameState,
    player: PlayerId,
    uid: u32,
) -> Result<StepResult, EngineError> {
    if state.phase != Phase::Encounter {
        return Err(EngineError::NotYourPhase {
            expected: "encounter",
        });
    }
    if state.players[player].eliminated {
        return Err(EngineError::UnknownPlayer(player));
    }
    let staging_index = state
        .staging
        .iter()
        .position(|entry| matches!(entry, StagingEntry::Enemy(e) if e.uid == uid))
        .ok_or_else(|| EngineError::InvalidTarget("enemy is not in the staging area".to_owned()))?;

    let mut next = state.clone();
    let mut log = Vec::new();
    engage(session, &mut next, staging_index, player, &mut log);
    Ok(StepResult::new(next, log))
}

fn step_encounter(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    log.push("Encounter phase: engagement checks.".to_owned());
    while let Some((ix, player)) = engagement_candidate(state) {
        engage(session, state, ix, player, log);
        if state.game_over {
            return;
        }
    }

    let rules = session.quest(&state.current_stage.code);
    if let Some(end_of_encounter) = rules.end_of_encounter {
        end_of_encounter(session, state, log);
    }
    if state.game_over {
        return;
    }

    state.usage.reset_phase();
    combat::start_combat(state, log);
    state.phase = Phase::Combat;
}

fn step_refresh(state: &mut GameState, log: &mut Vec<String>) {
    log.push("Refresh phase.".to_owned());
    let web = "01078"; // Caught in a Web: pay 2 from the hero's pool to ready
    let gandalf = "01073";

    // Round-scoped bonuses expire.
    for (_, player) in state.players.iter_mut() {
        for hero in &mut player.heroes {
            hero.round_attack_bonus = 0;
        }
        for enemy in &mut player.engaged {
            enemy.round_attack_bonus = 0;
            enemy.feinted = false;
        }
    }

    // A fully explored location should already be gone; sweep anyway in
    // case a card effect finished it outside progress placement.
    if state
        .active_location
        .as_ref()
        .is_some_and(ActiveLocation::is_explored)
    {
        if let Some(active) = state.active_location.take() {
            log.push(format!("{} is explored and discarded.", active.card.name));
            state.encounter_discard.push_back(active.card);
        }
    }

    // Ready everything.
    for (_, player) in state.players.iter_mut() {
        for hero in &mut player.heroes {
            if !hero.exhausted {
                continue;
            }
            if hero.has_condition(web) {
                if hero.resources >= 2 {
                    hero.resources -= 2;
                    hero.exhausted = false;
                    log.push(format!(
                        "{} pays 2 resources to ready despite the web.",
                        hero.name
                    ));
                } else {
                    log.push(format!(
                        "Caught in a Web: {} cannot ready.",
                        hero.name
                    ));
                }
                continue;
            }
            hero.exhausted = false;
        }
        for ally in &mut player.allies {
            ally.exhausted = false;
        }
        for attachment in player
            .heroes
            .iter_mut()
            .flat_map(|h| h.attachments.iter_mut())
        {
            attachment.exhausted = false;
        }
        for enemy in &mut player.engaged {
            enemy.exhausted = false;
        }

        // Gandalf leaves play at the end of the round.
        let mut ix = 0;
        while ix < player.allies.len() {
            if player.allies[ix].code.as_str() == gandalf {
                let ally = player.allies.remove(ix);
                log.push(format!("{} returns to the discard pile.", ally.name));
                player.discard.push_back(crate::cards::PlayerCard::ally(
                    ally.code.as_str(),
                    &ally.name,
                    ally.sphere,
                    5,
                    ally.willpower,
                    ally.attack,
                    ally.defense,
                    ally.hit_points,
                ));
                continue;
            }
            ix += 1;
        }
    }

    // Threat marches on.
    let players: Vec<PlayerId> = state.alive_players().collect();
    for id in players {
        state.raise_threat(id, 1, log);
    }
    if state.game_over {
        return;
    }

    // Pass the first player token to the next alive player.
    let count = state.players.player_count();
    let mut candidate = state.first_player;
    for _ in 0..count {
        let next = PlayerId::new(((candidate.index() + 1) % count) as u8);
        candidate = next;
        if !state.players[candidate].eliminated {
            break;
        }
    }
    state.first_player = candidate;

    state.usage.reset_round();
    state.round += 1;
    state.phase = Phase::Resource;
    log.push(format!("Round {} begins.", state.round));
}
