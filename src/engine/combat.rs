//! The combat phase: shadow cards, defense, and counterattacks.
//!
//! Combat runs as an explicit sub-state machine over
//! [`crate::core::CombatState`]. Enemies attack first, one at a time in
//! engagement order; each attack reveals its shadow card on
//! confirmation. Once every enemy has attacked, players declare attacks
//! back, again one enemy at a time.
//!
//! Every operation here is optional for callers: [`auto_resolve`]
//! finishes any half-resolved combat with default choices, so driving
//! the round loop with [`super::advance`] alone always works.

use crate::abilities::enemies::{enemy_attack_total, parse_shadow, ShadowEffect};
use crate::abilities::{heroes, Session};
use crate::core::{
    CharacterRef, CombatState, CombatStep, EngineError, GameState, Phase, PlayerId, StepResult,
};

/// Deal shadow cards and build the combat queue.
///
/// Called when the encounter phase hands over to combat. Shadow cards
/// come off the encounter deck face down, one per engaged enemy, dealt
/// in engagement order starting with the first player.
pub fn start_combat(state: &mut GameState, log: &mut Vec<String>) {
    let mut queue = Vec::new();
    let count = state.players.player_count();
    for offset in 0..count {
        let id = PlayerId::new(((state.first_player.index() + offset) % count) as u8);
        if state.players[id].eliminated {
            continue;
        }
        for ix in 0..state.players[id].engaged.len() {
            let uid = state.players[id].engaged[ix].uid;
            queue.push(uid);
            let shadow = state.draw_encounter_card();
            let enemy = &mut state.players[id].engaged[ix];
            if shadow.is_some() {
                log.push(format!("A shadow card is dealt to {}.", enemy.card.name));
            }
            enemy.shadow = shadow;
        }
    }
    if queue.is_empty() {
        log.push("No engaged enemies; combat is skipped.".to_owned());
    } else {
        log.push(format!("Combat begins against {} enemies.", queue.len()));
    }
    state.combat = Some(CombatState::new(queue));
}

fn combat_state(state: &GameState) -> Result<&CombatState, EngineError> {
    if state.phase != Phase::Combat {
        return Err(EngineError::NotYourPhase { expected: "combat" });
    }
    state
        .combat
        .as_ref()
        .ok_or_else(|| EngineError::illegal("combat has not started"))
}

fn character_standing(state: &GameState, character: CharacterRef) -> bool {
    match character {
        CharacterRef::Hero { player, index } => state.players[player]
            .heroes
            .get(index)
            .is_some_and(|h| !h.exhausted && !h.is_defeated()),
        CharacterRef::Ally { player, index } => state.players[player]
            .allies
            .get(index)
            .is_some_and(|a| !a.exhausted && !a.is_defeated()),
    }
}

/// Declare a defender against the current enemy attack.
pub fn select_defender(
    state: &GameState,
    defender: CharacterRef,
) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.step != CombatStep::EnemyAttacks {
        return Err(EngineError::illegal("enemy attacks are already resolved"));
    }
    let Some(uid) = combat.current_enemy() else {
        return Err(EngineError::illegal("no attack to defend"));
    };
    let (engaged_with, _) = state
        .find_engaged(uid)
        .ok_or_else(|| EngineError::InvalidTarget("attacking enemy left play".to_owned()))?;
    if defender.player() != engaged_with {
        return Err(EngineError::InvalidTarget(
            "the defender must belong to the engaged player".to_owned(),
        ));
    }
    if !character_standing(state, defender) {
        return Err(EngineError::InvalidTarget(
            "the defender must be ready and standing".to_owned(),
        ));
    }

    let mut next = state.clone();
    let mut log = Vec::new();
    if let Some(combat) = next.combat.as_mut() {
        combat.selected_defender = Some(defender);
    }
    log.push("A defender steps forward.".to_owned());
    Ok(StepResult::new(next, log))
}

/// Turn the current attack's shadow card face up without resolving it.
///
/// Opens the response window for shadow cancellation. The effect still
/// applies when the attack is confirmed unless a response has removed
/// the shadow card by then.
pub fn reveal_shadow(state: &GameState) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.step != CombatStep::EnemyAttacks {
        return Err(EngineError::illegal("enemy attacks are already resolved"));
    }
    let Some(uid) = combat.current_enemy() else {
        return Err(EngineError::illegal("no attack to resolve"));
    };
    if combat.shadow_revealed {
        return Err(EngineError::illegal("the shadow card is already face up"));
    }
    let (_, enemy) = state
        .find_engaged(uid)
        .ok_or_else(|| EngineError::InvalidTarget("attacking enemy left play".to_owned()))?;

    let mut next = state.clone();
    let mut log = Vec::new();
    match &enemy.shadow {
        Some(card) if !card.shadow.is_empty() => {
            log.push(format!("Shadow: {}.", card.shadow.trim_end_matches('.')));
        }
        Some(_) => log.push("The shadow card is blank.".to_owned()),
        None => log.push("No shadow card was dealt.".to_owned()),
    }
    if let Some(combat) = next.combat.as_mut() {
        combat.shadow_revealed = true;
    }
    Ok(StepResult::new(next, log))
}

/// Resolve the current enemy attack with the declared defender, or
/// undefended if none was declared.
pub fn confirm_defense(session: &Session, state: &GameState) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.step != CombatStep::EnemyAttacks {
        return Err(EngineError::illegal("enemy attacks are already resolved"));
    }
    let Some(uid) = combat.current_enemy() else {
        return Err(EngineError::illegal("no attack to resolve"));
    };

    let mut next = state.clone();
    let mut log = Vec::new();
    resolve_enemy_attack(session, &mut next, uid, &mut log);
    advance_enemy_queue(&mut next);
    Ok(StepResult::new(next, log))
}

/// Let the current enemy attack undefended.
pub fn skip_defense(session: &Session, state: &GameState) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.selected_defender.is_some() {
        return Err(EngineError::illegal("a defender is already declared"));
    }
    confirm_defense(session, state)
}

fn resolve_enemy_attack(_session: &Session, state: &mut GameState, uid: u32, log: &mut Vec<String>) {
    let defender = state
        .combat
        .as_mut()
        .and_then(|c| c.selected_defender.take());

    let Some((player, enemy)) = state.find_engaged_mut(uid) else {
        return;
    };
    let name = enemy.card.name.clone();
    if enemy.feinted {
        log.push(format!("{name} cannot attack this round."));
        enemy.shadow = None;
        return;
    }

    let shadow = flip_shadow(state, uid, log);
    let attack = enemy_attack_total(state, uid, shadow);

    match defender.filter(|d| character_standing(state, *d)) {
        Some(defender) => {
            let defense = heroes::defender_strength(state, defender);
            let damage = attack.saturating_sub(defense) + shadow.direct_damage;
            apply_combat_damage(state, defender, damage, log, &name);
            exhaust_character(state, defender);
        }
        None => {
            // Undefended: full attack plus shadow damage onto a hero.
            let damage = attack + shadow.direct_damage;
            let target = state.players[player]
                .heroes
                .iter()
                .position(|h| !h.is_defeated());
            if let Some(index) = target {
                apply_combat_damage(
                    state,
                    CharacterRef::Hero { player, index },
                    damage,
                    log,
                    &name,
                );
            }
        }
    }
    state.check_defeat(log);
}

/// Turn the current attack's shadow card face up, discard it, and return
/// its parsed effect. Quiet when `reveal_shadow` already showed the card.
fn flip_shadow(state: &mut GameState, uid: u32, log: &mut Vec<String>) -> ShadowEffect {
    let already_revealed = state.combat.as_ref().is_some_and(|c| c.shadow_revealed);
    let Some((_, enemy)) = state.find_engaged_mut(uid) else {
        return ShadowEffect::default();
    };
    let name = enemy.card.name.clone();
    let Some(card) = enemy.shadow.take() else {
        return ShadowEffect::default();
    };
    let effect = parse_shadow(&card.shadow);
    if !already_revealed {
        if card.shadow.is_empty() {
            log.push(format!("The shadow card for {name} is blank."));
        } else {
            log.push(format!("Shadow: {}.", card.shadow.trim_end_matches('.')));
        }
    }
    state.encounter_discard.push_back(card);
    effect
}

fn apply_combat_damage(
    state: &mut GameState,
    target: CharacterRef,
    damage: u32,
    log: &mut Vec<String>,
    attacker: &str,
) {
    if damage == 0 {
        log.push(format!("The attack by {attacker} is fully blocked."));
        return;
    }
    match target {
        CharacterRef::Hero { player, index } => {
            let hero = &mut state.players[player].heroes[index];
            hero.damage += damage;
            log.push(format!("{attacker} deals {damage} damage to {}.", hero.name));
            if hero.is_defeated() {
                log.push(format!("{} falls.", hero.name));
            }
        }
        CharacterRef::Ally { player, index } => {
            let ally = &mut state.players[player].allies[index];
            ally.damage += damage;
            log.push(format!("{attacker} deals {damage} damage to {}.", ally.name));
            if ally.is_defeated() {
                let ally = state.players[player].allies.remove(index);
                log.push(format!("{} is destroyed.", ally.name));
            }
        }
    }
}

fn exhaust_character(state: &mut GameState, character: CharacterRef) {
    match character {
        CharacterRef::Hero { player, index } => {
            if let Some(hero) = state.players[player].heroes.get_mut(index) {
                hero.exhausted = true;
            }
        }
        CharacterRef::Ally { player, index } => {
            if let Some(ally) = state.players[player].allies.get_mut(index) {
                ally.exhausted = true;
            }
        }
    }
}

fn advance_enemy_queue(state: &mut GameState) {
    let Some(combat) = state.combat.as_mut() else {
        return;
    };
    combat.selected_defender = None;
    combat.shadow_revealed = false;
    combat.current += 1;
    if combat.current >= combat.queue.len() {
        combat.step = CombatStep::PlayerAttacks;
        combat.current = 0;
    }
}

/// Toggle a character in or out of the attack against the current enemy.
pub fn toggle_attacker(
    state: &GameState,
    attacker: CharacterRef,
) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.step != CombatStep::PlayerAttacks {
        return Err(EngineError::illegal("enemy attacks resolve first"));
    }
    let Some(uid) = combat.current_enemy() else {
        return Err(EngineError::illegal("no enemy to attack"));
    };
    let (engaged_with, _) = state
        .find_engaged(uid)
        .ok_or_else(|| EngineError::InvalidTarget("that enemy left play".to_owned()))?;
    if attacker.player() != engaged_with {
        return Err(EngineError::InvalidTarget(
            "attackers must belong to the engaged player".to_owned(),
        ));
    }
    if !character_standing(state, attacker) {
        return Err(EngineError::InvalidTarget(
            "attackers must be ready and standing".to_owned(),
        ));
    }

    let mut next = state.clone();
    let log = Vec::new();
    if let Some(combat) = next.combat.as_mut() {
        match combat.selected_attackers.iter().position(|a| *a == attacker) {
            Some(pos) => {
                combat.selected_attackers.remove(pos);
            }
            None => combat.selected_attackers.push(attacker),
        }
    }
    Ok(StepResult::new(next, log))
}

/// Resolve the declared attack against the current enemy.
pub fn confirm_attack(session: &Session, state: &GameState) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.step != CombatStep::PlayerAttacks {
        return Err(EngineError::illegal("enemy attacks resolve first"));
    }
    let Some(uid) = combat.current_enemy() else {
        return Err(EngineError::illegal("no enemy to attack"));
    };
    if combat.selected_attackers.is_empty() {
        return Err(EngineError::illegal("no attackers declared"));
    }

    let mut next = state.clone();
    let mut log = Vec::new();
    let attackers: Vec<CharacterRef> = next
        .combat
        .as_mut()
        .map(|c| std::mem::take(&mut c.selected_attackers).into_vec())
        .unwrap_or_default();

    let strength: u32 = attackers
        .iter()
        .map(|a| heroes::attacker_strength(&next, *a))
        .sum();
    for attacker in &attackers {
        exhaust_character(&mut next, *attacker);
    }

    if let Some((_, enemy)) = next.find_engaged(uid) {
        let name = enemy.card.name.clone();
        let defense = enemy.card.defense;
        let damage = strength.saturating_sub(defense);
        if damage == 0 {
            log.push(format!("The attack bounces off {name}."));
        } else {
            log.push(format!("The attack deals {damage} damage to {name}."));
            heroes::damage_enemy(&mut next, uid, damage, &mut log);
            let destroyed = next.find_engaged(uid).is_none();
            if destroyed {
                if let Some(card) = next
                    .encounter_discard
                    .iter()
                    .rev()
                    .chain(next.victory_display.iter().rev())
                    .find(|c| c.name == name)
                    .cloned()
                {
                    heroes::fire_destroy_responses(session, &mut next, &card, &attackers, &mut log);
                }
            }
        }
    }

    advance_attack_queue(&mut next);
    Ok(StepResult::new(next, log))
}

/// Decline to attack the current enemy.
pub fn skip_attack(state: &GameState) -> Result<StepResult, EngineError> {
    let combat = combat_state(state)?;
    if combat.step != CombatStep::PlayerAttacks {
        return Err(EngineError::illegal("enemy attacks resolve first"));
    }
    if combat.current_enemy().is_none() {
        return Err(EngineError::illegal("no enemy to skip"));
    }
    let mut next = state.clone();
    let log = Vec::new();
    advance_attack_queue(&mut next);
    Ok(StepResult::new(next, log))
}

fn advance_attack_queue(state: &mut GameState) {
    if let Some(combat) = state.combat.as_mut() {
        combat.selected_attackers.clear();
        if let Some(uid) = combat.current_enemy() {
            combat.resolved.push(uid);
        }
        combat.current += 1;
    }
}

/// True once both halves of combat have run out of enemies.
#[must_use]
pub fn combat_finished(state: &GameState) -> bool {
    state.combat.as_ref().is_some_and(|c| {
        c.step == CombatStep::PlayerAttacks && c.current >= c.queue.len()
    })
}

/// Close the combat phase: discard leftover shadows, fire end-of-combat
/// abilities, and hand over to refresh.
pub fn end_combat(
    session: &Session,
    state: &GameState,
) -> Result<StepResult, EngineError> {
    combat_state(state)?;
    let mut next = state.clone();
    let mut log = Vec::new();
    finish_combat(session, &mut next, &mut log);
    Ok(StepResult::new(next, log))
}

fn finish_combat(session: &Session, state: &mut GameState, log: &mut Vec<String>) {
    // Undealt-with shadow cards are discarded face up.
    for (_, player) in state.players.iter_mut() {
        for enemy in &mut player.engaged {
            if let Some(card) = enemy.shadow.take() {
                state.encounter_discard.push_back(card);
            }
        }
    }

    // Staged enemies with end-of-combat effects act now.
    let staged_uids: Vec<(u32, crate::cards::CardCode)> = state
        .staging
        .iter()
        .filter_map(|entry| match entry {
            crate::core::StagingEntry::Enemy(e) => Some((e.uid, e.card.code.clone())),
            crate::core::StagingEntry::Card(_) => None,
        })
        .collect();
    for (uid, code) in staged_uids {
        if let Some(end_of_combat) = session.enemy(&code).end_of_combat {
            end_of_combat(state, uid, log);
            if state.game_over {
                return;
            }
        }
    }

    state.combat = None;
    state.phase = Phase::Refresh;
    log.push("Combat ends.".to_owned());
}

/// Finish the combat phase with default choices.
///
/// Each remaining enemy attack lands on the first ready hero of the
/// engaged player (or the first standing hero once everyone is spent),
/// who defends and exhausts; afterwards the first still-ready hero
/// strikes back, and destroyed enemies leave play. Used by
/// [`super::advance`] when the caller does not drive combat
/// interactively.
pub fn auto_resolve(
    session: &Session,
    state: &mut GameState,
    log: &mut Vec<String>,
) -> Result<(), EngineError> {
    if state.combat.is_none() {
        start_combat(state, log);
    }

    loop {
        if state.game_over {
            return Ok(());
        }
        let Some(combat) = state.combat.as_ref() else {
            return Ok(());
        };
        match combat.step {
            CombatStep::EnemyAttacks => match combat.current_enemy() {
                Some(uid) => {
                    auto_resolve_enemy_attack(session, state, uid, log);
                    advance_enemy_queue(state);
                }
                None => advance_enemy_queue(state),
            },
            CombatStep::PlayerAttacks => {
                if combat.current_enemy().is_some() {
                    advance_attack_queue(state);
                } else {
                    finish_combat(session, state, log);
                    return Ok(());
                }
            }
        }
    }
}

/// One automatic attack: default defender, then a counterattack.
///
/// A defended attack deals at least 1 damage even against higher
/// defense. A declared-but-unresolved defender from an interactive
/// session is honored.
fn auto_resolve_enemy_attack(
    session: &Session,
    state: &mut GameState,
    uid: u32,
    log: &mut Vec<String>,
) {
    let selected = state
        .combat
        .as_mut()
        .and_then(|c| c.selected_defender.take());

    let Some((player, enemy)) = state.find_engaged_mut(uid) else {
        return;
    };
    let name = enemy.card.name.clone();
    if enemy.feinted {
        log.push(format!("{name} cannot attack this round."));
        enemy.shadow = None;
    } else {
        let shadow = flip_shadow(state, uid, log);
        let attack = enemy_attack_total(state, uid, shadow);
        let defender = selected
            .filter(|d| character_standing(state, *d))
            .or_else(|| default_defender(state, player));
        if let Some(defender) = defender {
            let defense = heroes::defender_strength(state, defender);
            let damage = attack.saturating_sub(defense).max(1) + shadow.direct_damage;
            apply_combat_damage(state, defender, damage, log, &name);
            exhaust_character(state, defender);
        }
        state.check_defeat(log);
        if state.game_over {
            return;
        }
    }

    counter_attack(session, state, player, uid, log);
}

/// The first ready hero, falling back to the first standing one.
fn default_defender(state: &GameState, player: PlayerId) -> Option<CharacterRef> {
    let heroes = &state.players[player].heroes;
    heroes
        .iter()
        .position(|h| !h.exhausted && !h.is_defeated())
        .or_else(|| heroes.iter().position(|h| !h.is_defeated()))
        .map(|index| CharacterRef::Hero { player, index })
}

fn counter_attack(
    session: &Session,
    state: &mut GameState,
    player: PlayerId,
    uid: u32,
    log: &mut Vec<String>,
) {
    let Some(index) = state.players[player]
        .heroes
        .iter()
        .position(|h| !h.exhausted && !h.is_defeated())
    else {
        return;
    };
    let attacker = CharacterRef::Hero { player, index };
    let strength = heroes::attacker_strength(state, attacker);
    exhaust_character(state, attacker);

    let Some((_, enemy)) = state.find_engaged(uid) else {
        return;
    };
    let name = enemy.card.name.clone();
    let damage = strength.saturating_sub(enemy.card.defense);
    if damage == 0 {
        log.push(format!("The counterattack bounces off {name}."));
        return;
    }
    log.push(format!("The counterattack deals {damage} damage to {name}."));
    heroes::damage_enemy(state, uid, damage, log);
    if state.find_engaged(uid).is_none() {
        if let Some(card) = state
            .encounter_discard
            .iter()
            .rev()
            .chain(state.victory_display.iter().rev())
            .find(|c| c.name == name)
            .cloned()
        {
            heroes::fire_destroy_responses(session, state, &card, &[attacker], log);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{EncounterCard, Sphere};
    use crate::core::{ActiveEnemy, Hero, PlayerState};
    use im::Vector;

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    fn combat_ready_state() -> GameState {
        let heroes = vec![
            Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5),
            Hero::new("01004", "Gimli", Sphere::Tactics, 11, 2, 2, 2, 5),
        ];
        let player = PlayerState::new(heroes, Vector::new());
        let stage = EncounterCard::quest("01119A", "Flies and Spiders", 1, 8);
        let mut state = GameState::new(vec![player], stage, 5);
        state.phase = Phase::Combat;
        state
    }

    fn engage_spider(state: &mut GameState) -> u32 {
        let uid = state.next_enemy_uid();
        let spider = EncounterCard::enemy("01096", "Forest Spider", 25, 2, 2, 1, 4, 4)
            .with_shadow("Attacking enemy gets +1 [attack].");
        state.players[p0()].engaged.push(ActiveEnemy::new(uid, spider));
        uid
    }

    #[test]
    fn test_defended_attack_uses_defense() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        state.combat = Some(CombatState::new(vec![uid]));

        let defender = CharacterRef::Hero {
            player: p0(),
            index: 0,
        };
        let result = select_defender(&state, defender).unwrap();
        let result = confirm_defense(&session, &result.state).unwrap();

        // Attack 2 against defense 2, no shadow card dealt: blocked.
        let hero = &result.state.players[p0()].heroes[0];
        assert_eq!(hero.damage, 0);
        assert!(hero.exhausted);
    }

    #[test]
    fn test_undefended_attack_hits_a_hero_full() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        state.combat = Some(CombatState::new(vec![uid]));

        let result = skip_defense(&session, &state).unwrap();
        assert_eq!(result.state.players[p0()].heroes[0].damage, 2);
    }

    #[test]
    fn test_shadow_card_boosts_the_attack() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        state.players[p0()].engaged[0].shadow = Some(
            EncounterCard::treachery("x", "Shadow Fodder", 1)
                .with_shadow("Attacking enemy gets +2 Attack."),
        );
        state.combat = Some(CombatState::new(vec![uid]));

        let result = skip_defense(&session, &state).unwrap();
        // Attack 2 + shadow 2, undefended.
        assert_eq!(result.state.players[p0()].heroes[0].damage, 4);
        // The shadow card is discarded face up.
        assert_eq!(result.state.encounter_discard.len(), 1);
    }

    #[test]
    fn test_feinted_enemy_skips_its_attack() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        state.players[p0()].engaged[0].feinted = true;
        state.combat = Some(CombatState::new(vec![uid]));

        let result = skip_defense(&session, &state).unwrap();
        assert_eq!(result.state.players[p0()].heroes[0].damage, 0);
    }

    #[test]
    fn test_counterattack_destroys_the_enemy() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        let mut combat = CombatState::new(vec![uid]);
        combat.step = CombatStep::PlayerAttacks;
        state.combat = Some(combat);

        let aragorn = CharacterRef::Hero {
            player: p0(),
            index: 0,
        };
        let gimli = CharacterRef::Hero {
            player: p0(),
            index: 1,
        };
        let result = toggle_attacker(&state, aragorn).unwrap();
        let result = toggle_attacker(&result.state, gimli).unwrap();
        let result = confirm_attack(&session, &result.state).unwrap();

        // Attack 3 + 2 against defense 1: 4 damage, spider has 4 hit points.
        assert!(result.state.players[p0()].engaged.is_empty());
        assert_eq!(result.state.encounter_discard.len(), 1);
        assert!(result.state.players[p0()].heroes.iter().all(|h| h.exhausted));
    }

    #[test]
    fn test_toggle_attacker_twice_deselects() {
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        let mut combat = CombatState::new(vec![uid]);
        combat.step = CombatStep::PlayerAttacks;
        state.combat = Some(combat);

        let aragorn = CharacterRef::Hero {
            player: p0(),
            index: 0,
        };
        let result = toggle_attacker(&state, aragorn).unwrap();
        let result = toggle_attacker(&result.state, aragorn).unwrap();
        assert!(result
            .state
            .combat
            .as_ref()
            .unwrap()
            .selected_attackers
            .is_empty());
    }

    #[test]
    fn test_auto_resolve_runs_combat_to_refresh() {
        let session = Session::new();
        let mut state = combat_ready_state();
        engage_spider(&mut state);

        let mut log = Vec::new();
        auto_resolve(&session, &mut state, &mut log).unwrap();
        assert!(state.combat.is_none());
        assert_eq!(state.phase, Phase::Refresh);
        // Aragorn defends: max(1, 2 - 2) = 1 damage, and he exhausts.
        // Gimli counters for 2 - 1 = 1; the spider's 4 hit points hold.
        let heroes = &state.players[p0()].heroes;
        assert_eq!(heroes[0].damage, 1);
        assert!(heroes[0].exhausted);
        assert!(heroes[1].exhausted);
        assert_eq!(state.players[p0()].engaged[0].damage, 1);
    }

    #[test]
    fn test_auto_defense_floors_at_one_damage() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = state.next_enemy_uid();
        // Attack 1 against Aragorn's defense 2 still gets 1 point through.
        let rat = EncounterCard::enemy("x1", "Forest Rat", 25, 1, 1, 3, 9, 1);
        state.players[p0()].engaged.push(ActiveEnemy::new(uid, rat));

        let mut log = Vec::new();
        auto_resolve(&session, &mut state, &mut log).unwrap();
        assert_eq!(state.players[p0()].heroes[0].damage, 1);
        assert!(state.players[p0()].heroes[0].exhausted);
    }

    #[test]
    fn test_auto_counterattack_destroys_the_enemy() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = state.next_enemy_uid();
        let grub = EncounterCard::enemy("x2", "Wood Grub", 25, 1, 2, 0, 1, 1);
        state.players[p0()].engaged.push(ActiveEnemy::new(uid, grub));

        let mut log = Vec::new();
        auto_resolve(&session, &mut state, &mut log).unwrap();
        // Aragorn exhausts defending; Gimli's counter kills the 1 hit point.
        assert!(state.players[p0()].engaged.is_empty());
        assert_eq!(state.encounter_discard.len(), 1);
        assert_eq!(state.phase, Phase::Refresh);
    }

    #[test]
    fn test_wrong_step_operations_error() {
        let session = Session::new();
        let mut state = combat_ready_state();
        let uid = engage_spider(&mut state);
        state.combat = Some(CombatState::new(vec![uid]));

        let aragorn = CharacterRef::Hero {
            player: p0(),
            index: 0,
        };
        assert!(toggle_attacker(&state, aragorn).is_err());
        assert!(confirm_attack(&session, &state).is_err());

        state.phase = Phase::Planning;
        assert!(select_defender(&state, aragorn).is_err());
    }
}
