//! Player-card abilities: hero actions, attachment actions, derived
//! passives, ally enter-play effects, and destroy responses.
//!
//! Passive stat bonuses are never stored on the state. They are
//! re-derived from what is in play every time an effective stat is read,
//! which keeps them idempotent across arbitrary state cloning.

use crate::abilities::{AbilityOutcome, CardAbility, DestroyResponse, Session, UseLimit};
use crate::cards::EncounterKind;
use crate::core::{Ally, CharacterRef, EngineError, GameState, Hero, PlayerId};

use super::locations;

/// Celebrían's Stone.
const CELEBRIAN_STONE: &str = "01027";
/// Blade of Gondolin.
const BLADE_OF_GONDOLIN: &str = "01039";
/// Gimli.
const GIMLI: &str = "01004";
/// Legolas.
const LEGOLAS: &str = "01005";

/// A hero's willpower after passives and active-location effects.
#[must_use]
pub fn effective_hero_willpower(state: &GameState, hero: &Hero) -> u32 {
    let mut willpower = hero.willpower;
    if hero.has_attachment(CELEBRIAN_STONE) {
        willpower += 2;
    }
    if locations::willpower_penalty_active(state) {
        willpower = willpower.saturating_sub(1);
    }
    willpower
}

/// An ally's willpower after active-location effects.
#[must_use]
pub fn effective_ally_willpower(state: &GameState, ally: &Ally) -> u32 {
    if locations::willpower_penalty_active(state) {
        ally.willpower.saturating_sub(1)
    } else {
        ally.willpower
    }
}

/// A hero's attack after passives and round bonuses.
#[must_use]
pub fn effective_hero_attack(hero: &Hero) -> u32 {
    let mut attack = hero.attack + hero.round_attack_bonus;
    if hero.code.as_str() == GIMLI {
        attack += hero.damage;
    }
    attack += hero
        .attachments
        .iter()
        .filter(|a| a.card.code.as_str() == BLADE_OF_GONDOLIN)
        .count() as u32;
    attack
}

/// Attack contributed by one declared attacker.
#[must_use]
pub fn attacker_strength(state: &GameState, attacker: CharacterRef) -> u32 {
    match attacker {
        CharacterRef::Hero { player, index } => state.players[player]
            .heroes
            .get(index)
            .map_or(0, effective_hero_attack),
        CharacterRef::Ally { player, index } => state.players[player]
            .allies
            .get(index)
            .map_or(0, |a| a.attack),
    }
}

/// Defense of one declared defender.
#[must_use]
pub fn defender_strength(state: &GameState, defender: CharacterRef) -> u32 {
    match defender {
        CharacterRef::Hero { player, index } => {
            state.players[player].heroes.get(index).map_or(0, |h| h.defense)
        }
        CharacterRef::Ally { player, index } => {
            state.players[player].allies.get(index).map_or(0, |a| a.defense)
        }
    }
}

fn aragorn_ready() -> CardAbility {
    CardAbility {
        limit: UseLimit::OncePerPhase,
        can_use: |state, ctx| {
            let hero = &state.players[ctx.player].heroes[ctx.hero_index];
            hero.exhausted && hero.resources >= 1 && !hero.is_defeated()
        },
        resolve: |state, ctx, log| {
            let hero = &mut state.players[ctx.player].heroes[ctx.hero_index];
            hero.resources -= 1;
            hero.exhausted = false;
            log.push(format!("{} spends 1 resource and readies.", hero.name));
            Ok(())
        },
    }
}

fn steward_of_gondor() -> CardAbility {
    CardAbility {
        limit: UseLimit::Unlimited,
        can_use: |state, ctx| {
            state.players[ctx.player].heroes[ctx.hero_index]
                .attachments
                .iter()
                .any(|a| a.card.code.as_str() == "01026" && !a.exhausted)
        },
        resolve: |state, ctx, log| {
            let hero = &mut state.players[ctx.player].heroes[ctx.hero_index];
            let steward = hero
                .attachments
                .iter_mut()
                .find(|a| a.card.code.as_str() == "01026" && !a.exhausted)
                .ok_or_else(|| EngineError::illegal("Steward of Gondor is exhausted"))?;
            steward.exhausted = true;
            hero.resources += 2;
            log.push(format!(
                "Steward of Gondor exhausts; {} gains 2 resources.",
                hero.name
            ));
            Ok(())
        },
    }
}

/// Gandalf's enter-play choice.
///
/// Without a choice index this reports the three options; with one it
/// resolves that option.
fn gandalf_enters_play(
    state: &mut GameState,
    player: PlayerId,
    choice: Option<usize>,
    log: &mut Vec<String>,
) -> Result<AbilityOutcome, EngineError> {
    let Some(choice) = choice else {
        return Ok(AbilityOutcome::NeedsChoice(vec![
            "Draw 3 cards.".to_owned(),
            "Deal 4 damage to 1 enemy in play.".to_owned(),
            "Reduce your threat by 5.".to_owned(),
        ]));
    };
    match choice {
        0 => {
            let mut drawn = 0;
            for _ in 0..3 {
                if state.players[player].draw_card() {
                    drawn += 1;
                }
            }
            log.push(format!("Gandalf: {player} draws {drawn} cards."));
        }
        1 => {
            // First engaged enemy, else first staged enemy.
            let target = state.players[player]
                .engaged
                .first()
                .map(|e| e.uid)
                .or_else(|| {
                    state.staging.iter().find_map(|entry| match entry {
                        crate::core::StagingEntry::Enemy(e) => Some(e.uid),
                        crate::core::StagingEntry::Card(_) => None,
                    })
                });
            match target {
                Some(uid) => {
                    damage_enemy(state, uid, 4, log);
                }
                None => log.push("Gandalf: no enemy in play to damage.".to_owned()),
            }
        }
        2 => {
            state.reduce_threat(player, 5, log);
            log.push("Gandalf eases the burden.".to_owned());
        }
        other => {
            return Err(EngineError::InvalidTarget(format!(
                "Gandalf has no option {other}"
            )))
        }
    }
    Ok(AbilityOutcome::Resolved)
}

/// Deal damage to an enemy anywhere in play, destroying it if lethal.
pub fn damage_enemy(state: &mut GameState, uid: u32, amount: u32, log: &mut Vec<String>) {
    // Staged enemies.
    for ix in 0..state.staging.len() {
        if let crate::core::StagingEntry::Enemy(enemy) = &state.staging[ix] {
            if enemy.uid == uid {
                let mut enemy = enemy.clone();
                enemy.damage += amount;
                log.push(format!("{} takes {amount} damage.", enemy.card.name));
                if enemy.is_destroyed() {
                    state.staging.remove(ix);
                    discard_destroyed_enemy(state, enemy, log);
                } else {
                    state.staging.set(ix, crate::core::StagingEntry::Enemy(enemy));
                }
                return;
            }
        }
    }
    // Engaged enemies.
    if let Some((player, enemy)) = state.find_engaged_mut(uid) {
        enemy.damage += amount;
        log.push(format!("{} takes {amount} damage.", enemy.card.name));
        if enemy.is_destroyed() {
            let pos = state.players[player]
                .engaged
                .iter()
                .position(|e| e.uid == uid);
            if let Some(pos) = pos {
                let enemy = state.players[player].engaged.remove(pos);
                discard_destroyed_enemy(state, enemy, log);
            }
        }
    }
}

/// Move a destroyed enemy to the encounter discard or the victory display.
pub fn discard_destroyed_enemy(
    state: &mut GameState,
    enemy: crate::core::ActiveEnemy,
    log: &mut Vec<String>,
) {
    if let Some(shadow) = enemy.shadow {
        state.encounter_discard.push_back(shadow);
    }
    log.push(format!("{} is destroyed.", enemy.card.name));
    if enemy.card.victory_points > 0 {
        log.push(format!(
            "{} is added to the victory display ({} points).",
            enemy.card.name, enemy.card.victory_points
        ));
        state.victory_display.push_back(enemy.card);
    } else {
        state.encounter_discard.push_back(enemy.card);
    }
}

/// Fire destroy responses after an attack kills an enemy.
///
/// Cooperative play: responses whose predicate passes resolve
/// automatically for the controlling player.
pub fn fire_destroy_responses(
    session: &Session,
    state: &mut GameState,
    destroyed: &crate::cards::EncounterCard,
    attackers: &[CharacterRef],
    log: &mut Vec<String>,
) {
    let responses: Vec<DestroyResponse> = session
        .destroy_responses()
        .map(|(_, r)| *r)
        .collect();
    for response in responses {
        if (response.matches)(state, destroyed, attackers) {
            let player = attackers
                .first()
                .map_or(PlayerId::new(0), |a| a.player());
            (response.resolve)(state, player, log);
        }
    }
}

fn legolas_response() -> DestroyResponse {
    DestroyResponse {
        matches: |state, destroyed, attackers| {
            destroyed.kind == EncounterKind::Enemy
                && attackers.iter().any(|a| match a {
                    CharacterRef::Hero { player, index } => state.players[*player]
                        .heroes
                        .get(*index)
                        .is_some_and(|h| h.code.as_str() == LEGOLAS),
                    CharacterRef::Ally { .. } => false,
                })
        },
        resolve: |state, _player, log| {
            log.push("Legolas: place 2 progress on the current quest.".to_owned());
            super::quests::place_progress(state, 2, true, log);
        },
    }
}

fn blade_of_gondolin_response() -> DestroyResponse {
    DestroyResponse {
        matches: |state, destroyed, attackers| {
            destroyed.has_trait("Orc")
                && attackers.iter().any(|a| match a {
                    CharacterRef::Hero { player, index } => state.players[*player]
                        .heroes
                        .get(*index)
                        .is_some_and(|h| h.has_attachment(BLADE_OF_GONDOLIN)),
                    CharacterRef::Ally { .. } => false,
                })
        },
        resolve: |state, _player, log| {
            log.push("Blade of Gondolin: place 1 progress on the current quest.".to_owned());
            super::quests::place_progress(state, 1, true, log);
        },
    }
}

/// Register the core player-card abilities.
pub fn register_all(session: &mut Session) {
    session.register_ability("01001", aragorn_ready());
    session.register_ability("01026", steward_of_gondor());
    session.register_enter_play("01073", gandalf_enters_play);
    session.register_destroy_response(LEGOLAS, legolas_response());
    session.register_destroy_response(BLADE_OF_GONDOLIN, blade_of_gondolin_response());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::activate;
    use crate::cards::{CardCode, EncounterCard, PlayerCard, Sphere};
    use crate::core::{Attachment, PlayerState};
    use im::Vector;

    fn state_with_heroes(heroes: Vec<Hero>) -> GameState {
        let player = PlayerState::new(heroes, Vector::new());
        let stage = EncounterCard::quest("01119A", "Flies and Spiders", 1, 8);
        GameState::new(vec![player], stage, 5)
    }

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    #[test]
    fn test_gimli_attack_grows_with_damage() {
        let mut gimli = Hero::new(GIMLI, "Gimli", Sphere::Tactics, 11, 2, 2, 2, 5);
        assert_eq!(effective_hero_attack(&gimli), 2);
        gimli.damage = 3;
        assert_eq!(effective_hero_attack(&gimli), 5);
    }

    #[test]
    fn test_celebrian_stone_willpower() {
        let mut aragorn = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        aragorn.attachments.push(Attachment::new(PlayerCard::attachment(
            CELEBRIAN_STONE,
            "Celebrían's Stone",
            Sphere::Leadership,
            2,
        )));
        let state = state_with_heroes(vec![aragorn]);
        let hero = &state.players[p0()].heroes[0];
        assert_eq!(effective_hero_willpower(&state, hero), 4);
    }

    #[test]
    fn test_blade_of_gondolin_attack_bonus() {
        let mut legolas = Hero::new(LEGOLAS, "Legolas", Sphere::Tactics, 9, 1, 3, 1, 4);
        legolas.attachments.push(Attachment::new(PlayerCard::attachment(
            BLADE_OF_GONDOLIN,
            "Blade of Gondolin",
            Sphere::Tactics,
            1,
        )));
        assert_eq!(effective_hero_attack(&legolas), 4);
    }

    #[test]
    fn test_aragorn_ready_pays_one_resource() {
        let mut session = Session::new();
        register_all(&mut session);

        let mut aragorn = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        aragorn.exhausted = true;
        aragorn.resources = 2;
        let state = state_with_heroes(vec![aragorn]);

        let result = activate(&session, &state, p0(), &CardCode::from("01001"), 0).unwrap();
        let hero = &result.state.players[p0()].heroes[0];
        assert!(!hero.exhausted);
        assert_eq!(hero.resources, 1);
    }

    #[test]
    fn test_aragorn_needs_a_resource() {
        let mut session = Session::new();
        register_all(&mut session);

        let mut aragorn = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        aragorn.exhausted = true;
        let state = state_with_heroes(vec![aragorn]);

        assert!(activate(&session, &state, p0(), &CardCode::from("01001"), 0).is_err());
    }

    #[test]
    fn test_steward_exhausts_for_resources() {
        let mut session = Session::new();
        register_all(&mut session);

        let mut aragorn = Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5);
        aragorn.attachments.push(Attachment::new(PlayerCard::attachment(
            "01026",
            "Steward of Gondor",
            Sphere::Leadership,
            2,
        )));
        let state = state_with_heroes(vec![aragorn]);

        let result = activate(&session, &state, p0(), &CardCode::from("01026"), 0).unwrap();
        let hero = &result.state.players[p0()].heroes[0];
        assert_eq!(hero.resources, 2);
        assert!(hero.attachments[0].exhausted);

        // Exhausted Steward cannot be used again.
        assert!(activate(&session, &result.state, p0(), &CardCode::from("01026"), 0).is_err());
    }

    #[test]
    fn test_gandalf_choice_listing_and_threat_option() {
        let mut state = state_with_heroes(vec![Hero::new(
            "01001",
            "Aragorn",
            Sphere::Leadership,
            12,
            2,
            3,
            2,
            5,
        )]);
        let mut log = Vec::new();

        let outcome = gandalf_enters_play(&mut state, p0(), None, &mut log).unwrap();
        assert!(matches!(outcome, AbilityOutcome::NeedsChoice(ref opts) if opts.len() == 3));

        state.players[p0()].threat = 30;
        let outcome = gandalf_enters_play(&mut state, p0(), Some(2), &mut log).unwrap();
        assert_eq!(outcome, AbilityOutcome::Resolved);
        assert_eq!(state.players[p0()].threat, 25);
    }

    #[test]
    fn test_legolas_response_places_progress() {
        let mut session = Session::new();
        register_all(&mut session);

        let legolas = Hero::new(LEGOLAS, "Legolas", Sphere::Tactics, 9, 1, 3, 1, 4);
        let mut state = state_with_heroes(vec![legolas]);
        let mut log = Vec::new();

        let destroyed = EncounterCard::enemy("01097", "Dol Guldur Orcs", 17, 3, 3, 0, 5, 2);
        let attackers = [CharacterRef::Hero {
            player: p0(),
            index: 0,
        }];
        fire_destroy_responses(&session, &mut state, &destroyed, &attackers, &mut log);
        assert_eq!(state.quest_progress, 2);
    }
}
