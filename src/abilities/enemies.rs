//! Enemy abilities and shadow text parsing.
//!
//! Shadow effects in this pool boil down to two shapes, parsed straight
//! off the card text: an attack bonus (`+N Attack`) and direct damage
//! (`deals N damage`). Anything else on a shadow card is a no-op.

use crate::abilities::{EnemyAbilitySet, Session};
use crate::core::{GameState, PlayerId, StagingEntry};

/// Parsed shadow card effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowEffect {
    pub attack_bonus: u32,
    pub direct_damage: u32,
}

/// Parse a shadow text into its mechanical effect.
///
/// Recognizes `+N Attack` (also written `+N [attack]`) and
/// `deal(s) N damage`, case-insensitively.
#[must_use]
pub fn parse_shadow(text: &str) -> ShadowEffect {
    let lower = text.to_ascii_lowercase();
    ShadowEffect {
        attack_bonus: scan_attack_bonus(&lower).unwrap_or(0),
        direct_damage: scan_direct_damage(&lower).unwrap_or(0),
    }
}

fn scan_attack_bonus(lower: &str) -> Option<u32> {
    let mut search = lower;
    while let Some(pos) = search.find('+') {
        let rest = &search[pos + 1..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if !digits.is_empty() {
            let after = rest[digits.len()..].trim_start();
            let after = after.strip_prefix('[').unwrap_or(after);
            if after.starts_with("attack") {
                return digits.parse().ok();
            }
        }
        search = rest;
    }
    None
}

fn scan_direct_damage(lower: &str) -> Option<u32> {
    let mut search = lower;
    while let Some(pos) = search.find("deal") {
        let rest = search[pos + "deal".len()..].strip_prefix('s').unwrap_or(&search[pos + 4..]);
        let rest = rest.trim_start();
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if !digits.is_empty() && rest[digits.len()..].trim_start().starts_with("damage") {
            return digits.parse().ok();
        }
        search = &search[pos + "deal".len()..];
    }
    None
}

fn forest_spider() -> EnemyAbilitySet {
    EnemyAbilitySet {
        // Forced: after engaging, +1 attack until the end of the round.
        when_engaged: Some(|state, _player, uid, log| {
            if let Some((_, enemy)) = state.find_engaged_mut(uid) {
                enemy.round_attack_bonus += 1;
                log.push(format!(
                    "{} gets +1 attack until the end of the round.",
                    enemy.card.name
                ));
            }
        }),
        ..EnemyAbilitySet::default()
    }
}

fn king_spider() -> EnemyAbilitySet {
    EnemyAbilitySet {
        // When revealed: each player exhausts 1 ready character.
        when_revealed: Some(|state, log| {
            for (id, player) in state.players.iter_mut() {
                if player.eliminated {
                    continue;
                }
                if let Some(ally) = player.allies.iter_mut().find(|a| !a.exhausted) {
                    ally.exhausted = true;
                    log.push(format!("King Spider: {id} exhausts {}.", ally.name));
                    continue;
                }
                if let Some(hero) = player
                    .heroes
                    .iter_mut()
                    .find(|h| !h.exhausted && !h.is_defeated())
                {
                    hero.exhausted = true;
                    log.push(format!("King Spider: {id} exhausts {}.", hero.name));
                }
            }
        }),
        ..EnemyAbilitySet::default()
    }
}

fn hummerhorns() -> EnemyAbilitySet {
    EnemyAbilitySet {
        // When engaged: deal 5 damage to a single hero.
        when_engaged: Some(|state, player, _uid, log| {
            let target = state.players[player]
                .heroes
                .iter_mut()
                .find(|h| !h.is_defeated());
            if let Some(hero) = target {
                hero.damage += 5;
                log.push(format!("Hummerhorns deals 5 damage to {}.", hero.name));
                if hero.is_defeated() {
                    log.push(format!("{} falls.", hero.name));
                }
            }
            state.check_defeat(log);
        }),
        ..EnemyAbilitySet::default()
    }
}

fn ungoliants_spawn() -> EnemyAbilitySet {
    EnemyAbilitySet {
        // When revealed: each player raises threat by 4 per Spider in play.
        when_revealed: Some(|state, log| {
            let spiders = state.count_in_play(|c| c.has_trait("Spider"));
            if spiders == 0 {
                return;
            }
            let amount = 4 * spiders;
            log.push(format!(
                "Ungoliant's Spawn: {spiders} Spider cards in play, each player raises threat by {amount}."
            ));
            let players: Vec<PlayerId> = state.alive_players().collect();
            for id in players {
                state.raise_threat(id, amount, log);
            }
        }),
        ..EnemyAbilitySet::default()
    }
}

fn chieftain_ufthak() -> EnemyAbilitySet {
    EnemyAbilitySet {
        // Forced: at the end of combat, if staged, attack the player with
        // the highest threat.
        end_of_combat: Some(|state, uid, log| {
            let staged = state.staging.iter().any(|entry| match entry {
                StagingEntry::Enemy(e) => e.uid == uid,
                StagingEntry::Card(_) => false,
            });
            if !staged {
                return;
            }
            let attack = state
                .staging
                .iter()
                .find_map(|entry| match entry {
                    StagingEntry::Enemy(e) if e.uid == uid => Some(e.card.attack),
                    _ => None,
                })
                .unwrap_or(0);
            let target = state
                .players
                .iter()
                .filter(|(_, p)| !p.eliminated)
                .max_by_key(|(id, p)| (p.threat, std::cmp::Reverse(id.index())))
                .map(|(id, _)| id);
            let Some(id) = target else { return };
            log.push(format!(
                "Chieftain Ufthak attacks {id} from the staging area."
            ));
            let player = &mut state.players[id];
            if let Some(hero) = player.heroes.iter_mut().find(|h| !h.is_defeated()) {
                let damage = attack.max(1);
                hero.damage += damage;
                log.push(format!("{} takes {damage} damage.", hero.name));
                if hero.is_defeated() {
                    log.push(format!("{} falls.", hero.name));
                }
            }
            state.check_defeat(log);
        }),
        ..EnemyAbilitySet::default()
    }
}

fn dol_guldur_orcs() -> EnemyAbilitySet {
    EnemyAbilitySet {
        // When revealed: deal 2 damage to a character committed to the
        // quest. Committed characters are the exhausted ones during the
        // quest phase.
        when_revealed: Some(|state, log| {
            for (_, player) in state.players.iter_mut() {
                if player.eliminated {
                    continue;
                }
                if let Some(hero) = player
                    .heroes
                    .iter_mut()
                    .find(|h| h.exhausted && !h.is_defeated())
                {
                    hero.damage += 2;
                    log.push(format!("Dol Guldur Orcs deals 2 damage to {}.", hero.name));
                    if hero.is_defeated() {
                        log.push(format!("{} falls.", hero.name));
                    }
                    break;
                }
            }
            state.check_defeat(log);
        }),
        ..EnemyAbilitySet::default()
    }
}

/// Register the enemy abilities for this scenario.
pub fn register_all(session: &mut Session) {
    session.register_enemy("01096", forest_spider());
    session.register_enemy("01074", king_spider());
    session.register_enemy("01075", hummerhorns());
    session.register_enemy("01076", ungoliants_spawn());
    session.register_enemy("01098", chieftain_ufthak());
    session.register_enemy("01089", dol_guldur_orcs());
}

/// Total attack of an engaged enemy including round and shadow bonuses.
#[must_use]
pub fn enemy_attack_total(state: &GameState, uid: u32, shadow: ShadowEffect) -> u32 {
    state
        .find_engaged(uid)
        .map_or(0, |(_, e)| e.card.attack + e.round_attack_bonus + shadow.attack_bonus)
}
