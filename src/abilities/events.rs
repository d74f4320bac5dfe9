//! Event card resolvers.
//!
//! Events resolve through the registry when played from hand and go to
//! their owner's discard pile afterwards. `can_play` gates both the
//! timing window and any board requirements; `resolve` applies the
//! effect, validating the supplied target.

use crate::abilities::{EventCard, Session, Target};
use crate::cards::{PlayerCardKind, Sphere};
use crate::core::{CharacterRef, EngineError, GameState, Phase, StagingEntry};

use super::heroes;

fn in_combat(state: &GameState) -> bool {
    state.phase == Phase::Combat && state.combat.is_some()
}

fn ever_vigilant() -> EventCard {
    EventCard {
        can_play: |state, _player| {
            state
                .players
                .iter()
                .any(|(_, p)| p.allies.iter().any(|a| a.exhausted))
        },
        resolve: |state, _player, target, log| {
            let Target::Ally { player, index } = target else {
                return Err(EngineError::InvalidTarget(
                    "Ever Vigilant targets an exhausted ally".to_owned(),
                ));
            };
            let ally = state.players[player]
                .allies
                .get_mut(index)
                .ok_or_else(|| EngineError::InvalidTarget("no ally at that index".to_owned()))?;
            if !ally.exhausted {
                return Err(EngineError::InvalidTarget(format!(
                    "{} is already ready",
                    ally.name
                )));
            }
            ally.exhausted = false;
            log.push(format!("Ever Vigilant: {} readies.", ally.name));
            Ok(())
        },
    }
}

fn common_cause() -> EventCard {
    EventCard {
        can_play: |state, player| {
            let p = &state.players[player];
            p.heroes.iter().any(|h| !h.exhausted && !h.is_defeated())
                && p.heroes.iter().any(|h| h.exhausted)
        },
        resolve: |state, player, target, log| {
            let Target::Hero {
                player: owner,
                index,
            } = target
            else {
                return Err(EngineError::InvalidTarget(
                    "Common Cause targets an exhausted hero".to_owned(),
                ));
            };
            if state.players[owner]
                .heroes
                .get(index)
                .is_none_or(|h| !h.exhausted)
            {
                return Err(EngineError::InvalidTarget(
                    "target hero is not exhausted".to_owned(),
                ));
            }
            let payer = state.players[player]
                .heroes
                .iter_mut()
                .find(|h| !h.exhausted && !h.is_defeated())
                .ok_or_else(|| EngineError::illegal("no ready hero to exhaust"))?;
            payer.exhausted = true;
            let payer_name = payer.name.clone();
            let hero = &mut state.players[owner].heroes[index];
            hero.exhausted = false;
            log.push(format!(
                "Common Cause: {payer_name} exhausts to ready {}.",
                hero.name
            ));
            Ok(())
        },
    }
}

fn sneak_attack() -> EventCard {
    EventCard {
        can_play: |state, player| {
            state.players[player]
                .hand
                .iter()
                .any(|c| c.kind == PlayerCardKind::Ally)
        },
        resolve: |state, player, target, log| {
            let Target::HandCard {
                player: owner,
                index,
            } = target
            else {
                return Err(EngineError::InvalidTarget(
                    "Sneak Attack targets an ally in your hand".to_owned(),
                ));
            };
            if owner != player {
                return Err(EngineError::InvalidTarget(
                    "Sneak Attack only puts your own ally into play".to_owned(),
                ));
            }
            let card = state.players[player]
                .hand
                .get(index)
                .cloned()
                .ok_or_else(|| EngineError::InvalidTarget("no card at that index".to_owned()))?;
            if card.kind != PlayerCardKind::Ally {
                return Err(EngineError::InvalidTarget(format!(
                    "{} is not an ally",
                    card.name
                )));
            }
            state.players[player].hand.remove(index);
            state.players[player]
                .allies
                .push(crate::core::Ally::from_card(&card));
            log.push(format!(
                "Sneak Attack: {} enters play until the end of the phase.",
                card.name
            ));
            state.pending_returns.push((player, card));
            Ok(())
        },
    }
}

fn grim_resolve() -> EventCard {
    EventCard {
        can_play: |_state, _player| true,
        resolve: |state, _player, _target, log| {
            for (_, p) in state.players.iter_mut() {
                for hero in &mut p.heroes {
                    hero.exhausted = false;
                }
                for ally in &mut p.allies {
                    ally.exhausted = false;
                }
            }
            log.push("Grim Resolve: every character readies.".to_owned());
            Ok(())
        },
    }
}

fn blade_mastery() -> EventCard {
    EventCard {
        can_play: |_state, _player| true,
        resolve: |state, _player, target, log| {
            let Target::Hero { player, index } = target else {
                return Err(EngineError::InvalidTarget(
                    "Blade Mastery targets a hero".to_owned(),
                ));
            };
            let hero = state.players[player]
                .heroes
                .get_mut(index)
                .ok_or_else(|| EngineError::InvalidTarget("no hero at that index".to_owned()))?;
            hero.round_attack_bonus += 1;
            log.push(format!(
                "Blade Mastery: {} gets +1 attack until the end of the round.",
                hero.name
            ));
            Ok(())
        },
    }
}

fn feint() -> EventCard {
    EventCard {
        can_play: |state, player| {
            in_combat(state) && !state.players[player].engaged.is_empty()
        },
        resolve: |state, _player, target, log| {
            let Target::Enemy(uid) = target else {
                return Err(EngineError::InvalidTarget(
                    "Feint targets an engaged enemy".to_owned(),
                ));
            };
            let (_, enemy) = state
                .find_engaged_mut(uid)
                .ok_or_else(|| EngineError::InvalidTarget("enemy is not engaged".to_owned()))?;
            enemy.feinted = true;
            log.push(format!("Feint: {} cannot attack this phase.", enemy.card.name));
            Ok(())
        },
    }
}

fn quick_strike() -> EventCard {
    EventCard {
        can_play: |state, player| {
            !state.players[player].engaged.is_empty()
                && state.players[player]
                    .heroes
                    .iter()
                    .any(|h| !h.exhausted && !h.is_defeated())
        },
        resolve: |state, player, target, log| {
            let attacker = match target {
                Target::Hero { player: p, index } => CharacterRef::Hero { player: p, index },
                Target::Ally { player: p, index } => CharacterRef::Ally { player: p, index },
                _ => {
                    return Err(EngineError::InvalidTarget(
                        "Quick Strike exhausts one of your ready characters".to_owned(),
                    ))
                }
            };
            match attacker {
                CharacterRef::Hero { player: p, index } => {
                    let hero = state.players[p].heroes.get_mut(index).ok_or_else(|| {
                        EngineError::InvalidTarget("no hero at that index".to_owned())
                    })?;
                    if hero.exhausted {
                        return Err(EngineError::InvalidTarget(format!(
                            "{} is exhausted",
                            hero.name
                        )));
                    }
                    hero.exhausted = true;
                }
                CharacterRef::Ally { player: p, index } => {
                    let ally = state.players[p].allies.get_mut(index).ok_or_else(|| {
                        EngineError::InvalidTarget("no ally at that index".to_owned())
                    })?;
                    if ally.exhausted {
                        return Err(EngineError::InvalidTarget(format!(
                            "{} is exhausted",
                            ally.name
                        )));
                    }
                    ally.exhausted = true;
                }
            }
            let strength = heroes::attacker_strength(state, attacker);
            let uid = state.players[player]
                .engaged
                .first()
                .map(|e| e.uid)
                .ok_or_else(|| EngineError::illegal("no engaged enemy to strike"))?;
            let defense = state
                .find_engaged(uid)
                .map_or(0, |(_, e)| e.card.defense);
            let damage = strength.saturating_sub(defense);
            log.push(format!("Quick Strike: immediate attack for {damage} damage."));
            if damage > 0 {
                heroes::damage_enemy(state, uid, damage, log);
            }
            Ok(())
        },
    }
}

fn swift_strike() -> EventCard {
    EventCard {
        can_play: |state, _player| {
            in_combat(state)
                && state
                    .combat
                    .as_ref()
                    .is_some_and(|c| c.selected_defender.is_some())
        },
        resolve: |state, _player, _target, log| {
            let uid = state
                .combat
                .as_ref()
                .and_then(crate::core::CombatState::current_enemy)
                .ok_or_else(|| EngineError::illegal("no attacking enemy"))?;
            log.push("Swift Strike: 2 damage to the attacking enemy.".to_owned());
            heroes::damage_enemy(state, uid, 2, log);
            Ok(())
        },
    }
}

fn galadhrims_greeting() -> EventCard {
    EventCard {
        can_play: |_state, _player| true,
        resolve: |state, player, _target, log| {
            log.push("The Galadhrim's Greeting: reduce your threat by 6.".to_owned());
            state.reduce_threat(player, 6, log);
            Ok(())
        },
    }
}

fn hasty_stroke() -> EventCard {
    EventCard {
        can_play: |state, _player| {
            in_combat(state) && state.combat.as_ref().is_some_and(|c| c.shadow_revealed)
        },
        resolve: |state, _player, _target, log| {
            let uid = state
                .combat
                .as_ref()
                .and_then(crate::core::CombatState::current_enemy)
                .ok_or_else(|| EngineError::illegal("no shadow card to cancel"))?;
            let (_, enemy) = state
                .find_engaged_mut(uid)
                .ok_or_else(|| EngineError::illegal("no attacking enemy"))?;
            let shadow = enemy
                .shadow
                .take()
                .ok_or_else(|| EngineError::illegal("no shadow card to cancel"))?;
            log.push(format!("Hasty Stroke: the shadow effect of {} is cancelled.", shadow.name));
            state.encounter_discard.push_back(shadow);
            if let Some(combat) = state.combat.as_mut() {
                combat.shadow_revealed = false;
            }
            Ok(())
        },
    }
}

fn a_test_of_will() -> EventCard {
    EventCard {
        can_play: |state, _player| {
            matches!(
                state.phase,
                Phase::QuestCommit | Phase::QuestStaging | Phase::Planning
            ) && !state.cancel_next_when_revealed
        },
        resolve: |state, _player, _target, log| {
            state.cancel_next_when_revealed = true;
            log.push(
                "A Test of Will: the next when-revealed effect is cancelled.".to_owned(),
            );
            Ok(())
        },
    }
}

fn stand_and_fight() -> EventCard {
    EventCard {
        can_play: |state, _player| {
            state
                .players
                .iter()
                .any(|(_, p)| p.discard.iter().any(|c| c.kind == PlayerCardKind::Ally))
        },
        resolve: |state, player, target, log| {
            let Target::DiscardCard {
                player: owner,
                index,
            } = target
            else {
                return Err(EngineError::InvalidTarget(
                    "Stand and Fight targets an ally in any discard pile".to_owned(),
                ));
            };
            let card = state.players[owner]
                .discard
                .get(index)
                .cloned()
                .ok_or_else(|| EngineError::InvalidTarget("no card at that index".to_owned()))?;
            if card.kind != PlayerCardKind::Ally {
                return Err(EngineError::InvalidTarget(format!(
                    "{} is not an ally",
                    card.name
                )));
            }
            crate::engine::play::pay_resources_any(state, player, card.cost)?;
            state.players[owner].discard.remove(index);
            state.players[player]
                .allies
                .push(crate::core::Ally::from_card(&card));
            log.push(format!(
                "Stand and Fight: {} enters play under {player}'s control.",
                card.name
            ));
            Ok(())
        },
    }
}

fn a_light_in_the_dark() -> EventCard {
    EventCard {
        can_play: |state, _player| {
            state.players.iter().any(|(_, p)| !p.engaged.is_empty())
        },
        resolve: |state, _player, target, log| {
            let Target::Enemy(uid) = target else {
                return Err(EngineError::InvalidTarget(
                    "A Light in the Dark targets an engaged enemy".to_owned(),
                ));
            };
            let mut found = None;
            for (id, p) in state.players.iter() {
                if let Some(pos) = p.engaged.iter().position(|e| e.uid == uid) {
                    found = Some((id, pos));
                    break;
                }
            }
            let (id, pos) = found
                .ok_or_else(|| EngineError::InvalidTarget("enemy is not engaged".to_owned()))?;
            let enemy = state.players[id].engaged.remove(pos);
            log.push(format!(
                "A Light in the Dark: {} returns to the staging area.",
                enemy.card.name
            ));
            state.staging.push_back(StagingEntry::Enemy(enemy));
            Ok(())
        },
    }
}

fn dwarven_tomb() -> EventCard {
    EventCard {
        can_play: |state, player| {
            state.players[player]
                .discard
                .iter()
                .any(|c| c.sphere == Sphere::Spirit)
        },
        resolve: |state, player, target, log| {
            let Target::DiscardCard {
                player: owner,
                index,
            } = target
            else {
                return Err(EngineError::InvalidTarget(
                    "Dwarven Tomb targets a Spirit card in your discard pile".to_owned(),
                ));
            };
            if owner != player {
                return Err(EngineError::InvalidTarget(
                    "Dwarven Tomb only returns your own cards".to_owned(),
                ));
            }
            let card = state.players[player]
                .discard
                .get(index)
                .cloned()
                .ok_or_else(|| EngineError::InvalidTarget("no card at that index".to_owned()))?;
            if card.sphere != Sphere::Spirit {
                return Err(EngineError::InvalidTarget(format!(
                    "{} is not a Spirit card",
                    card.name
                )));
            }
            state.players[player].discard.remove(index);
            log.push(format!("Dwarven Tomb: {} returns to hand.", card.name));
            state.players[player].hand.push_back(card);
            Ok(())
        },
    }
}

/// Register the event resolvers.
pub fn register_all(session: &mut Session) {
    session.register_event("01020", ever_vigilant());
    session.register_event("01021", common_cause());
    session.register_event("01023", sneak_attack());
    session.register_event("01025", grim_resolve());
    session.register_event("01032", blade_mastery());
    session.register_event("01034", feint());
    session.register_event("01035", quick_strike());
    session.register_event("01037", swift_strike());
    session.register_event("01046", galadhrims_greeting());
    session.register_event("01048", hasty_stroke());
    session.register_event("01050", a_test_of_will());
    session.register_event("01051", stand_and_fight());
    session.register_event("01052", a_light_in_the_dark());
    session.register_event("01053", dwarven_tomb());
}
