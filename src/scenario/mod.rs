//! The built-in scenario: Passage Through Mirkwood.
//!
//! Static card data for the three encounter sets, the quest deck, the
//! starter heroes, and a ready-made 40-card deck. [`core_set`] builds
//! the matching [`Session`] with every scripted effect registered.
//!
//! Card stats here are data, not behavior: a card whose text has no
//! registered resolver still staged, attacks, and contributes threat
//! from its printed numbers alone.

use crate::abilities::{enemies, events, heroes, locations, quests, treacheries, Session};
use crate::cards::{CardCode, EncounterCard, PlayerCard, Sphere};
use crate::core::Hero;

/// Everything setup needs to lay out a scenario.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    /// Encounter pool; each card's printed quantity is expanded at setup.
    pub encounter_cards: Vec<EncounterCard>,
    /// Quest stages in play order.
    pub quest_stages: Vec<EncounterCard>,
    /// One copy of each starts in the staging area.
    pub staging_setup: Vec<CardCode>,
    /// One copy of each is set aside, waiting on a stage effect.
    pub set_aside: Vec<CardCode>,
}

/// The Passage Through Mirkwood scenario definition.
#[must_use]
pub fn passage_through_mirkwood() -> Scenario {
    let mut encounter_cards = spiders_of_mirkwood();
    encounter_cards.extend(passage_through_mirkwood_set());
    encounter_cards.extend(dol_guldur_orcs_set());
    Scenario {
        name: "Passage Through Mirkwood".to_owned(),
        encounter_cards,
        quest_stages: quest_stages(),
        staging_setup: vec![CardCode::from("01096"), CardCode::from("01099")],
        set_aside: vec![CardCode::from("01078")],
    }
}

fn quest_stages() -> Vec<EncounterCard> {
    vec![
        EncounterCard::quest("01119A", "Flies and Spiders", 1, 8).with_text(
            "Setup: Search the encounter deck for 1 copy of Forest Spider and 1 copy of \
             Old Forest Road, and add them to the staging area. Then, shuffle the \
             encounter deck.",
        ),
        EncounterCard::quest("01120A", "A Fork in the Road", 2, 10).with_text(
            "When Revealed: Add the set-aside Caught in a Web to the staging area. \
             Forced: At the end of the encounter phase, if there are no enemies in \
             play, reveal the top card of the encounter deck.",
        ),
        EncounterCard::quest("01121A", "A Chosen Path", 3, 0).with_text(
            "Reveal 1 additional card from the encounter deck during staging. If the \
             encounter deck and discard pile are both empty, the players win the game.",
        ),
    ]
}

fn spiders_of_mirkwood() -> Vec<EncounterCard> {
    vec![
        EncounterCard::enemy("01074", "King Spider", 25, 2, 3, 1, 3, 2)
            .with_traits(&["Creature", "Spider"])
            .with_text("When Revealed: Each player must choose and exhaust 1 character he controls.")
            .with_shadow("Attacking enemy gets +1 [attack]."),
        EncounterCard::enemy("01075", "Hummerhorns", 40, 1, 2, 0, 3, 1)
            .with_traits(&["Creature", "Insect"])
            .with_text(
                "Forced: After Hummerhorns engages you, deal 5 damage to a single hero \
                 you control.",
            )
            .with_victory(5),
        EncounterCard::enemy("01076", "Ungoliant's Spawn", 35, 3, 5, 2, 9, 1)
            .with_traits(&["Creature", "Spider"])
            .with_text(
                "When Revealed: Each player raises his threat by 4 for each Spider card \
                 in play.",
            )
            .with_shadow("Raise the defending player's threat by 4."),
        EncounterCard::treachery("01077", "Great Forest Web", 1)
            .with_traits(&["Condition"])
            .with_text(
                "When Revealed: Attach to a hero. Attached hero cannot commit to a \
                 quest.",
            ),
        EncounterCard::treachery("01078", "Caught in a Web", 1)
            .with_traits(&["Condition"])
            .with_text(
                "When Revealed: Attach to a hero. Attached hero does not collect \
                 resources and cannot ready unless its controller pays 2 resources from \
                 that hero's pool.",
            ),
    ]
}

fn passage_through_mirkwood_set() -> Vec<EncounterCard> {
    vec![
        EncounterCard::enemy("01096", "Forest Spider", 25, 2, 2, 1, 4, 4)
            .with_traits(&["Creature", "Spider"])
            .with_text(
                "Forced: After Forest Spider engages a player, it gets +1 [attack] \
                 until the end of the round.",
            )
            .with_shadow("Attacking enemy gets +1 [attack]."),
        EncounterCard::enemy("01097", "Dol Guldur Orcs", 17, 3, 3, 0, 5, 2)
            .with_traits(&["Dol Guldur", "Orc"])
            .with_shadow(
                "Attacking enemy gets +1 [attack] for each character the defending \
                 player controls.",
            ),
        EncounterCard::enemy("01098", "Chieftain Ufthak", 30, 3, 4, 2, 6, 1)
            .with_traits(&["Dol Guldur", "Orc"])
            .with_text(
                "Forced: At the end of the combat phase, if Chieftain Ufthak is in the \
                 staging area, he attacks the player with the highest threat.",
            )
            .with_victory(4),
        EncounterCard::location("01095", "Enchanted Stream", 2, 3, 2)
            .with_traits(&["Forest"])
            .with_text("While Enchanted Stream is the active location, each character gets -1 [willpower]."),
        EncounterCard::location("01099", "Old Forest Road", 1, 3, 2)
            .with_traits(&["Forest"])
            .with_text(
                "Response: After you travel to Old Forest Road, ready 1 character you \
                 control.",
            ),
        EncounterCard::location("01100", "Forest Gate", 2, 4, 2)
            .with_traits(&["Forest"])
            .with_text(
                "Travel: The player with the highest threat must exhaust 1 hero he \
                 controls to travel here.",
            ),
        EncounterCard::location("01101", "Mountains of Mirkwood", 3, 5, 2)
            .with_traits(&["Forest", "Mountain"])
            .with_text(
                "While Mountains of Mirkwood is the active location, card effects \
                 cannot place progress tokens on the current quest.",
            ),
        EncounterCard::treachery("01102", "The Necromancer's Reach", 2)
            .with_text("When Revealed: Deal 1 damage to each exhausted character."),
        EncounterCard::treachery("01103", "Driven by Shadow", 2)
            .with_text(
                "When Revealed: Place 1 progress token on the current quest for each \
                 card in the staging area. Surge.",
            )
            .with_keywords(&["Surge"]),
        EncounterCard::treachery("01104", "Despair", 2)
            .with_text("When Revealed: Each player raises his threat by 3."),
    ]
}

fn dol_guldur_orcs_set() -> Vec<EncounterCard> {
    vec![
        EncounterCard::enemy("01089", "Dol Guldur Orcs", 10, 2, 2, 0, 3, 3)
            .with_traits(&["Dol Guldur", "Orc"])
            .with_text(
                "When Revealed: The first player chooses 1 character currently \
                 committed to a quest. Deal 2 damage to that character.",
            )
            .with_shadow("Attacking enemy gets +1 [attack]."),
        EncounterCard::enemy("01090", "Chieftain Ufthak", 35, 2, 3, 3, 6, 1)
            .with_traits(&["Dol Guldur", "Orc"])
            .with_text(
                "Chieftain Ufthak gets +2 [attack] for each resource token on him. \
                 Forced: After Chieftain Ufthak attacks, place 1 resource token on him.",
            )
            .with_victory(4),
        EncounterCard::enemy("01091", "Dol Guldur Beastmaster", 35, 3, 3, 1, 5, 2)
            .with_traits(&["Dol Guldur", "Orc"])
            .with_text("Forced: When Dol Guldur Beastmaster attacks, deal it 1 additional shadow card."),
        EncounterCard::location("01092", "Necromancer's Pass", 3, 2, 2)
            .with_traits(&["Stronghold", "Dol Guldur"])
            .with_text(
                "Travel: The first player must discard 2 random cards from his hand to \
                 travel here.",
            ),
        EncounterCard::location("01093", "Enchanted Stream", 2, 2, 2)
            .with_traits(&["Forest"])
            .with_text("While Enchanted Stream is the active location, players cannot draw cards."),
        EncounterCard::treachery("01094", "The Necromancer's Reach", 3)
            .with_text("When Revealed: Deal 1 damage to each exhausted character."),
    ]
}

/// The three starter heroes.
#[must_use]
pub fn starter_heroes() -> Vec<Hero> {
    vec![
        Hero::new("01001", "Aragorn", Sphere::Leadership, 12, 2, 3, 2, 5)
            .with_traits(&["Dúnedain", "Noble", "Ranger"]),
        Hero::new("01005", "Legolas", Sphere::Tactics, 9, 1, 3, 1, 4)
            .with_traits(&["Noble", "Silvan", "Warrior"]),
        Hero::new("01004", "Gimli", Sphere::Tactics, 11, 2, 2, 2, 5)
            .with_traits(&["Dwarf", "Noble", "Warrior"]),
    ]
}

/// Every player card in the pool, one entry per code.
#[must_use]
pub fn player_cards() -> Vec<PlayerCard> {
    vec![
        // Leadership.
        PlayerCard::ally("01014", "Faramir", Sphere::Leadership, 4, 2, 1, 2, 3)
            .with_traits(&["Gondor", "Noble", "Ranger"]),
        PlayerCard::ally("01016", "Snowbourn Scout", Sphere::Leadership, 1, 0, 0, 1, 1)
            .with_traits(&["Rohan", "Scout"]),
        PlayerCard::event("01020", "Ever Vigilant", Sphere::Leadership, 1)
            .with_text("Choose and ready 1 ally card."),
        PlayerCard::event("01021", "Common Cause", Sphere::Leadership, 0)
            .with_text("Exhaust 1 hero you control to choose and ready a different hero."),
        PlayerCard::event("01023", "Sneak Attack", Sphere::Leadership, 1).with_text(
            "Put 1 ally card into play from your hand. At the end of the phase, if that \
             ally is still in play, return it to your hand.",
        ),
        PlayerCard::event("01025", "Grim Resolve", Sphere::Leadership, 5)
            .with_text("Ready all character cards in play."),
        PlayerCard::attachment("01026", "Steward of Gondor", Sphere::Leadership, 2)
            .with_traits(&["Gondor", "Title"])
            .with_text("Exhaust Steward of Gondor to add 2 resources to attached hero's pool."),
        PlayerCard::attachment("01027", "Celebrían's Stone", Sphere::Leadership, 2)
            .with_traits(&["Artifact", "Item"])
            .with_text("Attached hero gets +2 [willpower]."),
        // Tactics.
        PlayerCard::ally("01028", "Veteran Axehand", Sphere::Tactics, 2, 0, 2, 1, 2)
            .with_traits(&["Dwarf", "Warrior"]),
        PlayerCard::ally("01029", "Gondorian Spearman", Sphere::Tactics, 2, 0, 1, 1, 1)
            .with_traits(&["Gondor", "Warrior"]),
        PlayerCard::event("01032", "Blade Mastery", Sphere::Tactics, 1)
            .with_text("Choose a character. Until the end of the phase, that character gets +1 [attack]."),
        PlayerCard::event("01034", "Feint", Sphere::Tactics, 1).with_text(
            "Combat Action: Choose an enemy engaged with a player. That enemy cannot \
             attack that player this phase.",
        ),
        PlayerCard::event("01035", "Quick Strike", Sphere::Tactics, 1).with_text(
            "Action: Exhaust a character you control to immediately declare it as an \
             attacker against any eligible enemy target.",
        ),
        PlayerCard::event("01037", "Swift Strike", Sphere::Tactics, 2).with_text(
            "Response: After a character is declared as a defender, deal 2 damage to \
             the attacking enemy.",
        ),
        PlayerCard::attachment("01039", "Blade of Gondolin", Sphere::Tactics, 1)
            .with_traits(&["Item", "Weapon"])
            .with_text(
                "Attached hero gets +1 [attack] when attacking an Orc. Response: After \
                 attached hero attacks and destroys an enemy, place 1 progress token on \
                 the current quest.",
            ),
        PlayerCard::attachment("01041", "Dwarven Axe", Sphere::Tactics, 2)
            .with_traits(&["Item", "Weapon"])
            .with_text("Attached hero gets +1 [attack]. (+2 instead if attached hero is a Dwarf.)"),
        // Spirit.
        PlayerCard::event("01046", "The Galadhrim's Greeting", Sphere::Spirit, 3)
            .with_text("Reduce one player's threat by 6, or reduce each player's threat by 2."),
        PlayerCard::event("01048", "Hasty Stroke", Sphere::Spirit, 1).with_text(
            "Response: Cancel a shadow effect just triggered during combat.",
        ),
        PlayerCard::event("01050", "A Test of Will", Sphere::Spirit, 1).with_text(
            "Response: Cancel the when revealed effects of a card that was just \
             revealed from the encounter deck.",
        ),
        PlayerCard::event("01051", "Stand and Fight", Sphere::Spirit, 0).with_text(
            "Action: Choose an ally with a printed cost between 0 and X in any player's \
             discard pile. Put that ally into play under your control.",
        ),
        PlayerCard::event("01052", "A Light in the Dark", Sphere::Spirit, 2).with_text(
            "Action: Choose an enemy engaged with a player. Return that enemy to the \
             staging area.",
        ),
        PlayerCard::event("01053", "Dwarven Tomb", Sphere::Spirit, 1)
            .with_text("Action: Return 1 Spirit card from your discard pile to your hand."),
        PlayerCard::attachment("01057", "Unexpected Courage", Sphere::Spirit, 2)
            .with_traits(&["Condition"])
            .with_text("Exhaust Unexpected Courage to ready attached hero."),
        // Lore.
        PlayerCard::ally("01062", "Gléowine", Sphere::Lore, 2, 1, 0, 0, 2)
            .with_traits(&["Rohan", "Minstrel"]),
        PlayerCard::event("01063", "Lore of Imladris", Sphere::Lore, 1)
            .with_text("Action: Choose a character. Heal all damage from that character."),
        PlayerCard::event("01066", "Secret Paths", Sphere::Lore, 1).with_text(
            "Quest Action: Choose a location in the staging area. Until the end of the \
             phase, that location does not contribute its threat.",
        ),
        PlayerCard::attachment("01069", "Forest Snare", Sphere::Lore, 3)
            .with_traits(&["Item", "Trap"])
            .with_text(
                "Attach to an enemy engaged with a player. Attached enemy cannot \
                 attack.",
            ),
        // Neutral.
        PlayerCard::ally("01073", "Gandalf", Sphere::Neutral, 5, 4, 4, 4, 4)
            .with_traits(&["Istari"])
            .with_text(
                "At the end of the round, discard Gandalf from play. Response: After \
                 Gandalf enters play, (choose 1): draw 3 cards, deal 4 damage to 1 \
                 enemy in play, or reduce your threat by 5.",
            ),
    ]
}

fn pool_card(code: &str) -> PlayerCard {
    player_cards()
        .into_iter()
        .find(|c| c.code.as_str() == code)
        .unwrap_or_else(|| panic!("card {code} missing from the pool"))
}

/// A ready-made 40-card deck for the starter heroes.
#[must_use]
pub fn starter_deck() -> Vec<PlayerCard> {
    let counts: &[(&str, usize)] = &[
        ("01026", 2),
        ("01027", 1),
        ("01023", 2),
        ("01014", 2),
        ("01016", 3),
        ("01039", 2),
        ("01037", 2),
        ("01034", 2),
        ("01028", 3),
        ("01029", 3),
        ("01041", 2),
        ("01050", 2),
        ("01048", 2),
        ("01057", 1),
        ("01063", 2),
        ("01066", 2),
        ("01069", 2),
        ("01062", 2),
        ("01073", 3),
    ];
    let mut deck = Vec::with_capacity(40);
    for (code, count) in counts {
        let card = pool_card(code);
        for _ in 0..*count {
            deck.push(card.clone());
        }
    }
    deck
}

/// Build the session for the core card pool: every scripted enemy,
/// location, treachery, event, quest stage, and player-card ability.
#[must_use]
pub fn core_set() -> Session {
    let mut session = Session::new();
    heroes::register_all(&mut session);
    enemies::register_all(&mut session);
    locations::register_all(&mut session);
    treacheries::register_all(&mut session);
    events::register_all(&mut session);
    quests::register_all(&mut session);
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::EncounterKind;

    #[test]
    fn test_starter_deck_has_forty_cards() {
        let deck = starter_deck();
        assert_eq!(deck.len(), 40);
        // No more than 3 copies of any card.
        for card in &deck {
            let copies = deck.iter().filter(|c| c.code == card.code).count();
            assert!(copies <= 3, "{} has {copies} copies", card.name);
        }
    }

    #[test]
    fn test_encounter_pool_counts() {
        let scenario = passage_through_mirkwood();
        let total: u32 = scenario.encounter_cards.iter().map(|c| c.quantity).sum();
        // 6 + 21 + 13 physical cards across the three sets.
        assert_eq!(total, 40);
        assert_eq!(scenario.quest_stages.len(), 3);
    }

    #[test]
    fn test_every_staged_setup_card_exists() {
        let scenario = passage_through_mirkwood();
        for code in scenario.staging_setup.iter().chain(&scenario.set_aside) {
            assert!(
                scenario.encounter_cards.iter().any(|c| c.code == *code),
                "{code} missing from the encounter pool"
            );
        }
    }

    #[test]
    fn test_core_set_registers_scripted_cards() {
        let session = core_set();
        assert!(session.enemy(&CardCode::from("01096")).when_engaged.is_some());
        assert!(session.treachery(&CardCode::from("01104")).is_some());
        assert!(session.event(&CardCode::from("01034")).is_some());
        assert!(session.location(&CardCode::from("01100")).is_some());
        assert_eq!(session.quest(&CardCode::from("01121A")).extra_reveals, 1);
    }

    #[test]
    fn test_enemy_stats_sanity() {
        let scenario = passage_through_mirkwood();
        for card in &scenario.encounter_cards {
            match card.kind {
                EncounterKind::Enemy => {
                    assert!(card.engagement_cost.is_some(), "{}", card.name);
                    assert!(card.hit_points > 0, "{}", card.name);
                }
                EncounterKind::Location => {
                    assert!(card.quest_points > 0, "{}", card.name);
                }
                _ => {}
            }
        }
    }
}
