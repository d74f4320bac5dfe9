//! Encounter deck cards: enemies, locations, treacheries, and quest stages.

use serde::{Deserialize, Serialize};

use super::CardCode;

/// The four kinds of card found in the encounter and quest decks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterKind {
    Enemy,
    Location,
    Treachery,
    Quest,
}

/// Static data for an encounter or quest card.
///
/// Field meaning varies with `kind`:
///
/// - enemies use `engagement_cost`, `threat`, `attack`, `defense`,
///   `hit_points`
/// - locations use `threat` and `quest_points`
/// - treacheries only carry text and keywords
/// - quest stages use `stage` and `quest_points`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterCard {
    pub code: CardCode,
    pub name: String,
    pub kind: EncounterKind,
    pub engagement_cost: Option<u32>,
    pub threat: u32,
    pub attack: u32,
    pub defense: u32,
    pub hit_points: u32,
    pub quest_points: u32,
    /// Quest stage number, zero for non-quest cards.
    pub stage: u32,
    /// Copies of this card in the encounter deck.
    pub quantity: u32,
    pub text: String,
    pub shadow: String,
    pub keywords: Vec<String>,
    pub traits: Vec<String>,
    pub victory_points: u32,
}

impl EncounterCard {
    /// Build an enemy card.
    #[must_use]
    pub fn enemy(
        code: &str,
        name: &str,
        engagement_cost: u32,
        threat: u32,
        attack: u32,
        defense: u32,
        hit_points: u32,
        quantity: u32,
    ) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: EncounterKind::Enemy,
            engagement_cost: Some(engagement_cost),
            threat,
            attack,
            defense,
            hit_points,
            quest_points: 0,
            stage: 0,
            quantity,
            text: String::new(),
            shadow: String::new(),
            keywords: Vec::new(),
            traits: Vec::new(),
            victory_points: 0,
        }
    }

    /// Build a location card.
    #[must_use]
    pub fn location(code: &str, name: &str, threat: u32, quest_points: u32, quantity: u32) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: EncounterKind::Location,
            engagement_cost: None,
            threat,
            attack: 0,
            defense: 0,
            hit_points: 0,
            quest_points,
            stage: 0,
            quantity,
            text: String::new(),
            shadow: String::new(),
            keywords: Vec::new(),
            traits: Vec::new(),
            victory_points: 0,
        }
    }

    /// Build a treachery card.
    #[must_use]
    pub fn treachery(code: &str, name: &str, quantity: u32) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: EncounterKind::Treachery,
            engagement_cost: None,
            threat: 0,
            attack: 0,
            defense: 0,
            hit_points: 0,
            quest_points: 0,
            stage: 0,
            quantity,
            text: String::new(),
            shadow: String::new(),
            keywords: Vec::new(),
            traits: Vec::new(),
            victory_points: 0,
        }
    }

    /// Build a quest stage card.
    #[must_use]
    pub fn quest(code: &str, name: &str, stage: u32, quest_points: u32) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: EncounterKind::Quest,
            engagement_cost: None,
            threat: 0,
            attack: 0,
            defense: 0,
            hit_points: 0,
            quest_points,
            stage,
            quantity: 1,
            text: String::new(),
            shadow: String::new(),
            keywords: Vec::new(),
            traits: Vec::new(),
            victory_points: 0,
        }
    }

    /// Attach rules text.
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_owned();
        self
    }

    /// Attach shadow text.
    #[must_use]
    pub fn with_shadow(mut self, shadow: &str) -> Self {
        self.shadow = shadow.to_owned();
        self
    }

    /// Attach keyword labels.
    #[must_use]
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| (*k).to_owned()).collect();
        self
    }

    /// Attach trait labels.
    #[must_use]
    pub fn with_traits(mut self, traits: &[&str]) -> Self {
        self.traits = traits.iter().map(|t| (*t).to_owned()).collect();
        self
    }

    /// Mark the card as worth victory points when defeated.
    #[must_use]
    pub fn with_victory(mut self, points: u32) -> Self {
        self.victory_points = points;
        self
    }

    /// True if the card carries the given trait (case-insensitive).
    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}
