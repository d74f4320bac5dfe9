//! Player deck cards: allies, attachments, and events.

use serde::{Deserialize, Serialize};

use super::{CardCode, Sphere};

/// What a player card does when played from hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerCardKind {
    /// Enters play as a character under the player's control.
    Ally,
    /// Attaches to a hero.
    Attachment,
    /// Resolves an effect, then goes to the discard pile.
    Event,
}

/// Static data for a card in a player's deck or hand.
///
/// Combat stats are only meaningful for allies; attachments and events
/// leave them at zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCard {
    pub code: CardCode,
    pub name: String,
    pub kind: PlayerCardKind,
    pub sphere: Sphere,
    pub cost: u32,
    pub willpower: u32,
    pub attack: u32,
    pub defense: u32,
    pub hit_points: u32,
    pub text: String,
    pub traits: Vec<String>,
}

impl PlayerCard {
    /// Build an ally card.
    #[must_use]
    pub fn ally(
        code: &str,
        name: &str,
        sphere: Sphere,
        cost: u32,
        willpower: u32,
        attack: u32,
        defense: u32,
        hit_points: u32,
    ) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: PlayerCardKind::Ally,
            sphere,
            cost,
            willpower,
            attack,
            defense,
            hit_points,
            text: String::new(),
            traits: Vec::new(),
        }
    }

    /// Build an attachment card.
    #[must_use]
    pub fn attachment(code: &str, name: &str, sphere: Sphere, cost: u32) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: PlayerCardKind::Attachment,
            sphere,
            cost,
            willpower: 0,
            attack: 0,
            defense: 0,
            hit_points: 0,
            text: String::new(),
            traits: Vec::new(),
        }
    }

    /// Build an event card.
    #[must_use]
    pub fn event(code: &str, name: &str, sphere: Sphere, cost: u32) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            kind: PlayerCardKind::Event,
            sphere,
            cost,
            willpower: 0,
            attack: 0,
            defense: 0,
            hit_points: 0,
            text: String::new(),
            traits: Vec::new(),
        }
    }

    /// Attach rules text.
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_owned();
        self
    }

    /// Attach trait labels.
    #[must_use]
    pub fn with_traits(mut self, traits: &[&str]) -> Self {
        self.traits = traits.iter().map(|t| (*t).to_owned()).collect();
        self
    }

    /// True if the card carries the given trait (case-insensitive).
    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ally_builder() {
        let card = PlayerCard::ally("01014", "Faramir", Sphere::Leadership, 4, 2, 1, 2, 3)
            .with_traits(&["Gondor", "Ranger"]);

        assert_eq!(card.kind, PlayerCardKind::Ally);
        assert_eq!(card.cost, 4);
        assert_eq!(card.hit_points, 3);
        assert!(card.has_trait("ranger"));
        assert!(!card.has_trait("Orc"));
    }

    #[test]
    fn test_event_has_no_stats() {
        let card = PlayerCard::event("01034", "Feint", Sphere::Tactics, 1);
        assert_eq!(card.kind, PlayerCardKind::Event);
        assert_eq!(card.willpower, 0);
        assert_eq!(card.hit_points, 0);
    }
}
