//! Player identification and in-play characters.
//!
//! ## PlayerId
//!
//! Type-safe player identifier supporting 1-255 players.
//!
//! ## PlayerArea
//!
//! Per-player data storage backed by `Vec` for O(1) access, indexable by
//! `PlayerId`.
//!
//! ## Hero / Ally
//!
//! Characters in play. Heroes persist for the whole game and carry
//! resources and attachments; allies come and go.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::cards::{CardCode, EncounterCard, PlayerCard, Sphere};

/// Player identifier supporting 1-255 players.
///
/// Player indices are 0-based: the first player is `PlayerId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0 + 1)
    }
}

/// Per-player data storage with O(1) access.
///
/// Backed by a `Vec<T>` with one entry per player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerArea<T> {
    data: Vec<T>,
}

impl<T> PlayerArea<T> {
    /// Create a new area with values from a factory function.
    ///
    /// The factory receives the `PlayerId` for each player.
    pub fn new(player_count: usize, mut factory: impl FnMut(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        let data = (0..player_count as u8)
            .map(|i| factory(PlayerId(i)))
            .collect();

        Self { data }
    }

    /// Get the number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to a player's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a player's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over (PlayerId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over all player IDs.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.data.len() as u8).map(PlayerId)
    }
}

impl<T> Index<PlayerId> for PlayerArea<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerArea<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}

/// A player card attached to a hero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub card: PlayerCard,
    pub exhausted: bool,
}

impl Attachment {
    #[must_use]
    pub fn new(card: PlayerCard) -> Self {
        Self {
            card,
            exhausted: false,
        }
    }
}

/// A hero in play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub code: CardCode,
    pub name: String,
    pub sphere: Sphere,
    /// Contribution to the player's starting threat.
    pub threat_cost: u32,
    pub willpower: u32,
    pub attack: u32,
    pub defense: u32,
    pub hit_points: u32,
    pub damage: u32,
    pub resources: u32,
    pub exhausted: bool,
    /// Attack bonus that expires during refresh.
    pub round_attack_bonus: u32,
    pub attachments: Vec<Attachment>,
    /// Condition cards from the encounter deck attached to this hero.
    pub conditions: Vec<EncounterCard>,
    pub traits: Vec<String>,
}

impl Hero {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: &str,
        name: &str,
        sphere: Sphere,
        threat_cost: u32,
        willpower: u32,
        attack: u32,
        defense: u32,
        hit_points: u32,
    ) -> Self {
        Self {
            code: CardCode::from(code),
            name: name.to_owned(),
            sphere,
            threat_cost,
            willpower,
            attack,
            defense,
            hit_points,
            damage: 0,
            resources: 0,
            exhausted: false,
            round_attack_bonus: 0,
            attachments: Vec::new(),
            conditions: Vec::new(),
            traits: Vec::new(),
        }
    }

    /// Attach trait labels.
    #[must_use]
    pub fn with_traits(mut self, traits: &[&str]) -> Self {
        self.traits = traits.iter().map(|t| (*t).to_owned()).collect();
        self
    }

    /// True once damage meets or exceeds hit points.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.damage >= self.hit_points
    }

    /// True if an attachment with this code is attached.
    #[must_use]
    pub fn has_attachment(&self, code: &str) -> bool {
        self.attachments.iter().any(|a| a.card.code.as_str() == code)
    }

    /// True if an encounter condition with this code is attached.
    #[must_use]
    pub fn has_condition(&self, code: &str) -> bool {
        self.conditions.iter().any(|c| c.code.as_str() == code)
    }
}

/// An ally in play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ally {
    pub code: CardCode,
    pub name: String,
    pub sphere: Sphere,
    pub willpower: u32,
    pub attack: u32,
    pub defense: u32,
    pub hit_points: u32,
    pub damage: u32,
    pub exhausted: bool,
    pub traits: Vec<String>,
}

impl Ally {
    /// Put an ally card into play.
    #[must_use]
    pub fn from_card(card: &PlayerCard) -> Self {
        Self {
            code: card.code.clone(),
            name: card.name.clone(),
            sphere: card.sphere,
            willpower: card.willpower,
            attack: card.attack,
            defense: card.defense,
            hit_points: card.hit_points,
            damage: 0,
            exhausted: false,
            traits: card.traits.clone(),
        }
    }

    /// True once damage meets or exceeds hit points.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.damage >= self.hit_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_basics() {
        let p0 = PlayerId::new(0);
        assert_eq!(p0.index(), 0);
        assert_eq!(format!("{p0}"), "Player 1");
    }

    #[test]
    fn test_player_id_all() {
        let players: Vec<_> = PlayerId::all(3).collect();
        assert_eq!(players, vec![PlayerId(0), PlayerId(1), PlayerId(2)]);
    }

    #[test]
    fn test_player_area_indexing() {
        let mut area: PlayerArea<u32> = PlayerArea::new(2, |p| p.index() as u32 * 10);
        assert_eq!(area[PlayerId::new(0)], 0);
        assert_eq!(area[PlayerId::new(1)], 10);

        area[PlayerId::new(1)] = 25;
        assert_eq!(area[PlayerId::new(1)], 25);
    }

    #[test]
    fn test_player_area_factory_may_consume_an_iterator() {
        let mut seeds = [7u32, 11, 13].into_iter();
        let area = PlayerArea::new(3, |_| seeds.next().unwrap_or(0));
        assert_eq!(area[PlayerId::new(0)], 7);
        assert_eq!(area[PlayerId::new(2)], 13);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_player_area_zero_players() {
        let _: PlayerArea<u32> = PlayerArea::new(0, |_| 0);
    }

    #[test]
    fn test_hero_defeated() {
        let mut hero = Hero::new("01004", "Gimli", Sphere::Tactics, 11, 2, 2, 2, 5);
        assert!(!hero.is_defeated());
        hero.damage = 5;
        assert!(hero.is_defeated());
    }

    #[test]
    fn test_ally_from_card() {
        let card = crate::cards::PlayerCard::ally(
            "01016",
            "Snowbourn Scout",
            Sphere::Leadership,
            1,
            0,
            0,
            1,
            1,
        );
        let ally = Ally::from_card(&card);
        assert_eq!(ally.name, "Snowbourn Scout");
        assert_eq!(ally.hit_points, 1);
        assert!(!ally.exhausted);
    }
}
