//! Encounter keyword parsing.
//!
//! Keywords live in three places on printed cards, inconsistently: the
//! keyword list, the trait list, or the body text. Parsing scans all
//! three, case-insensitively, and is pure: parsing the same card twice
//! always gives the same answer.
//!
//! Two keywords matter for this scenario:
//!
//! - **Surge**: after resolving the card, reveal another.
//! - **Doomed N**: each player raises their threat by N before anything
//!   else resolves.

use crate::cards::EncounterCard;

/// Keywords parsed off one encounter card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keywords {
    pub surge: bool,
    pub doomed: Option<u32>,
}

/// Parse the keywords on a card.
#[must_use]
pub fn parse_keywords(card: &EncounterCard) -> Keywords {
    Keywords {
        surge: has_surge(card),
        doomed: doomed_value(card),
    }
}

fn has_surge(card: &EncounterCard) -> bool {
    let entry_is_surge = |entry: &String| entry.trim().eq_ignore_ascii_case("surge");
    if card.keywords.iter().any(entry_is_surge) || card.traits.iter().any(entry_is_surge) {
        return true;
    }
    let text = card.text.to_ascii_lowercase();
    text.contains("surge.") || text.starts_with("surge")
}

fn doomed_value(card: &EncounterCard) -> Option<u32> {
    card.keywords
        .iter()
        .chain(card.traits.iter())
        .filter_map(|entry| scan_doomed(entry))
        .next()
        .or_else(|| scan_doomed(&card.text))
}

/// Find `doomed <N>` anywhere in a string, ignoring case.
fn scan_doomed(text: &str) -> Option<u32> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("doomed")? + "doomed".len();
    let rest = lower[start..].trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surge_from_keyword_list() {
        let card = EncounterCard::treachery("01103", "Driven by Shadow", 2).with_keywords(&["Surge"]);
        assert!(parse_keywords(&card).surge);
    }

    #[test]
    fn test_surge_from_text() {
        let card = EncounterCard::treachery("01104", "Despair", 2)
            .with_text("Surge. Raise each player's threat by 3.");
        assert!(parse_keywords(&card).surge);
    }

    #[test]
    fn test_surge_mid_text_with_period() {
        let card = EncounterCard::treachery("x", "Test", 1)
            .with_text("When Revealed: do a thing. Surge.");
        assert!(parse_keywords(&card).surge);
    }

    #[test]
    fn test_no_surge() {
        let card = EncounterCard::treachery("01102", "The Necromancer's Reach", 2)
            .with_text("Deal 1 damage to each exhausted character.");
        assert!(!parse_keywords(&card).surge);
    }

    #[test]
    fn test_doomed_from_keyword() {
        let card = EncounterCard::treachery("x", "Test", 1).with_keywords(&["Doomed 2"]);
        assert_eq!(parse_keywords(&card).doomed, Some(2));
    }

    #[test]
    fn test_doomed_from_text_case_insensitive() {
        let card = EncounterCard::treachery("x", "Test", 1).with_text("DOOMED 3. Bad things.");
        assert_eq!(parse_keywords(&card).doomed, Some(3));
    }

    #[test]
    fn test_doomed_without_number_is_none() {
        let card = EncounterCard::treachery("x", "Test", 1).with_text("A doomed expedition.");
        assert_eq!(parse_keywords(&card).doomed, None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let card = EncounterCard::treachery("x", "Test", 1)
            .with_keywords(&["Surge", "Doomed 1"]);
        let first = parse_keywords(&card);
        let second = parse_keywords(&card);
        assert_eq!(first, second);
        assert!(first.surge);
        assert_eq!(first.doomed, Some(1));
    }
}
