use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::registry::CardId;

pub const DECK_SIZE: usize = 8;

pub const DEFAULT_DECK: [&str; DECK_SIZE] = [
    "knight", "archer", "knight", "archer", "knight", "archer", "knight", "archer",
];

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to access deck file: {0}")]
    Io(#[from] io::Error),
    #[error("deck file is not a list of card names: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn default_deck() -> Vec<CardId> {
    normalize_deck::<&str>(&[])
}

/// Drops unknown card names, pads from the default deck and truncates to
/// exactly eight cards.
pub fn normalize_deck<S: AsRef<str>>(names: &[S]) -> Vec<CardId> {
    let mut deck: Vec<CardId> = names
        .iter()
        .filter_map(|name| {
            let card = CardId::from_name(name.as_ref());
            if card.is_none() {
                log::warn!("Dropping unknown card '{}' from deck", name.as_ref());
            }
            card
        })
        .collect();

    if deck.len() < DECK_SIZE {
        let missing = DECK_SIZE - deck.len();
        deck.extend(
            DEFAULT_DECK[..missing]
                .iter()
                .filter_map(|name| CardId::from_name(name)),
        );
    }
    deck.truncate(DECK_SIZE);
    deck
}

/// Reads a JSON list of card names. A missing file yields the default deck.
pub fn load_deck(path: &Path) -> Result<Vec<CardId>, DeckError> {
    if !path.exists() {
        return Ok(default_deck());
    }
    let raw = fs::read_to_string(path)?;
    let names: Vec<String> = serde_json::from_str(&raw)?;
    Ok(normalize_deck(&names))
}

pub fn save_deck(path: &Path, deck: &[CardId]) -> Result<(), DeckError> {
    let names: Vec<&str> = deck.iter().map(|card| card.name()).collect();
    fs::write(path, serde_json::to_string(&names)?)?;
    Ok(())
}
