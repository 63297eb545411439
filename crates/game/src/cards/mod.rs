mod deck;
mod registry;
mod stats;

pub use deck::{
    DECK_SIZE, DEFAULT_DECK, DeckError, default_deck, load_deck, normalize_deck, save_deck,
};
pub use registry::{CardId, CardRegistry};
pub use stats::{
    ProjectileKind, SpellKind, SpellStats, TargetPreference, TowerKind, TowerStats, UnitKind,
    UnitStats,
};
