use std::fmt;

use super::stats::{
    SpellKind, SpellStats, TowerKind, TowerStats, UnitKind, UnitStats, standard_spell_stats,
    standard_tower_stats, standard_unit_stats,
};

/// A playable card: either a troop deployment or a spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardId {
    Unit(UnitKind),
    Spell(SpellKind),
}

impl CardId {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unit(kind) => kind.name(),
            Self::Spell(kind) => kind.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        UnitKind::from_name(name)
            .map(Self::Unit)
            .or_else(|| SpellKind::from_name(name).map(Self::Spell))
    }

    pub fn is_spell(self) -> bool {
        matches!(self, Self::Spell(_))
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable stat tables, indexed by kind.
#[derive(Debug, Clone)]
pub struct CardRegistry {
    units: [UnitStats; UnitKind::ALL.len()],
    spells: [SpellStats; SpellKind::ALL.len()],
    princess: TowerStats,
    king: TowerStats,
}

impl Default for CardRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CardRegistry {
    pub fn standard() -> Self {
        Self {
            units: UnitKind::ALL.map(standard_unit_stats),
            spells: SpellKind::ALL.map(standard_spell_stats),
            princess: standard_tower_stats(TowerKind::Princess),
            king: standard_tower_stats(TowerKind::King),
        }
    }

    pub fn unit(&self, kind: UnitKind) -> &UnitStats {
        &self.units[kind as usize]
    }

    pub fn spell(&self, kind: SpellKind) -> &SpellStats {
        &self.spells[kind as usize]
    }

    pub fn tower(&self, kind: TowerKind) -> &TowerStats {
        match kind {
            TowerKind::Princess => &self.princess,
            TowerKind::King => &self.king,
        }
    }

    pub fn cost(&self, card: CardId) -> u32 {
        match card {
            CardId::Unit(kind) => self.unit(kind).cost,
            CardId::Spell(kind) => self.spell(kind).cost,
        }
    }

    /// Number of entities a single play of `card` creates.
    pub fn spawn_count(&self, card: CardId) -> usize {
        match card {
            CardId::Unit(kind) => self.unit(kind).count as usize,
            CardId::Spell(_) => 1,
        }
    }

    pub fn card(&self, name: &str) -> Option<CardId> {
        CardId::from_name(name)
    }

    pub fn cards(&self) -> impl Iterator<Item = CardId> + '_ {
        UnitKind::ALL
            .into_iter()
            .map(CardId::Unit)
            .chain(SpellKind::ALL.into_iter().map(CardId::Spell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_kind_matches_table() {
        let registry = CardRegistry::standard();
        assert_eq!(registry.unit(UnitKind::Giant).health, 3000.0);
        assert_eq!(registry.unit(UnitKind::MiniPekka).damage, 400.0);
        assert_eq!(registry.spell(SpellKind::Zap).cost, 2);
        assert_eq!(registry.tower(TowerKind::King).health, 4000.0);
    }

    #[test]
    fn cards_by_name() {
        let registry = CardRegistry::standard();
        assert_eq!(registry.card("hog_rider"), Some(CardId::Unit(UnitKind::HogRider)));
        assert_eq!(registry.card("poison"), Some(CardId::Spell(SpellKind::Poison)));
        assert_eq!(registry.card("mirror"), None);
        assert_eq!(registry.cards().count(), 17);
    }

    #[test]
    fn spawn_counts() {
        let registry = CardRegistry::standard();
        assert_eq!(registry.spawn_count(CardId::Unit(UnitKind::Minions)), 3);
        assert_eq!(registry.spawn_count(CardId::Spell(SpellKind::Fireball)), 1);
    }
}
