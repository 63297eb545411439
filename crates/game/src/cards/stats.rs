use crate::entity::{Domains, MovementDomain};
use crate::map::TILE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitKind {
    Knight,
    Archer,
    BabyDragon,
    Minions,
    SkeletonArmy,
    Giant,
    Musketeer,
    Goblin,
    GoblinGang,
    Wizard,
    HogRider,
    Balloon,
    MiniPekka,
}

impl UnitKind {
    pub const ALL: [UnitKind; 13] = [
        Self::Knight,
        Self::Archer,
        Self::BabyDragon,
        Self::Minions,
        Self::SkeletonArmy,
        Self::Giant,
        Self::Musketeer,
        Self::Goblin,
        Self::GoblinGang,
        Self::Wizard,
        Self::HogRider,
        Self::Balloon,
        Self::MiniPekka,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Knight => "knight",
            Self::Archer => "archer",
            Self::BabyDragon => "baby_dragon",
            Self::Minions => "minions",
            Self::SkeletonArmy => "skeleton_army",
            Self::Giant => "giant",
            Self::Musketeer => "musketeer",
            Self::Goblin => "goblin",
            Self::GoblinGang => "goblin_gang",
            Self::Wizard => "wizard",
            Self::HogRider => "hog_rider",
            Self::Balloon => "balloon",
            Self::MiniPekka => "mini_pekka",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpellKind {
    Fireball,
    Arrows,
    Zap,
    Poison,
}

impl SpellKind {
    pub const ALL: [SpellKind; 4] = [Self::Fireball, Self::Arrows, Self::Zap, Self::Poison];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fireball => "fireball",
            Self::Arrows => "arrows",
            Self::Zap => "zap",
            Self::Poison => "poison",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TowerKind {
    Princess,
    King,
}

impl TowerKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Princess => "princess",
            Self::King => "king",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetPreference {
    #[default]
    Any,
    Buildings,
}

/// Visual and speed class of a ranged shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectileKind {
    Basic,
    Arrow,
    Fireball,
    Spear,
}

impl ProjectileKind {
    pub fn speed(self) -> f32 {
        match self {
            Self::Basic => 300.0,
            Self::Arrow => 400.0,
            Self::Fireball => 250.0,
            Self::Spear => 350.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitStats {
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
    pub range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    pub cost: u32,
    pub domain: MovementDomain,
    pub targets: Domains,
    pub preference: TargetPreference,
    pub count: u32,
    pub size: f32,
    pub mass: f32,
    pub projectile: ProjectileKind,
}

impl UnitStats {
    pub fn attack_cooldown(&self) -> f32 {
        1.0 / self.attack_speed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpellStats {
    pub damage: f32,
    pub radius: f32,
    pub cost: u32,
    /// Seconds the effect lingers once it lands.
    pub duration: f32,
    /// Seconds after landing before damage is dealt.
    pub delay: f32,
    /// Spells with a flight speed travel from the caster's king tower.
    pub flight_speed: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TowerStats {
    pub health: f32,
    pub damage: f32,
    pub range: f32,
    pub attack_speed: f32,
    pub size: f32,
}

impl TowerStats {
    pub fn attack_cooldown(&self) -> f32 {
        1.0 / self.attack_speed
    }
}

const T: f32 = TILE_SIZE;

pub(super) fn standard_unit_stats(kind: UnitKind) -> UnitStats {
    let ground = MovementDomain::Ground;
    let air = MovementDomain::Air;
    let ground_only = Domains::GROUND;
    let both = Domains::GROUND | Domains::AIR;
    let unit = |health: f32,
                damage: f32,
                speed: f32,
                range: f32,
                attack_speed: f32,
                cost: u32,
                domain: MovementDomain,
                targets: Domains,
                size: f32,
                mass: f32| {
        UnitStats {
            health,
            damage,
            speed,
            range,
            attack_speed,
            cost,
            domain,
            targets,
            preference: TargetPreference::Any,
            count: 1,
            size,
            mass,
            projectile: ProjectileKind::Basic,
        }
    };

    match kind {
        UnitKind::Knight => unit(1000.0, 100.0, 2.5 * T, 0.6 * T, 1.2, 3, ground, ground_only, 1.5 * T, 20.0),
        UnitKind::Archer => UnitStats {
            projectile: ProjectileKind::Arrow,
            ..unit(300.0, 50.0, 3.75 * T, 9.0 * T, 1.0, 3, ground, both, 1.25 * T, 10.0)
        },
        UnitKind::BabyDragon => UnitStats {
            projectile: ProjectileKind::Fireball,
            ..unit(800.0, 80.0, 3.75 * T, 6.25 * T, 1.5, 4, air, both, 1.9 * T, 30.0)
        },
        UnitKind::Minions => UnitStats {
            count: 3,
            projectile: ProjectileKind::Spear,
            ..unit(200.0, 60.0, 5.0 * T, 5.0 * T, 1.0, 3, air, both, 1.25 * T, 10.0)
        },
        UnitKind::SkeletonArmy => UnitStats {
            count: 15,
            ..unit(80.0, 40.0, 5.0 * T, 0.3 * T, 1.5, 3, ground, ground_only, 0.9 * T, 5.0)
        },
        UnitKind::Giant => UnitStats {
            preference: TargetPreference::Buildings,
            ..unit(3000.0, 120.0, 1.25 * T, 0.6 * T, 1.5, 5, ground, ground_only, 2.5 * T, 50.0)
        },
        UnitKind::Musketeer => unit(600.0, 120.0, 3.1 * T, 9.0 * T, 1.1, 4, ground, both, 1.5 * T, 20.0),
        UnitKind::Goblin => unit(150.0, 60.0, 6.25 * T, 0.3 * T, 1.1, 2, ground, ground_only, 1.25 * T, 5.0),
        UnitKind::GoblinGang => UnitStats {
            count: 6,
            ..unit(150.0, 60.0, 6.25 * T, 0.3 * T, 1.1, 3, ground, ground_only, 1.25 * T, 5.0)
        },
        UnitKind::Wizard => unit(500.0, 140.0, 2.5 * T, 12.5 * T, 1.4, 5, ground, both, 1.5 * T, 20.0),
        UnitKind::HogRider => UnitStats {
            preference: TargetPreference::Buildings,
            ..unit(1200.0, 150.0, 7.5 * T, 0.6 * T, 1.5, 4, ground, ground_only, 1.9 * T, 25.0)
        },
        UnitKind::Balloon => UnitStats {
            preference: TargetPreference::Buildings,
            ..unit(1200.0, 500.0, 2.5 * T, 0.6 * T, 3.0, 5, air, ground_only, 2.2 * T, 30.0)
        },
        UnitKind::MiniPekka => unit(1000.0, 400.0, 3.75 * T, 0.6 * T, 1.8, 4, ground, ground_only, 1.5 * T, 25.0),
    }
}

pub(super) fn standard_spell_stats(kind: SpellKind) -> SpellStats {
    match kind {
        SpellKind::Fireball => SpellStats {
            damage: 400.0,
            radius: 6.25 * T,
            cost: 4,
            duration: 0.5,
            delay: 0.0,
            flight_speed: Some(600.0),
        },
        SpellKind::Arrows => SpellStats {
            damage: 150.0,
            radius: 9.4 * T,
            cost: 3,
            duration: 0.6,
            delay: 0.2,
            flight_speed: None,
        },
        SpellKind::Zap => SpellStats {
            damage: 200.0,
            radius: 7.5 * T,
            cost: 2,
            duration: 0.3,
            delay: 0.0,
            flight_speed: None,
        },
        SpellKind::Poison => SpellStats {
            damage: 350.0,
            radius: 8.1 * T,
            cost: 4,
            duration: 1.0,
            delay: 0.0,
            flight_speed: None,
        },
    }
}

pub(super) fn standard_tower_stats(kind: TowerKind) -> TowerStats {
    match kind {
        TowerKind::Princess => TowerStats {
            health: 2500.0,
            damage: 100.0,
            range: 11.6 * T,
            attack_speed: 0.8,
            size: (2.8 * T).floor(),
        },
        TowerKind::King => TowerStats {
            health: 4000.0,
            damage: 120.0,
            range: 13.6 * T,
            attack_speed: 1.0,
            size: (3.5 * T).floor(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_back_to_kinds() {
        for kind in UnitKind::ALL {
            assert_eq!(UnitKind::from_name(kind.name()), Some(kind));
        }
        for kind in SpellKind::ALL {
            assert_eq!(SpellKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(UnitKind::from_name("dragon"), None);
    }

    #[test]
    fn swarms_and_building_hunters() {
        assert_eq!(standard_unit_stats(UnitKind::SkeletonArmy).count, 15);
        assert_eq!(standard_unit_stats(UnitKind::GoblinGang).count, 6);
        assert_eq!(
            standard_unit_stats(UnitKind::Giant).preference,
            TargetPreference::Buildings
        );
        let balloon = standard_unit_stats(UnitKind::Balloon);
        assert_eq!(balloon.domain, MovementDomain::Air);
        assert!(!balloon.targets.contains(Domains::AIR));
    }

    #[test]
    fn tower_sizes_are_whole_pixels() {
        assert_eq!(standard_tower_stats(TowerKind::Princess).size, 44.0);
        assert_eq!(standard_tower_stats(TowerKind::King).size, 56.0);
    }
}
