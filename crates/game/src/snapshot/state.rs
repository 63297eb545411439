use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::entity::{Entity, SpellPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityClass {
    Unit = 0,
    Tower = 1,
    Projectile = 2,
    Spell = 3,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EntitySnapshot {
    pub id: String,
    pub team: u8,
    pub class: u8,
    pub kind: u8,
    pub position: [f32; 2],
    pub health: f32,
    pub flags: u8,
}

impl From<&Entity> for EntitySnapshot {
    fn from(entity: &Entity) -> Self {
        let (class, kind, health, flags) = match entity {
            Entity::Unit(unit) => (
                EntityClass::Unit,
                unit.kind as u8,
                unit.body.health,
                u8::from(unit.locked_target) | u8::from(unit.is_moving) << 1,
            ),
            Entity::Tower(tower) => (
                EntityClass::Tower,
                tower.kind as u8,
                tower.body.health,
                u8::from(tower.active),
            ),
            Entity::Projectile(projectile) => (
                EntityClass::Projectile,
                projectile.kind as u8,
                0.0,
                u8::from(projectile.has_dealt_damage),
            ),
            Entity::Spell(spell) => (
                EntityClass::Spell,
                spell.kind as u8,
                0.0,
                phase_code(spell.phase) | u8::from(spell.has_dealt_damage) << 2,
            ),
        };
        let position = entity.position();
        Self {
            id: entity.id().as_str().to_owned(),
            team: entity.team().index() as u8,
            class: class as u8,
            kind,
            position: [position.x, position.y],
            health,
            flags,
        }
    }
}

fn phase_code(phase: SpellPhase) -> u8 {
    match phase {
        SpellPhase::Flying { .. } => 0,
        SpellPhase::Active { .. } => 1,
        SpellPhase::Dead => 2,
    }
}

/// Full battle state at the end of a tick. Two peers fed the same actions
/// produce byte-identical encodings.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldSnapshot {
    pub tick: u64,
    pub entities: Vec<EntitySnapshot>,
    pub removed: Vec<String>,
    pub elixir: [f32; 2],
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl WorldSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(SnapshotError::Serialize)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(SnapshotError::Deserialize)
    }

    pub fn find(&self, id: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}
