use std::collections::BTreeMap;

use crate::entity::{Entity, NetworkId, Team, Tower, Unit};
use crate::map::TowerSlot;
use crate::snapshot::{EntitySnapshot, WorldSnapshot};

/// Every live entity keyed by network id. Iteration is always in id order,
/// which is what keeps two peers' simulations in step.
#[derive(Debug, Default, Clone)]
pub struct World {
    tick: u64,
    entities: BTreeMap<NetworkId, Entity>,
    removed_entities: Vec<NetworkId>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
        self.removed_entities.clear();
    }

    /// Inserts an entity. A duplicate id is rejected so a replayed action
    /// cannot create the same unit twice.
    pub fn spawn(&mut self, entity: Entity) -> bool {
        let id = entity.id().clone();
        if self.entities.contains_key(&id) {
            log::warn!("Ignoring spawn of duplicate entity {id}");
            return false;
        }
        self.entities.insert(id, entity);
        true
    }

    pub fn despawn(&mut self, id: &NetworkId) -> Option<Entity> {
        let entity = self.entities.remove(id);
        if entity.is_some() {
            self.removed_entities.push(id.clone());
        }
        entity
    }

    /// Removes every entity that has died or finished this tick.
    pub fn sweep_dead(&mut self) -> Vec<Entity> {
        let dead: Vec<NetworkId> = self
            .entities
            .values()
            .filter(|e| !e.is_alive())
            .map(|e| e.id().clone())
            .collect();
        dead.iter().filter_map(|id| self.despawn(id)).collect()
    }

    pub fn get(&self, id: &NetworkId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &NetworkId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &NetworkId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn ids(&self) -> Vec<NetworkId> {
        self.entities.keys().cloned().collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.entities.values().filter_map(Entity::as_unit)
    }

    pub fn towers(&self) -> impl Iterator<Item = &Tower> {
        self.entities.values().filter_map(Entity::as_tower)
    }

    pub fn tower(&self, team: Team, slot: TowerSlot) -> Option<&Tower> {
        self.towers()
            .find(|t| t.team() == team && t.slot == slot && t.body.is_alive())
    }

    pub fn tower_mut(&mut self, team: Team, slot: TowerSlot) -> Option<&mut Tower> {
        self.entities
            .values_mut()
            .filter_map(Entity::as_tower_mut)
            .find(|t| t.team() == team && t.slot == slot && t.body.is_alive())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn removed_entities(&self) -> &[NetworkId] {
        &self.removed_entities
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            entities: self.entities.values().map(EntitySnapshot::from).collect(),
            removed: self
                .removed_entities
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
            elixir: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::cards::CardRegistry;
    use crate::map::Arena;

    fn world_with_towers() -> World {
        let registry = CardRegistry::standard();
        let mut world = World::new();
        for placement in Arena::standard().tower_layout() {
            let id = format!("tower-{}-{}", placement.team.as_str(), placement.slot.as_str());
            world.spawn(Entity::Tower(Tower::new(
                id.into(),
                placement.team,
                placement.slot,
                placement.position,
                registry.tower(placement.slot.kind()),
            )));
        }
        world
    }

    #[test]
    fn iteration_follows_id_order() {
        let world = world_with_towers();
        let ids: Vec<_> = world.entities().map(|e| e.id().as_str().to_owned()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(world.towers().count(), 6);
    }

    #[test]
    fn duplicate_spawn_is_rejected() {
        let mut world = world_with_towers();
        let registry = CardRegistry::standard();
        let duplicate = Tower::new(
            "tower-player-king".into(),
            Team::Player,
            TowerSlot::King,
            Vec2::ZERO,
            registry.tower(TowerSlot::King.kind()),
        );
        assert!(!world.spawn(Entity::Tower(duplicate)));
        assert_eq!(world.entity_count(), 6);
    }

    #[test]
    fn sweep_removes_destroyed_towers() {
        let mut world = world_with_towers();
        if let Some(tower) = world.tower_mut(Team::Enemy, TowerSlot::Left) {
            tower.take_damage(10_000.0);
        }
        let removed = world.sweep_dead();
        assert_eq!(removed.len(), 1);
        assert!(world.tower(Team::Enemy, TowerSlot::Left).is_none());
        assert_eq!(world.removed_entities().len(), 1);

        world.advance_tick();
        assert!(world.removed_entities().is_empty());
        assert_eq!(world.tick(), 1);
    }
}
