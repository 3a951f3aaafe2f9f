//! Entity registry.
//!
//! The world owns every live [`Entity`]. Other systems refer to entities by
//! [`EntityId`] only and look them up here each tick.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::components::{Entity, EntityId, EntityKind, Faction};
use crate::math::planar_distance;

/// Storage for all entities.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration via
/// sorted keys when systems process entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    /// Map of entity ID to entity data.
    entities: HashMap<EntityId, Entity>,
    /// Next entity ID to assign.
    next_id: EntityId,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its assigned ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted ids of entities of one kind.
    #[must_use]
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .entities
            .values()
            .filter(|e| e.kind == kind)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Number of other units whose centre is closer than `radius` to
    /// `position` in the ground plane.
    #[must_use]
    pub fn units_near(&self, position: Vec3, radius: f32, exclude: EntityId) -> usize {
        self.entities
            .values()
            .filter(|e| e.id != exclude && e.is_unit())
            .filter(|e| planar_distance(e.position(), position) < radius)
            .count()
    }

    /// Closest living enemy of `attacker` within `radius`, ties broken by
    /// lower id.
    #[must_use]
    pub fn nearest_enemy(&self, position: Vec3, radius: f32, attacker: Faction) -> Option<EntityId> {
        self.entities
            .values()
            .filter(|e| e.faction.is_enemy_of(attacker) && !e.health.is_dead())
            .map(|e| (e.position().distance(position), e.id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitData;

    fn ghoul() -> UnitData {
        ron::from_str(
            r#"UnitData(id: "ghoul", name: "Ghoul", health: 60, movement_speed: 3.5, build_time: 6.0)"#,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut world = World::new();
        let a = world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        let b = world.insert(Entity::unit(&ghoul(), Vec3::X, Faction::Player));
        assert_eq!((a, b), (1, 2));
        assert_eq!(world.get(b).unwrap().id, 2);

        world.remove(a);
        assert_eq!(world.sorted_ids(), vec![2]);
    }

    #[test]
    fn test_default_world_starts_ids_at_one() {
        let mut world = World::default();
        assert_eq!(world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player)), 1);
    }

    #[test]
    fn test_units_near_excludes_self() {
        let mut world = World::new();
        let me = world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        world.insert(Entity::unit(&ghoul(), Vec3::new(1.0, 0.0, 0.0), Faction::Player));
        world.insert(Entity::unit(&ghoul(), Vec3::new(3.0, 0.0, 0.0), Faction::Player));
        assert_eq!(world.units_near(Vec3::ZERO, 1.5, me), 1);
    }

    #[test]
    fn test_nearest_enemy_ignores_friendlies() {
        let mut world = World::new();
        world.insert(Entity::unit(&ghoul(), Vec3::new(1.0, 0.0, 0.0), Faction::Player));
        let far = world.insert(Entity::unit(&ghoul(), Vec3::new(8.0, 0.0, 0.0), Faction::Hostile));
        let near = world.insert(Entity::unit(&ghoul(), Vec3::new(4.0, 0.0, 0.0), Faction::Hostile));
        assert_eq!(world.nearest_enemy(Vec3::ZERO, 10.0, Faction::Player), Some(near));
        world.remove(near);
        assert_eq!(world.nearest_enemy(Vec3::ZERO, 10.0, Faction::Player), Some(far));
        assert_eq!(world.nearest_enemy(Vec3::ZERO, 5.0, Faction::Player), None);
    }
}
