//! Straight-down camera for scripting input.
//!
//! Screen `(x, y)` maps to world `(x, z)` one to one, so tests can click at
//! world coordinates directly. The picker keeps its own snapshot of entity
//! shapes; call [`OverheadPicker::sync`] after the world changes.

use glam::{Vec2, Vec3};
use zombie_core::components::{EntityId, EntityKind};
use zombie_core::input::{Pick, ScreenPicker};
use zombie_core::spatial::HeightField;
use zombie_core::world::World;

#[derive(Debug, Clone, Copy)]
struct Target {
    id: EntityId,
    kind: EntityKind,
    min: Vec2,
    max: Vec2,
    center: Vec2,
    radius: f32,
}

impl Target {
    fn hit(&self, point: Vec2) -> bool {
        match self.kind {
            EntityKind::Unit => point.distance(self.center) <= self.radius,
            EntityKind::Building => {
                point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
            }
        }
    }
}

/// Screen picker looking straight down at a height field.
#[derive(Debug, Clone)]
pub struct OverheadPicker {
    ground: HeightField,
    targets: Vec<Target>,
}

impl OverheadPicker {
    /// Picker over `ground` with no entities.
    #[must_use]
    pub fn new(ground: HeightField) -> Self {
        Self {
            ground,
            targets: Vec::new(),
        }
    }

    /// Picker over `ground` seeing the entities of `world`.
    #[must_use]
    pub fn with_world(ground: HeightField, world: &World) -> Self {
        let mut picker = Self::new(ground);
        picker.sync(world);
        picker
    }

    /// Refresh the entity snapshot.
    pub fn sync(&mut self, world: &World) {
        self.targets = world
            .sorted_ids()
            .into_iter()
            .filter_map(|id| world.get(id))
            .map(|entity| {
                let (min, max) = entity.obb().xz_bounds();
                let position = entity.position();
                Target {
                    id: entity.id,
                    kind: entity.kind,
                    min,
                    max,
                    center: Vec2::new(position.x, position.z),
                    radius: entity.footprint.half_extents.x,
                }
            })
            .collect();
    }

    /// Screen position of a ground point.
    #[must_use]
    pub fn screen_of(x: f32, z: f32) -> Vec2 {
        Vec2::new(x, z)
    }
}

impl ScreenPicker for OverheadPicker {
    fn pick(&self, screen: Vec2) -> Pick {
        let hit = |kind| self.targets.iter().find(|t| t.kind == kind && t.hit(screen));
        if let Some(unit) = hit(EntityKind::Unit) {
            return Pick::Unit(unit.id);
        }
        if let Some(building) = hit(EntityKind::Building) {
            return Pick::Building(building.id);
        }
        self.pick_ground(screen)
            .map_or(Pick::Nothing, |(point, normal)| Pick::Ground { point, normal })
    }

    fn pick_ground(&self, screen: Vec2) -> Option<(Vec3, Vec3)> {
        let height = self.ground.height_at(screen.x, screen.y)?;
        let normal = self.ground.normal_at(screen.x, screen.y)?;
        Some((Vec3::new(screen.x, height, screen.y), normal))
    }

    fn project(&self, world: Vec3) -> Option<Vec2> {
        Some(Vec2::new(world.x, world.z))
    }
}
