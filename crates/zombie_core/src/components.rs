//! Entity data model.
//!
//! Components are plain data. Behaviour lives in the systems that own the
//! relevant rules (placement, commands, combat, economy).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::data::{BuildingData, CombatStats, UnitData};
use crate::economy::ResourceProducer;
use crate::math::{fixed_serde, yaw_rotation, Fixed};
use crate::spatial::Obb;

/// Unique identifier for entities.
pub type EntityId = u64;

// ============================================================================
// Classification
// ============================================================================

/// Whether an entity is a unit or a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Mobile, selectable in groups.
    Unit,
    /// Static; at most one selected at a time.
    Building,
}

/// Side an entity fights for. Only hostile entities are attackable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    /// Controlled by the local player.
    #[default]
    Player,
    /// Enemy entities.
    Hostile,
}

impl Faction {
    /// Whether an entity of this faction may be targeted by the player.
    #[must_use]
    pub const fn is_attackable(self) -> bool {
        matches!(self, Self::Hostile)
    }

    /// Whether entities of the two factions fight each other.
    #[must_use]
    pub fn is_enemy_of(self, other: Self) -> bool {
        self != other
    }
}

/// Lifecycle of a to-be-placed entity.
///
/// `Preview` on creation, `Valid`/`Invalid` after each validation, `Fixed`
/// exactly once on confirmation. `Fixed` never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlacementState {
    /// Just created, not yet validated.
    #[default]
    Preview,
    /// Last validation passed.
    Valid,
    /// Last validation failed.
    Invalid,
    /// Committed to the world.
    Fixed,
}

impl PlacementState {
    /// Whether the state can no longer change.
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::Fixed)
    }
}

// ============================================================================
// Spatial components
// ============================================================================

/// World position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec3,
    /// Facing about the vertical axis, in degrees.
    pub yaw: f32,
    /// Ground-alignment tilt applied on top of the facing.
    pub tilt: Quat,
}

impl Transform {
    /// Upright transform at `position` facing `yaw` degrees.
    #[must_use]
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            tilt: Quat::IDENTITY,
        }
    }

    /// Combined orientation: tilt composed with facing.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.tilt * yaw_rotation(self.yaw)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

/// Bounding shape used for overlap tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Half size along the entity's local axes.
    pub half_extents: Vec3,
}

impl Footprint {
    /// Footprint with the given half extents.
    #[must_use]
    pub const fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }

    /// Oriented box at `transform`.
    #[must_use]
    pub fn obb(&self, transform: &Transform) -> Obb {
        Obb::new(transform.position, self.half_extents, transform.rotation())
    }
}

/// Health component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Health from a blueprint value; non-positive values become 1.
    #[must_use]
    pub fn from_blueprint(value: i32) -> Self {
        Self::new(u32::try_from(value).unwrap_or(0).max(1))
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (u64::from(self.current) * 100 / u64::from(self.max)) as u32
        }
    }
}

// ============================================================================
// Unit / building state
// ============================================================================

/// Movement state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Not moving.
    #[default]
    Idle,
    /// Travelling to a destination.
    Moving,
}

/// Per-unit movement data driven by the command dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitMotion {
    /// Current state.
    pub state: MotionState,
    /// Where the unit is heading, if anywhere.
    pub destination: Option<Vec3>,
    /// Remaining distance at which the unit considers itself arrived.
    pub stopping_distance: f32,
    /// Set while the player's move command is in effect.
    pub commanded: bool,
    /// Displacement per second applied last update.
    pub velocity: Vec3,
}

impl Default for UnitMotion {
    fn default() -> Self {
        Self {
            state: MotionState::Idle,
            destination: None,
            stopping_distance: 0.0,
            commanded: false,
            velocity: Vec3::ZERO,
        }
    }
}

impl UnitMotion {
    /// Whether the unit is travelling.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }
}

/// Unit-only state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    /// Speed in world units per second.
    pub movement_speed: f32,
    /// Attack capability; `None` for non-combat units.
    pub combat: Option<CombatStats>,
    /// Movement.
    pub motion: UnitMotion,
    /// Explicit or acquired attack target.
    pub attack_target: Option<EntityId>,
    /// Whether `attack_target` came from a player order, which the unit
    /// chases; acquired targets are only fought from where the unit stands.
    pub ordered_attack: bool,
    /// Seconds until the next attack is allowed.
    #[serde(with = "fixed_serde")]
    pub cooldown: Fixed,
}

/// Building-only state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingState {
    /// Periodic resource production.
    pub producers: Vec<ResourceProducer>,
}

// ============================================================================
// Entity
// ============================================================================

/// A unit or building in the world.
///
/// Exactly one of `unit` / `building` is `Some`, matching `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, assigned by the world on insert.
    pub id: EntityId,
    /// Id of the blueprint this entity was built from.
    pub blueprint: String,
    /// Unit or building.
    pub kind: EntityKind,
    /// Owning side.
    pub faction: Faction,
    /// Position and orientation.
    pub transform: Transform,
    /// Bounding shape.
    pub footprint: Footprint,
    /// Hit points.
    pub health: Health,
    /// Flat reduction applied to every hit.
    pub armor: u32,
    /// Whether clicks may select the entity.
    pub selectable: bool,
    /// Placement lifecycle.
    pub placement: PlacementState,
    /// Unit state, for units.
    pub unit: Option<UnitState>,
    /// Building state, for buildings.
    pub building: Option<BuildingState>,
}

impl Entity {
    /// A constructed, fixed building.
    #[must_use]
    pub fn building(data: &BuildingData, transform: Transform, faction: Faction) -> Self {
        Self {
            id: 0,
            blueprint: data.id.clone(),
            kind: EntityKind::Building,
            faction,
            transform,
            footprint: Footprint::new(data.half_extents()),
            health: Health::from_blueprint(data.health),
            armor: u32::try_from(data.armor).unwrap_or(0),
            selectable: true,
            placement: PlacementState::Fixed,
            unit: None,
            building: Some(BuildingState {
                producers: data
                    .production
                    .iter()
                    .cloned()
                    .map(ResourceProducer::new)
                    .collect(),
            }),
        }
    }

    /// A freshly spawned, idle unit.
    #[must_use]
    pub fn unit(data: &UnitData, position: Vec3, faction: Faction) -> Self {
        let radius = data.radius.max(0.05);
        Self {
            id: 0,
            blueprint: data.id.clone(),
            kind: EntityKind::Unit,
            faction,
            transform: Transform::new(position, 0.0),
            footprint: Footprint::new(Vec3::splat(radius)),
            health: Health::from_blueprint(data.health),
            armor: 0,
            selectable: true,
            placement: PlacementState::Fixed,
            unit: Some(UnitState {
                movement_speed: data.movement_speed,
                combat: data.combat,
                motion: UnitMotion::default(),
                attack_target: None,
                ordered_attack: false,
                cooldown: Fixed::ZERO,
            }),
            building: None,
        }
    }

    /// Whether the entity is a unit.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.kind == EntityKind::Unit
    }

    /// Whether the entity is a building.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.kind == EntityKind::Building
    }

    /// Whether the entity is a unit that can attack.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.unit.as_ref().is_some_and(|u| u.combat.is_some())
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Oriented bounding box.
    #[must_use]
    pub fn obb(&self) -> Obb {
        self.footprint.obb(&self.transform)
    }
}
