//! Move and attack commands for the selected units.
//!
//! [`CommandDispatcher`] turns a target point or entity into per-unit
//! orders, and drives each unit's [`UnitMotion`] state machine:
//!
//! ```text
//! Idle --(move issued)--> Moving --(arrived | stuck | path invalid | crowded near goal)--> Idle
//! ```
//!
//! The stopping distance widens while a unit is crowded by others so a
//! group does not pile onto the same destination.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Entity, EntityId, MotionState, UnitMotion};
use crate::config::CommandConfig;
use crate::math::planar_distance;
use crate::spatial::SpatialQuery;
use crate::world::World;

/// Named formation layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormationType {
    /// Side by side along the X axis.
    Line,
    /// Rows growing by one unit each, apex in front.
    Triangle,
    /// Near-square grid.
    #[default]
    Rectangle,
}

/// A unit started or stopped moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionChanged {
    /// The unit.
    pub entity: EntityId,
    /// Its new movement state.
    pub state: MotionState,
}

/// Why a command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No units are selected.
    #[error("no units selected")]
    NothingSelected,
    /// The target entity does not exist.
    #[error("target {0} not found")]
    TargetNotFound(EntityId),
    /// The target is not on an attackable side.
    #[error("target {0} cannot be attacked")]
    TargetNotAttackable(EntityId),
    /// No selected unit can attack.
    #[error("no selected unit can attack")]
    NoCombatUnits,
}

/// Slot positions for `count` units around `center`, `spacing` apart.
///
/// Points are distinct and their centroid is `center`. Slot order is
/// stable: slot `i` always goes to the `i`-th selected unit.
#[must_use]
pub fn layout(formation: FormationType, count: usize, center: Vec3, spacing: f32) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let spacing = if spacing.is_finite() && spacing > 0.0 {
        spacing
    } else {
        1.0
    };

    // Offsets in (x, z) slot units before centring.
    let offsets: Vec<(f32, f32)> = match formation {
        FormationType::Line => (0..count).map(|i| (i as f32, 0.0)).collect(),
        FormationType::Rectangle => {
            let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
            (0..count)
                .map(|i| ((i % columns) as f32, (i / columns) as f32))
                .collect()
        }
        FormationType::Triangle => {
            let mut slots = Vec::with_capacity(count);
            let mut row = 0usize;
            while slots.len() < count {
                for k in 0..=row {
                    if slots.len() == count {
                        break;
                    }
                    slots.push((k as f32 - row as f32 / 2.0, row as f32));
                }
                row += 1;
            }
            slots
        }
    };

    let n = offsets.len() as f32;
    let (sum_x, sum_z) = offsets
        .iter()
        .fold((0.0, 0.0), |(sx, sz), (x, z)| (sx + x, sz + z));
    let (mean_x, mean_z) = (sum_x / n, sum_z / n);

    offsets
        .into_iter()
        .map(|(x, z)| {
            Vec3::new(
                center.x + (x - mean_x) * spacing,
                center.y,
                center.z + (z - mean_z) * spacing,
            )
        })
        .collect()
}

/// Issues move and attack orders and advances unit movement.
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    config: CommandConfig,
    formation: FormationType,
}

impl CommandDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(config: CommandConfig) -> Self {
        Self {
            config,
            formation: FormationType::default(),
        }
    }

    /// Formation used for group moves.
    #[must_use]
    pub const fn formation(&self) -> FormationType {
        self.formation
    }

    /// Change the formation used for group moves.
    pub fn set_formation(&mut self, formation: FormationType) {
        self.formation = formation;
    }

    /// Tunables in use.
    #[must_use]
    pub const fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Destination for each selected unit, in selection order.
    ///
    /// A single unit goes straight to `target`; a group is spread over the
    /// current formation centred on `target`.
    #[must_use]
    pub fn issue_move(&self, target: Vec3, selected: &[EntityId]) -> Vec<(EntityId, Vec3)> {
        match selected {
            [] => Vec::new(),
            [only] => vec![(*only, target)],
            _ => {
                let slots = layout(self.formation, selected.len(), target, self.config.formation_spacing);
                selected.iter().copied().zip(slots).collect()
            }
        }
    }

    /// Stopping distance given to units when a move is issued.
    #[must_use]
    pub fn issued_stopping_distance(&self, selected_count: usize) -> f32 {
        let c = &self.config;
        (selected_count as f32 * c.stopping_distance_per_unit)
            .clamp(c.min_stopping_distance, c.max_stopping_distance)
    }

    /// Order the selected units to `target` and start them moving.
    ///
    /// Non-unit ids are skipped. Clears explicit attack targets. Returns the
    /// transitions to `Moving`.
    pub fn command_move(&self, target: Vec3, selected: &[EntityId], world: &mut World) -> Vec<MotionChanged> {
        let units: Vec<EntityId> = selected
            .iter()
            .copied()
            .filter(|id| world.get(*id).is_some_and(|e| e.unit.is_some()))
            .collect();
        let stopping = self.issued_stopping_distance(units.len());
        let mut changes = Vec::new();

        for (id, destination) in self.issue_move(target, &units) {
            let Some(unit) = world.get_mut(id).and_then(|e| e.unit.as_mut()) else {
                continue;
            };
            unit.attack_target = None;
            unit.ordered_attack = false;
            let was_moving = unit.motion.is_moving();
            unit.motion = UnitMotion {
                state: MotionState::Moving,
                destination: Some(destination),
                stopping_distance: stopping,
                commanded: true,
                velocity: unit.motion.velocity,
            };
            if !was_moving {
                changes.push(MotionChanged {
                    entity: id,
                    state: MotionState::Moving,
                });
            }
        }

        tracing::debug!(units = units.len(), ?target, formation = ?self.formation, "Move issued");
        changes
    }

    /// Re-form the selected units around their own centroid.
    pub fn regroup(&self, selected: &[EntityId], world: &mut World) -> Vec<MotionChanged> {
        let positions: Vec<Vec3> = selected
            .iter()
            .filter_map(|id| world.get(*id))
            .filter(|e| e.is_unit())
            .map(Entity::position)
            .collect();
        if positions.is_empty() {
            return Vec::new();
        }
        let center = positions.iter().copied().sum::<Vec3>() / positions.len() as f32;
        self.command_move(center, selected, world)
    }

    /// Point every combat-capable selected unit at `target`.
    ///
    /// Non-combat units are left alone. Returns how many units took the
    /// order.
    pub fn issue_attack(
        &self,
        target: EntityId,
        selected: &[EntityId],
        world: &mut World,
    ) -> Result<usize, CommandError> {
        if selected.is_empty() {
            return Err(CommandError::NothingSelected);
        }
        let victim = world.get(target).ok_or(CommandError::TargetNotFound(target))?;
        if !victim.faction.is_attackable() {
            return Err(CommandError::TargetNotAttackable(target));
        }
        let target_position = victim.position();

        let attackers: Vec<EntityId> = selected
            .iter()
            .copied()
            .filter(|id| *id != target && world.get(*id).is_some_and(Entity::can_attack))
            .collect();
        if attackers.is_empty() {
            return Err(CommandError::NoCombatUnits);
        }

        let stopping = self.issued_stopping_distance(attackers.len());
        for id in &attackers {
            if let Some(unit) = world.get_mut(*id).and_then(|e| e.unit.as_mut()) {
                unit.attack_target = Some(target);
                unit.ordered_attack = true;
                unit.motion.state = MotionState::Moving;
                unit.motion.destination = Some(target_position);
                unit.motion.stopping_distance = stopping;
                unit.motion.commanded = true;
            }
        }

        tracing::debug!(target, attackers = attackers.len(), "Attack issued");
        Ok(attackers.len())
    }

    /// Advance every moving unit by `dt` seconds.
    ///
    /// Units travel in a straight line at their movement speed and follow the
    /// ground height. Returns the transitions to `Idle`.
    pub fn update_motion<S>(&self, world: &mut World, spatial: &S, dt: f32) -> Vec<MotionChanged>
    where
        S: SpatialQuery + ?Sized,
    {
        let c = &self.config;
        let mut changes = Vec::new();
        if !(dt.is_finite() && dt > 0.0) {
            return changes;
        }

        for id in world.sorted_ids() {
            let Some(entity) = world.get(id) else { continue };
            let Some(unit) = entity.unit.as_ref() else { continue };
            if !unit.motion.is_moving() {
                continue;
            }
            let position = entity.position();
            let speed = unit.movement_speed;
            let neighbours = world.units_near(position, c.crowd_radius, id);
            let mut motion = unit.motion;

            let travel = motion.destination.and_then(|destination| {
                spatial.ground_hit(destination).map(|_| destination)
            });
            let next = match travel {
                None => None,
                Some(destination) => {
                    motion.stopping_distance = if neighbours > 0 {
                        c.crowded_stopping_distance
                    } else {
                        c.clear_stopping_distance
                    };
                    let remaining = planar_distance(position, destination);
                    if remaining <= motion.stopping_distance {
                        None
                    } else if neighbours >= c.heavy_crowd_neighbours && remaining <= c.crowd_arrival_radius {
                        None
                    } else {
                        let step = (speed * dt).min(remaining);
                        let mut to = destination - position;
                        to.y = 0.0;
                        let mut next = position + to.normalize_or_zero() * step;
                        if let Some(ground) = spatial.ground_hit(next) {
                            next.y = ground.point.y;
                        }
                        motion.velocity = (next - position) / dt;
                        let stuck = motion.velocity.length_squared() <= c.rest_speed_sq;
                        let arrived = planar_distance(next, destination) <= motion.stopping_distance;
                        Some((next, stuck || arrived))
                    }
                }
            };

            let stopped = match next {
                Some((_, stopped)) => stopped,
                None => true,
            };
            if stopped {
                motion.state = MotionState::Idle;
                motion.destination = None;
                motion.commanded = false;
                if next.is_none() {
                    motion.velocity = Vec3::ZERO;
                }
                changes.push(MotionChanged {
                    entity: id,
                    state: MotionState::Idle,
                });
            }

            if let Some(entity) = world.get_mut(id) {
                if let Some((to, _)) = next {
                    entity.transform.position = to;
                }
                if let Some(unit) = entity.unit.as_mut() {
                    unit.motion = motion;
                }
            }
        }

        changes
    }
}
