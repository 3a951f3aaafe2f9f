//! Unit-versus-entity combat.
//!
//! Each tick every combat-capable unit counts its cooldown down, keeps or
//! acquires a target, and strikes once the target is in reach. Entities
//! reduced to zero health are removed from the [`World`] and reported so the
//! caller can drop their colliders and selection.

use serde::{Deserialize, Serialize};

use crate::commands::MotionChanged;
use crate::components::{EntityId, MotionState};
use crate::config::CombatConfig;
use crate::math::{planar_distance, seconds, Fixed};
use crate::world::World;

/// Something that happened during a combat tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// An attacker picked a target on its own.
    TargetAcquired {
        /// The attacker.
        attacker: EntityId,
        /// Its new target.
        target: EntityId,
    },
    /// A hit landed.
    Damaged {
        /// The attacker.
        attacker: EntityId,
        /// The entity hit.
        target: EntityId,
        /// Health actually removed.
        amount: u32,
    },
    /// An entity died and was removed from the world.
    Killed {
        /// The removed entity.
        victim: EntityId,
        /// Who landed the final hit.
        by: EntityId,
    },
}

/// Result of one combat tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Events in attacker id order.
    pub events: Vec<CombatEvent>,
    /// Units that stopped because an ordered target came within reach.
    pub motion: Vec<MotionChanged>,
}

impl CombatOutcome {
    /// Ids removed from the world this tick.
    #[must_use]
    pub fn killed(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                CombatEvent::Killed { victim, .. } => Some(*victim),
                _ => None,
            })
            .collect()
    }
}

/// Damage after flat armor; every hit removes at least one point.
#[must_use]
pub fn mitigated_damage(attack_damage: i32, armor: u32) -> u32 {
    let raw = u32::try_from(attack_damage).unwrap_or(0);
    raw.saturating_sub(armor).max(1)
}

/// Run one combat tick.
pub fn combat_system(world: &mut World, config: &CombatConfig, dt: Fixed) -> CombatOutcome {
    let dt = dt.max(Fixed::ZERO);
    let mut outcome = CombatOutcome::default();
    let mut dead: Vec<(EntityId, EntityId)> = Vec::new();

    for id in world.sorted_ids() {
        let Some(attacker) = world.get(id) else { continue };
        if attacker.health.is_dead() {
            continue;
        }
        let Some(unit) = attacker.unit.as_ref() else { continue };
        let Some(stats) = unit.combat else { continue };
        let position = attacker.position();
        let faction = attacker.faction;

        let live_target = unit.attack_target.filter(|target| {
            world
                .get(*target)
                .is_some_and(|e| !e.health.is_dead() && e.faction.is_enemy_of(faction))
        });
        let mut ordered = unit.ordered_attack && live_target.is_some();
        let target = match live_target {
            Some(target) => Some(target),
            None => {
                ordered = false;
                let acquired = world.nearest_enemy(position, config.detection_radius, faction);
                if let Some(target) = acquired {
                    outcome.events.push(CombatEvent::TargetAcquired { attacker: id, target });
                }
                acquired
            }
        };

        let reach = target.and_then(|target| {
            let victim = world.get(target)?;
            let radius = victim.footprint.half_extents.x.max(victim.footprint.half_extents.z);
            let in_reach = planar_distance(position, victim.position()) <= stats.attack_range + radius;
            Some((target, victim.position(), victim.armor, in_reach))
        });

        let Some(unit) = world.get_mut(id).and_then(|e| e.unit.as_mut()) else {
            continue;
        };
        unit.cooldown = unit.cooldown.saturating_sub(dt).max(Fixed::ZERO);
        unit.attack_target = target;
        unit.ordered_attack = ordered;

        let Some((target, target_position, armor, in_reach)) = reach else {
            continue;
        };
        if !in_reach {
            if ordered && unit.motion.is_moving() {
                unit.motion.destination = Some(target_position);
            }
            continue;
        }

        if ordered && unit.motion.is_moving() {
            unit.motion.state = MotionState::Idle;
            unit.motion.destination = None;
            unit.motion.commanded = false;
            outcome.motion.push(MotionChanged {
                entity: id,
                state: MotionState::Idle,
            });
        }
        if unit.cooldown > Fixed::ZERO {
            continue;
        }
        unit.cooldown = seconds(stats.attack_interval);

        let Some(victim) = world.get_mut(target) else { continue };
        let amount = victim.health.apply_damage(mitigated_damage(stats.attack_damage, armor));
        outcome.events.push(CombatEvent::Damaged {
            attacker: id,
            target,
            amount,
        });
        if victim.health.is_dead() {
            dead.push((target, id));
        }
    }

    for (victim, by) in dead {
        if world.remove(victim).is_some() {
            tracing::info!(victim, by, "Entity destroyed");
            outcome.events.push(CombatEvent::Killed { victim, by });
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::commands::CommandDispatcher;
    use crate::components::{Entity, Faction};
    use crate::data::UnitData;

    fn ghoul() -> UnitData {
        ron::from_str(
            r#"UnitData(id: "ghoul", name: "Ghoul", health: 20, movement_speed: 4.0, build_time: 6.0,
                combat: Some(CombatStats(attack_damage: 8, attack_range: 1.5, attack_interval: 1.0)))"#,
        )
        .unwrap()
    }

    fn doctor() -> UnitData {
        ron::from_str(
            r#"UnitData(id: "doctor", name: "Doctor", health: 40, movement_speed: 4.0, build_time: 10.0)"#,
        )
        .unwrap()
    }

    #[test]
    fn test_mitigated_damage_floors_at_one() {
        assert_eq!(mitigated_damage(8, 3), 5);
        assert_eq!(mitigated_damage(8, 20), 1);
        assert_eq!(mitigated_damage(-4, 0), 1);
    }

    #[test]
    fn test_idle_unit_acquires_and_hits_nearby_enemy() {
        let mut world = World::new();
        let attacker = world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        let victim = world.insert(Entity::unit(&doctor(), Vec3::new(1.0, 0.0, 0.0), Faction::Hostile));

        let outcome = combat_system(&mut world, &CombatConfig::default(), seconds(0.1));
        assert_eq!(
            outcome.events,
            vec![
                CombatEvent::TargetAcquired { attacker, target: victim },
                CombatEvent::Damaged { attacker, target: victim, amount: 8 },
            ]
        );
        assert_eq!(world.get(victim).unwrap().health.current, 32);
    }

    #[test]
    fn test_cooldown_gates_attacks() {
        let mut world = World::new();
        world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        let victim = world.insert(Entity::unit(&doctor(), Vec3::new(1.0, 0.0, 0.0), Faction::Hostile));
        let config = CombatConfig::default();

        combat_system(&mut world, &config, seconds(0.5));
        combat_system(&mut world, &config, seconds(0.5));
        assert_eq!(world.get(victim).unwrap().health.current, 32);
        combat_system(&mut world, &config, seconds(0.5));
        assert_eq!(world.get(victim).unwrap().health.current, 24);
    }

    #[test]
    fn test_out_of_detection_radius_is_ignored() {
        let mut world = World::new();
        world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        world.insert(Entity::unit(&doctor(), Vec3::new(30.0, 0.0, 0.0), Faction::Hostile));
        let outcome = combat_system(&mut world, &CombatConfig::default(), seconds(0.1));
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_kill_removes_victim() {
        let mut world = World::new();
        let attacker = world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Hostile));
        let victim = world.insert(Entity::unit(&ghoul(), Vec3::new(1.0, 0.0, 0.0), Faction::Player));
        world.get_mut(victim).unwrap().health.current = 5;

        let outcome = combat_system(&mut world, &CombatConfig::default(), seconds(0.1));
        assert_eq!(outcome.killed(), vec![victim]);
        assert!(!world.contains(victim));
        assert!(outcome
            .events
            .contains(&CombatEvent::Killed { victim, by: attacker }));
    }

    #[test]
    fn test_ordered_attacker_stops_in_reach() {
        let mut world = World::new();
        let attacker = world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        let victim = world.insert(Entity::unit(&doctor(), Vec3::new(1.2, 0.0, 0.0), Faction::Hostile));
        CommandDispatcher::default()
            .issue_attack(victim, &[attacker], &mut world)
            .unwrap();

        let outcome = combat_system(&mut world, &CombatConfig::default(), seconds(0.1));
        assert_eq!(
            outcome.motion,
            vec![MotionChanged { entity: attacker, state: MotionState::Idle }]
        );
        let unit = world.get(attacker).unwrap().unit.as_ref().unwrap();
        assert!(!unit.motion.is_moving());
        assert_eq!(unit.attack_target, Some(victim));
    }

    #[test]
    fn test_ordered_attacker_chases_moving_target() {
        let mut world = World::new();
        let attacker = world.insert(Entity::unit(&ghoul(), Vec3::ZERO, Faction::Player));
        let victim = world.insert(Entity::unit(&doctor(), Vec3::new(8.0, 0.0, 0.0), Faction::Hostile));
        CommandDispatcher::default()
            .issue_attack(victim, &[attacker], &mut world)
            .unwrap();
        world.get_mut(victim).unwrap().transform.position = Vec3::new(8.0, 0.0, 6.0);

        combat_system(&mut world, &CombatConfig::default(), seconds(0.1));
        let unit = world.get(attacker).unwrap().unit.as_ref().unwrap();
        assert_eq!(unit.motion.destination, Some(Vec3::new(8.0, 0.0, 6.0)));
    }

    #[test]
    fn test_non_combat_units_never_attack() {
        let mut world = World::new();
        world.insert(Entity::unit(&doctor(), Vec3::ZERO, Faction::Player));
        world.insert(Entity::unit(&doctor(), Vec3::new(1.0, 0.0, 0.0), Faction::Hostile));
        let outcome = combat_system(&mut world, &CombatConfig::default(), seconds(1.0));
        assert!(outcome.events.is_empty());
    }
}
