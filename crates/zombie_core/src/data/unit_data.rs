//! Unit data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceCost;

/// Combat statistics for a unit.
///
/// Optional combat data - units without combat stats are non-combatants
/// and stay idle when an attack order is issued.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CombatStats {
    /// Damage per attack.
    pub attack_damage: i32,

    /// Attack range in world units.
    pub attack_range: f32,

    /// Seconds between attacks.
    pub attack_interval: f32,
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: "ghoul",
///     name: "Ghoul",
///     health: 60,
///     movement_speed: 3.5,
///     build_time: 6.0,
///     costs: [(resource: "Bone", amount: 30), (resource: "Flesh", amount: 10)],
///     combat: Some(CombatStats(attack_damage: 8, attack_range: 1.5, attack_interval: 1.0)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Unique string identifier for this unit type.
    ///
    /// Used for referencing in other data files and for save/load.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Maximum health points.
    pub health: i32,

    /// Movement speed in world units per second.
    pub movement_speed: f32,

    /// Training time in seconds.
    pub build_time: f32,

    /// Resources paid when training is queued.
    #[serde(default)]
    pub costs: Vec<ResourceCost>,

    /// Combat statistics (None for non-combat units).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat: Option<CombatStats>,

    /// Radius of the unit's collider.
    #[serde(default = "default_radius")]
    pub radius: f32,
}

const fn default_radius() -> f32 {
    0.5
}

impl UnitData {
    /// Check if this unit can engage in combat.
    #[must_use]
    pub fn is_combatant(&self) -> bool {
        self.combat.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_unit() -> UnitData {
        UnitData {
            id: "ghoul".to_string(),
            name: "Ghoul".to_string(),
            health: 60,
            movement_speed: 3.5,
            build_time: 6.0,
            costs: vec![ResourceCost::new("Bone", 30)],
            combat: Some(CombatStats {
                attack_damage: 8,
                attack_range: 1.5,
                attack_interval: 1.0,
            }),
            radius: 0.5,
        }
    }

    #[test]
    fn test_is_combatant() {
        let mut unit = create_test_unit();
        assert!(unit.is_combatant());

        unit.combat = None;
        assert!(!unit.is_combatant());
    }

    #[test]
    fn test_parse_ron() {
        let unit: UnitData = ron::from_str(
            r#"UnitData(
                id: "doctor",
                name: "Doctor",
                health: 40,
                movement_speed: 4.0,
                build_time: 10.0,
            )"#,
        )
        .unwrap();
        assert!(!unit.is_combatant());
        assert_eq!(unit.radius, 0.5);
    }
}
