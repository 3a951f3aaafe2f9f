//! Building data structures for data-driven building definitions.

use serde::{Deserialize, Serialize};

use crate::economy::{ResourceCost, ResourceProduction};

/// Data-driven building definition.
///
/// Immutable once loaded. One of these backs every placement preview and
/// every placed building.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     id: "bone_factory",
///     name: "Bone Factory",
///     description: "Grinds remains into usable bone.",
///     costs: [(resource: "Biohazard", amount: 50)],
///     build_time: 12.0,
///     health: 400,
///     half_extents: (3.0, 2.5, 3.0),
///     production: [(resource: "Bone", amount_per_cycle: 5, cycle_seconds: 4.0)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Unique string identifier for this building type.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Tooltip description.
    #[serde(default)]
    pub description: String,

    /// Resources paid when placement is confirmed.
    #[serde(default)]
    pub costs: Vec<ResourceCost>,

    /// Construction time in seconds.
    pub build_time: f32,

    /// Maximum health points.
    pub health: i32,

    /// Armor value that reduces incoming damage.
    #[serde(default)]
    pub armor: i32,

    /// Half extents of the collision box, before placement scaling.
    #[serde(default = "default_half_extents")]
    pub half_extents: (f32, f32, f32),

    /// Resources generated while constructed.
    #[serde(default)]
    pub production: Vec<ResourceProduction>,

    /// Units this building can train.
    #[serde(default)]
    pub trains: Vec<String>,
}

const fn default_half_extents() -> (f32, f32, f32) {
    (2.0, 2.0, 2.0)
}

impl BuildingData {
    /// Check if this building can train the specified unit.
    #[must_use]
    pub fn can_train(&self, unit_id: &str) -> bool {
        self.trains.iter().any(|u| u == unit_id)
    }

    /// Check if this building produces any resource.
    #[must_use]
    pub fn is_producer(&self) -> bool {
        self.production
            .iter()
            .any(|p| p.amount_per_cycle > 0 && p.cycle_seconds > 0.0)
    }

    /// Collision half extents as a vector.
    #[must_use]
    pub fn half_extents(&self) -> glam::Vec3 {
        let (x, y, z) = self.half_extents;
        glam::Vec3::new(x, y, z)
    }
}
