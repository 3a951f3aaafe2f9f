//! Blueprint registry: every building and unit definition, indexed by id.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::building_data::BuildingData;
use super::unit_data::UnitData;
use crate::economy::MIN_CYCLE_SECONDS;
use crate::error::{GameError, Result};

/// Contents of one data file.
///
/// # Example RON
///
/// ```ron
/// GameData(
///     buildings: [...],
///     units: [...],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameData {
    /// Building definitions.
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
    /// Unit definitions.
    #[serde(default)]
    pub units: Vec<UnitData>,
}

/// Registry containing all unit and building blueprints.
///
/// Ids are kept in `BTreeMap`s so iteration order is stable.
#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    buildings: BTreeMap<String, BuildingData>,
    units: BTreeMap<String, UnitData>,
}

impl BlueprintRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a building blueprint, replacing any previous one with the same id.
    pub fn register_building(&mut self, data: BuildingData) {
        self.buildings.insert(data.id.clone(), data);
    }

    /// Register a unit blueprint, replacing any previous one with the same id.
    pub fn register_unit(&mut self, data: UnitData) {
        self.units.insert(data.id.clone(), data);
    }

    /// Get a building blueprint by id.
    #[must_use]
    pub fn building(&self, id: &str) -> Option<&BuildingData> {
        self.buildings.get(id)
    }

    /// Get a unit blueprint by id.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&UnitData> {
        self.units.get(id)
    }

    /// All building blueprints in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &BuildingData> {
        self.buildings.values()
    }

    /// All unit blueprints in id order.
    pub fn units(&self) -> impl Iterator<Item = &UnitData> {
        self.units.values()
    }

    /// Merge a parsed data file. Duplicate ids are an error.
    pub fn merge(&mut self, data: GameData, origin: &str) -> Result<()> {
        for building in data.buildings {
            if self.buildings.contains_key(&building.id) {
                return Err(duplicate(origin, "building", &building.id));
            }
            self.register_building(building);
        }
        for unit in data.units {
            if self.units.contains_key(&unit.id) {
                return Err(duplicate(origin, "unit", &unit.id));
            }
            self.register_unit(unit);
        }
        Ok(())
    }

    /// Parse a RON string holding a [`GameData`] block.
    pub fn from_ron_str(source: &str, origin: &str) -> Result<Self> {
        let data: GameData = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        let mut registry = Self::new();
        registry.merge(data, origin)?;
        Ok(registry)
    }

    /// Load every `.ron` file in a directory, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let origin = path.display().to_string();
            let source = std::fs::read_to_string(&path)?;
            let data: GameData =
                ron::from_str(&source).map_err(|e| GameError::DataParseError {
                    path: origin.clone(),
                    message: e.to_string(),
                })?;
            tracing::debug!(
                file = %origin,
                buildings = data.buildings.len(),
                units = data.units.len(),
                "Loaded data file"
            );
            registry.merge(data, &origin)?;
        }
        Ok(registry)
    }

    /// Sanity-check every blueprint. Returns one message per problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for b in self.buildings.values() {
            if !(b.build_time.is_finite() && b.build_time >= 0.0) {
                problems.push(format!("building '{}': invalid build_time", b.id));
            }
            if b.health <= 0 {
                problems.push(format!("building '{}': health must be positive", b.id));
            }
            let (x, y, z) = b.half_extents;
            if x <= 0.0 || y <= 0.0 || z <= 0.0 {
                problems.push(format!("building '{}': half_extents must be positive", b.id));
            }
            for cost in &b.costs {
                if cost.amount < 0 {
                    problems.push(format!(
                        "building '{}': negative cost for {}",
                        b.id, cost.resource
                    ));
                }
            }
            for rule in &b.production {
                if !(rule.cycle_seconds.is_finite() && rule.cycle_seconds >= MIN_CYCLE_SECONDS) {
                    problems.push(format!(
                        "building '{}': production of {} needs a cycle of at least {MIN_CYCLE_SECONDS}s",
                        b.id, rule.resource
                    ));
                }
            }
            for unit in &b.trains {
                if !self.units.contains_key(unit) {
                    problems.push(format!("building '{}': trains unknown unit '{unit}'", b.id));
                }
            }
        }

        for u in self.units.values() {
            if !(u.build_time.is_finite() && u.build_time >= 0.0) {
                problems.push(format!("unit '{}': invalid build_time", u.id));
            }
            if u.health <= 0 {
                problems.push(format!("unit '{}': health must be positive", u.id));
            }
            if !(u.movement_speed.is_finite() && u.movement_speed >= 0.0) {
                problems.push(format!("unit '{}': invalid movement_speed", u.id));
            }
            for cost in &u.costs {
                if cost.amount < 0 {
                    problems.push(format!("unit '{}': negative cost for {}", u.id, cost.resource));
                }
            }
            if let Some(combat) = u.combat {
                if combat.attack_range <= 0.0 || combat.attack_interval <= 0.0 {
                    problems.push(format!("unit '{}': combat range and interval must be positive", u.id));
                }
            }
        }

        problems
    }
}

fn duplicate(origin: &str, kind: &str, id: &str) -> GameError {
    GameError::DataParseError {
        path: origin.to_string(),
        message: format!("duplicate {kind} id '{id}'"),
    }
}
