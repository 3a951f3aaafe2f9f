//! Flat JSON save records.
//!
//! A save lists every building and unit by blueprint id with its position
//! and health, plus the ledger contents. Restoring rebuilds entities from
//! their blueprints, so only state that differs from a fresh entity is kept.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::components::{Entity, EntityKind, Faction};
use crate::economy::ResourceLedger;
use crate::error::{GameError, Result};
use crate::world::World;

/// Save format version; older or newer files are rejected on load.
pub const SAVE_VERSION: u32 = 1;

/// One saved entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Blueprint id.
    pub kind_id: String,
    /// World position.
    pub position: Vec3,
    /// Facing in degrees.
    #[serde(default)]
    pub yaw: f32,
    /// Current health.
    pub health: u32,
    /// Owning side.
    #[serde(default)]
    pub faction: Faction,
}

impl EntityRecord {
    /// Record for a live entity.
    #[must_use]
    pub fn of(entity: &Entity) -> Self {
        Self {
            kind_id: entity.blueprint.clone(),
            position: entity.position(),
            yaw: entity.transform.yaw,
            health: entity.health.current,
            faction: entity.faction,
        }
    }
}

/// One saved resource amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource name.
    pub resource: String,
    /// Amount held.
    pub amount: i64,
}

/// A complete save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    /// Format version.
    pub version: u32,
    /// Constructed buildings, in id order.
    #[serde(default)]
    pub buildings: Vec<EntityRecord>,
    /// Units, in id order.
    #[serde(default)]
    pub units: Vec<EntityRecord>,
    /// Ledger contents, sorted by resource name.
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl Default for SaveGame {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            buildings: Vec::new(),
            units: Vec::new(),
            resources: Vec::new(),
        }
    }
}

impl SaveGame {
    /// Capture the world and ledger.
    #[must_use]
    pub fn capture(world: &World, ledger: &ResourceLedger) -> Self {
        let records = |kind: EntityKind| -> Vec<EntityRecord> {
            world
                .ids_of_kind(kind)
                .into_iter()
                .filter_map(|id| world.get(id))
                .map(EntityRecord::of)
                .collect()
        };
        Self {
            version: SAVE_VERSION,
            buildings: records(EntityKind::Building),
            units: records(EntityKind::Unit),
            resources: ledger
                .snapshot()
                .into_iter()
                .map(|(resource, amount)| ResourceRecord { resource, amount })
                .collect(),
        }
    }

    /// Whether the save has no entities and no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty() && self.units.is_empty() && self.resources.is_empty()
    }

    /// Ledger holding the saved amounts.
    #[must_use]
    pub fn ledger(&self) -> ResourceLedger {
        ResourceLedger::with_amounts(self.resources.iter().map(|r| (r.resource.clone(), r.amount)))
    }

    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON, checking the version.
    pub fn from_json(source: &str) -> Result<Self> {
        let save: Self = serde_json::from_str(source)?;
        if save.version != SAVE_VERSION {
            return Err(GameError::SaveVersion {
                found: save.version,
                expected: SAVE_VERSION,
            });
        }
        Ok(save)
    }
}

/// Write `save` to `path`, replacing any existing file.
pub fn save_to_path(save: &SaveGame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, save.to_json()?)?;
    tracing::info!(
        path = %path.display(),
        buildings = save.buildings.len(),
        units = save.units.len(),
        "Game saved"
    );
    Ok(())
}

/// Read a save from `path`. A missing file yields an empty save.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SaveGame> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "No save file, starting fresh");
        return Ok(SaveGame::default());
    }
    let save = SaveGame::from_json(&std::fs::read_to_string(path)?)?;
    tracing::info!(
        path = %path.display(),
        buildings = save.buildings.len(),
        units = save.units.len(),
        "Game loaded"
    );
    Ok(save)
}

/// Delete the save at `path`. Returns whether a file was removed.
pub fn delete_save(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    tracing::info!(path = %path.display(), "Save deleted");
    Ok(true)
}
