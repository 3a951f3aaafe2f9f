//! Tunable configuration for the core.
//!
//! Every numeric threshold used by placement, selection, commands and combat
//! lives here. All fields have serde defaults, so a config file only needs
//! the values it overrides.
//!
//! # Example RON
//!
//! ```ron
//! CoreConfig(
//!     grid: (cell_size: 2.0, spacing: 1.0),
//!     placement: (min_player_distance: 12.0),
//!     starting_resources: {"Bone": 150, "Biohazard": 150},
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Grid snapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Size of one grid cell.
    pub cell_size: f32,
    /// Extra gap between cells.
    pub spacing: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            spacing: 1.0,
        }
    }
}

/// Placement validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    /// Minimum straight-line distance from the player avatar.
    pub min_player_distance: f32,
    /// Steepest ground slope accepted, in degrees.
    pub max_slope_angle: f32,
    /// Largest pitch/roll/yaw deviation of the aligned building, in degrees.
    pub tilt_threshold: f32,
    /// Scale applied to the full footprint size; the result is the half extent
    /// searched by the building overlap test.
    pub footprint_scale: f32,
    /// Half extent of the box searched for obstacles (trees, rocks).
    pub obstacle_clearance: f32,
    /// Height above the candidate the ground probe starts from.
    pub probe_height: f32,
    /// Length of the downward ground probe.
    pub probe_distance: f32,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            min_player_distance: 10.0,
            max_slope_angle: 27.0,
            tilt_threshold: 27.0,
            footprint_scale: 0.777,
            obstacle_clearance: 3.0,
            probe_height: 5.0,
            probe_distance: 10.0,
        }
    }
}

/// Selection input parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Pointer travel in pixels before a press becomes a drag.
    pub drag_threshold: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 10.0,
        }
    }
}

/// Movement command parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Distance between formation slots.
    pub formation_spacing: f32,
    /// Stopping distance added per selected unit when a move is issued.
    pub stopping_distance_per_unit: f32,
    /// Lower clamp for the issued stopping distance.
    pub min_stopping_distance: f32,
    /// Upper clamp for the issued stopping distance.
    pub max_stopping_distance: f32,
    /// Radius in which other units count as crowding.
    pub crowd_radius: f32,
    /// Stopping distance while crowded.
    pub crowded_stopping_distance: f32,
    /// Stopping distance while not crowded.
    pub clear_stopping_distance: f32,
    /// Neighbour count that triggers an early stop near the destination.
    pub heavy_crowd_neighbours: usize,
    /// Remaining distance under which a heavily crowded unit stops.
    pub crowd_arrival_radius: f32,
    /// Squared speed below which a unit counts as stationary.
    pub rest_speed_sq: f32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            formation_spacing: 1.5,
            stopping_distance_per_unit: 0.1,
            min_stopping_distance: 1.0,
            max_stopping_distance: 5.0,
            crowd_radius: 1.5,
            crowded_stopping_distance: 7.0,
            clear_stopping_distance: 0.3,
            heavy_crowd_neighbours: 3,
            crowd_arrival_radius: 10.0,
            rest_speed_sq: 1e-4,
        }
    }
}

/// Combat parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Radius in which idle combat units acquire hostile targets.
    pub detection_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
        }
    }
}

/// Complete core configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Grid snapping.
    pub grid: GridConfig,
    /// Placement validation.
    pub placement: PlacementRules,
    /// Selection input.
    pub selection: SelectionConfig,
    /// Movement commands.
    pub commands: CommandConfig,
    /// Combat.
    pub combat: CombatConfig,
    /// Ledger contents at session start.
    pub starting_resources: BTreeMap<String, i64>,
}

impl CoreConfig {
    /// Parse a RON config string.
    pub fn from_ron_str(source: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Load and check a RON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source, &path.display().to_string())
    }

    /// Reject values that would make the rules meaningless.
    pub fn check(&self) -> Result<()> {
        let pitch = self.grid.cell_size + self.grid.spacing;
        if !(pitch.is_finite() && pitch > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "grid pitch must be positive, got {pitch}"
            )));
        }
        let p = &self.placement;
        if p.probe_distance <= 0.0 || p.footprint_scale <= 0.0 {
            return Err(GameError::InvalidConfig(
                "probe_distance and footprint_scale must be positive".to_string(),
            ));
        }
        let c = &self.commands;
        if c.min_stopping_distance > c.max_stopping_distance {
            return Err(GameError::InvalidConfig(
                "min_stopping_distance exceeds max_stopping_distance".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_thresholds() {
        let config = CoreConfig::default();
        assert_eq!(config.placement.min_player_distance, 10.0);
        assert_eq!(config.placement.max_slope_angle, 27.0);
        assert_eq!(config.selection.drag_threshold, 10.0);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_partial_ron_override() {
        let config = CoreConfig::from_ron_str(
            r#"CoreConfig(
                placement: (min_player_distance: 12.0),
                starting_resources: {"Bone": 150},
            )"#,
            "test",
        )
        .unwrap();
        assert_eq!(config.placement.min_player_distance, 12.0);
        assert_eq!(config.placement.max_slope_angle, 27.0);
        assert_eq!(config.starting_resources.get("Bone"), Some(&150));
    }

    #[test]
    fn test_zero_grid_pitch_rejected() {
        let mut config = CoreConfig::default();
        config.grid = GridConfig {
            cell_size: 0.0,
            spacing: 0.0,
        };
        assert!(matches!(config.check(), Err(GameError::InvalidConfig(_))));
    }
}
