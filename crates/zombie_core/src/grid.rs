//! Grid snapping for placement candidates.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::{GameError, Result};

/// Snaps world points onto a regular XZ grid.
///
/// The grid pitch is `cell_size + spacing`; cell centres sit on integer
/// multiples of the pitch, so the origin is always a cell centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSnapper {
    cell_size: f32,
    spacing: f32,
}

impl GridSnapper {
    /// Create a snapper. The pitch must be finite and positive.
    pub fn new(cell_size: f32, spacing: f32) -> Result<Self> {
        let pitch = cell_size + spacing;
        if !(pitch.is_finite() && pitch > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "grid pitch must be positive, got {pitch}"
            )));
        }
        Ok(Self { cell_size, spacing })
    }

    /// Create a snapper from configuration.
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        Self::new(config.cell_size, config.spacing)
    }

    /// Distance between neighbouring cell centres.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.cell_size + self.spacing
    }

    /// Cell size without spacing.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Round `x` and `z` to the nearest cell centre; `y` passes through.
    #[must_use]
    pub fn snap(&self, point: Vec3) -> Vec3 {
        let pitch = self.pitch();
        Vec3::new(
            snap_axis(point.x, pitch),
            point.y,
            snap_axis(point.z, pitch),
        )
    }

    /// Integer cell index containing `point`.
    #[must_use]
    pub fn cell_of(&self, point: Vec3) -> (i32, i32) {
        let pitch = self.pitch();
        (
            (point.x / pitch).round() as i32,
            (point.z / pitch).round() as i32,
        )
    }

    /// World-space centre of a cell, at height `y`.
    #[must_use]
    pub fn cell_center(&self, cell: (i32, i32), y: f32) -> Vec3 {
        let pitch = self.pitch();
        Vec3::new(cell.0 as f32 * pitch, y, cell.1 as f32 * pitch)
    }
}

impl Default for GridSnapper {
    fn default() -> Self {
        let config = GridConfig::default();
        Self {
            cell_size: config.cell_size,
            spacing: config.spacing,
        }
    }
}

fn snap_axis(value: f32, pitch: f32) -> f32 {
    let snapped = (value / pitch).round() * pitch;
    // Avoid -0.0 so snapped points compare and hash consistently.
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}
