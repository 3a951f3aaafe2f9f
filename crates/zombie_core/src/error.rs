//! Error types for the placement/selection core.
//!
//! None of these are fatal. Every variant describes a transient state that
//! the caller re-presents as UI feedback and recomputes next frame.

use thiserror::Error;

use crate::components::EntityId;
use crate::placement::PlacementRejection;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the core.
#[derive(Debug, Error)]
pub enum GameError {
    /// A placement candidate failed validation.
    #[error("Placement rejected: {0}")]
    PlacementRejected(PlacementRejection),

    /// Insufficient resources.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource name.
        resource: String,
        /// Amount required.
        required: i64,
        /// Amount available.
        available: i64,
    },

    /// The cursor ray did not hit ground this frame.
    #[error("No ground under cursor")]
    NoGroundUnderCursor,

    /// A click or command targeted something that cannot be selected or attacked.
    #[error("Invalid selection target")]
    InvalidSelectionTarget,

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A building or unit id that is not in the registry.
    #[error("Unknown blueprint: {0}")]
    UnknownBlueprint(String),

    /// A configuration value is out of its legal range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A save written by a different format version.
    #[error("Save version mismatch: found {found}, expected {expected}")]
    SaveVersion {
        /// Version stored in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// Save data could not be encoded or decoded.
    #[error("Save data error: {0}")]
    Save(#[from] serde_json::Error),

    /// Filesystem failure while reading or writing data.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PlacementRejection> for GameError {
    fn from(reason: PlacementRejection) -> Self {
        Self::PlacementRejected(reason)
    }
}
