//! Outbound presentation hooks.
//!
//! The core never renders or plays audio itself. It reports what should be
//! shown or heard through a [`FeedbackSink`]; every call is fire-and-forget.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::components::{EntityId, MotionState, PlacementState};
use crate::selection::SelectionChanged;

/// Symbolic sound-effect identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Rejected action: invalid placement, unaffordable purchase, cancel.
    ErrorClick,
    /// A unit or building was selected.
    ClickOnBuilding,
    /// A click on empty ground cleared the selection.
    ClickOnEmpty,
    /// The placement preview turned 90 degrees.
    RotateBuilding,
    /// A building's info panel opened.
    ShowUIBuilding,
    /// A building's info panel closed.
    CloseUIBuilding,
    /// A placement was committed.
    PlaceBuilding,
    /// A construction job finished.
    BuildingComplete,
}

/// Receiver for everything the core wants presented.
///
/// All methods default to doing nothing so sinks implement only what they
/// display.
pub trait FeedbackSink {
    /// Show or hide the selection marker of `entity`.
    fn show_selection(&mut self, entity: EntityId, shown: bool) {
        let _ = (entity, shown);
    }

    /// Show the move destination marker at `point`, or hide it with `None`.
    fn show_destination(&mut self, point: Option<Vec3>) {
        let _ = point;
    }

    /// Play a sound effect.
    fn play(&mut self, effect: SoundEffect) {
        let _ = effect;
    }

    /// Resource amounts after a change, in name order.
    fn resources_changed(&mut self, snapshot: &[(String, i64)]) {
        let _ = snapshot;
    }

    /// A new selection.
    fn selection_changed(&mut self, change: &SelectionChanged) {
        let _ = change;
    }

    /// Placement preview state for tinting, with the snapped position if
    /// ground was found.
    fn placement_preview(&mut self, state: PlacementState, position: Option<Vec3>) {
        let _ = (state, position);
    }

    /// A unit started or stopped moving.
    fn motion_changed(&mut self, entity: EntityId, state: MotionState) {
        let _ = (entity, state);
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {}
