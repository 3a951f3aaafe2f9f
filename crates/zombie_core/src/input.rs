//! Inbound input events and the picking seam.
//!
//! The core never reads devices. A frontend pushes [`InputEvent`]s into an
//! [`InputQueue`] and provides a [`ScreenPicker`] that turns screen
//! positions into world hits; the session drains the queue once per tick.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::commands::FormationType;
use crate::components::EntityId;

/// A discrete input event in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Primary button pressed.
    PrimaryDown {
        /// Pointer position.
        screen: Vec2,
        /// Whether the multi-select modifier is held.
        modifier: bool,
    },
    /// Primary button released.
    PrimaryUp {
        /// Pointer position.
        screen: Vec2,
    },
    /// Pointer moved, with or without a button held.
    PointerMoved {
        /// Pointer position.
        screen: Vec2,
    },
    /// Secondary button pressed: move/attack, or cancel placement.
    SecondaryDown {
        /// Pointer position.
        screen: Vec2,
    },
    /// Rotate the placement preview.
    RotatePressed,
    /// Cancel the placement preview.
    CancelPressed,
    /// Choose the formation used for group moves.
    FormationPressed(FormationType),
}

/// FIFO of pending input events.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event.
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Remove and return every event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<InputEvent> for InputQueue {
    fn extend<T: IntoIterator<Item = InputEvent>>(&mut self, iter: T) {
        self.events.extend(iter);
    }
}

/// What a screen position hits in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pick {
    /// A unit.
    Unit(EntityId),
    /// A building.
    Building(EntityId),
    /// Ground at `point` with surface `normal`.
    Ground {
        /// Hit point.
        point: Vec3,
        /// Surface normal.
        normal: Vec3,
    },
    /// Nothing (sky, off-map).
    Nothing,
}

/// Screen-to-world and world-to-screen through the active camera.
pub trait ScreenPicker {
    /// Cast through `screen` and report the nearest hit.
    fn pick(&self, screen: Vec2) -> Pick;

    /// Cast through `screen` against ground only, ignoring entities.
    ///
    /// Defaults to [`pick`](Self::pick) filtered to ground hits.
    fn pick_ground(&self, screen: Vec2) -> Option<(Vec3, Vec3)> {
        match self.pick(screen) {
            Pick::Ground { point, normal } => Some((point, normal)),
            _ => None,
        }
    }

    /// Screen position of a world point, or `None` when off screen or
    /// behind the camera.
    fn project(&self, world: Vec3) -> Option<Vec2>;
}
