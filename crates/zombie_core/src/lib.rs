//! # Zombie Core
//!
//! Placement, selection, economy and construction core for ZombieRTS.
//!
//! This crate contains **only** game rules:
//! - No rendering
//! - No audio playback
//! - No device input
//! - No file IO outside [`save`]
//!
//! Frontends drive a [`session::Session`] once per frame, feeding it
//! [`input::InputEvent`]s and a [`input::ScreenPicker`], and receive
//! everything presentable through a [`feedback::FeedbackSink`].
//!
//! ## Crate Structure
//!
//! - [`session`] - The owning per-frame loop
//! - [`placement`] - Building preview and placement rules
//! - [`selection`] - Unit and building selection
//! - [`commands`] - Move/attack orders and unit movement
//! - [`construction`] - Timed build jobs
//! - [`economy`] - Resource ledger and production
//! - [`combat`] - Target acquisition and damage
//! - [`spatial`] - Ground queries and collider overlap
//! - [`data`] / [`config`] - RON-loaded blueprints and tunables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod construction;
pub mod data;
pub mod economy;
pub mod error;
pub mod feedback;
pub mod grid;
pub mod input;
pub mod math;
pub mod placement;
pub mod save;
pub mod selection;
pub mod session;
pub mod spatial;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::CombatEvent;
    pub use crate::commands::{CommandDispatcher, FormationType, MotionChanged};
    pub use crate::components::*;
    pub use crate::config::CoreConfig;
    pub use crate::construction::{BuildDescriptor, ConstructionScheduler, JobId};
    pub use crate::data::{BlueprintRegistry, BuildingData, CombatStats, UnitData};
    pub use crate::economy::{ResourceCost, ResourceLedger, ResourceProduction};
    pub use crate::error::{GameError, Result};
    pub use crate::feedback::{FeedbackSink, NullFeedback, SoundEffect};
    pub use crate::grid::GridSnapper;
    pub use crate::input::{InputEvent, InputQueue, Pick, ScreenPicker};
    pub use crate::math::{Fixed, ScreenRect};
    pub use crate::placement::{PlacementPreview, PlacementRejection};
    pub use crate::save::SaveGame;
    pub use crate::selection::{SelectionChanged, SelectionSet};
    pub use crate::session::{Session, TickReport};
    pub use crate::spatial::{LayerMask, SpatialQuery, Terrain};
    pub use crate::world::World;
}
