//! Data structures for building and unit configuration.
//!
//! These are plain immutable definitions deserialized from RON files at
//! startup. [`BlueprintRegistry`] indexes them by string id.

mod building_data;
mod registry;
mod unit_data;

pub use building_data::BuildingData;
pub use registry::{BlueprintRegistry, GameData};
pub use unit_data::{CombatStats, UnitData};
