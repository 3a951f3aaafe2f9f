//! Selection state: which units or which building the player has picked.
//!
//! Units and buildings are mutually exclusive: selecting a building clears
//! the units and vice versa, and at most one building is selected at a
//! time. The set only stores ids and never owns or destroys entities.
//!
//! Every state change queues one [`SelectionChanged`]; calls that change
//! nothing queue nothing. Consumers drain the queue once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::config::SelectionConfig;
use crate::math::ScreenRect;

/// The selection after a change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionChanged {
    /// Selected units in selection order.
    pub units: Vec<EntityId>,
    /// Selected building, if any.
    pub building: Option<EntityId>,
}

impl SelectionChanged {
    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.building.is_none()
    }
}

/// What a primary click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// A unit.
    Unit(EntityId),
    /// A building and whether it accepts selection.
    Building {
        /// Building id.
        id: EntityId,
        /// Buildings still being placed are not selectable.
        selectable: bool,
    },
    /// Ground or nothing at all.
    Empty,
}

/// Result of routing a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A unit was added to or removed from the selection.
    Toggled {
        /// Whether the unit is now selected.
        selected: bool,
    },
    /// The clicked unit is now the only selection.
    SelectedUnit,
    /// The clicked building is now selected.
    SelectedBuilding,
    /// The clicked building was already selected.
    AlreadySelected,
    /// The selection was cleared.
    Cleared,
    /// Nothing happened.
    Ignored,
}

/// Currently selected units or building.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    units: Vec<EntityId>,
    building: Option<EntityId>,
    changes: Vec<SelectionChanged>,
    markers: Vec<(EntityId, bool)>,
}

impl SelectionSet {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected units in selection order.
    #[must_use]
    pub fn units(&self) -> &[EntityId] {
        &self.units
    }

    /// Selected building.
    #[must_use]
    pub const fn building(&self) -> Option<EntityId> {
        self.building
    }

    /// Whether `id` is selected, as a unit or as the building.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.building == Some(id) || self.units.contains(&id)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.building.is_none()
    }

    /// Clear everything, then select `unit`.
    pub fn select_single(&mut self, unit: EntityId) {
        if self.units == [unit] && self.building.is_none() {
            return;
        }
        self.clear_silently();
        self.add_unit(unit);
        self.notify();
    }

    /// Deselect `unit` if selected, otherwise add it.
    ///
    /// Returns whether the unit is selected afterwards.
    pub fn toggle(&mut self, unit: EntityId) -> bool {
        let selected = if self.units.contains(&unit) {
            self.remove_unit(unit);
            false
        } else {
            self.clear_building();
            self.add_unit(unit);
            true
        };
        self.notify();
        selected
    }

    /// Make the selection exactly the candidates whose screen position lies
    /// inside `region`.
    ///
    /// `projected` lists on-screen units with their screen positions; the
    /// new selection keeps that order. Previously selected units outside the
    /// region are deselected, so an empty region clears the units.
    pub fn select_in_region(&mut self, region: ScreenRect, projected: &[(EntityId, Vec2)]) {
        let mut inside: Vec<EntityId> = Vec::new();
        for (id, screen) in projected {
            if region.contains(*screen) && !inside.contains(id) {
                inside.push(*id);
            }
        }

        let building_cleared = !inside.is_empty() && self.building.is_some();
        if inside == self.units && !building_cleared {
            return;
        }

        if building_cleared {
            self.clear_building();
        }
        for id in self.units.clone() {
            if !inside.contains(&id) {
                self.markers.push((id, false));
            }
        }
        for id in &inside {
            if !self.units.contains(id) {
                self.markers.push((*id, true));
            }
        }
        self.units = inside;
        self.notify();
    }

    /// Select `building`, clearing any units or other building.
    ///
    /// Returns `false` if it was already the selection.
    pub fn select_building(&mut self, building: EntityId) -> bool {
        if self.building == Some(building) {
            return false;
        }
        self.clear_silently();
        self.building = Some(building);
        self.markers.push((building, true));
        self.notify();
        true
    }

    /// Deselect one entity. Returns whether it was selected.
    pub fn deselect(&mut self, id: EntityId) -> bool {
        let removed = if self.building == Some(id) {
            self.clear_building();
            true
        } else if self.units.contains(&id) {
            self.remove_unit(id);
            true
        } else {
            false
        };
        if removed {
            self.notify();
        }
        removed
    }

    /// Forget an entity that left the world.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.deselect(id)
    }

    /// Deselect everything. Returns whether anything was selected.
    pub fn clear_all(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.clear_silently();
        self.notify();
        true
    }

    /// Apply the click rules for `target`.
    ///
    /// - unit with modifier: toggle
    /// - unit: select only that unit
    /// - selectable building: select it unless it already is
    /// - empty space: clear all, unless the modifier is held
    pub fn click(&mut self, target: ClickTarget, modifier: bool) -> ClickOutcome {
        match target {
            ClickTarget::Unit(id) if modifier => ClickOutcome::Toggled {
                selected: self.toggle(id),
            },
            ClickTarget::Unit(id) => {
                self.select_single(id);
                ClickOutcome::SelectedUnit
            }
            ClickTarget::Building { selectable: false, .. } => ClickOutcome::Ignored,
            ClickTarget::Building { id, .. } => {
                if self.select_building(id) {
                    ClickOutcome::SelectedBuilding
                } else {
                    ClickOutcome::AlreadySelected
                }
            }
            ClickTarget::Empty if modifier => ClickOutcome::Ignored,
            ClickTarget::Empty => {
                if self.clear_all() {
                    ClickOutcome::Cleared
                } else {
                    ClickOutcome::Ignored
                }
            }
        }
    }

    /// Take queued change notifications, oldest first.
    pub fn drain_changes(&mut self) -> Vec<SelectionChanged> {
        std::mem::take(&mut self.changes)
    }

    /// Take queued marker toggles `(entity, shown)`, oldest first.
    pub fn drain_markers(&mut self) -> Vec<(EntityId, bool)> {
        std::mem::take(&mut self.markers)
    }

    fn add_unit(&mut self, unit: EntityId) {
        self.units.push(unit);
        self.markers.push((unit, true));
    }

    fn remove_unit(&mut self, unit: EntityId) {
        self.units.retain(|u| *u != unit);
        self.markers.push((unit, false));
    }

    fn clear_building(&mut self) {
        if let Some(building) = self.building.take() {
            self.markers.push((building, false));
        }
    }

    fn clear_silently(&mut self) {
        self.clear_building();
        for unit in std::mem::take(&mut self.units) {
            self.markers.push((unit, false));
        }
    }

    fn notify(&mut self) {
        self.changes.push(SelectionChanged {
            units: self.units.clone(),
            building: self.building,
        });
    }
}

// ============================================================================
// Drag tracking
// ============================================================================

/// Tracks a primary-button press and whether it has become a drag.
#[derive(Debug, Clone)]
pub struct DragSelect {
    threshold: f32,
    start: Option<Vec2>,
    current: Vec2,
    dragging: bool,
}

impl DragSelect {
    /// Create a tracker with the given pixel threshold.
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
            start: None,
            current: Vec2::ZERO,
            dragging: false,
        }
    }

    /// Create a tracker from configuration.
    #[must_use]
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.drag_threshold)
    }

    /// Button pressed at `position`.
    pub fn press(&mut self, position: Vec2) {
        self.start = Some(position);
        self.current = position;
        self.dragging = false;
    }

    /// Pointer moved. Returns whether a drag is in progress.
    pub fn moved(&mut self, position: Vec2) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        self.current = position;
        if !self.dragging && position.distance(start) > self.threshold {
            self.dragging = true;
        }
        self.dragging
    }

    /// Button released. Returns the final rectangle if this was a drag.
    pub fn release(&mut self, position: Vec2) -> Option<ScreenRect> {
        self.moved(position);
        let rect = self.rect();
        self.start = None;
        self.dragging = false;
        rect
    }

    /// Whether the button is held.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.start.is_some()
    }

    /// Whether the press has become a drag.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Current drag rectangle, while dragging.
    #[must_use]
    pub fn rect(&self) -> Option<ScreenRect> {
        match (self.start, self.dragging) {
            (Some(start), true) => Some(ScreenRect::from_corners(start, self.current)),
            _ => None,
        }
    }
}

impl Default for DragSelect {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}
