//! The owning game loop.
//!
//! A [`Session`] owns every piece of core state and advances it one frame
//! at a time. Frontends feed it input events, a [`ScreenPicker`] for the
//! active camera and a [`FeedbackSink`] for presentation; nothing here
//! renders, plays audio or reads devices.
//!
//! Each [`Session::tick`] runs, in order:
//!
//! 1. input routing (placement preview, or selection and commands)
//! 2. construction jobs, registering finished entities
//! 3. resource production of constructed buildings
//! 4. unit movement
//! 5. combat, removing the dead
//! 6. notification flush (resources, selection, markers, motion)
//!
//! # Example
//!
//! ```
//! use glam::{Vec2, Vec3};
//! use zombie_core::prelude::*;
//! use zombie_core::spatial::HeightField;
//!
//! struct Overhead;
//!
//! impl ScreenPicker for Overhead {
//!     fn pick(&self, screen: Vec2) -> Pick {
//!         Pick::Ground { point: Vec3::new(screen.x, 0.0, screen.y), normal: Vec3::Y }
//!     }
//!
//!     fn project(&self, world: Vec3) -> Option<Vec2> {
//!         Some(Vec2::new(world.x, world.z))
//!     }
//! }
//!
//! let mut session = Session::new(
//!     CoreConfig::default(),
//!     BlueprintRegistry::new(),
//!     HeightField::flat(100.0, 0.0)?,
//! )?;
//! let mut input = InputQueue::new();
//! input.push(InputEvent::PrimaryDown { screen: Vec2::new(5.0, 5.0), modifier: false });
//! let report = session.tick(1.0 / 60.0, &mut input, &Overhead, &mut NullFeedback);
//! assert_eq!(report.tick, 1);
//! # Ok::<(), zombie_core::error::GameError>(())
//! ```

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

use crate::combat::{combat_system, CombatEvent};
use crate::commands::{CommandDispatcher, FormationType, MotionChanged};
use crate::components::{Entity, EntityId, EntityKind, Faction, Transform};
use crate::config::CoreConfig;
use crate::construction::{BuildDescriptor, CompletionFn, ConstructionScheduler, JobId};
use crate::data::BlueprintRegistry;
use crate::economy::ResourceLedger;
use crate::error::{GameError, Result};
use crate::feedback::{FeedbackSink, SoundEffect};
use crate::grid::GridSnapper;
use crate::input::{InputEvent, InputQueue, Pick, ScreenPicker};
use crate::math::{seconds, yaw_rotation};
use crate::placement::{ground_alignment, PlacementContext, PlacementPreview};
use crate::save::SaveGame;
use crate::selection::{ClickOutcome, ClickTarget, DragSelect, SelectionSet};
use crate::spatial::{ColliderId, GroundHit, HeightField, LayerMask, Obb, SpatialQuery, Terrain};
use crate::world::World;

/// Distance in front of a training building at which units appear.
pub const SPAWN_CLEARANCE: f32 = 2.0;

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Entities registered by finished construction jobs.
    pub spawned: Vec<EntityId>,
    /// Production cycles completed by buildings.
    pub production_cycles: u32,
    /// Combat events in attacker order.
    pub combat: Vec<CombatEvent>,
}

/// All core state for one game.
#[derive(Debug)]
pub struct Session {
    config: CoreConfig,
    registry: BlueprintRegistry,
    snapper: GridSnapper,
    world: World,
    terrain: Terrain,
    ledger: ResourceLedger,
    selection: SelectionSet,
    drag: DragSelect,
    dispatcher: CommandDispatcher,
    scheduler: ConstructionScheduler,
    preview: Option<PlacementPreview>,
    cursor: Option<GroundHit>,
    player_position: Vec3,
    /// Reserved footprints of buildings under construction.
    sites: BTreeMap<JobId, ColliderId>,
    destination_shown: bool,
    tick: u64,
}

impl Session {
    /// Create a session on `ground` with the configured starting resources.
    pub fn new(config: CoreConfig, registry: BlueprintRegistry, ground: HeightField) -> Result<Self> {
        config.check()?;
        let snapper = GridSnapper::from_config(&config.grid)?;
        let terrain = Terrain::new(ground, config.placement.probe_height, config.placement.probe_distance);
        let ledger = ResourceLedger::with_amounts(
            config
                .starting_resources
                .iter()
                .map(|(name, amount)| (name.clone(), *amount)),
        );
        tracing::info!(
            buildings = registry.buildings().count(),
            units = registry.units().count(),
            "Session started"
        );
        Ok(Self {
            drag: DragSelect::from_config(&config.selection),
            dispatcher: CommandDispatcher::new(config.commands),
            config,
            registry,
            snapper,
            world: World::new(),
            terrain,
            ledger,
            selection: SelectionSet::new(),
            scheduler: ConstructionScheduler::new(),
            preview: None,
            cursor: None,
            player_position: Vec3::ZERO,
            sites: BTreeMap::new(),
            destination_shown: false,
            tick: 0,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Loaded blueprints.
    #[must_use]
    pub const fn registry(&self) -> &BlueprintRegistry {
        &self.registry
    }

    /// Live entities.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Ground and colliders.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Mutable ground and colliders, for adding static obstacles.
    pub fn terrain_mut(&mut self) -> &mut Terrain {
        &mut self.terrain
    }

    /// Resource counters.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Running construction jobs.
    #[must_use]
    pub const fn scheduler(&self) -> &ConstructionScheduler {
        &self.scheduler
    }

    /// Active placement preview, if any.
    #[must_use]
    pub const fn preview(&self) -> Option<&PlacementPreview> {
        self.preview.as_ref()
    }

    /// Formation used for group moves.
    #[must_use]
    pub const fn formation(&self) -> FormationType {
        self.dispatcher.formation()
    }

    /// Player avatar position used by the placement distance rule.
    #[must_use]
    pub const fn player_position(&self) -> Vec3 {
        self.player_position
    }

    /// Move the player avatar.
    pub fn set_player_position(&mut self, position: Vec3) {
        self.player_position = position;
    }

    /// Number of ticks run.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Register a finished building: world entry plus collider.
    pub fn spawn_building(&mut self, entity: Entity) -> EntityId {
        let shape = entity.obb();
        let id = self.world.insert(entity);
        self.terrain.colliders.insert(shape, LayerMask::BUILDING, Some(id));
        id
    }

    /// Register a unit.
    pub fn spawn_unit(&mut self, entity: Entity) -> EntityId {
        self.world.insert(entity)
    }

    /// Place a blueprint building directly, aligned to the ground and
    /// skipping placement rules, costs and construction time.
    pub fn place_building_now(&mut self, building_id: &str, position: Vec3, yaw: f32, faction: Faction) -> Result<EntityId> {
        let data = self
            .registry
            .building(building_id)
            .ok_or_else(|| GameError::UnknownBlueprint(building_id.to_string()))?;
        let transform = self.grounded_transform(position, yaw);
        let entity = Entity::building(data, transform, faction);
        Ok(self.spawn_building(entity))
    }

    /// Spawn a blueprint unit immediately.
    pub fn spawn_unit_now(&mut self, unit_id: &str, position: Vec3, faction: Faction) -> Result<EntityId> {
        let data = self
            .registry
            .unit(unit_id)
            .ok_or_else(|| GameError::UnknownBlueprint(unit_id.to_string()))?;
        let entity = Entity::unit(data, self.grounded(position), faction);
        Ok(self.spawn_unit(entity))
    }

    fn grounded(&self, position: Vec3) -> Vec3 {
        self.terrain
            .ground_hit(position)
            .map_or(position, |hit| hit.point)
    }

    fn grounded_transform(&self, position: Vec3, yaw: f32) -> Transform {
        match self.terrain.ground_hit(position) {
            Some(hit) => Transform {
                position: hit.point,
                yaw,
                tilt: ground_alignment(hit.normal),
            },
            None => Transform::new(position, yaw),
        }
    }

    // ========================================================================
    // Building placement
    // ========================================================================

    /// Start previewing a building under the cursor.
    ///
    /// Refused with an error click when the building is unaffordable. Any
    /// existing preview is replaced.
    pub fn begin_placement(&mut self, building_id: &str, feedback: &mut dyn FeedbackSink) -> Result<()> {
        let data = self
            .registry
            .building(building_id)
            .ok_or_else(|| GameError::UnknownBlueprint(building_id.to_string()))?;
        if let Err(err) = self.ledger.check(&data.costs) {
            feedback.play(SoundEffect::ErrorClick);
            return Err(err);
        }
        feedback.play(SoundEffect::ClickOnBuilding);
        let preview = PlacementPreview::new(data);

        // Abandon any drag in progress.
        self.drag.release(Vec2::ZERO);
        self.preview = Some(preview);
        self.refresh_preview(feedback);
        tracing::debug!(building = building_id, "Placement started");
        Ok(())
    }

    /// Whether a placement preview is active.
    #[must_use]
    pub const fn is_placing(&self) -> bool {
        self.preview.is_some()
    }

    /// Discard the active preview. Returns whether one was active.
    pub fn cancel_placement(&mut self, feedback: &mut dyn FeedbackSink) -> bool {
        let cancelled = self
            .preview
            .take()
            .is_some_and(|mut preview| preview.cancel(feedback));
        if cancelled {
            tracing::debug!("Placement cancelled");
        }
        cancelled
    }

    /// Commit the preview: validate, pay, then start construction.
    ///
    /// On any failure the preview stays active for another attempt and
    /// nothing is paid.
    pub fn confirm_placement(&mut self, feedback: &mut dyn FeedbackSink) -> Result<JobId> {
        let Some(preview) = self.preview.as_mut() else {
            return Err(GameError::NoGroundUnderCursor);
        };
        let ctx = PlacementContext {
            snapper: &self.snapper,
            rules: &self.config.placement,
            player_position: self.player_position,
            spatial: &self.terrain,
        };

        if let Err(err) = self.ledger.check(preview.costs()) {
            feedback.play(SoundEffect::ErrorClick);
            tracing::debug!(building = preview.blueprint(), %err, "Placement unaffordable");
            return Err(err);
        }
        let placed = preview.confirm(&ctx, feedback)?;
        self.preview = None;
        self.ledger.try_deduct(&placed.costs)?;

        let data = self
            .registry
            .building(&placed.blueprint)
            .cloned()
            .ok_or_else(|| GameError::UnknownBlueprint(placed.blueprint.clone()))?;
        let rotation = placed.tilt * yaw_rotation(placed.yaw);
        let site = self.terrain.colliders.insert(
            Obb::new(placed.position, placed.half_extents, rotation),
            LayerMask::BUILDING,
            None,
        );

        let descriptor = BuildDescriptor {
            kind: EntityKind::Building,
            blueprint: placed.blueprint.clone(),
            position: placed.position,
            yaw: placed.yaw,
            tilt: placed.tilt,
            slot: None,
        };
        let duration = seconds(data.build_time);
        let on_complete: CompletionFn = Box::new(move |d: &BuildDescriptor| {
            Entity::building(
                &data,
                Transform {
                    position: d.position,
                    yaw: d.yaw,
                    tilt: d.tilt,
                },
                Faction::Player,
            )
        });
        let job = self.scheduler.begin_job(descriptor, duration, on_complete);
        self.sites.insert(job, site);
        tracing::info!(
            building = %placed.blueprint,
            position = ?placed.position,
            yaw = placed.yaw,
            "Building placed"
        );
        Ok(job)
    }

    /// Rotate the preview by one step and re-validate in place.
    pub fn rotate_placement(&mut self, feedback: &mut dyn FeedbackSink) {
        if let Some(preview) = self.preview.as_mut() {
            preview.rotate(feedback);
            self.refresh_preview(feedback);
        }
    }

    fn refresh_preview(&mut self, feedback: &mut dyn FeedbackSink) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        let ctx = PlacementContext {
            snapper: &self.snapper,
            rules: &self.config.placement,
            player_position: self.player_position,
            spatial: &self.terrain,
        };
        let state = preview.update(self.cursor, &ctx);
        feedback.placement_preview(state, preview.position());
    }

    /// Demolish a building and refund its blueprint costs.
    pub fn remove_building(&mut self, id: EntityId, feedback: &mut dyn FeedbackSink) -> Result<()> {
        let entity = match self.world.get(id) {
            Some(entity) if entity.is_building() => entity,
            _ => return Err(GameError::EntityNotFound(id)),
        };
        if let Some(data) = self.registry.building(&entity.blueprint) {
            self.ledger.refund(&data.costs);
        }
        let blueprint = entity.blueprint.clone();
        self.world.remove(id);
        self.terrain.colliders.remove_owned_by(id);
        if self.selection.remove_entity(id) {
            feedback.play(SoundEffect::CloseUIBuilding);
        }
        tracing::info!(building = id, %blueprint, "Building removed");
        Ok(())
    }

    // ========================================================================
    // Unit purchase
    // ========================================================================

    /// Pay for a unit and start training it at `spawn`.
    pub fn purchase_unit(&mut self, unit_id: &str, spawn: Vec3, feedback: &mut dyn FeedbackSink) -> Result<JobId> {
        let data = self
            .registry
            .unit(unit_id)
            .cloned()
            .ok_or_else(|| GameError::UnknownBlueprint(unit_id.to_string()))?;
        if let Err(err) = self.ledger.try_deduct(&data.costs) {
            feedback.play(SoundEffect::ErrorClick);
            tracing::debug!(unit = unit_id, %err, "Not enough resources");
            return Err(err);
        }
        feedback.play(SoundEffect::ClickOnBuilding);

        let descriptor = BuildDescriptor::new(EntityKind::Unit, unit_id, self.grounded(spawn));
        let duration = seconds(data.build_time);
        let on_complete: CompletionFn =
            Box::new(move |d: &BuildDescriptor| Entity::unit(&data, d.position, Faction::Player));
        let job = self.scheduler.begin_job(descriptor, duration, on_complete);
        tracing::info!(unit = unit_id, job = job.0, "Unit purchased");
        Ok(job)
    }

    /// Purchase a unit from a building that trains it, spawning in front
    /// of the building.
    pub fn train_unit(&mut self, building: EntityId, unit_id: &str, feedback: &mut dyn FeedbackSink) -> Result<JobId> {
        let entity = self.world.get(building).ok_or(GameError::EntityNotFound(building))?;
        if !entity.is_building() {
            return Err(GameError::InvalidSelectionTarget);
        }
        let trains = self
            .registry
            .building(&entity.blueprint)
            .is_some_and(|data| data.can_train(unit_id));
        if !trains {
            feedback.play(SoundEffect::ErrorClick);
            return Err(GameError::UnknownBlueprint(unit_id.to_string()));
        }
        let forward = yaw_rotation(entity.transform.yaw) * Vec3::Z;
        let spawn = entity.position() + forward * (entity.footprint.half_extents.z + SPAWN_CLEARANCE);
        self.purchase_unit(unit_id, spawn, feedback)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the game by `dt` seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &mut InputQueue,
        picker: &dyn ScreenPicker,
        feedback: &mut dyn FeedbackSink,
    ) -> TickReport {
        self.tick += 1;
        let step = seconds(dt);
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        let mut motion: Vec<MotionChanged> = Vec::new();

        for event in input.drain() {
            if self.preview.is_some() {
                self.handle_placement_input(event, picker, feedback);
            } else {
                motion.extend(self.handle_input(event, picker, feedback));
            }
        }

        for done in self.scheduler.tick(step, feedback) {
            if let Some(site) = self.sites.remove(&done.job) {
                self.terrain.colliders.remove(site);
            }
            let id = match done.descriptor.kind {
                EntityKind::Building => self.spawn_building(done.entity),
                EntityKind::Unit => self.spawn_unit(done.entity),
            };
            report.spawned.push(id);
        }

        for id in self.world.ids_of_kind(EntityKind::Building) {
            let Some(state) = self.world.get_mut(id).and_then(|e| e.building.as_mut()) else {
                continue;
            };
            for producer in &mut state.producers {
                report.production_cycles += producer.tick(step, &mut self.ledger);
            }
        }

        motion.extend(self.dispatcher.update_motion(&mut self.world, &self.terrain, dt));

        let combat = combat_system(&mut self.world, &self.config.combat, step);
        for victim in combat.killed() {
            self.terrain.colliders.remove_owned_by(victim);
            self.selection.remove_entity(victim);
        }
        motion.extend(combat.motion.iter().copied());
        report.combat = combat.events;

        self.flush(&motion, feedback);
        report
    }

    fn flush(&mut self, motion: &[MotionChanged], feedback: &mut dyn FeedbackSink) {
        if !self.ledger.drain_changes().is_empty() {
            feedback.resources_changed(&self.ledger.snapshot());
        }
        for change in self.selection.drain_changes() {
            feedback.selection_changed(&change);
        }
        for (entity, shown) in self.selection.drain_markers() {
            feedback.show_selection(entity, shown);
        }
        for change in motion {
            feedback.motion_changed(change.entity, change.state);
        }

        if self.destination_shown {
            let any_commanded = self
                .world
                .iter()
                .any(|(_, e)| e.unit.as_ref().is_some_and(|u| u.motion.commanded));
            if !any_commanded {
                self.destination_shown = false;
                feedback.show_destination(None);
            }
        }
    }

    // ========================================================================
    // Input routing
    // ========================================================================

    fn handle_placement_input(&mut self, event: InputEvent, picker: &dyn ScreenPicker, feedback: &mut dyn FeedbackSink) {
        match event {
            InputEvent::PointerMoved { screen } => {
                self.cursor = picker
                    .pick_ground(screen)
                    .map(|(point, normal)| GroundHit { point, normal });
                self.refresh_preview(feedback);
            }
            InputEvent::PrimaryDown { screen, .. } => {
                self.cursor = picker
                    .pick_ground(screen)
                    .map(|(point, normal)| GroundHit { point, normal });
                self.refresh_preview(feedback);
                if let Err(err) = self.confirm_placement(feedback) {
                    tracing::debug!(%err, "Placement not confirmed");
                }
            }
            InputEvent::SecondaryDown { .. } | InputEvent::CancelPressed => {
                self.cancel_placement(feedback);
            }
            InputEvent::RotatePressed => self.rotate_placement(feedback),
            InputEvent::FormationPressed(formation) => self.dispatcher.set_formation(formation),
            InputEvent::PrimaryUp { .. } => {}
        }
    }

    fn handle_input(
        &mut self,
        event: InputEvent,
        picker: &dyn ScreenPicker,
        feedback: &mut dyn FeedbackSink,
    ) -> Vec<MotionChanged> {
        match event {
            InputEvent::PrimaryDown { screen, modifier } => {
                self.drag.press(screen);
                self.click(picker.pick(screen), modifier, feedback);
                Vec::new()
            }
            InputEvent::PointerMoved { screen } => {
                if self.drag.moved(screen) {
                    if let Some(rect) = self.drag.rect() {
                        let projected = self.projected_units(picker);
                        self.selection.select_in_region(rect, &projected);
                    }
                }
                Vec::new()
            }
            InputEvent::PrimaryUp { screen } => {
                if let Some(rect) = self.drag.release(screen) {
                    let projected = self.projected_units(picker);
                    self.selection.select_in_region(rect, &projected);
                }
                Vec::new()
            }
            InputEvent::SecondaryDown { screen } => self.command(screen, picker, feedback),
            InputEvent::FormationPressed(formation) => {
                self.dispatcher.set_formation(formation);
                let units = self.selection.units().to_vec();
                self.dispatcher.regroup(&units, &mut self.world)
            }
            InputEvent::RotatePressed | InputEvent::CancelPressed => Vec::new(),
        }
    }

    fn click(&mut self, pick: Pick, modifier: bool, feedback: &mut dyn FeedbackSink) {
        let target = match pick {
            Pick::Unit(id) => match self.world.get(id) {
                Some(e) if e.faction == Faction::Player && e.selectable => ClickTarget::Unit(id),
                Some(_) => return,
                None => ClickTarget::Empty,
            },
            Pick::Building(id) => match self.world.get(id) {
                Some(e) if e.faction == Faction::Player => ClickTarget::Building {
                    id,
                    selectable: e.selectable && e.placement.is_fixed(),
                },
                Some(_) => return,
                None => ClickTarget::Empty,
            },
            Pick::Ground { .. } | Pick::Nothing => ClickTarget::Empty,
        };

        let had_building = self.selection.building().is_some();
        match self.selection.click(target, modifier) {
            ClickOutcome::SelectedUnit | ClickOutcome::Toggled { selected: true } => {
                if had_building {
                    feedback.play(SoundEffect::CloseUIBuilding);
                }
                feedback.play(SoundEffect::ClickOnBuilding);
            }
            ClickOutcome::SelectedBuilding => {
                feedback.play(SoundEffect::ClickOnBuilding);
                feedback.play(SoundEffect::ShowUIBuilding);
            }
            ClickOutcome::Cleared => {
                if had_building {
                    feedback.play(SoundEffect::CloseUIBuilding);
                }
                feedback.play(SoundEffect::ClickOnEmpty);
            }
            ClickOutcome::Toggled { selected: false } | ClickOutcome::AlreadySelected | ClickOutcome::Ignored => {}
        }
    }

    fn command(&mut self, screen: Vec2, picker: &dyn ScreenPicker, feedback: &mut dyn FeedbackSink) -> Vec<MotionChanged> {
        let units = self.selection.units().to_vec();
        if units.is_empty() {
            return Vec::new();
        }

        let hostile = match picker.pick(screen) {
            Pick::Unit(id) | Pick::Building(id) => self
                .world
                .get(id)
                .filter(|e| e.faction.is_attackable())
                .map(|e| e.id),
            Pick::Ground { .. } | Pick::Nothing => None,
        };
        if let Some(target) = hostile {
            match self.dispatcher.issue_attack(target, &units, &mut self.world) {
                Ok(_) => return Vec::new(),
                Err(err) => tracing::debug!(%err, "Attack not issued"),
            }
        }

        let Some((point, _)) = picker.pick_ground(screen) else {
            return Vec::new();
        };
        let changes = self.dispatcher.command_move(point, &units, &mut self.world);
        feedback.show_destination(Some(point));
        self.destination_shown = true;
        changes
    }

    fn projected_units(&self, picker: &dyn ScreenPicker) -> Vec<(EntityId, Vec2)> {
        self.world
            .ids_of_kind(EntityKind::Unit)
            .into_iter()
            .filter_map(|id| self.world.get(id))
            .filter(|e| e.faction == Faction::Player && e.selectable)
            .filter_map(|e| picker.project(e.position()).map(|screen| (e.id, screen)))
            .collect()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Capture buildings, units and resources.
    #[must_use]
    pub fn save(&self) -> SaveGame {
        SaveGame::capture(&self.world, &self.ledger)
    }

    /// Replace the world and ledger with `save`.
    ///
    /// Running jobs, the preview, the cursor, any drag and the selection are
    /// discarded. A destination marker still shown is hidden on the next
    /// tick, since no loaded unit carries a move order. Records naming
    /// unknown blueprints are skipped with a warning.
    pub fn load(&mut self, save: &SaveGame) {
        for id in self.world.sorted_ids() {
            self.terrain.colliders.remove_owned_by(id);
        }
        for (_, site) in std::mem::take(&mut self.sites) {
            self.terrain.colliders.remove(site);
        }
        self.world = World::new();
        self.scheduler = ConstructionScheduler::new();
        self.preview = None;
        self.cursor = None;
        self.drag.release(Vec2::ZERO);
        self.selection = SelectionSet::new();
        self.ledger = save.ledger();

        for record in &save.buildings {
            let Some(data) = self.registry.building(&record.kind_id) else {
                tracing::warn!(building = %record.kind_id, "Unknown building in save, skipped");
                continue;
            };
            let mut entity = Entity::building(data, self.grounded_transform(record.position, record.yaw), record.faction);
            entity.transform.position = record.position;
            entity.health.current = record.health.min(entity.health.max);
            self.spawn_building(entity);
        }
        for record in &save.units {
            let Some(data) = self.registry.unit(&record.kind_id) else {
                tracing::warn!(unit = %record.kind_id, "Unknown unit in save, skipped");
                continue;
            };
            let mut entity = Entity::unit(data, record.position, record.faction);
            entity.transform.yaw = record.yaw;
            entity.health.current = record.health.min(entity.health.max);
            self.spawn_unit(entity);
        }
        tracing::info!(entities = self.world.len(), "Save restored");
    }
}
