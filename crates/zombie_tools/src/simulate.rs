//! Headless scripted sessions.
//!
//! Runs a [`Session`] on flat ground with a straight-down camera: every
//! affordable building is placed on a ring around the player through the
//! regular input path and every trainable unit is purchased once. Rocks
//! ring the base and an optional hostile wave spawns at the map edge.

use glam::{Vec2, Vec3};
use zombie_core::combat::CombatEvent;
use zombie_core::components::Faction;
use zombie_core::config::CoreConfig;
use zombie_core::data::BlueprintRegistry;
use zombie_core::feedback::{FeedbackSink, SoundEffect};
use zombie_core::input::{InputEvent, InputQueue, Pick, ScreenPicker};
use zombie_core::save::SaveGame;
use zombie_core::session::Session;
use zombie_core::spatial::{HeightField, LayerMask, Obb};

use crate::validate::ToolError;

/// Half size of the simulated map.
pub const MAP_HALF_SIZE: f32 = 150.0;

/// Radius of the building ring around the player.
pub const RING_RADIUS: f32 = 24.0;

/// Radius of the scenery ring outside the base.
pub const SCENERY_RADIUS: f32 = 60.0;

/// Rocks placed on the scenery ring.
pub const ROCKS: usize = 12;

/// Script parameters.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Number of ticks to run.
    pub ticks: u64,
    /// Seconds per tick.
    pub dt: f32,
    /// Hostile units spawned at the map edge on the first tick.
    pub hostiles: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            ticks: 600,
            dt: 1.0 / 20.0,
            hostiles: 0,
        }
    }
}

/// What the script achieved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationSummary {
    /// Placements confirmed.
    pub placed: usize,
    /// Placements refused (rules or resources).
    pub refused: usize,
    /// Units purchased.
    pub purchased: usize,
    /// Entities produced by construction.
    pub spawned: usize,
    /// Production cycles completed.
    pub production_cycles: u32,
    /// Entities destroyed in combat.
    pub kills: usize,
    /// Final state.
    pub save: Option<SaveGame>,
}

struct Overhead {
    ground: HeightField,
}

impl ScreenPicker for Overhead {
    fn pick(&self, screen: Vec2) -> Pick {
        self.pick_ground(screen)
            .map_or(Pick::Nothing, |(point, normal)| Pick::Ground { point, normal })
    }

    fn pick_ground(&self, screen: Vec2) -> Option<(Vec3, Vec3)> {
        let height = self.ground.height_at(screen.x, screen.y)?;
        Some((Vec3::new(screen.x, height, screen.y), self.ground.normal_at(screen.x, screen.y)?))
    }

    fn project(&self, world: Vec3) -> Option<Vec2> {
        Some(Vec2::new(world.x, world.z))
    }
}

#[derive(Default)]
struct Tally {
    placed: usize,
    refused: usize,
}

impl FeedbackSink for Tally {
    fn play(&mut self, effect: SoundEffect) {
        match effect {
            SoundEffect::PlaceBuilding => self.placed += 1,
            SoundEffect::ErrorClick => self.refused += 1,
            _ => {}
        }
    }
}

/// Run the scripted session.
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn run(config: CoreConfig, registry: BlueprintRegistry, options: &SimulationOptions) -> Result<SimulationSummary, ToolError> {
    let ground = HeightField::flat(MAP_HALF_SIZE, 0.0)?;
    let picker = Overhead { ground: ground.clone() };
    let mut session = Session::new(config, registry, ground)?;
    let mut input = InputQueue::new();
    let mut tally = Tally::default();
    let mut summary = SimulationSummary::default();

    for i in 0..ROCKS {
        let angle = i as f32 / ROCKS as f32 * std::f32::consts::TAU;
        let at = Vec3::new(angle.cos(), 0.0, angle.sin()) * SCENERY_RADIUS;
        session
            .terrain_mut()
            .colliders
            .insert(Obb::cube(at, 1.0), LayerMask::OBSTACLE, None);
    }

    let buildings: Vec<String> = session.registry().buildings().map(|b| b.id.clone()).collect();
    let count = buildings.len().max(1) as f32;
    for (i, id) in buildings.iter().enumerate() {
        let angle = i as f32 / count * std::f32::consts::TAU;
        let spot = Vec2::new(angle.cos(), angle.sin()) * RING_RADIUS;
        if session.begin_placement(id, &mut tally).is_err() {
            continue;
        }
        input.push(InputEvent::PointerMoved { screen: spot });
        input.push(InputEvent::PrimaryDown { screen: spot, modifier: false });
        input.push(InputEvent::PrimaryUp { screen: spot });
        session.tick(0.0, &mut input, &picker, &mut tally);
        if session.is_placing() {
            session.cancel_placement(&mut tally);
        }
    }

    let units: Vec<String> = session.registry().units().map(|u| u.id.clone()).collect();
    for (i, id) in units.iter().enumerate() {
        let spawn = Vec3::new(i as f32 * 2.0, 0.0, -4.0);
        if session.purchase_unit(id, spawn, &mut tally).is_ok() {
            summary.purchased += 1;
        }
    }

    let attacker = session.registry().units().find(|u| u.is_combatant()).map(|u| u.id.clone());
    if let Some(attacker) = attacker {
        for i in 0..options.hostiles {
            let position = Vec3::new(i as f32 * 2.0 - options.hostiles as f32, 0.0, MAP_HALF_SIZE - 10.0);
            session.spawn_unit_now(&attacker, position, Faction::Hostile)?;
        }
    }

    for _ in 0..options.ticks {
        let report = session.tick(options.dt, &mut input, &picker, &mut tally);
        summary.spawned += report.spawned.len();
        summary.production_cycles += report.production_cycles;
        summary.kills += report
            .combat
            .iter()
            .filter(|e| matches!(e, CombatEvent::Killed { .. }))
            .count();
    }

    summary.placed = tally.placed;
    summary.refused = tally.refused;
    summary.save = Some(session.save());
    tracing::info!(
        placed = summary.placed,
        refused = summary.refused,
        purchased = summary.purchased,
        spawned = summary.spawned,
        cycles = summary.production_cycles,
        kills = summary.kills,
        "Simulation finished"
    );
    Ok(summary)
}
