//! Replay checks for sessions.
//!
//! A scripted session is run several times from the same setup and its
//! state is hashed after every tick. Any difference between runs is
//! reported with the first tick at which the runs split.
//!
//! Things that would make runs differ:
//!
//! - iterating a `HashMap`, whose hasher is seeded per process; systems walk
//!   entities through `World::sorted_ids` instead
//! - summing `f32` timers; construction and production accumulate
//!   [`zombie_core::math::Fixed`] seconds

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use zombie_core::session::Session;

/// Per-tick state hashes of repeated runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayCheck {
    /// One trace per run, one hash per tick.
    pub traces: Vec<Vec<u64>>,
}

impl ReplayCheck {
    /// First tick (1-based) at which some run differs from the first run.
    #[must_use]
    pub fn first_divergence(&self) -> Option<u64> {
        let (reference, rest) = self.traces.split_first()?;
        rest.iter()
            .filter_map(|trace| {
                trace
                    .iter()
                    .zip(reference)
                    .position(|(a, b)| a != b)
                    .or_else(|| (trace.len() != reference.len()).then(|| trace.len().min(reference.len())))
            })
            .min()
            .map(|index| index as u64 + 1)
    }

    /// Whether every run matched at every tick.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.first_divergence().is_none()
    }

    /// Final hash of each run.
    #[must_use]
    pub fn final_hashes(&self) -> Vec<u64> {
        self.traces.iter().filter_map(|trace| trace.last().copied()).collect()
    }

    /// # Panics
    ///
    /// Panics naming the first diverging tick if the runs differ.
    pub fn assert_deterministic(&self) {
        if let Some(tick) = self.first_divergence() {
            panic!(
                "runs diverged at tick {tick} of {} ({} runs, final hashes {:?})",
                self.traces.first().map_or(0, Vec::len),
                self.traces.len(),
                self.final_hashes()
            );
        }
    }
}

/// Run `setup` then `ticks` calls of `step`, `runs` times, hashing the
/// state after each step.
pub fn check_replay<S>(
    runs: usize,
    ticks: u64,
    setup: impl Fn() -> S,
    step: impl Fn(&mut S),
    hash: impl Fn(&S) -> u64,
) -> ReplayCheck {
    let traces = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..ticks)
                .map(|_| {
                    step(&mut state);
                    hash(&state)
                })
                .collect()
        })
        .collect();
    ReplayCheck { traces }
}

/// Hash of a session's saved state: entities, health, positions, resources.
///
/// # Panics
///
/// Panics if the save cannot be encoded.
#[must_use]
pub fn session_hash(session: &Session) -> u64 {
    let json = serde_json::to_string(&session.save()).expect("save encodes");
    hash_of(&json)
}

/// `DefaultHasher` digest of `value`.
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for core inputs.
pub mod strategies {
    use glam::{Vec2, Vec3};
    use proptest::prelude::*;
    use zombie_core::commands::FormationType;
    use zombie_core::economy::ResourceCost;

    /// Resource names used by the sample data.
    pub const RESOURCES: [&str; 2] = ["Bone", "Biohazard"];

    /// A point on the ground plane inside the fixture map.
    pub fn arb_ground_point() -> impl Strategy<Value = Vec3> {
        (-90.0f32..90.0, -90.0f32..90.0).prop_map(|(x, z)| Vec3::new(x, 0.0, z))
    }

    /// Any finite world point within a large range.
    pub fn arb_world_point() -> impl Strategy<Value = Vec3> {
        (-1.0e4f32..1.0e4, -100.0f32..100.0, -1.0e4f32..1.0e4).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    /// A screen position on a 1920x1080 display.
    pub fn arb_screen_point() -> impl Strategy<Value = Vec2> {
        (0.0f32..1920.0, 0.0f32..1080.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// A formation.
    pub fn arb_formation() -> impl Strategy<Value = FormationType> {
        prop_oneof![
            Just(FormationType::Line),
            Just(FormationType::Triangle),
            Just(FormationType::Rectangle),
        ]
    }

    /// Up to three costs over the sample resources.
    pub fn arb_costs() -> impl Strategy<Value = Vec<ResourceCost>> {
        prop::collection::vec((0usize..RESOURCES.len(), 0i64..300), 0..=3).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(index, amount)| ResourceCost::new(RESOURCES[index], amount))
                .collect()
        })
    }

    /// Starting amounts for the sample resources.
    pub fn arb_amounts() -> impl Strategy<Value = Vec<(String, i64)>> {
        (0i64..500, 0i64..500).prop_map(|(bone, biohazard)| {
            vec![
                (RESOURCES[0].to_string(), bone),
                (RESOURCES[1].to_string(), biohazard),
            ]
        })
    }
}
