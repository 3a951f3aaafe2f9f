//! Timed construction of buildings and units.
//!
//! Costs are paid before a job begins. Each job accumulates fixed-point
//! time and, once it reaches its duration, hands its descriptor to the
//! completion callback exactly once. Jobs run independently and cannot be
//! cancelled.

use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::components::{Entity, EntityKind};
use crate::feedback::{FeedbackSink, SoundEffect};
use crate::math::Fixed;

/// Handle to a construction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// What a job will produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Building or unit.
    pub kind: EntityKind,
    /// Blueprint id.
    pub blueprint: String,
    /// Spawn position.
    pub position: Vec3,
    /// Facing in degrees.
    pub yaw: f32,
    /// Ground-alignment tilt.
    pub tilt: Quat,
    /// UI slot the job was started from, if any.
    pub slot: Option<String>,
}

impl BuildDescriptor {
    /// Descriptor for an upright entity.
    #[must_use]
    pub fn new(kind: EntityKind, blueprint: impl Into<String>, position: Vec3) -> Self {
        Self {
            kind,
            blueprint: blueprint.into(),
            position,
            yaw: 0.0,
            tilt: Quat::IDENTITY,
            slot: None,
        }
    }
}

/// Callback that turns a finished job into a live entity.
pub type CompletionFn = Box<dyn FnOnce(&BuildDescriptor) -> Entity>;

struct ConstructionJob {
    id: JobId,
    descriptor: BuildDescriptor,
    duration: Fixed,
    elapsed: Fixed,
    on_complete: CompletionFn,
}

impl fmt::Debug for ConstructionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionJob")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

/// A job that finished this tick.
#[derive(Debug, Clone)]
pub struct CompletedJob {
    /// The finished job.
    pub job: JobId,
    /// What it was building.
    pub descriptor: BuildDescriptor,
    /// The entity produced by the completion callback, not yet in the world.
    pub entity: Entity,
}

/// In-progress construction jobs.
#[derive(Debug, Default)]
pub struct ConstructionScheduler {
    jobs: Vec<ConstructionJob>,
    next_id: u64,
}

impl ConstructionScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a job at zero elapsed time.
    pub fn begin_job(
        &mut self,
        descriptor: BuildDescriptor,
        duration: Fixed,
        on_complete: CompletionFn,
    ) -> JobId {
        self.next_id += 1;
        let id = JobId(self.next_id);
        tracing::info!(
            job = id.0,
            blueprint = %descriptor.blueprint,
            kind = ?descriptor.kind,
            duration = %duration,
            "Construction started"
        );
        self.jobs.push(ConstructionJob {
            id,
            descriptor,
            duration: duration.max(Fixed::ZERO),
            elapsed: Fixed::ZERO,
            on_complete,
        });
        id
    }

    /// Advance every job by `dt` and complete the finished ones.
    ///
    /// Each finished job runs its callback once, plays the completion cue
    /// once, and is removed. Results are in job start order.
    pub fn tick(&mut self, dt: Fixed, feedback: &mut dyn FeedbackSink) -> Vec<CompletedJob> {
        let dt = dt.max(Fixed::ZERO);
        let mut completed = Vec::new();

        for mut job in std::mem::take(&mut self.jobs) {
            job.elapsed = job.elapsed.saturating_add(dt);
            if job.elapsed < job.duration {
                self.jobs.push(job);
                continue;
            }

            let entity = (job.on_complete)(&job.descriptor);
            feedback.play(SoundEffect::BuildingComplete);
            tracing::info!(job = job.id.0, blueprint = %job.descriptor.blueprint, "Construction complete");
            completed.push(CompletedJob {
                job: job.id,
                descriptor: job.descriptor,
                entity,
            });
        }

        completed
    }

    /// Ids and descriptors of running jobs, in start order.
    pub fn active_jobs(&self) -> impl Iterator<Item = (JobId, &BuildDescriptor)> {
        self.jobs.iter().map(|job| (job.id, &job.descriptor))
    }

    /// Progress of a running job as a percentage (0-100).
    #[must_use]
    pub fn progress(&self, id: JobId) -> Option<u32> {
        let job = self.jobs.iter().find(|job| job.id == id)?;
        if job.duration == Fixed::ZERO {
            return Some(100);
        }
        let percent = job.elapsed.saturating_mul(Fixed::from_num(100)) / job.duration;
        Some(percent.min(Fixed::from_num(100)).to_num::<u32>())
    }

    /// Number of running jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
