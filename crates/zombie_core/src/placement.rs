//! Placement validation and the placement preview lifecycle.
//!
//! [`validate`] checks a candidate footprint against six ordered rules and
//! short-circuits on the first failure, so a given world state always
//! reports the same reason. It reads the world through [`SpatialQuery`] and
//! mutates nothing.
//!
//! [`PlacementPreview`] is the to-be-placed building that follows the
//! cursor: `Preview` on creation, `Valid`/`Invalid` after every update and
//! `Fixed` once confirmed.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::PlacementState;
use crate::config::PlacementRules;
use crate::data::BuildingData;
use crate::economy::ResourceCost;
use crate::error::{GameError, Result};
use crate::feedback::{FeedbackSink, SoundEffect};
use crate::grid::GridSnapper;
use crate::math::{euler_degrees, wrap_degrees, yaw_rotation};
use crate::spatial::{slope_angle, ColliderId, GroundHit, LayerMask, Obb, SpatialQuery};

/// Why a candidate was rejected.
///
/// Variants are listed in the order the rules are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementRejection {
    /// Candidate is within the minimum distance of the player.
    #[error("too close to player")]
    TooCloseToPlayer,
    /// No ground below the candidate.
    #[error("no ground")]
    NoGround,
    /// Ground slope exceeds the maximum.
    #[error("slope too steep")]
    TooSteep,
    /// The ground-aligned orientation tilts too far.
    #[error("tilt exceeds threshold")]
    TiltExceeded,
    /// Footprint overlaps another building.
    #[error("overlaps a building")]
    OverlapsBuilding,
    /// An obstacle (tree, rock) is too close.
    #[error("overlaps an obstacle")]
    OverlapsObstacle,
}

/// A footprint to validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Snapped world position.
    pub position: Vec3,
    /// Intended facing about the vertical axis, in degrees.
    pub yaw: f32,
    /// Unscaled footprint half extents.
    pub half_extents: Vec3,
    /// The candidate's own collider, skipped by the overlap checks.
    pub own_collider: Option<ColliderId>,
}

impl Candidate {
    /// Candidate without a collider of its own.
    #[must_use]
    pub fn new(position: Vec3, yaw: f32, half_extents: Vec3) -> Self {
        Self {
            position,
            yaw,
            half_extents,
            own_collider: None,
        }
    }
}

/// A candidate that passed every rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidPlacement {
    /// Ground below the candidate.
    pub ground: GroundHit,
    /// Ground-alignment rotation (up onto the ground normal).
    pub tilt: Quat,
    /// Final orientation: tilt composed with the intended facing.
    pub rotation: Quat,
}

/// Rotation taking world up onto `normal`.
#[must_use]
pub fn ground_alignment(normal: Vec3) -> Quat {
    match normal.try_normalize() {
        Some(normal) => Quat::from_rotation_arc(Vec3::Y, normal),
        None => Quat::IDENTITY,
    }
}

/// Validate `candidate` against `rules`.
///
/// Rules, in order:
/// 1. distance to `player_position` at least `min_player_distance`
/// 2. ground found below the candidate
/// 3. ground slope at most `max_slope_angle`
/// 4. pitch, roll and yaw drift of the aligned orientation within
///    `tilt_threshold`
/// 5. no building under the scaled footprint
/// 6. no obstacle within `obstacle_clearance`
pub fn validate<S>(
    candidate: &Candidate,
    rules: &PlacementRules,
    player_position: Vec3,
    spatial: &S,
) -> std::result::Result<ValidPlacement, PlacementRejection>
where
    S: SpatialQuery + ?Sized,
{
    if candidate.position.distance(player_position) < rules.min_player_distance {
        return Err(PlacementRejection::TooCloseToPlayer);
    }

    let ground = spatial
        .ground_hit(candidate.position)
        .ok_or(PlacementRejection::NoGround)?;

    if slope_angle(ground.normal) > rules.max_slope_angle {
        return Err(PlacementRejection::TooSteep);
    }

    let tilt = ground_alignment(ground.normal);
    let rotation = tilt * yaw_rotation(candidate.yaw);
    let euler = euler_degrees(rotation);
    let yaw_drift = wrap_degrees(euler.y - candidate.yaw);
    let threshold = rules.tilt_threshold;
    if euler.x.abs() > threshold || euler.z.abs() > threshold || yaw_drift.abs() > threshold {
        return Err(PlacementRejection::TiltExceeded);
    }

    let exclude: &[ColliderId] = match &candidate.own_collider {
        Some(id) => std::slice::from_ref(id),
        None => &[],
    };

    // The scale applies to the full size, so the searched box reaches past
    // the building's own half extents.
    let footprint = Obb::new(
        candidate.position,
        candidate.half_extents * 2.0 * rules.footprint_scale,
        rotation,
    );
    if !spatial
        .overlaps(&footprint, LayerMask::BUILDING, exclude)
        .is_empty()
    {
        return Err(PlacementRejection::OverlapsBuilding);
    }

    let clearance = Obb::cube(candidate.position, rules.obstacle_clearance);
    if !spatial
        .overlaps(&clearance, LayerMask::OBSTACLE, exclude)
        .is_empty()
    {
        return Err(PlacementRejection::OverlapsObstacle);
    }

    Ok(ValidPlacement {
        ground,
        tilt,
        rotation,
    })
}

// ============================================================================
// Preview
// ============================================================================

/// Shared inputs for preview updates and confirmation.
pub struct PlacementContext<'a, S: SpatialQuery + ?Sized> {
    /// Grid the cursor snaps to.
    pub snapper: &'a GridSnapper,
    /// Validation rules.
    pub rules: &'a PlacementRules,
    /// Current player avatar position.
    pub player_position: Vec3,
    /// World geometry.
    pub spatial: &'a S,
}

/// A placement accepted by [`PlacementPreview::confirm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedPlacement {
    /// Building blueprint id.
    pub blueprint: String,
    /// Costs to charge for the building.
    pub costs: Vec<ResourceCost>,
    /// Snapped ground position.
    pub position: Vec3,
    /// Facing in degrees.
    pub yaw: f32,
    /// Ground-alignment tilt.
    pub tilt: Quat,
    /// Unscaled footprint half extents.
    pub half_extents: Vec3,
}

/// Degrees added by one rotate.
pub const ROTATION_STEP: f32 = 90.0;

/// The building currently following the cursor.
#[derive(Debug, Clone)]
pub struct PlacementPreview {
    blueprint: String,
    costs: Vec<ResourceCost>,
    half_extents: Vec3,
    yaw: f32,
    state: PlacementState,
    candidate: Option<Candidate>,
    last: Option<std::result::Result<ValidPlacement, PlacementRejection>>,
    cancelled: bool,
}

impl PlacementPreview {
    /// Start previewing `data`.
    #[must_use]
    pub fn new(data: &BuildingData) -> Self {
        Self {
            blueprint: data.id.clone(),
            costs: data.costs.clone(),
            half_extents: data.half_extents(),
            yaw: 0.0,
            state: PlacementState::Preview,
            candidate: None,
            last: None,
            cancelled: false,
        }
    }

    /// Blueprint being placed.
    #[must_use]
    pub fn blueprint(&self) -> &str {
        &self.blueprint
    }

    /// Price paid on confirmation.
    #[must_use]
    pub fn costs(&self) -> &[ResourceCost] {
        &self.costs
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PlacementState {
        self.state
    }

    /// Manual facing in degrees, one of 0, 90, 180, 270.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Snapped position of the last update that found ground.
    #[must_use]
    pub fn position(&self) -> Option<Vec3> {
        self.candidate.map(|c| c.position)
    }

    /// Reason the last update was rejected, if it was.
    #[must_use]
    pub fn rejection(&self) -> Option<PlacementRejection> {
        self.last.and_then(std::result::Result::err)
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Follow the cursor: snap, validate, and move to `Valid` or `Invalid`.
    ///
    /// With no ground under the cursor the preview is hidden and drops
    /// back to `Preview`.
    pub fn update<S>(&mut self, cursor: Option<GroundHit>, ctx: &PlacementContext<'_, S>) -> PlacementState
    where
        S: SpatialQuery + ?Sized,
    {
        if self.state.is_fixed() || self.cancelled {
            return self.state;
        }

        let Some(hit) = cursor else {
            self.candidate = None;
            self.last = None;
            self.state = PlacementState::Preview;
            return self.state;
        };

        let candidate = Candidate::new(ctx.snapper.snap(hit.point), self.yaw, self.half_extents);
        let result = validate(&candidate, ctx.rules, ctx.player_position, ctx.spatial);
        if let Err(reason) = result {
            tracing::debug!(blueprint = %self.blueprint, ?reason, "Placement candidate rejected");
        }
        self.state = if result.is_ok() {
            PlacementState::Valid
        } else {
            PlacementState::Invalid
        };
        self.candidate = Some(candidate);
        self.last = Some(result);
        self.state
    }

    /// Turn the preview by 90 degrees, wrapping at 360.
    pub fn rotate(&mut self, feedback: &mut dyn FeedbackSink) {
        if self.state.is_fixed() || self.cancelled {
            return;
        }
        self.yaw = (self.yaw + ROTATION_STEP) % 360.0;
        if let Some(candidate) = &mut self.candidate {
            candidate.yaw = self.yaw;
        }
        feedback.play(SoundEffect::RotateBuilding);
    }

    /// Commit the current candidate.
    ///
    /// The candidate is re-validated against the current world, so a rotate
    /// since the last update is honoured. On success the preview becomes
    /// `Fixed` and its candidate is discarded. On failure it stays where it
    /// was and an error click plays.
    pub fn confirm<S>(
        &mut self,
        ctx: &PlacementContext<'_, S>,
        feedback: &mut dyn FeedbackSink,
    ) -> Result<ConfirmedPlacement>
    where
        S: SpatialQuery + ?Sized,
    {
        let candidate = match self.candidate {
            Some(candidate) if !self.cancelled && !self.state.is_fixed() => candidate,
            _ => {
                feedback.play(SoundEffect::ErrorClick);
                return Err(GameError::NoGroundUnderCursor);
            }
        };

        match validate(&candidate, ctx.rules, ctx.player_position, ctx.spatial) {
            Ok(valid) => {
                self.state = PlacementState::Fixed;
                self.candidate = None;
                self.last = None;
                feedback.play(SoundEffect::PlaceBuilding);
                Ok(ConfirmedPlacement {
                    blueprint: self.blueprint.clone(),
                    costs: self.costs.clone(),
                    position: valid.ground.point,
                    yaw: self.yaw,
                    tilt: valid.tilt,
                    half_extents: self.half_extents,
                })
            }
            Err(reason) => {
                tracing::debug!(blueprint = %self.blueprint, %reason, "Attempted to place an invalid building");
                self.state = PlacementState::Invalid;
                self.last = Some(Err(reason));
                feedback.play(SoundEffect::ErrorClick);
                Err(reason.into())
            }
        }
    }

    /// Discard the preview. Only the first call has any effect.
    ///
    /// Returns whether this call cancelled it.
    pub fn cancel(&mut self, feedback: &mut dyn FeedbackSink) -> bool {
        if self.cancelled || self.state.is_fixed() {
            return false;
        }
        self.cancelled = true;
        self.candidate = None;
        self.last = None;
        feedback.play(SoundEffect::ErrorClick);
        true
    }
}
