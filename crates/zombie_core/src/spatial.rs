//! Spatial queries: ground lookup, slope, and box overlap.
//!
//! [`SpatialQuery`] is the seam between the core and whatever provides
//! terrain and collision. [`Terrain`] is the bundled implementation: a
//! [`HeightField`] for the ground plus a [`CollisionWorld`] of oriented
//! boxes with a uniform-grid broad phase.
//!
//! Queries never mutate state. Self-intersection is avoided by passing the
//! candidate's own collider in the `exclude` list rather than toggling it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::error::{GameError, Result};

/// Bit set of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Walkable ground.
    pub const GROUND: Self = Self(1 << 0);
    /// Placed buildings.
    pub const BUILDING: Self = Self(1 << 1);
    /// Painted scenery: trees, rocks and other placement blockers.
    pub const OBSTACLE: Self = Self(1 << 2);
    /// Matches everything.
    pub const ALL: Self = Self(u32::MAX);

    /// Whether the two masks share any layer.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Where a downward probe met the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundHit {
    /// Surface point.
    pub point: Vec3,
    /// Unit surface normal.
    pub normal: Vec3,
}

/// Angle between world up and `normal`, in degrees.
///
/// A degenerate (zero-length) normal is reported as vertical, 90 degrees.
#[must_use]
pub fn slope_angle(normal: Vec3) -> f32 {
    let Some(normal) = normal.try_normalize() else {
        return 90.0;
    };
    normal.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    /// Box centre.
    pub center: Vec3,
    /// Half size along each local axis.
    pub half_extents: Vec3,
    /// Local-to-world rotation.
    pub rotation: Quat,
}

const SAT_EPSILON: f32 = 1e-6;

impl Obb {
    /// Create an oriented box.
    #[must_use]
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
            rotation: rotation.normalize(),
        }
    }

    /// Axis-aligned box.
    #[must_use]
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, half_extents, Quat::IDENTITY)
    }

    /// Cube around `center` with half size `radius`.
    #[must_use]
    pub fn cube(center: Vec3, radius: f32) -> Self {
        Self::axis_aligned(center, Vec3::splat(radius))
    }

    /// World-space local axes.
    #[must_use]
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation * Vec3::X,
            self.rotation * Vec3::Y,
            self.rotation * Vec3::Z,
        ]
    }

    /// Half size of the world-axis-aligned box enclosing this one.
    #[must_use]
    pub fn world_half_extents(&self) -> Vec3 {
        let [ax, ay, az] = self.axes();
        ax.abs() * self.half_extents.x + ay.abs() * self.half_extents.y + az.abs() * self.half_extents.z
    }

    /// Enclosing rectangle in the XZ plane as `(min, max)`.
    #[must_use]
    pub fn xz_bounds(&self) -> (Vec2, Vec2) {
        let half = self.world_half_extents();
        let centre = Vec2::new(self.center.x, self.center.z);
        let half = Vec2::new(half.x, half.z);
        (centre - half, centre + half)
    }

    /// Separating-axis overlap test. Touching boxes count as overlapping.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let a = self.axes();
        let b = other.axes();
        let ea = self.half_extents.to_array();
        let eb = other.half_extents.to_array();

        let mut r = [[0.0_f32; 3]; 3];
        let mut abs_r = [[0.0_f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = a[i].dot(b[j]);
                abs_r[i][j] = r[i][j].abs() + SAT_EPSILON;
            }
        }

        let d = other.center - self.center;
        let t = [d.dot(a[0]), d.dot(a[1]), d.dot(a[2])];

        for i in 0..3 {
            let rb = eb[0] * abs_r[i][0] + eb[1] * abs_r[i][1] + eb[2] * abs_r[i][2];
            if t[i].abs() > ea[i] + rb {
                return false;
            }
        }

        for j in 0..3 {
            let ra = ea[0] * abs_r[0][j] + ea[1] * abs_r[1][j] + ea[2] * abs_r[2][j];
            let tj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if tj.abs() > ra + eb[j] {
                return false;
            }
        }

        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = ea[i1] * abs_r[i2][j] + ea[i2] * abs_r[i1][j];
                let rb = eb[j1] * abs_r[i][j2] + eb[j2] * abs_r[i][j1];
                let tl = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if tl.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }
}

/// Handle to a collider in a [`CollisionWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// A registered obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Handle.
    pub id: ColliderId,
    /// Entity this collider belongs to, if any (scenery has none).
    pub owner: Option<EntityId>,
    /// Shape.
    pub shape: Obb,
    /// Layers this collider lives on.
    pub layers: LayerMask,
}

/// Contract the placement validator and commands rely on.
pub trait SpatialQuery {
    /// Probe straight down from above `position` for the ground surface.
    fn ground_hit(&self, position: Vec3) -> Option<GroundHit>;

    /// Colliders on `filter` layers overlapping `region`, skipping `exclude`.
    ///
    /// Results are in ascending id order.
    fn overlaps(&self, region: &Obb, filter: LayerMask, exclude: &[ColliderId]) -> Vec<ColliderId>;
}

/// Default bucket size of the broad phase, in world units.
pub const DEFAULT_BUCKET_SIZE: f32 = 8.0;

type Bucket = (i32, i32);

/// Oriented boxes indexed by a uniform XZ grid.
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    colliders: BTreeMap<ColliderId, Collider>,
    buckets: HashMap<Bucket, Vec<ColliderId>>,
    bucket_size: f32,
    next_id: u32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self {
            colliders: BTreeMap::new(),
            buckets: HashMap::new(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            next_id: 1,
        }
    }
}

impl CollisionWorld {
    /// Create an empty world with the default bucket size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world with a custom bucket size.
    pub fn with_bucket_size(bucket_size: f32) -> Result<Self> {
        if !(bucket_size.is_finite() && bucket_size > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "bucket size must be positive, got {bucket_size}"
            )));
        }
        Ok(Self {
            bucket_size,
            ..Self::default()
        })
    }

    /// Register a collider and return its handle.
    pub fn insert(&mut self, shape: Obb, layers: LayerMask, owner: Option<EntityId>) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.index(id, &shape);
        self.colliders.insert(
            id,
            Collider {
                id,
                owner,
                shape,
                layers,
            },
        );
        id
    }

    /// Remove a collider.
    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        let collider = self.colliders.remove(&id)?;
        self.unindex(id, &collider.shape);
        Some(collider)
    }

    /// Remove every collider owned by `owner`.
    pub fn remove_owned_by(&mut self, owner: EntityId) -> usize {
        let owned: Vec<_> = self
            .colliders
            .values()
            .filter(|c| c.owner == Some(owner))
            .map(|c| c.id)
            .collect();
        for id in &owned {
            self.remove(*id);
        }
        owned.len()
    }

    /// Look up a collider.
    #[must_use]
    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// First collider owned by `owner`, if any.
    #[must_use]
    pub fn collider_of(&self, owner: EntityId) -> Option<&Collider> {
        self.colliders.values().find(|c| c.owner == Some(owner))
    }

    /// Number of registered colliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Colliders on `filter` overlapping `region`, skipping `exclude`.
    #[must_use]
    pub fn query(&self, region: &Obb, filter: LayerMask, exclude: &[ColliderId]) -> Vec<ColliderId> {
        let mut candidates = BTreeSet::new();
        for bucket in self.buckets_for(region) {
            if let Some(ids) = self.buckets.get(&bucket) {
                candidates.extend(ids.iter().copied());
            }
        }

        candidates
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .filter_map(|id| self.colliders.get(&id))
            .filter(|c| c.layers.intersects(filter))
            .filter(|c| c.shape.intersects(region))
            .map(|c| c.id)
            .collect()
    }

    fn buckets_for(&self, shape: &Obb) -> Vec<Bucket> {
        let (min, max) = shape.xz_bounds();
        let to_bucket = |v: f32| (v / self.bucket_size).floor().clamp(-1.0e6, 1.0e6) as i32;
        let (x0, x1) = (to_bucket(min.x), to_bucket(max.x));
        let (z0, z1) = (to_bucket(min.y), to_bucket(max.y));
        let mut buckets = Vec::with_capacity(((x1 - x0 + 1) * (z1 - z0 + 1)).max(0) as usize);
        for x in x0..=x1 {
            for z in z0..=z1 {
                buckets.push((x, z));
            }
        }
        buckets
    }

    fn index(&mut self, id: ColliderId, shape: &Obb) {
        for bucket in self.buckets_for(shape) {
            self.buckets.entry(bucket).or_default().push(id);
        }
    }

    fn unindex(&mut self, id: ColliderId, shape: &Obb) {
        for bucket in self.buckets_for(shape) {
            if let Some(ids) = self.buckets.get_mut(&bucket) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.buckets.remove(&bucket);
                }
            }
        }
    }
}

/// Regular grid of ground heights. `None` samples are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightField {
    origin: Vec2,
    spacing: f32,
    columns: usize,
    rows: usize,
    heights: Vec<Option<f32>>,
}

impl HeightField {
    /// Build a height field by sampling `height(x, z)` at every grid point.
    ///
    /// `origin` is the world XZ of sample `(0, 0)`; there are `columns`
    /// samples along X and `rows` along Z, `spacing` apart.
    pub fn from_fn<F>(origin: Vec2, spacing: f32, columns: usize, rows: usize, height: F) -> Result<Self>
    where
        F: Fn(f32, f32) -> Option<f32>,
    {
        if columns < 2 || rows < 2 {
            return Err(GameError::InvalidConfig(
                "height field needs at least 2x2 samples".to_string(),
            ));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "height field spacing must be positive, got {spacing}"
            )));
        }
        let mut heights = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for column in 0..columns {
                let x = origin.x + column as f32 * spacing;
                let z = origin.y + row as f32 * spacing;
                heights.push(height(x, z).filter(|h| h.is_finite()));
            }
        }
        Ok(Self {
            origin,
            spacing,
            columns,
            rows,
            heights,
        })
    }

    /// Flat ground at height `y` covering `[-half_size, half_size]` on X and Z.
    pub fn flat(half_size: f32, y: f32) -> Result<Self> {
        let spacing = (half_size / 8.0).max(1.0);
        let samples = ((2.0 * half_size / spacing).ceil() as usize + 1).max(2);
        Self::from_fn(
            Vec2::splat(-half_size),
            spacing,
            samples,
            samples,
            |_, _| Some(y),
        )
    }

    /// Set one sample; `None` punches a hole. Out-of-range indices are ignored.
    pub fn set_sample(&mut self, column: usize, row: usize, height: Option<f32>) {
        if column < self.columns && row < self.rows {
            self.heights[row * self.columns + column] = height;
        }
    }

    fn sample(&self, column: usize, row: usize) -> Option<f32> {
        self.heights.get(row * self.columns + column).copied().flatten()
    }

    /// Locate the cell containing `(x, z)` and the fractional position inside it.
    fn cell(&self, x: f32, z: f32) -> Option<(usize, usize, f32, f32)> {
        let gx = (x - self.origin.x) / self.spacing;
        let gz = (z - self.origin.y) / self.spacing;
        let max_x = (self.columns - 1) as f32;
        let max_z = (self.rows - 1) as f32;
        if !(gx >= 0.0 && gz >= 0.0 && gx <= max_x && gz <= max_z) {
            return None;
        }
        let column = (gx.floor() as usize).min(self.columns - 2);
        let row = (gz.floor() as usize).min(self.rows - 2);
        Some((column, row, gx - column as f32, gz - row as f32))
    }

    /// Corner heights of a cell, only if all four are present.
    fn corners(&self, column: usize, row: usize) -> Option<[f32; 4]> {
        Some([
            self.sample(column, row)?,
            self.sample(column + 1, row)?,
            self.sample(column, row + 1)?,
            self.sample(column + 1, row + 1)?,
        ])
    }

    /// Bilinearly interpolated height, or `None` outside the field or in a hole.
    #[must_use]
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let (column, row, tx, tz) = self.cell(x, z)?;
        let [h00, h10, h01, h11] = self.corners(column, row)?;
        let near = h00 + (h10 - h00) * tx;
        let far = h01 + (h11 - h01) * tx;
        Some(near + (far - near) * tz)
    }

    /// Surface normal from the bilinear patch gradient.
    #[must_use]
    pub fn normal_at(&self, x: f32, z: f32) -> Option<Vec3> {
        let (column, row, tx, tz) = self.cell(x, z)?;
        let [h00, h10, h01, h11] = self.corners(column, row)?;
        let dh_dx = ((h10 - h00) * (1.0 - tz) + (h11 - h01) * tz) / self.spacing;
        let dh_dz = ((h01 - h00) * (1.0 - tx) + (h11 - h10) * tx) / self.spacing;
        Some(Vec3::new(-dh_dx, 1.0, -dh_dz).normalize())
    }

    /// Vertical probe from `origin` downward for at most `max_distance`.
    #[must_use]
    pub fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit> {
        let height = self.height_at(origin.x, origin.z)?;
        let drop = origin.y - height;
        if drop < 0.0 || drop > max_distance {
            return None;
        }
        Some(GroundHit {
            point: Vec3::new(origin.x, height, origin.z),
            normal: self.normal_at(origin.x, origin.z)?,
        })
    }
}

/// Ground plus colliders: the bundled [`SpatialQuery`] implementation.
#[derive(Debug, Clone)]
pub struct Terrain {
    /// Ground surface.
    pub ground: HeightField,
    /// Registered obstacles.
    pub colliders: CollisionWorld,
    /// Height above a position the ground probe starts from.
    pub probe_height: f32,
    /// Length of the ground probe.
    pub probe_distance: f32,
}

impl Terrain {
    /// Combine a height field with an empty collision world.
    #[must_use]
    pub fn new(ground: HeightField, probe_height: f32, probe_distance: f32) -> Self {
        Self {
            ground,
            colliders: CollisionWorld::new(),
            probe_height,
            probe_distance,
        }
    }
}

impl SpatialQuery for Terrain {
    fn ground_hit(&self, position: Vec3) -> Option<GroundHit> {
        self.ground
            .raycast_down(position + Vec3::Y * self.probe_height, self.probe_distance)
    }

    fn overlaps(&self, region: &Obb, filter: LayerMask, exclude: &[ColliderId]) -> Vec<ColliderId> {
        self.colliders.query(region, filter, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::yaw_rotation;

    #[test]
    fn test_slope_angle() {
        assert!(slope_angle(Vec3::Y).abs() < 1e-4);
        assert!((slope_angle(Vec3::new(1.0, 1.0, 0.0)) - 45.0).abs() < 1e-3);
        assert_eq!(slope_angle(Vec3::ZERO), 90.0);
    }

    #[test]
    fn test_obb_axis_aligned_overlap() {
        let a = Obb::cube(Vec3::ZERO, 1.0);
        assert!(a.intersects(&Obb::cube(Vec3::new(1.5, 0.0, 0.0), 1.0)));
        assert!(!a.intersects(&Obb::cube(Vec3::new(2.5, 0.0, 0.0), 1.0)));
        assert!(!a.intersects(&Obb::cube(Vec3::new(0.0, 3.0, 0.0), 1.0)));
    }

    #[test]
    fn test_obb_rotation_matters() {
        // A long thin box rotated 90 degrees about Y now reaches along Z.
        let long = Obb::new(Vec3::ZERO, Vec3::new(4.0, 1.0, 0.5), Quat::IDENTITY);
        let probe = Obb::cube(Vec3::new(0.0, 0.0, 3.0), 0.5);
        assert!(!long.intersects(&probe));

        let turned = Obb::new(Vec3::ZERO, Vec3::new(4.0, 1.0, 0.5), yaw_rotation(90.0));
        assert!(turned.intersects(&probe));
    }

    #[test]
    fn test_obb_diagonal_separation() {
        // Corner-to-corner boxes separated only along a rotated axis.
        let a = Obb::new(Vec3::ZERO, Vec3::splat(1.0), yaw_rotation(45.0));
        let b = Obb::cube(Vec3::new(2.3, 0.0, 0.0), 0.8);
        assert!(!a.intersects(&b));
        let c = Obb::cube(Vec3::new(1.9, 0.0, 0.0), 0.8);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_collision_world_filters_and_excludes() {
        let mut world = CollisionWorld::new();
        let building = world.insert(Obb::cube(Vec3::ZERO, 2.0), LayerMask::BUILDING, Some(7));
        let tree = world.insert(Obb::cube(Vec3::new(1.0, 0.0, 1.0), 0.5), LayerMask::OBSTACLE, None);

        let region = Obb::cube(Vec3::new(0.5, 0.0, 0.5), 1.0);
        assert_eq!(world.query(&region, LayerMask::BUILDING, &[]), vec![building]);
        assert_eq!(world.query(&region, LayerMask::OBSTACLE, &[]), vec![tree]);
        assert_eq!(
            world.query(&region, LayerMask::BUILDING | LayerMask::OBSTACLE, &[]),
            vec![building, tree]
        );
        assert!(world.query(&region, LayerMask::BUILDING, &[building]).is_empty());
        // Exclusion leaves the collider registered.
        assert!(world.get(building).is_some());
    }

    #[test]
    fn test_collision_world_spans_buckets() {
        let mut world = CollisionWorld::with_bucket_size(2.0).unwrap();
        let wall = world.insert(
            Obb::axis_aligned(Vec3::ZERO, Vec3::new(20.0, 1.0, 0.5)),
            LayerMask::BUILDING,
            None,
        );
        let far_end = Obb::cube(Vec3::new(19.0, 0.0, 0.0), 0.25);
        assert_eq!(world.query(&far_end, LayerMask::ALL, &[]), vec![wall]);

        world.remove(wall);
        assert!(world.is_empty());
        assert!(world.buckets.is_empty());
    }

    #[test]
    fn test_height_field_plane_slope() {
        // Plane rising 1 unit per unit along X: 45 degree slope.
        let field = HeightField::from_fn(Vec2::splat(-10.0), 2.0, 11, 11, |x, _| Some(x)).unwrap();
        assert!((field.height_at(3.0, 1.0).unwrap() - 3.0).abs() < 1e-4);
        let normal = field.normal_at(3.0, 1.0).unwrap();
        assert!((slope_angle(normal) - 45.0).abs() < 1e-3);
        assert!(normal.x < 0.0);
    }

    #[test]
    fn test_height_field_holes_and_bounds() {
        let mut field = HeightField::flat(10.0, 0.0).unwrap();
        assert!(field.height_at(11.0, 0.0).is_none());
        assert_eq!(field.height_at(10.0, 10.0), Some(0.0));

        field.set_sample(0, 0, None);
        assert!(field.height_at(-9.9, -9.9).is_none());
    }

    #[test]
    fn test_terrain_ground_probe() {
        let terrain = Terrain::new(HeightField::flat(50.0, 2.0).unwrap(), 5.0, 10.0);
        let hit = terrain.ground_hit(Vec3::new(3.0, 2.0, 4.0)).unwrap();
        assert_eq!(hit.point, Vec3::new(3.0, 2.0, 4.0));
        assert!((hit.normal - Vec3::Y).length() < 1e-5);

        // Probe starts at y=5+(-20) and never reaches ground at y=2.
        assert!(terrain.ground_hit(Vec3::new(0.0, -20.0, 0.0)).is_none());
        // Too far above: 30 + 5 - 2 > 10.
        assert!(terrain.ground_hit(Vec3::new(0.0, 30.0, 0.0)).is_none());
        assert!(terrain.ground_hit(Vec3::new(80.0, 2.0, 0.0)).is_none());
    }
}
