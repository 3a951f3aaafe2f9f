//! Math utilities shared by the core.
//!
//! Time is accumulated in fixed-point so that timers fire on exactly the same
//! tick regardless of how `dt` was split across frames. Spatial math uses
//! `glam` floats; the helpers here pin down the Euler convention the
//! placement rules are written against.

use fixed::types::I32F32;
use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Fixed-point number type used for accumulated time.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Convert a float duration in seconds into fixed-point time.
///
/// Non-finite and non-positive inputs become zero; values beyond the
/// fixed-point range saturate.
#[must_use]
pub fn seconds(value: f32) -> Fixed {
    if !value.is_finite() || value <= 0.0 {
        return Fixed::ZERO;
    }
    Fixed::checked_from_num(value).unwrap_or(Fixed::MAX)
}

/// Wrap an angle in degrees into the half-open range `(-180, 180]`.
#[must_use]
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Euler angles of a rotation in degrees, as `(pitch, yaw, roll)` about
/// `(X, Y, Z)`.
///
/// Decomposes with yaw applied last (Y * X * Z), the convention used by the
/// original level data, and wraps every component into `(-180, 180]`.
#[must_use]
pub fn euler_degrees(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(
        wrap_degrees(pitch.to_degrees()),
        wrap_degrees(yaw.to_degrees()),
        wrap_degrees(roll.to_degrees()),
    )
}

/// Rotation about the vertical axis by `degrees`.
#[must_use]
pub fn yaw_rotation(degrees: f32) -> Quat {
    Quat::from_rotation_y(degrees.to_radians())
}

/// Horizontal (XZ-plane) distance between two points.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Axis-aligned rectangle in screen space (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl ScreenRect {
    /// Rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A zero-area rectangle that contains nothing.
    pub const EMPTY: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    /// Whether the rectangle has zero width or height.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Whether `point` lies inside (inclusive edges). Empty rects contain nothing.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        !self.is_empty()
            && point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_time_accumulates_exactly() {
        let mut elapsed = Fixed::ZERO;
        for _ in 0..3 {
            elapsed += seconds(4.0);
        }
        assert_eq!(elapsed, Fixed::from_num(12));
        assert!(elapsed >= seconds(10.0));
    }

    #[test]
    fn test_seconds_rejects_non_finite() {
        assert_eq!(seconds(f32::NAN), Fixed::ZERO);
        assert_eq!(seconds(-3.0), Fixed::ZERO);
        assert_eq!(seconds(f32::INFINITY), Fixed::ZERO);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(350.0), -10.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
    }

    #[test]
    fn test_euler_of_pure_yaw() {
        let euler = euler_degrees(yaw_rotation(90.0));
        assert!(euler.x.abs() < 1e-3);
        assert!((euler.y - 90.0).abs() < 1e-3);
        assert!(euler.z.abs() < 1e-3);
    }

    #[test]
    fn test_euler_of_small_negative_tilt() {
        let euler = euler_degrees(Quat::from_rotation_x((-10.0_f32).to_radians()));
        // Wrapped, not reported as 350 degrees.
        assert!((euler.x + 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_screen_rect_contains() {
        let rect = ScreenRect::from_corners(Vec2::new(100.0, 80.0), Vec2::new(10.0, 20.0));
        assert_eq!(rect.min, Vec2::new(10.0, 20.0));
        assert!(rect.contains(Vec2::new(50.0, 50.0)));
        assert!(rect.contains(Vec2::new(10.0, 20.0)));
        assert!(!rect.contains(Vec2::new(5.0, 50.0)));
        assert!(!ScreenRect::EMPTY.contains(Vec2::ZERO));
    }
}
