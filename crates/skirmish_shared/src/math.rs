//! Mathematical types shared between client and server.
//!
//! These are the canonical representations used in the wire protocol.
//! Rotation travels as `{x, y, z}` = `{pitch, yaw, roll}`.

use serde::{Deserialize, Serialize};

/// Clamps `value` into `[min, max]` without panicking.
///
/// Unlike [`f32::clamp`], an inverted range is allowed: the lower bound wins.
/// Generation code derives bounds from random sizes and relies on this.
#[inline]
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// 3D Vector - position, direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component (up)
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Distance in the XZ plane, ignoring height.
    #[must_use]
    pub fn planar_distance(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Returns the unit vector, or `fallback` when the length is zero.
    #[must_use]
    pub fn normalize_or(self, fallback: Self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            self * (1.0 / len)
        } else {
            fallback
        }
    }

    /// Same point raised by `dy`.
    #[inline]
    #[must_use]
    pub fn raised(self, dy: f32) -> Self {
        Self::new(self.x, self.y + dy, self.z)
    }

    /// Rounds every component to `decimals` places. Zero disables rounding.
    #[must_use]
    pub fn rounded(self, decimals: u32) -> Self {
        Self::new(
            round_to(self.x, decimals),
            round_to(self.y, decimals),
            round_to(self.z, decimals),
        )
    }

    /// Component-wise check that no value is NaN or infinite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// View rotation in radians. Roll is carried but never used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Pitch (look up/down)
    #[serde(rename = "x")]
    pub pitch: f32,
    /// Yaw (look left/right)
    #[serde(rename = "y")]
    pub yaw: f32,
    /// Roll (unused)
    #[serde(rename = "z", default)]
    pub roll: f32,
}

impl Rotation {
    /// Creates a rotation with zero roll.
    #[must_use]
    pub const fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw, roll: 0.0 }
    }

    /// Unit look direction. Yaw 0 faces -Z.
    #[must_use]
    pub fn forward(self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3::new(
            -self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            -self.yaw.cos() * cos_pitch,
        )
    }

    /// Rotation that looks along `direction` (must be unit length).
    #[must_use]
    pub fn looking_along(direction: Vec3) -> Self {
        let yaw = (-direction.x).atan2(-direction.z);
        let pitch = clamp(direction.y, -1.0, 1.0).asin();
        Self::new(pitch, yaw)
    }

    /// Rounds every component to `decimals` places. Zero disables rounding.
    #[must_use]
    pub fn rounded(self, decimals: u32) -> Self {
        Self {
            pitch: round_to(self.pitch, decimals),
            yaw: round_to(self.yaw, decimals),
            roll: round_to(self.roll, decimals),
        }
    }

    /// Component-wise check that no value is NaN or infinite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// Rounds to a fixed number of decimal places. Zero returns `value` unchanged.
#[must_use]
pub fn round_to(value: f32, decimals: u32) -> f32 {
    if decimals == 0 {
        return value;
    }
    let factor = 10f32.powi(decimals.min(6) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 7.0);
        assert_eq!(sum.z, 9.0);

        let dot = a.dot(b);
        assert_eq!(dot, 32.0); // 1*4 + 2*5 + 3*6
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 100.0, 4.0);
        assert!((a.planar_distance(b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_tolerates_inverted_range() {
        assert_eq!(clamp(5.0, 3.0, 1.0), 3.0);
        assert_eq!(clamp(-1.0, 0.0, 2.0), 0.0);
    }

    #[test]
    fn test_forward_and_looking_along_agree() {
        let rot = Rotation::new(0.3, 1.1);
        let back = Rotation::looking_along(rot.forward());
        assert!((back.pitch - rot.pitch).abs() < 1e-5);
        assert!((back.yaw - rot.yaw).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_zero_faces_negative_z() {
        let f = Rotation::default().forward();
        assert!(f.x.abs() < 1e-6);
        assert!((f.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 0), 1.23456);
    }

    #[test]
    fn test_rotation_wire_names() {
        let json = serde_json::to_string(&Rotation::new(0.5, 1.0)).unwrap();
        assert!(json.contains("\"x\":0.5"));
        assert!(json.contains("\"y\":1.0"));
        let parsed: Rotation = serde_json::from_str(r#"{"x":0.1,"y":0.2}"#).unwrap();
        assert_eq!(parsed.roll, 0.0);
    }
}
