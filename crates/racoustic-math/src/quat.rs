//! Unit quaternions for source/listener orientation.

use crate::vec3::Vec3;
use libm::sqrtf;

/// A unit quaternion `w + xi + yj + zk`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    /// X component of the imaginary part.
    pub x: f32,
    /// Y component of the imaginary part.
    pub y: f32,
    /// Z component of the imaginary part.
    pub z: f32,
    /// Real (scalar) part.
    pub w: f32,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Construct from raw components. The caller is responsible for
    /// normalization if the components did not already form a unit
    /// quaternion.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle_rad` around `axis` (need not be normalized).
    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalized();
        let half = angle_rad * 0.5;
        let s = libm::sinf(half);
        let c = libm::cosf(half);
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Normalize in place, guarding against a degenerate zero quaternion.
    pub fn normalized(self) -> Self {
        let len = sqrtf(self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w);
        if len < 1e-12 {
            Self::IDENTITY
        } else {
            let inv = 1.0 / len;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        }
    }

    /// The forward unit vector this orientation points along, using the
    /// right-handed `(2(xz+wy), 2(yz-wx), 1-2(x^2+y^2))` convention.
    pub fn forward(self) -> Vec3 {
        let q = self.normalized();
        Vec3::new(
            2.0 * (q.x * q.z + q.w * q.y),
            2.0 * (q.y * q.z - q.w * q.x),
            1.0 - 2.0 * (q.x * q.x + q.y * q.y),
        )
        .normalized()
    }

    /// Hamilton product: rotate `self` then `other` (applies `self` first).
    pub fn mul(self, other: Self) -> Self {
        Self::new(
            self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        )
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = self.normalized();
        let u = Vec3::new(q.x, q.y, q.z);
        let s = q.w;
        u * (2.0 * u.dot(v)) + v * (s * s - u.dot(u)) + u.cross(v) * (2.0 * s)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_forward_is_negative_z() {
        let fwd = Quat::IDENTITY.forward();
        assert!((fwd - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn rotate_by_90_degrees_about_y_swaps_axes() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), core::f32::consts::FRAC_PI_2);
        let rotated = q.rotate(Vec3::new(0.0, 0.0, 1.0));
        assert!((rotated - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn normalized_degenerate_quat_is_identity() {
        let degenerate = Quat::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(degenerate.normalized(), Quat::IDENTITY);
    }

    #[test]
    fn composed_rotation_matches_successive_application() {
        let a = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), core::f32::consts::FRAC_PI_2);
        let b = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), core::f32::consts::FRAC_PI_2);
        let composed = a.mul(b);
        let v = Vec3::new(0.0, 0.0, 1.0);
        let via_composed = composed.rotate(v);
        let via_sequence = b.rotate(a.rotate(v));
        assert!((via_composed - via_sequence).length() < 1e-4);
    }
}
