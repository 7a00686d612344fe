//! 3x3 matrices for plane bases and cylindrical-coordinate frames.

use crate::vec3::Vec3;

/// A 3x3 matrix stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    rows: [Vec3; 3],
}

impl Mat3 {
    /// Build a matrix from its three rows.
    pub const fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self { rows: [r0, r1, r2] }
    }

    /// Build an orthonormal basis with `forward` as one axis, suitable for
    /// expressing a point in cylindrical coordinates around an edge. `up`
    /// is any vector not parallel to `forward`, used to disambiguate the
    /// other two axes via Gram-Schmidt.
    pub fn basis_from_forward(forward: Vec3, up: Vec3) -> Self {
        let f = forward.normalized();
        let mut right = up - f * up.dot(f);
        if right.length_squared() < 1e-12 {
            // `up` was parallel to `forward`; pick an arbitrary perpendicular.
            right = if f.x.abs() < 0.9 {
                Vec3::new(1.0, 0.0, 0.0).cross(f)
            } else {
                Vec3::new(0.0, 1.0, 0.0).cross(f)
            };
        }
        let right = right.normalized();
        let true_up = f.cross(right);
        Self::from_rows(right, true_up, f)
    }

    /// Transform a vector: `M * v`.
    pub fn mul_vec3(self, v: Vec3) -> Vec3 {
        Vec3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
    }

    /// Row `i` of the matrix (`0..3`). For a basis built by
    /// [`basis_from_forward`](Self::basis_from_forward), rows are
    /// `(right, up, forward)`.
    pub fn row(&self, i: usize) -> Vec3 {
        self.rows[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_axes_are_orthonormal() {
        let basis = Mat3::basis_from_forward(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0));
        let right = basis.rows[0];
        let up = basis.rows[1];
        let fwd = basis.rows[2];
        assert!((right.dot(up)).abs() < 1e-5);
        assert!((right.dot(fwd)).abs() < 1e-5);
        assert!((up.dot(fwd)).abs() < 1e-5);
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!((fwd.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn basis_handles_parallel_up_hint() {
        let basis = Mat3::basis_from_forward(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        assert!(basis.rows[0].length() > 0.99);
    }
}
