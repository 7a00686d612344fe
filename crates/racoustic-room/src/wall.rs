//! Walls and the planes they group into.

use racoustic_math::{AbsorptionVector, Vec3};

/// A stable numeric identifier for a wall. Reused after the wall it named
/// is removed.
pub type WallId = usize;

/// A stable numeric identifier for a plane.
pub type PlaneId = usize;

/// A convex planar polygon: ordered vertices (right-hand-rule outward
/// normal), a derived plane equation, and an immutable absorption vector.
#[derive(Debug, Clone)]
pub struct Wall {
    pub(crate) id: WallId,
    pub(crate) vertices: Vec<Vec3>,
    pub(crate) normal: Vec3,
    pub(crate) distance: f32,
    pub(crate) absorption: AbsorptionVector,
    pub(crate) plane_id: PlaneId,
}

impl Wall {
    pub(crate) fn from_vertices(
        id: WallId,
        vertices: Vec<Vec3>,
        absorption: AbsorptionVector,
        plane_id: PlaneId,
    ) -> Option<Self> {
        let (normal, distance) = plane_equation(&vertices)?;
        Some(Self {
            id,
            vertices,
            normal,
            distance,
            absorption,
            plane_id,
        })
    }

    /// Stable ID.
    pub fn id(&self) -> WallId {
        self.id
    }

    /// Ordered vertex list.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Outward unit normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance from the origin along `normal`: a point `p` lies on
    /// the plane iff `normal.dot(p) == distance`.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Per-band absorption.
    pub fn absorption(&self) -> &AbsorptionVector {
        &self.absorption
    }

    /// Plane this wall belongs to.
    pub fn plane_id(&self) -> PlaneId {
        self.plane_id
    }

    /// Approximate polygon area via fan triangulation from the first vertex.
    pub fn area(&self) -> f32 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let v0 = self.vertices[0];
        let mut area2 = Vec3::ZERO;
        for i in 1..self.vertices.len() - 1 {
            let a = self.vertices[i] - v0;
            let b = self.vertices[i + 1] - v0;
            area2 = area2 + a.cross(b);
        }
        0.5 * area2.length()
    }

    /// Signed distance of an arbitrary point from this wall's plane.
    pub fn signed_distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// A group of coplanar walls sharing the same outward normal.
#[derive(Debug, Clone)]
pub struct Plane {
    pub(crate) id: PlaneId,
    pub(crate) normal: Vec3,
    pub(crate) distance: f32,
    pub(crate) wall_ids: Vec<WallId>,
    pub(crate) receiver_valid: bool,
}

impl Plane {
    /// Stable ID.
    pub fn id(&self) -> PlaneId {
        self.id
    }

    /// Shared outward normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Shared signed distance from the origin.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Walls belonging to this plane.
    pub fn wall_ids(&self) -> &[WallId] {
        &self.wall_ids
    }

    /// Does the listener currently lie in front of this plane?
    pub fn receiver_valid(&self) -> bool {
        self.receiver_valid
    }

    /// Two planes are the "same plane" if their normals match closely and
    /// their signed distances match closely.
    pub(crate) fn matches(&self, normal: Vec3, distance: f32) -> bool {
        const NORMAL_EPS: f32 = 1e-4;
        const DIST_EPS: f32 = 1e-4;
        (self.normal - normal).length_squared() < NORMAL_EPS && (self.distance - distance).abs() < DIST_EPS
    }
}

/// Fit a plane to a polygon's vertices via Newell's method, returning the
/// outward unit normal and signed distance. `None` if the polygon is
/// degenerate (zero area).
pub(crate) fn plane_equation(vertices: &[Vec3]) -> Option<(Vec3, f32)> {
    if vertices.len() < 3 {
        return None;
    }
    let mut normal = Vec3::ZERO;
    let n = vertices.len();
    for i in 0..n {
        let current = vertices[i];
        let next = vertices[(i + 1) % n];
        normal = normal
            + Vec3::new(
                (current.y - next.y) * (current.z + next.z),
                (current.z - next.z) * (current.x + next.x),
                (current.x - next.x) * (current.y + next.y),
            );
    }
    let normal = normal.normalized();
    if normal.length_squared() < 1e-8 {
        return None;
    }
    let centroid = vertices.iter().fold(Vec3::ZERO, |acc, v| acc + *v) * (1.0 / n as f32);
    let distance = normal.dot(centroid);
    Some((normal, distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_equation_of_xy_square_has_z_normal() {
        let verts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let (normal, distance) = plane_equation(&verts).unwrap();
        assert!(normal.z.abs() > 0.99);
        assert!(distance.abs() < 1e-5);
    }

    #[test]
    fn degenerate_polygon_has_no_plane() {
        let verts = [Vec3::ZERO, Vec3::ZERO, Vec3::ZERO];
        assert!(plane_equation(&verts).is_none());
    }

    #[test]
    fn wall_area_of_unit_square_is_one() {
        let absorption = AbsorptionVector::from_alpha(&[0.1], 0.0);
        let verts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let wall = Wall::from_vertices(0, verts, absorption, 0).unwrap();
        assert!((wall.area() - 1.0).abs() < 1e-5);
    }
}
