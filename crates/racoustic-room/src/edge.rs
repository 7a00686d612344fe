//! Edges: directed segments shared between two walls of different planes.

use crate::wall::PlaneId;
use racoustic_math::Vec3;

/// A stable numeric identifier for an edge.
pub type EdgeId = usize;

/// Where the listener currently sits relative to an edge's two adjoining
/// planes, recomputed on every listener update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverZone {
    /// Behind both adjoining planes: no line of sight to either face.
    Shadowed,
    /// In front of both adjoining planes.
    Illuminated,
    /// In front of one plane, behind the other.
    Reflection,
    /// The edge is degenerate (zero length) or its zone is undefined.
    Invalid,
}

/// A directed line segment shared between two walls of different outward
/// normals.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) plane_a: PlaneId,
    pub(crate) plane_b: PlaneId,
    pub(crate) normal_a: Vec3,
    pub(crate) normal_b: Vec3,
    pub(crate) base: Vec3,
    pub(crate) top: Vec3,
    pub(crate) wedge_angle: f32,
    pub(crate) receiver_zone: ReceiverZone,
}

impl Edge {
    /// Stable ID.
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// The plane on the "base" side of the normal ordering.
    pub fn plane_a(&self) -> PlaneId {
        self.plane_a
    }

    /// The plane on the "top" side of the normal ordering.
    pub fn plane_b(&self) -> PlaneId {
        self.plane_b
    }

    /// Normal of `plane_a`.
    pub fn normal_a(&self) -> Vec3 {
        self.normal_a
    }

    /// Normal of `plane_b`.
    pub fn normal_b(&self) -> Vec3 {
        self.normal_b
    }

    /// Start of the directed segment.
    pub fn base(&self) -> Vec3 {
        self.base
    }

    /// End of the directed segment.
    pub fn top(&self) -> Vec3 {
        self.top
    }

    /// Unit vector from `base` to `top`, or `Vec3::ZERO` if degenerate.
    pub fn axis(&self) -> Vec3 {
        (self.top - self.base).normalized()
    }

    /// Length of the edge.
    pub fn length(&self) -> f32 {
        self.top.distance(self.base)
    }

    /// Exterior wedge angle, swept from `normal_a` to `normal_b` through
    /// the open space outside the solid.
    pub fn wedge_angle(&self) -> f32 {
        self.wedge_angle
    }

    /// Most recently cached receiver zone.
    pub fn receiver_zone(&self) -> ReceiverZone {
        self.receiver_zone
    }

    /// Recompute `receiver_zone` for a new listener position.
    pub(crate) fn update_receiver_zone(&mut self, listener: Vec3) {
        if self.length() < 1e-6 {
            self.receiver_zone = ReceiverZone::Invalid;
            return;
        }
        let closest = self.closest_point(listener);
        let side_a = self.normal_a.dot(listener - closest) >= 0.0;
        let side_b = self.normal_b.dot(listener - closest) >= 0.0;
        self.receiver_zone = match (side_a, side_b) {
            (true, true) => ReceiverZone::Illuminated,
            (false, false) => ReceiverZone::Shadowed,
            _ => ReceiverZone::Reflection,
        };
    }

    /// Closest point on the (finite) edge segment to an arbitrary point.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let len = self.length();
        if len < 1e-6 {
            return self.base;
        }
        let axis = self.axis();
        let t = (point - self.base).dot(axis).clamp(0.0, len);
        self.base + axis * t
    }
}

/// Compute the exterior wedge angle between two plane normals: the angle
/// swept through the open space outside the solid the two planes bound.
pub(crate) fn exterior_wedge_angle(normal_a: Vec3, normal_b: Vec3) -> f32 {
    let cos_theta = normal_a.dot(normal_b).clamp(-1.0, 1.0);
    core::f32::consts::PI + libm::acosf(cos_theta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(normal_a: Vec3, normal_b: Vec3) -> Edge {
        Edge {
            id: 0,
            plane_a: 0,
            plane_b: 1,
            normal_a,
            normal_b,
            base: Vec3::new(0.0, 0.0, 0.0),
            top: Vec3::new(0.0, 0.0, 1.0),
            wedge_angle: exterior_wedge_angle(normal_a, normal_b),
            receiver_zone: ReceiverZone::Invalid,
        }
    }

    #[test]
    fn closest_point_clamps_to_segment() {
        let e = edge(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let p = e.closest_point(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(p, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn listener_in_front_of_both_planes_is_illuminated() {
        let mut e = edge(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        e.update_receiver_zone(Vec3::new(1.0, 1.0, 0.5));
        assert_eq!(e.receiver_zone(), ReceiverZone::Illuminated);
    }

    #[test]
    fn listener_behind_both_planes_is_shadowed() {
        let mut e = edge(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        e.update_receiver_zone(Vec3::new(-1.0, -1.0, 0.5));
        assert_eq!(e.receiver_zone(), ReceiverZone::Shadowed);
    }

    #[test]
    fn degenerate_edge_is_invalid() {
        let mut e = edge(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        e.base = Vec3::ZERO;
        e.top = Vec3::ZERO;
        e.update_receiver_zone(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(e.receiver_zone(), ReceiverZone::Invalid);
    }
}
