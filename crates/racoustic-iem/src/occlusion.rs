//! Segment-vs-room intersection tests used to decide whether a candidate
//! propagation path is obstructed.

use racoustic_math::Vec3;
use racoustic_room::{Room, WallId};

/// Does the segment `a -> b` cross any wall in the room other than the
/// ones listed in `excluding` (the walls that terminate this segment, to
/// avoid rejecting a path because it grazes its own boundary)?
pub fn segment_occluded(room: &Room, a: Vec3, b: Vec3, excluding: &[WallId]) -> bool {
    for wall in room.walls() {
        if excluding.contains(&wall.id()) {
            continue;
        }
        if segment_crosses_polygon(wall.normal(), wall.distance(), wall.vertices(), a, b) {
            return true;
        }
    }
    false
}

/// Does segment `a -> b` intersect the convex polygon defined by `normal`/
/// `distance` (plane equation) and `vertices` (ordered, coplanar)?
fn segment_crosses_polygon(normal: Vec3, distance: f32, vertices: &[Vec3], a: Vec3, b: Vec3) -> bool {
    let da = normal.dot(a) - distance;
    let db = normal.dot(b) - distance;
    if da.signum() == db.signum() || (da.abs() < 1e-6 && db.abs() < 1e-6) {
        return false;
    }
    let t = da / (da - db);
    let hit = a + (b - a) * t;
    point_in_polygon(vertices, normal, hit)
}

/// Is `point` (assumed on the polygon's plane) inside the convex polygon,
/// via a signed-area winding test projected onto the polygon's plane?
fn point_in_polygon(vertices: &[Vec3], normal: Vec3, point: Vec3) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..vertices.len() {
        let v0 = vertices[i];
        let v1 = vertices[(i + 1) % vertices.len()];
        let edge = v1 - v0;
        let to_point = point - v0;
        let cross = edge.cross(to_point).dot(normal);
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != 0.0 && cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Does the line segment `image -> listener` intersect the wall's finite
/// polygon, and is the intersection point the visible contribution of
/// `wall`? Returns the intersection point if so.
pub fn segment_intersects_wall(
    normal: Vec3,
    distance: f32,
    vertices: &[Vec3],
    a: Vec3,
    b: Vec3,
) -> Option<Vec3> {
    let da = normal.dot(a) - distance;
    let db = normal.dot(b) - distance;
    if (da - db).abs() < 1e-9 {
        return None;
    }
    let t = da / (da - db);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let hit = a + (b - a) * t;
    if point_in_polygon(vertices, normal, hit) {
        Some(hit)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_inside_unit_square_is_detected() {
        let verts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        assert!(point_in_polygon(&verts, Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.5, 0.5, 0.0)));
        assert!(!point_in_polygon(&verts, Vec3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn segment_through_polygon_plane_is_detected() {
        let verts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let hit = segment_intersects_wall(normal, 0.0, &verts, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(hit.is_some());
    }

    #[test]
    fn segment_missing_the_polygon_extent_is_not_detected() {
        let verts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let hit = segment_intersects_wall(normal, 0.0, &verts, Vec3::new(5.0, 5.0, -1.0), Vec3::new(5.0, 5.0, 1.0));
        assert!(hit.is_none());
    }
}
