//! The room model: walls, planes, edges, and the geometric queries the
//! image-edge model needs.

use std::collections::BTreeMap;

use racoustic_math::{reverberation_time, AbsorptionVector, ReverbFormula, Vec3};

use crate::edge::{exterior_wedge_angle, Edge, EdgeId, ReceiverZone};
use crate::error::RoomError;
use crate::wall::{plane_equation, Plane, PlaneId, Wall, WallId};

const VERTEX_MATCH_EPS: f32 = 1e-3;

/// Owns the room's walls, the planes they group into, and the edges
/// discovered between them.
pub struct Room {
    num_bands: usize,
    walls: BTreeMap<WallId, Wall>,
    planes: BTreeMap<PlaneId, Plane>,
    edges: BTreeMap<EdgeId, Edge>,
    free_wall_ids: Vec<WallId>,
    free_plane_ids: Vec<PlaneId>,
    free_edge_ids: Vec<EdgeId>,
    next_wall_id: WallId,
    next_plane_id: PlaneId,
    next_edge_id: EdgeId,
    changed: bool,
    listener: Vec3,
}

impl Room {
    /// An empty room with absorption vectors expected to carry `num_bands`
    /// frequency bands.
    pub fn new(num_bands: usize) -> Self {
        Self {
            num_bands,
            walls: BTreeMap::new(),
            planes: BTreeMap::new(),
            edges: BTreeMap::new(),
            free_wall_ids: Vec::new(),
            free_plane_ids: Vec::new(),
            free_edge_ids: Vec::new(),
            next_wall_id: 0,
            next_plane_id: 0,
            next_edge_id: 0,
            changed: false,
            listener: Vec3::ZERO,
        }
    }

    /// Number of frequency bands every absorption vector must carry.
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Has the room changed since the last `update_planes_and_edges` call?
    pub fn changed(&self) -> bool {
        self.changed
    }

    fn alloc_wall_id(&mut self) -> WallId {
        self.free_wall_ids.pop().unwrap_or_else(|| {
            let id = self.next_wall_id;
            self.next_wall_id += 1;
            id
        })
    }

    fn alloc_plane_id(&mut self) -> PlaneId {
        self.free_plane_ids.pop().unwrap_or_else(|| {
            let id = self.next_plane_id;
            self.next_plane_id += 1;
            id
        })
    }

    fn alloc_edge_id(&mut self) -> EdgeId {
        self.free_edge_ids.pop().unwrap_or_else(|| {
            let id = self.next_edge_id;
            self.next_edge_id += 1;
            id
        })
    }

    fn find_or_create_plane(&mut self, normal: Vec3, distance: f32) -> PlaneId {
        for plane in self.planes.values() {
            if plane.matches(normal, distance) {
                return plane.id;
            }
        }
        let id = self.alloc_plane_id();
        self.planes.insert(
            id,
            Plane {
                id,
                normal,
                distance,
                wall_ids: Vec::new(),
                receiver_valid: false,
            },
        );
        id
    }

    /// Create a wall from an ordered, right-hand-rule vertex list and a
    /// per-band absorption vector. Runs edge discovery against every
    /// existing wall on a different plane.
    pub fn add_wall(
        &mut self,
        vertices: Vec<Vec3>,
        absorption: AbsorptionVector,
    ) -> Result<WallId, RoomError> {
        if vertices.len() < 3 {
            return Err(RoomError::DegenerateWall(vertices.len()));
        }
        if absorption.num_bands() != self.num_bands {
            return Err(RoomError::AbsorptionLengthMismatch {
                got: absorption.num_bands(),
                expected: self.num_bands,
            });
        }
        let (normal, distance) =
            plane_equation(&vertices).ok_or(RoomError::DegenerateNormal)?;

        let id = self.alloc_wall_id();
        let plane_id = self.find_or_create_plane(normal, distance);
        let wall = Wall::from_vertices(id, vertices, absorption, plane_id)
            .ok_or(RoomError::DegenerateNormal)?;
        self.walls.insert(id, wall);
        self.planes.get_mut(&plane_id).unwrap().wall_ids.push(id);

        self.init_edges(id);
        self.changed = true;
        Ok(id)
    }

    /// Replace a wall's vertex list in place. Silently ignored if `id` is
    /// out of range.
    pub fn update_wall(&mut self, id: WallId, vertices: Vec<Vec3>) -> Result<(), RoomError> {
        let Some((normal, distance)) = plane_equation(&vertices) else {
            return Err(RoomError::DegenerateNormal);
        };
        let Some(wall) = self.walls.get_mut(&id) else {
            return Ok(());
        };
        wall.vertices = vertices;
        wall.normal = normal;
        wall.distance = distance;
        self.changed = true;
        Ok(())
    }

    /// Replace a wall's absorption vector in place. Rejected (coefficient-
    /// length mismatch) with a warning rather than an error, per the
    /// geometry thread's advisory failure semantics.
    pub fn update_wall_absorption(&mut self, id: WallId, absorption: AbsorptionVector) {
        if absorption.num_bands() != self.num_bands {
            tracing::warn!(
                wall_id = id,
                got = absorption.num_bands(),
                expected = self.num_bands,
                "ignoring wall absorption update: band count mismatch"
            );
            return;
        }
        if let Some(wall) = self.walls.get_mut(&id) {
            wall.absorption = absorption;
            self.changed = true;
        }
    }

    /// Remove a wall. Out-of-range IDs are silently ignored. The wall's ID
    /// is recycled on the next `add_wall` call.
    pub fn remove_wall(&mut self, id: WallId) {
        let Some(wall) = self.walls.remove(&id) else {
            return;
        };
        if let Some(plane) = self.planes.get_mut(&wall.plane_id) {
            plane.wall_ids.retain(|&w| w != id);
            if plane.wall_ids.is_empty() {
                self.planes.remove(&wall.plane_id);
                self.free_plane_ids.push(wall.plane_id);
            }
        }
        self.edges
            .retain(|_, e| !(e.plane_a == wall.plane_id || e.plane_b == wall.plane_id));
        self.free_wall_ids.push(id);
        self.changed = true;
    }

    /// Deferred rebuild after a batch of wall edits: re-derives every
    /// plane's membership and re-runs edge discovery from scratch, then
    /// refreshes listener-dependent caches.
    pub fn update_planes_and_edges(&mut self) {
        self.edges.clear();
        self.free_edge_ids.clear();
        self.next_edge_id = 0;

        let wall_ids: Vec<WallId> = self.walls.keys().copied().collect();
        for &id in &wall_ids {
            self.init_edges(id);
        }
        self.update_listener_caches();
        self.changed = false;
    }

    fn init_edges(&mut self, new_wall_id: WallId) {
        let other_ids: Vec<WallId> = self
            .walls
            .keys()
            .copied()
            .filter(|&id| id != new_wall_id)
            .collect();

        for other_id in other_ids {
            let (wall_a, wall_b) = (&self.walls[&new_wall_id], &self.walls[&other_id]);
            if wall_a.plane_id == wall_b.plane_id {
                continue;
            }
            if let Some((base, top)) = shared_segment(wall_a, wall_b) {
                let normal_a = wall_a.normal;
                let normal_b = wall_b.normal;
                let (plane_a, plane_b, normal_a, normal_b) =
                    if normal_a.cross(normal_b).dot(top - base) >= 0.0 {
                        (wall_a.plane_id, wall_b.plane_id, normal_a, normal_b)
                    } else {
                        (wall_b.plane_id, wall_a.plane_id, normal_b, normal_a)
                    };
                let id = self.alloc_edge_id();
                self.edges.insert(
                    id,
                    Edge {
                        id,
                        plane_a,
                        plane_b,
                        normal_a,
                        normal_b,
                        base,
                        top,
                        wedge_angle: exterior_wedge_angle(normal_a, normal_b),
                        receiver_zone: ReceiverZone::Invalid,
                    },
                );
            }
        }
    }

    /// Per-band T60 estimate over every wall in the room.
    pub fn get_reverb_time(&self, formula: ReverbFormula, volume_m3: f32) -> Vec<f32> {
        let absorptions: Vec<AbsorptionVector> =
            self.walls.values().map(|w| {
                AbsorptionVector::from_alpha(
                    &(0..self.num_bands).map(|b| w.absorption.alpha(b)).collect::<Vec<_>>(),
                    w.area(),
                )
            }).collect();
        reverberation_time(formula, volume_m3, &absorptions, self.num_bands)
    }

    /// Move the listener and refresh `receiver_valid`/`receiver_zone` caches.
    pub fn update_listener(&mut self, listener: Vec3) {
        self.listener = listener;
        self.update_listener_caches();
    }

    fn update_listener_caches(&mut self) {
        for plane in self.planes.values_mut() {
            plane.receiver_valid = plane.normal.dot(self.listener) - plane.distance > 0.0;
        }
        for edge in self.edges.values_mut() {
            edge.update_receiver_zone(self.listener);
        }
    }

    /// Does the listener lie in front of this plane? `false` for an
    /// out-of-range ID.
    pub fn receiver_valid(&self, plane_id: PlaneId) -> bool {
        self.planes.get(&plane_id).map(Plane::receiver_valid).unwrap_or(false)
    }

    /// Cached receiver zone for this edge. `ReceiverZone::Invalid` for an
    /// out-of-range ID.
    pub fn edge_receiver_zone(&self, edge_id: EdgeId) -> ReceiverZone {
        self.edges.get(&edge_id).map(Edge::receiver_zone).unwrap_or(ReceiverZone::Invalid)
    }

    /// Iterate walls in stable ID order.
    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.values()
    }

    /// Iterate planes in stable ID order.
    pub fn planes(&self) -> impl Iterator<Item = &Plane> {
        self.planes.values()
    }

    /// Iterate edges in stable ID order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Look up a single wall.
    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    /// Look up a single edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }
}

/// The segment shared between two walls on different planes, if any: the
/// two vertices (in either wall's list) that coincide within tolerance.
fn shared_segment(a: &Wall, b: &Wall) -> Option<(Vec3, Vec3)> {
    let mut matches = Vec::new();
    for &va in &a.vertices {
        for &vb in &b.vertices {
            if va.distance(vb) < VERTEX_MATCH_EPS {
                matches.push(va);
                break;
            }
        }
    }
    if matches.len() < 2 {
        return None;
    }
    // A convex polygon shares at most one edge (two vertices) with another
    // convex polygon on a different plane; take the first two matches.
    let base = matches[0];
    let top = matches[1];
    if base.distance(top) < VERTEX_MATCH_EPS {
        return None;
    }

    // Reflex check: a vertex of `a` not on the shared edge must lie behind
    // `b`'s plane, otherwise the two walls don't bound a convex wedge.
    let test_vertex = a.vertices.iter().find(|&&v| v.distance(base) >= VERTEX_MATCH_EPS && v.distance(top) >= VERTEX_MATCH_EPS);
    if let Some(&test_vertex) = test_vertex {
        if b.signed_distance_to(test_vertex) > VERTEX_MATCH_EPS {
            return None;
        }
    }

    Some((base, top))
}
