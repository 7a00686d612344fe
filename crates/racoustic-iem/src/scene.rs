//! Sources, the listener, and the IEM's path-enumeration loop.

use std::collections::BTreeMap;

use racoustic_diffraction::DiffractionPath;
use racoustic_math::{AbsorptionVector, Quat, Vec3};
use racoustic_room::{EdgeId, PlaneId, ReceiverZone, Room, WallId};

use crate::occlusion::{segment_intersects_wall, segment_occluded};
use crate::path::{ImageSourceData, PathPart};

/// A source's directivity pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directivity {
    /// Radiates equally in all directions.
    Omni,
    /// A cardioid-family pattern with the given order (1 = cardioid).
    Cardioid(u8),
    /// A measured loudspeaker directivity, referenced by ID.
    Measured(usize),
}

/// Stable numeric ID for a source.
pub type SourceId = usize;

/// A sound source: position, orientation, directivity, and a monotonic
/// `changed` flag the IEM reads to decide whether to re-solve it.
#[derive(Debug, Clone)]
pub struct Source {
    id: SourceId,
    position: Vec3,
    orientation: Quat,
    directivity: Directivity,
    changed: bool,
}

impl Source {
    /// Create a source at a position with identity orientation and omni
    /// directivity.
    pub fn new(id: SourceId, position: Vec3) -> Self {
        Self {
            id,
            position,
            orientation: Quat::IDENTITY,
            directivity: Directivity::Omni,
            changed: true,
        }
    }

    /// Stable ID.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the source, marking it changed.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.changed = true;
    }

    /// Reorient the source, marking it changed.
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
        self.changed = true;
    }

    /// Current orientation.
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Current directivity pattern.
    pub fn directivity(&self) -> Directivity {
        self.directivity
    }

    /// Change the directivity pattern, marking the source changed.
    pub fn set_directivity(&mut self, directivity: Directivity) {
        self.directivity = directivity;
        self.changed = true;
    }

    /// Has this source changed since the IEM last cleared the flag?
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Clear the changed flag after a solve.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}

/// Per-class path-order limits and enumeration toggles, pushed atomically
/// into the IEM loop.
#[derive(Debug, Clone, Copy)]
pub struct IemConfig {
    /// Maximum specular reflection order.
    pub max_reflection_order: usize,
    /// Maximum order for shadowed diffraction paths.
    pub max_shadow_diffraction_order: usize,
    /// Maximum order for non-shadowed ("specular") diffraction paths.
    pub max_specular_diffraction_order: usize,
    /// Edges shorter than this are never considered.
    pub min_edge_length: f32,
    /// Direct sound is always emitted without an occlusion test.
    pub direct_always_audible: bool,
    /// Late reverb (FDN feed) is active.
    pub late_reverb_active: bool,
}

impl Default for IemConfig {
    fn default() -> Self {
        Self {
            max_reflection_order: 2,
            max_shadow_diffraction_order: 1,
            max_specular_diffraction_order: 0,
            min_edge_length: 0.05,
            direct_always_audible: false,
            late_reverb_active: true,
        }
    }
}

/// The image-edge model: owns the per-source published path maps and the
/// bookkeeping (cycle tags) needed to garbage-collect stale paths.
pub struct Iem {
    config: IemConfig,
    sources: BTreeMap<SourceId, Source>,
    listener: Vec3,
    cycle: u64,
    published: BTreeMap<SourceId, BTreeMap<String, ImageSourceData>>,
}

impl Iem {
    /// An empty IEM with the given configuration.
    pub fn new(config: IemConfig) -> Self {
        Self {
            config,
            sources: BTreeMap::new(),
            listener: Vec3::ZERO,
            cycle: 0,
            published: BTreeMap::new(),
        }
    }

    /// Insert or replace a source.
    pub fn add_source(&mut self, source: Source) {
        self.sources.insert(source.id(), source);
    }

    /// Remove a source and its published paths. Out-of-range IDs are
    /// silently ignored.
    pub fn remove_source(&mut self, id: SourceId) {
        self.sources.remove(&id);
        self.published.remove(&id);
    }

    /// Look up a source for in-place editing (position, orientation,
    /// directivity). `None` for an unknown ID.
    pub fn source_mut(&mut self, id: SourceId) -> Option<&mut Source> {
        self.sources.get_mut(&id)
    }

    /// Replace the per-class order limits and enumeration toggles. Takes
    /// effect on the next `run_cycle`.
    pub fn set_config(&mut self, config: IemConfig) {
        self.config = config;
    }

    /// Move the listener.
    pub fn set_listener(&mut self, position: Vec3) {
        self.listener = position;
    }

    /// Currently published paths for a source, keyed by their stable
    /// string key.
    pub fn paths_for(&self, source_id: SourceId) -> Option<&BTreeMap<String, ImageSourceData>> {
        self.published.get(&source_id)
    }

    /// Every source's currently published path map, keyed by source ID.
    /// Used by the orchestrator to snapshot the whole scene for one IEM
    /// cycle's atomic publication.
    pub fn published(&self) -> &BTreeMap<SourceId, BTreeMap<String, ImageSourceData>> {
        &self.published
    }

    /// Run one full IEM cycle: snapshot the room's listener-dependent
    /// caches, then enumerate direct sound and every combined reflection/
    /// diffraction path for every source, publishing the result.
    ///
    /// Published paths persist across cycles rather than being rebuilt from
    /// an empty map: every path still audible this cycle is re-inserted
    /// with `cycle_tag` bumped to the current cycle, and anything left over
    /// from a prior cycle (a path whose geometry no longer survives
    /// enumeration) is dropped by the trailing `retain`. This is the
    /// garbage-collection pass `cycle_tag` exists for.
    ///
    /// The per-direction reverb reflection-filter ray-cast is not run here:
    /// it reads both the room and the fixed reverb-source ring, which lives
    /// in a crate downstream of this one, so the orchestrator calls it
    /// itself once per cycle, immediately after this method.
    pub fn run_cycle(&mut self, room: &mut Room) {
        room.update_listener(self.listener);
        self.cycle += 1;

        let source_ids: Vec<SourceId> = self.sources.keys().copied().collect();
        for id in source_ids {
            let mut paths = self.published.remove(&id).unwrap_or_default();
            {
                let source = &self.sources[&id];
                self.enumerate_direct(room, source, &mut paths);
                self.enumerate_combined(room, source, &mut paths);
            }
            paths.retain(|_, data| data.cycle_tag == self.cycle);
            self.published.insert(id, paths);
            self.sources.get_mut(&id).unwrap().clear_changed();
        }
    }

    fn enumerate_direct(&self, room: &Room, source: &Source, out: &mut BTreeMap<String, ImageSourceData>) {
        let visible = self.config.direct_always_audible
            || !segment_occluded(room, source.position(), self.listener, &[]);
        if !visible {
            return;
        }
        let key = ImageSourceData::build_key(source.id(), &[]);
        out.insert(
            key.clone(),
            ImageSourceData {
                source_id: source.id(),
                parts: Vec::new(),
                image_position: source.position(),
                absorption: AbsorptionVector::fully_reflective(room.num_bands(), 0.0),
                diffraction: None,
                key,
                visible: true,
                feeds_fdn: false,
                cycle_tag: self.cycle,
            },
        );
    }

    /// Enumerate every reflection/diffraction path up to the configured
    /// per-class orders, interleaving the two freely: a candidate that has
    /// already reflected may diffract around a further edge from its image
    /// position (diffraction-after-reflections), and a candidate that has
    /// already diffracted may reflect or diffract again from its apex
    /// (higher-order diffraction, reflect-after-diffraction). Each step
    /// extends every surviving candidate from the previous step by either
    /// one more reflection or one more diffraction, so the frontier after
    /// `k` steps holds every order-`k` combination still geometrically
    /// possible.
    fn enumerate_combined(&self, room: &Room, source: &Source, out: &mut BTreeMap<String, ImageSourceData>) {
        let max_refl = self.config.max_reflection_order;
        let max_shadow = self.config.max_shadow_diffraction_order;
        let max_spec = self.config.max_specular_diffraction_order;
        if max_refl == 0 && max_shadow == 0 && max_spec == 0 {
            return;
        }

        let mut frontier = vec![Working {
            parts: Vec::new(),
            image: source.position(),
            plane_chain: Vec::new(),
            last_edge: None,
            reflection_order: 0,
            shadow_order: 0,
            specular_order: 0,
            absorption: AbsorptionVector::fully_reflective(room.num_bands(), 0.0),
        }];

        for _step in 0..(max_refl + max_shadow + max_spec).max(1) {
            let mut next_frontier = Vec::new();

            for working in &frontier {
                if working.reflection_order < max_refl {
                    self.extend_by_reflection(room, source, working, out, &mut next_frontier);
                }
                if working.shadow_order < max_shadow || working.specular_order < max_spec {
                    self.extend_by_diffraction(room, source, working, max_shadow, max_spec, out, &mut next_frontier);
                }
            }

            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
    }

    fn extend_by_reflection(
        &self,
        room: &Room,
        source: &Source,
        working: &Working,
        out: &mut BTreeMap<String, ImageSourceData>,
        next_frontier: &mut Vec<Working>,
    ) {
        for plane in room.planes() {
            if working.plane_chain.last() == Some(&plane.id()) {
                continue;
            }
            if !room.receiver_valid(plane.id()) {
                continue;
            }
            let image = reflect_point(working.image, plane.normal(), plane.distance());
            if plane.normal().dot(image) - plane.distance() <= 0.0 {
                continue; // image must be in front of the plane
            }

            let mut parts = working.parts.clone();
            parts.push(PathPart::Reflection(plane.id()));
            let mut chain = working.plane_chain.clone();
            chain.push(plane.id());

            let wall_hit = plane
                .wall_ids()
                .iter()
                .filter_map(|&wid| room.wall(wid))
                .find_map(|wall| {
                    segment_intersects_wall(wall.normal(), wall.distance(), wall.vertices(), image, self.listener)
                        .map(|hit| (wall, hit))
                });
            let Some((wall, _hit)) = wall_hit else {
                next_frontier.push(Working {
                    parts,
                    image,
                    plane_chain: chain,
                    last_edge: working.last_edge,
                    reflection_order: working.reflection_order + 1,
                    shadow_order: working.shadow_order,
                    specular_order: working.specular_order,
                    absorption: working.absorption.clone(),
                });
                continue;
            };

            let excluding = excluded_wall_ids(room, &chain);
            let absorption = working.absorption.compose(wall.absorption());
            if !segment_occluded(room, image, self.listener, &excluding) {
                let key = ImageSourceData::build_key(source.id(), &parts);
                out.insert(
                    key.clone(),
                    ImageSourceData {
                        source_id: source.id(),
                        parts: parts.clone(),
                        image_position: image,
                        absorption: absorption.clone(),
                        diffraction: None,
                        key,
                        visible: true,
                        feeds_fdn: false,
                        cycle_tag: self.cycle,
                    },
                );
            }
            next_frontier.push(Working {
                parts,
                image,
                plane_chain: chain,
                last_edge: working.last_edge,
                reflection_order: working.reflection_order + 1,
                shadow_order: working.shadow_order,
                specular_order: working.specular_order,
                absorption,
            });
        }
    }

    fn extend_by_diffraction(
        &self,
        room: &Room,
        source: &Source,
        working: &Working,
        max_shadow: usize,
        max_spec: usize,
        out: &mut BTreeMap<String, ImageSourceData>,
        next_frontier: &mut Vec<Working>,
    ) {
        for edge in room.edges() {
            if Some(edge.id()) == working.last_edge {
                continue;
            }
            if edge.length() < self.config.min_edge_length {
                continue;
            }
            if !matches!(edge.receiver_zone(), ReceiverZone::Shadowed | ReceiverZone::Reflection) {
                continue;
            }
            let diffraction = DiffractionPath::compute(edge, edge.id(), working.image, self.listener);
            if !diffraction.valid {
                continue;
            }

            let (shadow_order, specular_order) = if diffraction.in_shadow {
                if working.shadow_order >= max_shadow {
                    continue;
                }
                (working.shadow_order + 1, working.specular_order)
            } else {
                if working.specular_order >= max_spec {
                    continue;
                }
                (working.shadow_order, working.specular_order + 1)
            };

            let apex = edge.base() + edge.axis() * diffraction.apex_z;
            let excluding = excluded_wall_ids(room, &working.plane_chain);
            let clear = !segment_occluded(room, working.image, apex, &excluding)
                && !segment_occluded(room, apex, self.listener, &[]);
            if !clear {
                continue;
            }

            let mut parts = working.parts.clone();
            parts.push(PathPart::Diffraction(edge.id()));
            let key = ImageSourceData::build_key(source.id(), &parts);
            out.insert(
                key.clone(),
                ImageSourceData {
                    source_id: source.id(),
                    parts: parts.clone(),
                    image_position: apex,
                    absorption: working.absorption.clone(),
                    diffraction: Some(diffraction),
                    key,
                    visible: true,
                    feeds_fdn: false,
                    cycle_tag: self.cycle,
                },
            );
            next_frontier.push(Working {
                parts,
                image: apex,
                plane_chain: working.plane_chain.clone(),
                last_edge: Some(edge.id()),
                reflection_order: working.reflection_order,
                shadow_order,
                specular_order,
                absorption: working.absorption.clone(),
            });
        }
    }
}

/// One partially-built path candidate during combined reflection/
/// diffraction enumeration: the emitting position so far (an image-source
/// mirror point or a diffraction apex), the chain of planes already
/// reflected off (to reject immediate repeats and self-occlusion), the last
/// edge diffracted around (ditto), and the per-class order counts used so
/// far.
struct Working {
    parts: Vec<PathPart>,
    image: Vec3,
    plane_chain: Vec<PlaneId>,
    last_edge: Option<EdgeId>,
    reflection_order: usize,
    shadow_order: usize,
    specular_order: usize,
    absorption: AbsorptionVector,
}

/// Wall IDs belonging to any plane in `chain`, excluded from occlusion
/// tests so a path doesn't reject itself against the surface it just
/// reflected off.
fn excluded_wall_ids(room: &Room, chain: &[PlaneId]) -> Vec<WallId> {
    chain
        .iter()
        .filter_map(|&pid| room.planes().find(|p| p.id() == pid))
        .flat_map(|p| p.wall_ids().iter().copied())
        .collect()
}

fn reflect_point(point: Vec3, normal: Vec3, distance: f32) -> Vec3 {
    let d = normal.dot(point) - distance;
    point - normal * (2.0 * d)
}
