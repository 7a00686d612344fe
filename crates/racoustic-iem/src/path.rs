//! The IEM's description of one audible propagation path.

use racoustic_diffraction::DiffractionPath;
use racoustic_math::{AbsorptionVector, Vec3};
use racoustic_room::{EdgeId, PlaneId};

/// One segment of a propagation path: a specular reflection in a plane, or
/// a diffraction around an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathPart {
    /// Specular reflection in this plane.
    Reflection(PlaneId),
    /// Diffraction around this edge.
    Diffraction(EdgeId),
}

impl PathPart {
    fn key_fragment(self) -> String {
        match self {
            PathPart::Reflection(id) => format!("r{id}"),
            PathPart::Diffraction(id) => format!("d{id}"),
        }
    }
}

/// One audible geometric path from a source to the listener: an ordered
/// sequence of path parts, the resulting image position, the cumulative
/// wall absorption, and (if any part is diffractive) the diffraction
/// geometry.
#[derive(Debug, Clone)]
pub struct ImageSourceData {
    /// Source this path originates from.
    pub source_id: usize,
    /// Ordered parts from source to listener.
    pub parts: Vec<PathPart>,
    /// Resulting image position (or apex position for a pure diffraction).
    pub image_position: Vec3,
    /// Cumulative wall absorption composed along the path.
    pub absorption: AbsorptionVector,
    /// Diffraction geometry, if any part of this path diffracts.
    pub diffraction: Option<DiffractionPath>,
    /// Stable string key, e.g. `"s42r7r13d2"`.
    pub key: String,
    /// Currently visible (unobstructed) this cycle.
    pub visible: bool,
    /// Feeds the shared FDN rather than a direct HRTF-rendered path.
    pub feeds_fdn: bool,
    /// Cycle tag used for garbage collection.
    pub cycle_tag: u64,
}

impl ImageSourceData {
    /// Order of this path (number of reflective/diffractive parts).
    pub fn order(&self) -> usize {
        self.parts.len()
    }

    /// Build the stable string key for a source and part sequence.
    pub fn build_key(source_id: usize, parts: &[PathPart]) -> String {
        let mut key = format!("s{source_id}");
        for part in parts {
            key.push_str(&part.key_fragment());
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_key_matches_spec_example() {
        let parts = [
            PathPart::Reflection(7),
            PathPart::Reflection(13),
            PathPart::Diffraction(2),
        ];
        assert_eq!(ImageSourceData::build_key(42, &parts), "s42r7r13d2");
    }
}
