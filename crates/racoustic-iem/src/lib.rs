//! The image-edge model: enumerates audible propagation paths (direct
//! sound, specular reflections, first-order diffraction) from every source
//! to the listener against a [`racoustic_room::Room`].
//!
//! - [`occlusion`] - segment/polygon intersection tests used to decide
//!   whether a candidate path is obstructed
//! - [`path`] - the published path entity (`ImageSourceData`) and its
//!   stable string key
//! - [`scene`] - sources, the listener, and the `Iem` enumeration engine

pub mod occlusion;
pub mod path;
pub mod scene;

pub use occlusion::{segment_intersects_wall, segment_occluded};
pub use path::{ImageSourceData, PathPart};
pub use scene::{Directivity, Iem, IemConfig, Source, SourceId};
