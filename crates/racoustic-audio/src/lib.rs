//! Per-image-source processing chains and the shared late-reverb network.
//!
//! - [`slot`] - the per-image-source `ImageSourceSlot` chain: wall
//!   absorption, diffraction, air absorption, and the attach/detach gain
//!   ramp
//! - [`fdn`] - the `N`-channel Feedback Delay Network rendering the
//!   diffuse late-reverb tail
//! - [`reverb_source`] - the fixed ring of directional emitters that
//!   render the FDN's output for HRTF spatialisation

pub mod fdn;
pub mod reverb_source;
pub mod slot;

pub use fdn::{Fdn, FeedbackMatrix};
pub use reverb_source::{ReverbSource, ReverbSourceRing};
pub use slot::ImageSourceSlot;
