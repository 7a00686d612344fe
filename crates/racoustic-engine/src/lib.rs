//! The real-time geometric room-acoustics spatialiser's orchestration
//! layer.
//!
//! This crate provides:
//!
//! - [`Context`] - owns the room/IEM scene, the shared late-reverb
//!   network, and the image-source slot pool, and exposes the engine's
//!   stable operations (`init_source`, `submit_audio`, `process_output`,
//!   ...)
//! - [`spin_lock`]/[`thread_pool`] - the non-blocking primitives the
//!   audio callback uses to fan per-source rendering out across a worker
//!   pool without ever taking a blocking lock
//! - [`release_pool`] - deferred destruction for scene snapshots handed
//!   off between the IEM background thread and the audio thread
//! - [`spatialiser`] - the seam a host plugs a real HRTF/ILD renderer
//!   into
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use racoustic_config::EngineConfig;
//! use racoustic_engine::Context;
//!
//! let mut ctx = Context::init(EngineConfig::default())?;
//! let source = ctx.init_source();
//! ctx.submit_audio(source, &samples);
//! if ctx.process_output() {
//!     let stereo = ctx.get_output_buffer().unwrap();
//! }
//! ```

mod context;
mod diffraction_kind;
mod error;
pub mod release_pool;
mod reverb_time;
pub mod spatialiser;
pub mod spin_lock;
pub mod thread_pool;

pub use context::{Context, SpatialisationMode};
pub use diffraction_kind::DiffractionModelKind;
pub use error::{EngineError, EngineResult};
pub use release_pool::ReleasePool;
pub use reverb_time::ReverbTimeSource;
pub use spatialiser::{NullSpatialiser, Spatialiser};
pub use spin_lock::SpinLock;
pub use thread_pool::ThreadPool;
