//! Engine-wide configuration: sample rate, block size, band table, and the
//! per-class defaults fed into the IEM and FDN at startup.

mod engine_config;
mod error;

/// Configuration validation.
pub mod validation;

pub use engine_config::EngineConfig;
pub use error::{ConfigError, ConfigResult};
pub use validation::{ValidationError, ValidationResult};
