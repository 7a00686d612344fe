//! The engine's own error taxonomy. Every call across the public surface
//! collapses to a boolean or silently degrades (see the crate's module
//! docs); `EngineError` exists for the handful of calls that are genuinely
//! fallible at the Rust API level, before that collapse happens.

use thiserror::Error;

/// Failures constructing or reconfiguring a [`crate::Context`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The supplied `EngineConfig` failed validation.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] racoustic_config::ValidationError),
}

/// Convenience result type for fallible engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
