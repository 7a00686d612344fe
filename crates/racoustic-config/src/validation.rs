//! Validation of an [`crate::EngineConfig`] before it reaches the engine.

use thiserror::Error;

/// Why an `EngineConfig` was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Sample rate is zero or negative.
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    /// Frames-per-callback is zero.
    #[error("frames per callback must be non-zero")]
    ZeroFramesPerCallback,

    /// Band table is empty.
    #[error("band table must have at least one band")]
    EmptyBandTable,

    /// FDN channel count is below the minimum of 2.
    #[error("FDN channel count must be at least 2, got {0}")]
    TooFewFdnChannels(usize),

    /// Lerp factor outside `(0, 1]`.
    #[error("lerp factor must be in (0, 1], got {0}")]
    InvalidLerpFactor(f32),

    /// Shelving Q is zero or negative.
    #[error("shelving Q must be positive, got {0}")]
    InvalidShelvingQ(f32),

    /// A configured path order is unreasonably large (`> 8`), almost
    /// certainly a misconfiguration rather than an intentional deep scene.
    #[error("{class} order {order} exceeds the sane maximum of 8")]
    OrderTooHigh {
        /// Which order class (`reflection`, `shadow_diffraction`, ...).
        class: &'static str,
        /// The configured order.
        order: u32,
    },
}

/// Result alias for validation.
pub type ValidationResult = Result<(), ValidationError>;
