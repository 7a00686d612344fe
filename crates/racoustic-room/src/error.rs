//! Error types for room geometry operations.

use thiserror::Error;

/// Errors that can occur while editing room geometry.
#[derive(Debug, Error)]
pub enum RoomError {
    /// A wall was given fewer than 3 vertices.
    #[error("wall must have at least 3 vertices, got {0}")]
    DegenerateWall(usize),

    /// A wall's vertices are collinear or otherwise fail to define a plane.
    #[error("wall vertices do not define a valid plane (zero-area polygon)")]
    DegenerateNormal,

    /// An absorption vector's band count does not match the room's.
    #[error("absorption vector has {got} bands, room expects {expected}")]
    AbsorptionLengthMismatch {
        /// Number of bands supplied.
        got: usize,
        /// Number of bands the room was configured with.
        expected: usize,
    },
}
