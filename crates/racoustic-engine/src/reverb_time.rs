//! The late-reverb T60 source: either a room-acoustics formula evaluated
//! against the room's geometry, or a fixed per-band vector supplied
//! directly by the host. `racoustic_math::ReverbFormula` only carries the
//! formula variants (`Sabine`, `Eyring`); the `Custom` option the public
//! API exposes is an engine-level concern, not a room-model one, so it
//! lives here rather than as a third `ReverbFormula` variant.

use racoustic_math::ReverbFormula;

/// How the engine derives the late-reverb network's per-band decay time.
#[derive(Debug, Clone)]
pub enum ReverbTimeSource {
    /// Evaluate a closed-form reverberation-time formula against the
    /// room's current volume and absorption.
    Formula(ReverbFormula),
    /// Use this fixed per-band T60 vector (seconds) regardless of room
    /// geometry.
    Custom(Vec<f32>),
}
