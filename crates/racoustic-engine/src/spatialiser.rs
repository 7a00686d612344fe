//! The binaural rendering seam. HRTF/ILD convolution is platform-specific
//! (3D Tune-In-style SOFA tables, proprietary filter banks) and outside
//! this crate's scope; hosts implement [`Spatialiser`] over whatever
//! library they load via [`racoustic_engine::Context::load_spatialisation_files`](
//! crate::Context::load_spatialisation_files) and hand the engine a boxed
//! instance. [`NullSpatialiser`] is the default: a straight mono-to-stereo
//! passthrough so the rest of the pipeline (FDN, diffraction, wall
//! absorption) is exercisable without a real HRTF data set.

use racoustic_math::{Quat, Vec3};

/// One mono source rendered into a stereo pair, given the source's
/// position and orientation relative to the listener.
pub trait Spatialiser: Send {
    /// Render `input` into `output` (interleaved L/R, `2 * input.len()`
    /// samples) for a source at `relative_position` (listener-relative,
    /// listener-frame) with `listener_orientation` already applied.
    fn render(&mut self, input: &[f32], relative_position: Vec3, output: &mut [f32]);

    /// Reset any interpolation/tail state (new source attached to a slot).
    fn reset(&mut self);
}

/// Equal-power mono-to-stereo passthrough: no ILD/ITD, no HRTF filtering.
/// Used until real spatialisation data is loaded, and in tests.
#[derive(Debug, Default)]
pub struct NullSpatialiser;

impl Spatialiser for NullSpatialiser {
    fn render(&mut self, input: &[f32], _relative_position: Vec3, output: &mut [f32]) {
        debug_assert_eq!(output.len(), 2 * input.len());
        let gain = std::f32::consts::FRAC_1_SQRT_2;
        for (i, x) in input.iter().enumerate() {
            output[2 * i] = x * gain;
            output[2 * i + 1] = x * gain;
        }
    }

    fn reset(&mut self) {}
}

/// Forward vector of a listener/source orientation, per the engine's
/// right-handed coordinate convention.
pub fn forward(orientation: Quat) -> Vec3 {
    orientation.forward()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_spatialiser_splits_energy_equally() {
        let mut s = NullSpatialiser;
        let input = [1.0f32, -1.0];
        let mut output = [0.0f32; 4];
        s.render(&input, Vec3::ZERO, &mut output);
        assert_eq!(output[0], output[1]);
        assert_eq!(output[2], output[3]);
    }
}
