//! The shared late-reverb network: an `N`-channel Feedback Delay Network
//! whose per-channel delay lengths derive from the room's dimensions and
//! whose per-band absorption tracks the room's measured T60.

use racoustic_dsp::{linear_to_db, sanitize, flush_denormal, GraphicEq, InterpolatedDelay};
use racoustic_math::DenseMatrix;

const SPEED_OF_SOUND_M_S: f32 = 343.0;

/// Which orthogonal feedback transform mixes energy between FDN channels.
#[derive(Debug, Clone)]
pub enum FeedbackMatrix {
    /// `x_i = (2/N) * sum(y) - y_i`, the reference engine's closed form.
    Householder,
    /// A fixed orthonormal basis built once by Gram-Schmidt.
    RandomOrthogonal(DenseMatrix),
}

impl FeedbackMatrix {
    /// Mix `y` (one value per channel) into `out`, the feedback vector fed
    /// back into each delay line's input this sample.
    fn apply(&self, y: &[f32], out: &mut [f32]) {
        match self {
            FeedbackMatrix::Householder => {
                let n = y.len() as f32;
                let sum: f32 = y.iter().sum();
                let scaled = (2.0 / n) * sum;
                for (o, &yi) in out.iter_mut().zip(y) {
                    *o = scaled - yi;
                }
            }
            FeedbackMatrix::RandomOrthogonal(matrix) => matrix.apply(y, out),
        }
    }
}

struct FdnChannel {
    delay: InterpolatedDelay,
    delay_samples: usize,
    absorb: GraphicEq,
    reflection: GraphicEq,
}

/// An `N`-channel feedback delay network rendering the room's diffuse late
/// reverb tail.
pub struct Fdn {
    channels: Vec<FdnChannel>,
    matrix: FeedbackMatrix,
    feedback_scratch: Vec<f32>,
    mixed_scratch: Vec<f32>,
}

impl Fdn {
    /// Build an `N`-channel FDN. `primary_dimensions_m` seeds each channel's
    /// base delay length (typically the room's bounding-box edge lengths);
    /// channels are spread across a `[0.7, 1.3]` multiplier of the mean
    /// dimension and then nudged to be pairwise coprime, matching the
    /// reference engine's GCD-based tuning search.
    pub fn new(
        channel_count: usize,
        primary_dimensions_m: &[f32],
        sample_rate: f32,
        num_bands: usize,
        matrix: FeedbackMatrix,
    ) -> Self {
        assert!(channel_count >= 2, "an FDN needs at least 2 channels");
        let mean_dim = if primary_dimensions_m.is_empty() {
            5.0
        } else {
            primary_dimensions_m.iter().sum::<f32>() / primary_dimensions_m.len() as f32
        };
        let base_samples = mean_dim * sample_rate / SPEED_OF_SOUND_M_S;

        let mut lengths = Vec::with_capacity(channel_count);
        for i in 0..channel_count {
            let spread = if channel_count > 1 {
                0.7 + 0.6 * i as f32 / (channel_count - 1) as f32
            } else {
                1.0
            };
            let mut length = (base_samples * spread).round().max(1.0) as usize;
            while lengths.iter().any(|&other| gcd(length, other) != 1) {
                length += 1;
            }
            lengths.push(length);
        }

        let channels = lengths
            .into_iter()
            .map(|delay_samples| FdnChannel {
                delay: InterpolatedDelay::new(delay_samples + 1),
                delay_samples,
                absorb: GraphicEq::new(&octave_centers_for(num_bands), 1.414, sample_rate),
                reflection: GraphicEq::new(&octave_centers_for(num_bands), 1.414, sample_rate),
            })
            .collect::<Vec<_>>();

        let matrix = match matrix {
            FeedbackMatrix::RandomOrthogonal(m) => {
                assert_eq!(m.dim(), channel_count);
                FeedbackMatrix::RandomOrthogonal(m)
            }
            other => other,
        };

        Self {
            channels,
            matrix,
            feedback_scratch: vec![0.0; channel_count],
            mixed_scratch: vec![0.0; channel_count],
        }
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Set channel `i`'s per-band absorption so the steady-state decay
    /// matches `t60_per_band` (seconds), per `gain = 10^(-3*L_i/(fs*T60))`.
    pub fn set_channel_t60(&mut self, channel: usize, sample_rate: f32, t60_per_band: &[f32]) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        let l = ch.delay_samples as f32;
        let gains_db: Vec<f32> = t60_per_band
            .iter()
            .map(|&t60| {
                if t60 <= 0.0 {
                    0.0
                } else {
                    let gain = libm::powf(10.0, -3.0 * l / (sample_rate * t60));
                    linear_to_db(gain.max(1e-6))
                }
            })
            .collect();
        ch.absorb.set_band_gains_db(&gains_db);
    }

    /// Set channel `i`'s output reflection EQ to the room's average
    /// per-direction absorption for that channel's panning direction.
    pub fn set_channel_reflection(&mut self, channel: usize, gains_db: &[f32]) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.reflection.set_band_gains_db(gains_db);
        }
    }

    /// Run one sample: `inputs[i]` feeds channel `i`, `outputs[i]` receives
    /// that channel's reflection-filtered output for the reverb-source
    /// panning stage to consume.
    pub fn process(&mut self, inputs: &[f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.channels.len());
        debug_assert_eq!(outputs.len(), self.channels.len());

        for (i, ch) in self.channels.iter_mut().enumerate() {
            self.feedback_scratch[i] = ch.absorb.process(ch.delay.read(ch.delay_samples as f32));
        }

        self.matrix.apply(&self.feedback_scratch, &mut self.mixed_scratch);

        for (i, ch) in self.channels.iter_mut().enumerate() {
            let fed_back = flush_denormal(sanitize(self.mixed_scratch[i], 0.0) + inputs[i]);
            ch.delay.write(fed_back);
            outputs[i] = ch.reflection.process(self.feedback_scratch[i]);
        }
    }

    /// Zero every delay buffer and filter state. Called on new room
    /// geometry or a sample-rate change.
    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.delay.clear();
            ch.absorb.clear();
            ch.reflection.clear();
        }
        self.feedback_scratch.fill(0.0);
        self.mixed_scratch.fill(0.0);
    }
}

fn octave_centers_for(num_bands: usize) -> Vec<f32> {
    racoustic_dsp::OCTAVE_BAND_CENTERS_HZ
        .iter()
        .copied()
        .take(num_bands.max(1))
        .collect()
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_lengths_are_pairwise_coprime() {
        let fdn = Fdn::new(8, &[6.0, 4.0, 3.0], 48000.0, 4, FeedbackMatrix::Householder);
        let lengths: Vec<usize> = fdn.channels.iter().map(|c| c.delay_samples).collect();
        for i in 0..lengths.len() {
            for j in (i + 1)..lengths.len() {
                assert_eq!(gcd(lengths[i], lengths[j]), 1);
            }
        }
    }

    #[test]
    fn silence_in_produces_decaying_not_exploding_output() {
        let mut fdn = Fdn::new(8, &[6.0, 4.0, 3.0], 48000.0, 4, FeedbackMatrix::Householder);
        for ch in 0..8 {
            fdn.set_channel_t60(ch, 48000.0, &[1.0, 1.0, 1.0, 1.0]);
        }
        let inputs = vec![0.0; 8];
        let mut outputs = vec![0.0; 8];
        let mut impulse = inputs.clone();
        impulse[0] = 1.0;
        fdn.process(&impulse, &mut outputs);
        for _ in 0..48000 {
            fdn.process(&inputs, &mut outputs);
            for &o in &outputs {
                assert!(o.is_finite());
                assert!(o.abs() < 100.0);
            }
        }
    }

    #[test]
    fn random_orthogonal_matrix_runs_without_panicking() {
        let matrix = FeedbackMatrix::RandomOrthogonal(DenseMatrix::random_orthogonal(8, 7));
        let mut fdn = Fdn::new(8, &[5.0], 48000.0, 4, matrix);
        let inputs = vec![0.1; 8];
        let mut outputs = vec![0.0; 8];
        for _ in 0..1000 {
            fdn.process(&inputs, &mut outputs);
        }
        assert!(outputs.iter().all(|o| o.is_finite()));
    }

    #[test]
    fn reset_clears_delay_state() {
        let mut fdn = Fdn::new(8, &[5.0], 48000.0, 4, FeedbackMatrix::Householder);
        let mut impulse = vec![0.0; 8];
        impulse[0] = 1.0;
        let mut outputs = vec![0.0; 8];
        fdn.process(&impulse, &mut outputs);
        fdn.reset();
        let silence = vec![0.0; 8];
        fdn.process(&silence, &mut outputs);
        assert!(outputs.iter().all(|&o| o == 0.0));
    }
}
