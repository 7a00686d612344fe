//! The per-image-source processing slot: a `idle <-> attached` state
//! machine owning a wall-absorption EQ, an air-absorption filter, and a
//! swappable diffraction model, all driving toward the gain ramp that
//! fades a slot in on attach and out on removal.

use racoustic_dsp::{GraphicEq, LinearSmoothedParam, OnePole};
use racoustic_diffraction::DiffractionModel;
use racoustic_iem::ImageSourceData;

/// Gain ramp time for attach/detach and for a diffraction-model crossfade.
const GAIN_RAMP_MS: f32 = 10.0;

/// Reference distance (metres) at which the air-absorption filter is fully
/// open; cutoff tightens with distance beyond this.
const AIR_ABSORPTION_REFERENCE_M: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Idle,
    Attached,
}

/// One image source's rendering chain: wall-absorption EQ, diffraction
/// filter (if the path diffracts), air-absorption lowpass, and the gain
/// ramp that attaches/detaches the slot.
pub struct ImageSourceSlot {
    state: SlotState,
    key: Option<String>,
    gain: LinearSmoothedParam,
    absorption: GraphicEq,
    air_absorption: OnePole,
    active_diffraction: Option<Box<dyn DiffractionModel>>,
    incoming_diffraction: Option<Box<dyn DiffractionModel>>,
    next_diffraction: Option<Box<dyn DiffractionModel>>,
    crossfade: LinearSmoothedParam,
    diffraction_scratch: Vec<f32>,
}

impl ImageSourceSlot {
    /// An idle slot with no path attached yet.
    pub fn new(sample_rate: f32, num_bands: usize) -> Self {
        let centers: Vec<f32> = racoustic_dsp::OCTAVE_BAND_CENTERS_HZ
            .iter()
            .copied()
            .take(num_bands.max(1))
            .collect();
        let mut gain = LinearSmoothedParam::with_config(0.0, sample_rate, GAIN_RAMP_MS);
        gain.set_immediate(0.0);
        let mut crossfade = LinearSmoothedParam::with_config(1.0, sample_rate, GAIN_RAMP_MS);
        crossfade.set_immediate(1.0);
        Self {
            state: SlotState::Idle,
            key: None,
            gain,
            absorption: GraphicEq::new(&centers, 1.414, sample_rate),
            air_absorption: OnePole::new(sample_rate, 20000.0),
            active_diffraction: None,
            incoming_diffraction: None,
            next_diffraction: None,
            crossfade,
            diffraction_scratch: Vec::new(),
        }
    }

    /// Is this slot free for a new path to claim: idle, or attached but
    /// fully faded out?
    pub fn can_edit(&self) -> bool {
        self.state == SlotState::Idle || (self.gain.target() == 0.0 && self.gain.is_settled())
    }

    /// Stable path key currently occupying the slot.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Attach to a freshly published path: copy its absorption into the
    /// EQ, size the air-absorption filter for its distance, install the
    /// diffraction model for its path kind, and start the gain ramp toward
    /// 1.0.
    pub fn init(
        &mut self,
        data: &ImageSourceData,
        distance_m: f32,
        diffraction_model: Option<Box<dyn DiffractionModel>>,
    ) {
        self.state = SlotState::Attached;
        self.key = Some(data.key.clone());
        self.apply_absorption(data);
        self.air_absorption.set_frequency(air_absorption_cutoff_hz(distance_m));
        self.active_diffraction = diffraction_model;
        if let Some(model) = &mut self.active_diffraction {
            if let Some(path) = &data.diffraction {
                model.set_target(path, 1.0);
            }
        }
        self.incoming_diffraction = None;
        self.next_diffraction = None;
        self.crossfade.set_immediate(1.0);
        self.gain.set_immediate(0.0);
        self.gain.set_target(1.0);
    }

    /// Feed new target parameters into every stage without resetting the
    /// gain ramp; stages interpolate internally so this may race a
    /// concurrent `process` call without glitching.
    pub fn update(&mut self, data: &ImageSourceData, distance_m: f32) {
        self.apply_absorption(data);
        self.air_absorption.set_frequency(air_absorption_cutoff_hz(distance_m));
        if let (Some(model), Some(path)) = (self.active_diffraction.as_mut(), &data.diffraction) {
            model.set_target(path, 0.05);
        }
        if let (Some(model), Some(path)) = (self.incoming_diffraction.as_mut(), &data.diffraction)
        {
            model.set_target(path, 0.05);
        }
    }

    /// Queue a diffraction-model change: if no crossfade is in progress it
    /// starts immediately, otherwise it waits in `next` until the current
    /// fade completes.
    pub fn queue_diffraction_model(&mut self, model: Box<dyn DiffractionModel>) {
        if self.incoming_diffraction.is_none() && self.crossfade.is_settled() {
            self.incoming_diffraction = Some(model);
            self.crossfade.set_immediate(0.0);
            self.crossfade.set_target(1.0);
        } else {
            self.next_diffraction = Some(model);
        }
    }

    /// Begin detaching: the gain ramps to zero, and the slot returns to
    /// `idle` once `process` observes it has settled there.
    pub fn remove(&mut self) {
        self.gain.set_target(0.0);
    }

    /// Render one block through the slot's full chain: wall absorption,
    /// diffraction (crossfading between active/incoming models if one is
    /// in flight), air absorption, and the gain ramp.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        if self.state == SlotState::Idle {
            output.fill(0.0);
            return;
        }

        for (o, &i) in output.iter_mut().zip(input) {
            *o = self.absorption.process(i);
        }

        self.process_diffraction(output);

        for o in output.iter_mut() {
            *o = self.air_absorption.process(*o);
            *o *= self.gain.advance();
        }

        if self.gain.target() == 0.0 && self.gain.is_settled() {
            self.detach();
        }
    }

    fn process_diffraction(&mut self, buffer: &mut [f32]) {
        if self.diffraction_scratch.len() != buffer.len() {
            self.diffraction_scratch.resize(buffer.len(), 0.0);
        }

        if let Some(active) = &mut self.active_diffraction {
            active.process(buffer, &mut self.diffraction_scratch);
            buffer.swap_with_slice(&mut self.diffraction_scratch);
        }

        if let Some(incoming) = &mut self.incoming_diffraction {
            // Re-run the pre-crossfade signal (still in `diffraction_scratch`
            // after the swap above) through the incoming model and blend.
            let dry = self.diffraction_scratch.clone();
            incoming.process(&dry, &mut self.diffraction_scratch);
            for (out, &wet) in buffer.iter_mut().zip(&self.diffraction_scratch) {
                let t = self.crossfade.advance();
                *out = *out * (1.0 - t) + wet * t;
            }
            if self.crossfade.is_settled() {
                self.active_diffraction = self.incoming_diffraction.take();
                if let Some(next) = self.next_diffraction.take() {
                    self.incoming_diffraction = Some(next);
                    self.crossfade.set_immediate(0.0);
                    self.crossfade.set_target(1.0);
                }
            }
        }
    }

    fn apply_absorption(&mut self, data: &ImageSourceData) {
        let gains_db: Vec<f32> = (0..data.absorption.num_bands().min(self.absorption.num_bands()))
            .map(|band| racoustic_dsp::linear_to_db(data.absorption.reflection_coefficient(band).max(1e-6)))
            .collect();
        self.absorption.set_band_gains_db(&gains_db);
    }

    fn detach(&mut self) {
        self.state = SlotState::Idle;
        self.key = None;
        self.active_diffraction = None;
        self.incoming_diffraction = None;
        self.next_diffraction = None;
        self.absorption.clear();
        self.air_absorption.reset();
    }
}

fn air_absorption_cutoff_hz(distance_m: f32) -> f32 {
    let d = distance_m.max(AIR_ABSORPTION_REFERENCE_M);
    (20000.0 / (1.0 + 0.15 * d)).clamp(1000.0, 20000.0)
}
