//! Multi-band graphic equalizer built from cascaded peaking biquads.
//!
//! Several diffraction models (UDFA, UDFAI) describe attenuation as a set of
//! per-octave-band gains rather than a single cutoff. [`GraphicEq`] turns a
//! fixed band layout into a cascade of [`Biquad`] peaking filters, one per
//! band, applied in series.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use crate::biquad::{Biquad, peaking_eq_coefficients};

/// Standard octave-band center frequencies used for diffraction shelving
/// (ISO 266 octave series, 125 Hz to 8 kHz).
pub const OCTAVE_BAND_CENTERS_HZ: [f32; 7] = [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0];

/// A cascade of peaking-EQ biquads, one per band, applied in series.
///
/// Band gains are set all at once via [`set_band_gains_db`](Self::set_band_gains_db)
/// whenever the image source's diffraction path geometry changes; the cascade
/// itself runs every sample with no further coefficient work.
#[derive(Debug, Clone)]
pub struct GraphicEq {
    bands: Vec<Biquad>,
    centers_hz: Vec<f32>,
    q: f32,
    sample_rate: f32,
}

impl GraphicEq {
    /// Build a graphic EQ with one peaking band per entry in `centers_hz`.
    ///
    /// `q` controls each band's bandwidth; narrower `q` gives less overlap
    /// between adjacent bands at the cost of a less natural-sounding curve.
    pub fn new(centers_hz: &[f32], q: f32, sample_rate: f32) -> Self {
        let mut eq = Self {
            bands: (0..centers_hz.len()).map(|_| Biquad::new()).collect(),
            centers_hz: centers_hz.to_vec(),
            q,
            sample_rate,
        };
        eq.set_band_gains_db(&alloc::vec![0.0; centers_hz.len()]);
        eq
    }

    /// Convenience constructor using the standard octave-band layout.
    pub fn octave_bands(sample_rate: f32) -> Self {
        Self::new(&OCTAVE_BAND_CENTERS_HZ, 1.414, sample_rate)
    }

    /// Update every band's gain. `gains_db.len()` must match the number of
    /// bands this EQ was constructed with; extra entries are ignored and
    /// missing entries leave the corresponding band at its previous gain.
    pub fn set_band_gains_db(&mut self, gains_db: &[f32]) {
        for ((band, &center), &gain_db) in self
            .bands
            .iter_mut()
            .zip(self.centers_hz.iter())
            .zip(gains_db.iter())
        {
            let (b0, b1, b2, a0, a1, a2) =
                peaking_eq_coefficients(center, self.q, gain_db, self.sample_rate);
            band.set_coefficients(b0, b1, b2, a0, a1, a2);
        }
    }

    /// Process one sample through every band in series.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.bands.iter_mut().fold(input, |x, band| band.process(x))
    }

    /// Number of bands in this EQ.
    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// Clear all band filter state (call on playback discontinuities).
    pub fn clear(&mut self) {
        for band in &mut self.bands {
            band.clear();
        }
    }
}
