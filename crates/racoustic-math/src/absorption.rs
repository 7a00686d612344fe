//! Frequency-band absorption/reflection coefficient vectors.
//!
//! Stored as *reflection* coefficients (`sqrt(1 - alpha)` per band) rather
//! than absorption coefficients directly, so that composing absorption
//! along a multi-surface path is a per-band multiplication rather than a
//! more awkward combination of `alpha` values.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use libm::sqrtf;

/// A per-band absorption coefficient vector, carrying the surface area it
/// applies to so Sabine/Eyring area-weighting can sum over many walls.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsorptionVector {
    /// Reflection coefficient per band: `sqrt(1 - alpha[k])`.
    reflection: Vec<f32>,
    /// Surface area this vector applies to, in square metres.
    area_m2: f32,
}

impl AbsorptionVector {
    /// Build from per-band absorption coefficients `alpha` in `[0, 1]`.
    pub fn from_alpha(alpha: &[f32], area_m2: f32) -> Self {
        let reflection = alpha
            .iter()
            .map(|&a| sqrtf((1.0 - a.clamp(0.0, 1.0)).max(0.0)))
            .collect();
        Self { reflection, area_m2 }
    }

    /// A fully reflective (alpha = 0) vector with `num_bands` bands.
    pub fn fully_reflective(num_bands: usize, area_m2: f32) -> Self {
        Self {
            reflection: alloc::vec![1.0; num_bands],
            area_m2,
        }
    }

    /// Number of frequency bands.
    pub fn num_bands(&self) -> usize {
        self.reflection.len()
    }

    /// Surface area this vector applies to.
    pub fn area_m2(&self) -> f32 {
        self.area_m2
    }

    /// Per-band absorption coefficient, recovered as `1 - reflection^2`.
    pub fn alpha(&self, band: usize) -> f32 {
        1.0 - self.reflection[band] * self.reflection[band]
    }

    /// Per-band reflection coefficient.
    pub fn reflection_coefficient(&self, band: usize) -> f32 {
        self.reflection[band]
    }

    /// Compose this vector with another surface's absorption along a
    /// reflection path: `compose(a, b)[k] = sqrt((1-a[k]) * (1-b[k]))`,
    /// i.e. the product of the two reflection coefficients.
    ///
    /// Panics if band counts differ.
    pub fn compose(&self, other: &Self) -> Self {
        assert_eq!(self.num_bands(), other.num_bands());
        let reflection = self
            .reflection
            .iter()
            .zip(&other.reflection)
            .map(|(a, b)| a * b)
            .collect();
        Self {
            reflection,
            area_m2: self.area_m2 + other.area_m2,
        }
    }
}

/// Reverberation-time formula selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverbFormula {
    /// Sabine: `T60 = 0.161 * V / A`.
    Sabine,
    /// Eyring: `T60 = -0.161 * V / (S * ln(1 - mean_alpha))`.
    Eyring,
}

/// Compute per-band T60 from room volume and a set of wall absorption
/// vectors, area-weighted.
pub fn reverberation_time(
    formula: ReverbFormula,
    volume_m3: f32,
    walls: &[AbsorptionVector],
    num_bands: usize,
) -> Vec<f32> {
    let total_area: f32 = walls.iter().map(AbsorptionVector::area_m2).sum();
    if total_area <= 0.0 {
        return alloc::vec![0.0; num_bands];
    }

    (0..num_bands)
        .map(|band| {
            let absorption_area: f32 = walls
                .iter()
                .map(|w| w.alpha(band) * w.area_m2())
                .sum();

            match formula {
                ReverbFormula::Sabine => {
                    if absorption_area <= 0.0 {
                        0.0
                    } else {
                        0.161 * volume_m3 / absorption_area
                    }
                }
                ReverbFormula::Eyring => {
                    let mean_alpha = (absorption_area / total_area).clamp(0.0, 0.999_999);
                    if mean_alpha <= 0.0 {
                        0.0
                    } else {
                        -0.161 * volume_m3 / (total_area * libm::logf(1.0 - mean_alpha))
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_matches_closed_form() {
        let a = AbsorptionVector::from_alpha(&[0.5, 0.7], 2.0);
        let b = AbsorptionVector::from_alpha(&[0.5, 0.7], 5.0);
        let composed = a.compose(&b);

        let expected_0 = sqrtf(1.0 - 0.5) * sqrtf(1.0 - 0.5);
        let expected_1 = sqrtf(1.0 - 0.7) * sqrtf(1.0 - 0.7);
        assert!((composed.reflection_coefficient(0) - expected_0).abs() < 1e-6);
        assert!((composed.reflection_coefficient(1) - expected_1).abs() < 1e-6);
        assert!((composed.area_m2() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn compose_is_associative() {
        let a = AbsorptionVector::from_alpha(&[0.2, 0.4], 1.0);
        let b = AbsorptionVector::from_alpha(&[0.3, 0.6], 1.0);
        let c = AbsorptionVector::from_alpha(&[0.1, 0.9], 1.0);

        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));

        for band in 0..2 {
            assert!(
                (left.reflection_coefficient(band) - right.reflection_coefficient(band)).abs()
                    < 1e-6
            );
        }
    }

    #[test]
    fn alpha_roundtrips_through_reflection_coefficient() {
        let v = AbsorptionVector::from_alpha(&[0.3, 0.6, 0.9], 10.0);
        assert!((v.alpha(0) - 0.3).abs() < 1e-5);
        assert!((v.alpha(1) - 0.6).abs() < 1e-5);
        assert!((v.alpha(2) - 0.9).abs() < 1e-5);
    }

    #[test]
    fn sabine_and_eyring_agree_at_low_absorption() {
        // At low mean absorption, ln(1-a) ≈ -a, so Sabine and Eyring
        // should nearly agree.
        let walls = alloc::vec![AbsorptionVector::from_alpha(&[0.05], 100.0)];
        let sabine = reverberation_time(ReverbFormula::Sabine, 200.0, &walls, 1);
        let eyring = reverberation_time(ReverbFormula::Eyring, 200.0, &walls, 1);
        assert!((sabine[0] - eyring[0]).abs() / sabine[0] < 0.1);
    }

    #[test]
    fn zero_area_yields_zero_t60() {
        let t60 = reverberation_time(ReverbFormula::Sabine, 100.0, &[], 3);
        assert_eq!(t60, alloc::vec![0.0; 3]);
    }
}
