//! The engine-wide configuration loaded at startup: sample rate, block
//! size, band table, and the per-class defaults fed into the IEM and FDN.

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::{ValidationError, ValidationResult};

/// Octave-band centre frequencies used everywhere absorption/EQ gains are
/// expressed per band, serialised alongside the rest of the config so a
/// deployment can narrow or widen the band table without a rebuild.
fn default_band_table() -> Vec<f32> {
    vec![125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0]
}

fn default_fdn_channel_count() -> usize {
    8
}

fn default_lerp_factor() -> f32 {
    0.05
}

fn default_shelving_q() -> f32 {
    1.414
}

fn default_frames_per_callback() -> usize {
    512
}

fn default_max_reflection_order() -> u32 {
    2
}

fn default_max_shadow_diffraction_order() -> u32 {
    1
}

/// Top-level engine configuration, loaded from TOML at startup and
/// validated before being handed to the `Context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,

    /// Frames delivered per audio callback.
    #[serde(default = "default_frames_per_callback")]
    pub frames_per_callback: usize,

    /// Octave-band centre frequencies every absorption/EQ stage uses.
    #[serde(default = "default_band_table")]
    pub band_table_hz: Vec<f32>,

    /// Number of channels in the shared Feedback Delay Network.
    #[serde(default = "default_fdn_channel_count")]
    pub fdn_channel_count: usize,

    /// Per-update interpolation factor fed into diffraction model
    /// `set_target` calls and slot parameter updates.
    #[serde(default = "default_lerp_factor")]
    pub lerp_factor: f32,

    /// Q factor shared by every per-band `GraphicEq` shelving stage.
    #[serde(default = "default_shelving_q")]
    pub shelving_q: f32,

    /// Maximum specular reflection order the IEM enumerates.
    #[serde(default = "default_max_reflection_order")]
    pub max_reflection_order: u32,

    /// Maximum shadowed-diffraction order the IEM enumerates.
    #[serde(default = "default_max_shadow_diffraction_order")]
    pub max_shadow_diffraction_order: u32,

    /// Maximum non-shadowed ("specular") diffraction order the IEM
    /// enumerates.
    #[serde(default)]
    pub max_specular_diffraction_order: u32,

    /// Is the direct path always audible, or must it pass an occlusion
    /// test like every other path class?
    #[serde(default)]
    pub direct_always_audible: bool,

    /// Is the shared late-reverb network active?
    #[serde(default = "default_true")]
    pub late_reverb_active: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            frames_per_callback: default_frames_per_callback(),
            band_table_hz: default_band_table(),
            fdn_channel_count: default_fdn_channel_count(),
            lerp_factor: default_lerp_factor(),
            shelving_q: default_shelving_q(),
            max_reflection_order: default_max_reflection_order(),
            max_shadow_diffraction_order: default_max_shadow_diffraction_order(),
            max_specular_diffraction_order: 0,
            direct_always_audible: false,
            late_reverb_active: true,
        }
    }
}

impl EngineConfig {
    /// Parse a config from a TOML string.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize this config back to TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of frequency bands in the band table.
    pub fn num_bands(&self) -> usize {
        self.band_table_hz.len()
    }

    /// Validate every field, producing the first violation found.
    pub fn validate(&self) -> ValidationResult {
        if self.sample_rate <= 0.0 {
            return Err(ValidationError::InvalidSampleRate(self.sample_rate));
        }
        if self.frames_per_callback == 0 {
            return Err(ValidationError::ZeroFramesPerCallback);
        }
        if self.band_table_hz.is_empty() {
            return Err(ValidationError::EmptyBandTable);
        }
        if self.fdn_channel_count < 2 {
            return Err(ValidationError::TooFewFdnChannels(self.fdn_channel_count));
        }
        if !(self.lerp_factor > 0.0 && self.lerp_factor <= 1.0) {
            return Err(ValidationError::InvalidLerpFactor(self.lerp_factor));
        }
        if self.shelving_q <= 0.0 {
            return Err(ValidationError::InvalidShelvingQ(self.shelving_q));
        }
        for (class, order) in [
            ("reflection", self.max_reflection_order),
            ("shadow_diffraction", self.max_shadow_diffraction_order),
            ("specular_diffraction", self.max_specular_diffraction_order),
        ] {
            if order > 8 {
                return Err(ValidationError::OrderTooHigh { class, order });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.sample_rate = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::InvalidSampleRate(0.0))
        );
    }

    #[test]
    fn one_channel_fdn_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.fdn_channel_count = 1;
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::TooFewFdnChannels(1))
        );
    }

    #[test]
    fn roundtrips_through_toml() {
        let cfg = EngineConfig::default();
        let text = cfg.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.sample_rate, cfg.sample_rate);
        assert_eq!(parsed.band_table_hz, cfg.band_table_hz);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = EngineConfig::from_toml_str("sample_rate = 44100.0\n").unwrap();
        assert_eq!(cfg.sample_rate, 44100.0);
        assert_eq!(cfg.fdn_channel_count, default_fdn_channel_count());
    }
}
