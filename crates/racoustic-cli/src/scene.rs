//! TOML scene description: the geometry and source layout a `render` or
//! `scene-info` invocation builds a [`racoustic_engine::Context`] from.
//! A plain `serde`-derived struct loaded once at startup and never
//! touched again.

use std::path::Path;

use racoustic_audio::FeedbackMatrix;
use racoustic_config::EngineConfig;
use racoustic_math::Vec3;
use serde::Deserialize;

fn default_matrix() -> String {
    "householder".to_string()
}

/// One triangular wall: three vertices plus a per-band absorption vector.
#[derive(Debug, Deserialize)]
pub struct WallDescription {
    /// Vertices in right-hand-rule winding order.
    pub vertices: [[f32; 3]; 3],
    /// Absorption coefficient per band, matching the engine's band table.
    pub absorption: Vec<f32>,
}

/// One source's fixed position for this render.
#[derive(Debug, Deserialize)]
pub struct SourceDescription {
    /// World-space position.
    pub position: [f32; 3],
}

/// The late-reverb network's geometry.
#[derive(Debug, Deserialize)]
pub struct ReverbDescription {
    /// Room volume in cubic metres, fed to the Sabine/Eyring formula.
    pub volume_m3: f32,
    /// Bounding-box dimensions (metres), one delay line length per entry.
    pub room_dimensions_m: Vec<f32>,
    /// Feedback matrix: `"householder"` or `"random-orthogonal"`.
    #[serde(default = "default_matrix")]
    pub matrix: String,
}

/// A full scene: engine configuration, room geometry, and source layout.
#[derive(Debug, Deserialize)]
pub struct SceneDescription {
    /// Engine configuration (sample rate, block size, band table, ...).
    #[serde(default)]
    pub engine: EngineConfig,
    /// Listener position and forward direction (identity orientation).
    #[serde(default)]
    pub listener_position: [f32; 3],
    /// Every wall in the room.
    #[serde(default)]
    pub walls: Vec<WallDescription>,
    /// Every source, in the order audio channels are assigned.
    #[serde(default)]
    pub sources: Vec<SourceDescription>,
    /// Late-reverb network, if the scene wants one.
    pub reverb: Option<ReverbDescription>,
}

impl SceneDescription {
    /// Parse a scene description from a TOML file on disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

impl ReverbDescription {
    /// The feedback matrix this description names, falling back to
    /// Householder for an unrecognised name.
    pub fn feedback_matrix(&self) -> FeedbackMatrix {
        match self.matrix.as_str() {
            "random-orthogonal" => {
                let n = self.room_dimensions_m.len().max(2);
                FeedbackMatrix::RandomOrthogonal(racoustic_math::DenseMatrix::identity(n))
            }
            _ => FeedbackMatrix::Householder,
        }
    }
}

pub fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}
