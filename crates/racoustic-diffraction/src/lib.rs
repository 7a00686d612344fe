//! Edge-diffraction path geometry and the diffraction filter model family.
//!
//! - [`path`] - cylindrical edge coordinates, apex computation, and the
//!   shadow/reflection classification every filter model reads from
//! - [`models`] - the diffraction filter family: Attenuate, LPF,
//!   UDFA/UDFAI, UTD, and BTM

pub mod models;
pub mod path;

pub use models::{Attenuate, Btm, DiffractionModel, Lpf, Udfa, Utd};
pub use path::{to_cylindrical, CylindricalCoords, DiffractionPath};
