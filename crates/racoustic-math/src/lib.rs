//! Geometry and linear-algebra primitives for room-acoustics scenes.
//!
//! Everything the geometry thread needs to place sources, mirror them
//! across walls, and build feedback topologies for the late reverb:
//!
//! - [`Vec3`] - positions, directions, normals
//! - [`Quat`] - source/listener orientation, with the engine's forward-vector
//!   convention
//! - [`Mat3`] - orthonormal bases for cylindrical edge coordinates
//! - [`DenseMatrix`] - feedback delay network routing matrices
//! - [`AbsorptionVector`] - per-band wall absorption, composable along a
//!   multi-surface reflection path
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible given `alloc`. Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! racoustic-math = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod absorption;
pub mod dense_matrix;
pub mod mat3;
pub mod quat;
pub mod vec3;

pub use absorption::{reverberation_time, AbsorptionVector, ReverbFormula};
pub use dense_matrix::{DenseMatrix, SplitMix64};
pub use mat3::Mat3;
pub use quat::Quat;
pub use vec3::Vec3;
