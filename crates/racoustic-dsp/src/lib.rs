//! DSP primitives shared by every stage of the spatialisation pipeline.
//!
//! This crate provides the foundational building blocks for the per-image-source
//! audio chain and the feedback delay network, designed for real-time audio
//! processing with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for all audio processing stages
//! - [`EffectExt`] - Extension trait for chaining
//! - [`Chain`] - Zero-cost chain combinator
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes as image-source geometry updates:
//!
//! - [`SmoothedParam`] - Exponential smoothing (RC-like response)
//! - [`LinearSmoothedParam`] - Linear ramps (constant rate)
//! - [`Parameter`] - Lock-free cross-thread handoff (geometry thread -> audio thread)
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`OnePole`] - Single-pole lowpass for air absorption and the LPF diffraction model
//! - [`GraphicEq`] - Cascaded peaking bands for UDFA/UDFAI diffraction shelving
//! - [`LinkwitzRileyCrossover`] - Two-way LR4 split for the UTD diffraction model
//! - [`FirConvolver`] - Direct-form convolution for the BTM diffraction model
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Variable-length delay with interpolation (FDN, air propagation)
//! - [`FixedDelayLine`] - Fixed-length delay (compile-time size)
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`flush_denormal`], [`sanitize`]
//! - [`fast_math`] - Polynomial approximations for hot per-sample paths
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! racoustic-dsp = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations in audio processing paths after setup
//! - **No dependency on std**: pure `no_std` with `libm` for math
//! - **Object-safe traits**: dynamic dispatch when needed
//! - **Zero-cost abstractions**: static dispatch chains optimize away

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod convolver;
pub mod crossover;
pub mod delay;
pub mod effect;
pub mod fast_math;
pub mod graphic_eq;
pub mod math;
pub mod one_pole;
pub mod param;

// Re-export main types at crate root
pub use biquad::{
    Biquad, bandpass_coefficients, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, lowpass_coefficients, notch_coefficients, peaking_eq_coefficients,
};
pub use convolver::FirConvolver;
pub use crossover::LinkwitzRileyCrossover;
pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation};
pub use effect::{Chain, Effect, EffectExt};
pub use fast_math::{
    fast_db_to_linear, fast_exp2, fast_linear_to_db, fast_log2, fast_sin_turns, fast_tan,
};
pub use graphic_eq::{GraphicEq, OCTAVE_BAND_CENTERS_HZ};
pub use math::{
    clamp, db_to_linear, flush_denormal, hz_to_omega, lerp, linear_to_db, ms_to_samples,
    samples_to_ms, sanitize,
};
pub use one_pole::OnePole;
pub use param::{LinearSmoothedParam, Parameter, SmoothedParam};
