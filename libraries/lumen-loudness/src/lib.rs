//! Loudness measurement core for Lumen
//!
//! This crate implements the measurement side of ITU-R BS.1770 / EBU R128:
//! - K-weighting filter coefficient design for arbitrary sample rates
//! - Channel-weighted block energy to LUFS conversion
//! - Momentary / short-term loudness over sliding windows of block energies
//! - Gated integrated loudness (two-stage gate per BS.1770)
//! - Loudness range (LRA) per EBU Tech 3342
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌───────────────────┐
//! │ Filter Designer  │ ──► │ External filtering │  (biquad recurrence,
//! │ (coeffs, cached) │     │ stage (not here)   │   per-sample, real-time)
//! └──────────────────┘     └─────────┬─────────┘
//!                                    │ K-weighted blocks
//!                                    ▼
//!                          ┌───────────────────┐
//!                          │ Energy Aggregator │ ──► momentary / short-term
//!                          └─────────┬─────────┘
//!                 per-block energies │
//!                  ┌─────────────────┴──────────────┐
//!                  ▼                                ▼
//!         ┌────────────────┐              ┌──────────────────┐
//!         │ Gating Engine  │              │ LRA Engine       │
//!         │ (integrated)   │              │ (loudness range) │
//!         └────────────────┘              └──────────────────┘
//! ```
//!
//! The crate does not filter, capture or decode audio. Its inputs are
//! per-block per-channel mean-square energies produced by an external
//! real-time filtering stage that applies the coefficients from
//! [`design_k_weighting`]; its outputs are LUFS/LU values, with
//! `f64::NEG_INFINITY` as the "no measurable signal" sentinel.
//!
//! # Example
//!
//! ```
//! use lumen_loudness::LoudnessAnalyzer;
//!
//! let mut analyzer = LoudnessAnalyzer::new(48000.0, 2).unwrap();
//!
//! // One call per 400 ms block of K-weighted audio
//! for _ in 0..25 {
//!     analyzer.add_block(&[0.01, 0.01]).unwrap();
//! }
//!
//! let summary = analyzer.summary();
//! println!("Integrated loudness: {:.1} LUFS", summary.integrated_lufs);
//! ```

#![deny(unsafe_code)]

mod analyzer;
mod channels;
mod energy;
mod error;
mod gating;
mod kweighting;
mod range;

pub use analyzer::{LoudnessAnalyzer, LoudnessSummary};
pub use channels::channel_weight;
pub use energy::{block_mean_square, lufs_from_mean_squares, windowed_lufs};
pub use error::{LoudnessError, Result};
pub use gating::{GatingState, ABSOLUTE_GATE_LUFS, RELATIVE_GATE_LU};
pub use kweighting::{
    design_k_weighting, BiquadCoeffs, KWeightingCoeffs, KWeightingDesigner,
    REFERENCE_SAMPLE_RATE,
};
pub use range::{LraState, LRA_RELATIVE_GATE_LU};

/// Length of a momentary (gating) block in seconds (400 ms per BS.1770)
pub const MOMENTARY_BLOCK_SECS: f64 = 0.4;

/// Length of the short-term loudness window in seconds (3 s per EBU Tech 3341)
pub const SHORT_TERM_WINDOW_SECS: f64 = 3.0;
