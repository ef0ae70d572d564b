//! Error types for loudness measurement

use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur when setting up or feeding a measurement session
///
/// These cover constructor-level validation only. The measurement math
/// itself never errors: "no measurable signal" is reported through
/// sentinel values (`f64::NEG_INFINITY` for LUFS, `0.0` for LRA), since
/// silence and startup are normal states, not faults.
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(f64),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be 1-8)")]
    InvalidChannelCount(usize),

    /// A block's energy vector does not match the session's channel count
    #[error("Block has {actual} channel energies, expected {expected}")]
    BlockChannelMismatch {
        /// Channel count the session was created with
        expected: usize,
        /// Length of the energy vector that was passed
        actual: usize,
    },
}
