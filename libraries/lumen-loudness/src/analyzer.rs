//! Measurement session facade
//!
//! Ties one program's gating and LRA accumulators together behind a
//! validated constructor. The session consumes per-block per-channel
//! mean-square energies (one call per 400 ms block) and externally
//! computed short-term loudness values (one per 3 s window position); the
//! sample-by-sample K-weighting filter runs outside this crate using the
//! coefficients exposed by [`LoudnessAnalyzer::coefficients`].

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{LoudnessError, Result};
use crate::gating::GatingState;
use crate::kweighting::{design_k_weighting, KWeightingCoeffs};
use crate::range::LraState;

/// Measurement results for one program
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessSummary {
    /// Gated integrated loudness in LUFS (`NEG_INFINITY` if nothing
    /// survived the gates)
    pub integrated_lufs: f64,
    /// Loudness range in LU (0 when there is not enough data)
    pub loudness_range_lu: f64,
    /// Number of 400 ms gating blocks fed in
    pub gating_blocks: usize,
    /// Number of short-term values counted by the LRA histogram
    pub short_term_blocks: u64,
    /// Sample rate of the measured program
    pub sample_rate: f64,
    /// Number of channels
    pub channels: usize,
}

impl fmt::Display for LoudnessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loudness: {:.1} LUFS, Range: {:.1} LU ({} blocks)",
            self.integrated_lufs, self.loudness_range_lu, self.gating_blocks
        )
    }
}

/// Loudness measurement session for a single audio source
///
/// Owns the per-program [`GatingState`] and [`LraState`] and resolves the
/// K-weighting coefficients through the process-wide designer cache. All
/// methods are synchronous; the session must be fed from a single thread
/// (one session per monitored source).
///
/// # Example
///
/// ```
/// use lumen_loudness::LoudnessAnalyzer;
///
/// let mut analyzer = LoudnessAnalyzer::new(44100.0, 2)?;
///
/// // External filtering stage applies these per sample:
/// let _coeffs = analyzer.coefficients();
///
/// // One mean-square vector per 400 ms block:
/// analyzer.add_block(&[0.02, 0.02])?;
///
/// // One externally computed short-term value per window position:
/// analyzer.add_short_term(-17.3);
///
/// println!("{}", analyzer.summary());
/// # Ok::<(), lumen_loudness::LoudnessError>(())
/// ```
#[derive(Debug)]
pub struct LoudnessAnalyzer {
    sample_rate: f64,
    channels: usize,
    coefficients: Arc<KWeightingCoeffs>,
    gating: GatingState,
    lra: LraState,
}

impl LoudnessAnalyzer {
    /// Create a session for the given sample rate and channel count
    ///
    /// # Errors
    /// Returns an error if the sample rate is outside 8000–384000 Hz or
    /// not finite, or if the channel count is outside 1–8.
    pub fn new(sample_rate: f64, channels: usize) -> Result<Self> {
        if !sample_rate.is_finite() || !(8000.0..=384000.0).contains(&sample_rate) {
            return Err(LoudnessError::InvalidSampleRate(sample_rate));
        }
        if !(1..=8).contains(&channels) {
            return Err(LoudnessError::InvalidChannelCount(channels));
        }

        Ok(Self {
            sample_rate,
            channels,
            coefficients: design_k_weighting(sample_rate),
            gating: GatingState::new(channels),
            lra: LraState::new(channels),
        })
    }

    /// K-weighting coefficients for this session's sample rate, for the
    /// external real-time filtering stage
    pub fn coefficients(&self) -> Arc<KWeightingCoeffs> {
        Arc::clone(&self.coefficients)
    }

    /// Sample rate this session was created with
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Channel count this session was created with
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Feed one 400 ms block of per-channel mean squares
    ///
    /// Returns the block's momentary loudness in LUFS (possibly
    /// `NEG_INFINITY` for silence).
    ///
    /// # Errors
    /// Returns an error if the vector length does not match the session's
    /// channel count.
    pub fn add_block(&mut self, mean_squares: &[f64]) -> Result<f64> {
        if mean_squares.len() != self.channels {
            return Err(LoudnessError::BlockChannelMismatch {
                expected: self.channels,
                actual: mean_squares.len(),
            });
        }
        Ok(self.gating.add_block(mean_squares))
    }

    /// Feed one short-term (3 s window) loudness value
    ///
    /// The window itself is computed by the caller, typically with
    /// [`crate::windowed_lufs`] over its ring of momentary block energies.
    pub fn add_short_term(&mut self, short_term_lufs: f64) {
        self.lra.add_block(short_term_lufs);
    }

    /// Gated integrated loudness so far (non-destructive, repeatable)
    pub fn integrated_lufs(&self) -> f64 {
        self.gating.integrated_loudness()
    }

    /// Loudness range so far (non-destructive, repeatable)
    pub fn loudness_range_lu(&self) -> f64 {
        self.lra.loudness_range()
    }

    /// Number of gating blocks fed in so far
    pub fn blocks_processed(&self) -> usize {
        self.gating.block_count()
    }

    /// Current measurement results
    pub fn summary(&self) -> LoudnessSummary {
        let summary = LoudnessSummary {
            integrated_lufs: self.integrated_lufs(),
            loudness_range_lu: self.loudness_range_lu(),
            gating_blocks: self.gating.block_count(),
            short_term_blocks: self.lra.total_blocks(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        };
        debug!(%summary, "loudness summary");
        summary
    }

    /// Clear all accumulated state for reuse on a new program
    ///
    /// The coefficients stay valid (same sample rate), so the external
    /// filtering stage does not need to re-fetch them.
    pub fn reset(&mut self) {
        debug!(
            blocks = self.gating.block_count(),
            "resetting loudness session"
        );
        self.gating.reset();
        self.lra.reset();
    }
}
