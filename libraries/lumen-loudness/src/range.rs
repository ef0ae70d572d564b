//! Loudness range (EBU Tech 3342)
//!
//! LRA is the spread of a program's short-term loudness: the distance
//! between the 10th and 95th percentile of the gated short-term values.
//! Instead of keeping every value for sorting, values are binned into a
//! fixed histogram spanning [-70, +10) LUFS at 0.08 LU resolution, which
//! keeps accumulation O(1) per block and the percentile scan O(bins).

use tracing::trace;

use crate::energy::{energy_from_lufs, LUFS_OFFSET};

/// Relative gate for LRA: 20 LU below the first-pass average
/// (deeper than the integrated-loudness gate on purpose, per Tech 3342)
pub const LRA_RELATIVE_GATE_LU: f64 = 20.0;

const HISTOGRAM_BINS: usize = 1000;
const HISTOGRAM_FLOOR_LUFS: f64 = -70.0;
const HISTOGRAM_BIN_WIDTH_LU: f64 = 0.08;

const LOWER_PERCENTILE: f64 = 0.10;
const UPPER_PERCENTILE: f64 = 0.95;

/// Loudness at the middle of a histogram bin
fn bin_center_lufs(bin: usize) -> f64 {
    HISTOGRAM_FLOOR_LUFS + (bin as f64 + 0.5) * HISTOGRAM_BIN_WIDTH_LU
}

/// Per-program accumulator for loudness range
///
/// Fed one short-term (3 s window) loudness value per call. The histogram
/// alone drives the LRA computation; the raw values are also retained, in
/// arrival order, purely for inspection and debugging.
#[derive(Debug, Clone)]
pub struct LraState {
    histogram: Vec<u64>,
    /// Count of values that landed inside the histogram range
    total_blocks: u64,
    channels: usize,
    /// Every value ever passed to `add_block`, including dropped ones
    short_term_values: Vec<f64>,
}

impl LraState {
    /// Create an empty accumulator for the given channel count
    pub fn new(channels: usize) -> Self {
        Self {
            histogram: vec![0; HISTOGRAM_BINS],
            total_blocks: 0,
            channels,
            short_term_values: Vec::new(),
        }
    }

    /// Channel count this state was created with
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of short-term values counted into the histogram
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Raw short-term values in arrival order (debugging aid; the LRA
    /// computation itself only reads the histogram)
    pub fn short_term_values(&self) -> &[f64] {
        &self.short_term_values
    }

    /// Record one short-term loudness value
    ///
    /// Values outside [-70, +10) LUFS — including the `NEG_INFINITY`
    /// silence sentinel — are dropped without error and without counting
    /// toward `total_blocks`. That is the saturation policy of the
    /// histogram, not a fault.
    pub fn add_block(&mut self, short_term_lufs: f64) {
        self.short_term_values.push(short_term_lufs);

        let offset = (short_term_lufs - HISTOGRAM_FLOOR_LUFS) / HISTOGRAM_BIN_WIDTH_LU;
        // NaN and -inf fail the range check and fall through
        if offset >= 0.0 && offset < HISTOGRAM_BINS as f64 {
            self.histogram[offset as usize] += 1;
            self.total_blocks += 1;
        }
    }

    /// Loudness range in LU over all accumulated short-term values
    ///
    /// Returns `0.0` whenever there is not enough data to define a range:
    /// fewer than two counted values, nothing above the absolute gate, or
    /// fewer than two values above the relative gate.
    pub fn loudness_range(&self) -> f64 {
        if self.total_blocks < 2 {
            return 0.0;
        }

        // Absolute gate: everything strictly above the -70 LUFS bin
        let absolute_gated: u64 = self.histogram[1..].iter().sum();
        if absolute_gated == 0 {
            return 0.0;
        }

        // First pass: energy-domain mean of the gated population,
        // reconstructed from each bin's center loudness
        let mut energy_sum = 0.0;
        for (bin, &count) in self.histogram.iter().enumerate().skip(1) {
            if count > 0 {
                energy_sum += count as f64 * energy_from_lufs(bin_center_lufs(bin));
            }
        }
        let mean_lufs = LUFS_OFFSET + 10.0 * (energy_sum / absolute_gated as f64).log10();

        // Relative gate, 20 LU down; the scan starts strictly above the
        // threshold's own bin (clamped so a threshold below the histogram
        // floor re-admits bin 0)
        let threshold = mean_lufs - LRA_RELATIVE_GATE_LU;
        let threshold_bin =
            ((threshold - HISTOGRAM_FLOOR_LUFS) / HISTOGRAM_BIN_WIDTH_LU).floor() as i64;
        let start = usize::try_from(threshold_bin + 1).unwrap_or(0);

        let population: u64 = self.histogram[start.min(HISTOGRAM_BINS)..].iter().sum();
        if population < 2 {
            return 0.0;
        }

        // Both percentiles come from the same low-to-high cumulative scan;
        // each is recorded at its first crossing only
        let lower_target = (population as f64 * LOWER_PERCENTILE).ceil() as u64;
        let upper_target = (population as f64 * UPPER_PERCENTILE).ceil() as u64;

        let mut cumulative = 0u64;
        let mut p10 = None;
        let mut p95 = None;
        for bin in start..HISTOGRAM_BINS {
            cumulative += self.histogram[bin];
            if p10.is_none() && cumulative >= lower_target {
                p10 = Some(bin_center_lufs(bin));
            }
            if cumulative >= upper_target {
                p95 = Some(bin_center_lufs(bin));
                break;
            }
        }

        match (p10, p95) {
            (Some(lower), Some(upper)) => {
                let range = (upper - lower).max(0.0);
                trace!(population, lower, upper, range, "loudness range");
                range
            }
            _ => 0.0,
        }
    }

    /// Drop all accumulated data, keeping the channel count
    pub fn reset(&mut self) {
        self.histogram.fill(0);
        self.total_blocks = 0;
        self.short_term_values.clear();
    }
}
