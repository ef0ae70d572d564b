//! Gated integrated loudness (BS.1770 two-stage gate)
//!
//! A program's integrated loudness is not the plain average of its block
//! loudnesses: silence and low-level passages are gated out in two stages,
//! and every average is taken over the per-channel mean-square energies of
//! the surviving blocks — never over their LUFS values, which would bias
//! the result.

use tracing::trace;

use crate::energy::lufs_from_mean_squares;

/// Absolute gate: blocks at or below this loudness never contribute
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate: blocks more than this far below the first-pass average
/// are dropped from the final average
pub const RELATIVE_GATE_LU: f64 = 10.0;

/// Per-program accumulator for gated integrated loudness
///
/// Owned by exactly one measurement session and fed sequentially, one
/// 400 ms block at a time. `block_loudness` and `block_energy` grow in
/// lockstep; querying is non-destructive and can be repeated at any point
/// during accumulation.
#[derive(Debug, Clone)]
pub struct GatingState {
    /// LUFS of each block, parallel to `block_energy`
    block_loudness: Vec<f64>,
    /// Raw per-channel mean squares of each block
    block_energy: Vec<Vec<f64>>,
    channels: usize,
}

impl GatingState {
    /// Create an empty accumulator for the given channel count
    pub fn new(channels: usize) -> Self {
        Self {
            block_loudness: Vec::new(),
            block_energy: Vec::new(),
            channels,
        }
    }

    /// Channel count this state was created with
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of blocks accumulated so far
    pub fn block_count(&self) -> usize {
        self.block_loudness.len()
    }

    /// Append one 400 ms block of per-channel mean squares
    ///
    /// Returns the block's momentary loudness (possibly
    /// `f64::NEG_INFINITY` for a silent block, which is stored and later
    /// removed by the absolute gate).
    pub fn add_block(&mut self, mean_squares: &[f64]) -> f64 {
        debug_assert_eq!(mean_squares.len(), self.channels);

        let lufs = lufs_from_mean_squares(mean_squares, self.channels);
        self.block_loudness.push(lufs);
        self.block_energy.push(mean_squares.to_vec());
        lufs
    }

    /// Gated integrated loudness over all accumulated blocks
    ///
    /// Two-stage gate per BS.1770:
    /// 1. keep blocks above the absolute gate (−70 LUFS),
    /// 2. average the survivors' energies to get the first-pass loudness
    ///    `Γ_a`, keep blocks above `Γ_a − 10` LU,
    /// 3. the result is the energy-domain average of that final set.
    ///
    /// Returns `f64::NEG_INFINITY` when either stage leaves no blocks.
    pub fn integrated_loudness(&self) -> f64 {
        let absolute_gated: Vec<usize> = (0..self.block_loudness.len())
            .filter(|&i| self.block_loudness[i] > ABSOLUTE_GATE_LUFS)
            .collect();
        if absolute_gated.is_empty() {
            return f64::NEG_INFINITY;
        }

        let first_pass = self.energy_average(&absolute_gated);
        let threshold = first_pass - RELATIVE_GATE_LU;

        let relative_gated: Vec<usize> = absolute_gated
            .into_iter()
            .filter(|&i| self.block_loudness[i] > threshold)
            .collect();
        if relative_gated.is_empty() {
            return f64::NEG_INFINITY;
        }

        let integrated = self.energy_average(&relative_gated);
        trace!(
            blocks = self.block_loudness.len(),
            gated = relative_gated.len(),
            threshold,
            integrated,
            "integrated loudness"
        );
        integrated
    }

    /// LUFS of the per-channel energy average over the selected blocks
    fn energy_average(&self, blocks: &[usize]) -> f64 {
        let mut averaged = vec![0.0; self.channels];
        for &i in blocks {
            for (acc, &ms) in averaged.iter_mut().zip(&self.block_energy[i]) {
                *acc += ms;
            }
        }
        for acc in &mut averaged {
            *acc /= blocks.len() as f64;
        }
        lufs_from_mean_squares(&averaged, self.channels)
    }

    /// Drop all accumulated blocks, keeping the channel count
    pub fn reset(&mut self) {
        self.block_loudness.clear();
        self.block_energy.clear();
    }
}
