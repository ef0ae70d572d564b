//! Block energy aggregation
//!
//! Converts K-weighted sample blocks into per-channel mean-square energies
//! and channel-weighted LUFS values. All averaging happens in the linear
//! energy domain; the logarithm is applied exactly once, at the end. That
//! ordering is what makes gated averages correct, so every caller in this
//! crate routes through [`lufs_from_mean_squares`] rather than averaging
//! LUFS values directly.

use crate::channels::channel_weight;

/// Offset applied after the log conversion (BS.1770 `-0.691` term)
pub(crate) const LUFS_OFFSET: f64 = -0.691;

/// Mean of the squared sample values over one block
///
/// The samples must already be K-weighted. Passing an empty block is a
/// caller error; it is debug-asserted, not validated.
pub fn block_mean_square(samples: &[f64]) -> f64 {
    debug_assert!(!samples.is_empty(), "zero-length sample block");
    let sum_sq: f64 = samples.iter().map(|&s| s * s).sum();
    sum_sq / samples.len() as f64
}

/// Channel-weighted loudness of one block of per-channel mean squares
///
/// `L = -0.691 + 10·log10(Σ weight(i)·ms[i])`. Returns
/// `f64::NEG_INFINITY` when the weighted sum is not positive (silence, or
/// all energy on excluded channels such as an LFE-only signal) — the
/// canonical "no signal" sentinel, not an error.
pub fn lufs_from_mean_squares(mean_squares: &[f64], channel_count: usize) -> f64 {
    let weighted_sum: f64 = mean_squares
        .iter()
        .enumerate()
        .map(|(ch, &ms)| channel_weight(ch, channel_count) * ms)
        .sum();

    if weighted_sum <= 0.0 {
        f64::NEG_INFINITY
    } else {
        LUFS_OFFSET + 10.0 * weighted_sum.log10()
    }
}

/// Loudness of a sliding window of block energies
///
/// `blocks` is a ring of per-channel mean-square vectors of which the
/// first `valid_blocks` entries hold data (a partially filled ring keeps
/// its valid entries at the front; once wrapped, every entry is valid and
/// ordering no longer matters for the mean). Each channel is averaged
/// across the window before the LUFS conversion. Returns
/// `f64::NEG_INFINITY` for an empty window.
pub fn windowed_lufs(blocks: &[Vec<f64>], valid_blocks: usize, channel_count: usize) -> f64 {
    if valid_blocks == 0 {
        return f64::NEG_INFINITY;
    }

    let mut averaged = vec![0.0; channel_count];
    for block in blocks.iter().take(valid_blocks) {
        for (acc, &ms) in averaged.iter_mut().zip(block.iter()) {
            *acc += ms;
        }
    }
    for acc in &mut averaged {
        *acc /= valid_blocks as f64;
    }

    lufs_from_mean_squares(&averaged, channel_count)
}

/// Linear energy that converts back to the given LUFS value
pub(crate) fn energy_from_lufs(lufs: f64) -> f64 {
    10.0_f64.powf((lufs - LUFS_OFFSET) / 10.0)
}
