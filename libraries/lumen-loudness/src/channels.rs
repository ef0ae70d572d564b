//! BS.1770 channel weighting
//!
//! Surround channels contribute more to perceived loudness than front
//! channels and are weighted by +1.5 dB (factor 1.41); the LFE channel is
//! excluded entirely. Only mono, stereo and 5.1 (SMPTE order) layouts are
//! distinguished; any other channel count falls back to unity weights.

/// Weight for the left/right surround channels (+1.5 dB)
const SURROUND_WEIGHT: f64 = 1.41;

/// Per-channel weights for a 5.1 layout in SMPTE order (FL, FR, C, LFE, SL, SR)
const WEIGHTS_5_1: [f64; 6] = [1.0, 1.0, 1.0, 0.0, SURROUND_WEIGHT, SURROUND_WEIGHT];

/// BS.1770 weighting factor for a channel within a given layout
///
/// Mono and stereo layouts have no LFE or surround channels, so every
/// channel is weighted 1.0. For six channels the layout is assumed to be
/// 5.1 in SMPTE order and index 3 (LFE) is excluded. Channel counts the
/// standard does not cover get the unity fallback; that is a deliberate
/// simplification, not an error.
pub fn channel_weight(index: usize, channel_count: usize) -> f64 {
    if channel_count == 6 {
        WEIGHTS_5_1.get(index).copied().unwrap_or(1.0)
    } else {
        1.0
    }
}
