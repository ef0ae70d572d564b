//! ITU-R BS.1770 / EBU R128 compliance tests
//!
//! These tests pin the measurement core to the published standards:
//! - ITU-R BS.1770-4 (K-weighting tables, channel weights, gating)
//! - EBU R128 (programme loudness)
//! - EBU Tech 3342 (loudness range)
//!
//! Key specifications tested:
//! - 48 kHz reference coefficient tables reproduced exactly
//! - K-weighting magnitude response windows at 44.1/48/96 kHz
//! - Gating thresholds (-70 LUFS absolute, -10 LU relative)
//! - Energy-domain (not LUFS-domain) gated averaging
//! - LRA percentile extraction with the -20 LU relative gate

use std::sync::Arc;

use lumen_loudness::{
    channel_weight, design_k_weighting, lufs_from_mean_squares, GatingState, KWeightingDesigner,
    LraState,
};

// ============================================================================
// Filter coefficient designer
// ============================================================================

#[test]
fn reference_rate_reproduces_published_tables() {
    let coeffs = design_k_weighting(48000.0);

    assert_eq!(
        coeffs.shelf.b,
        [1.53512485958697, -2.69169618940638, 1.19839281085285]
    );
    assert_eq!(coeffs.shelf.a, [1.0, -1.69065929318241, 0.73248077421585]);
    assert_eq!(coeffs.highpass.b, [1.0, -2.0, 1.0]);
    assert_eq!(coeffs.highpass.a, [1.0, -1.99004745483398, 0.99007225036621]);
}

#[test]
fn denominator_leading_term_is_always_one() {
    let designer = KWeightingDesigner::new();
    for rate in [
        8000.0, 11025.0, 16000.0, 22050.0, 32000.0, 44100.0, 48000.0, 88200.0, 96000.0, 176400.0,
        192000.0, 352800.0, 384000.0,
    ] {
        let coeffs = designer.design(rate);
        assert_eq!(coeffs.shelf.a[0], 1.0, "{rate} Hz");
        assert_eq!(coeffs.highpass.a[0], 1.0, "{rate} Hz");
    }
}

#[test]
fn repeated_design_is_cache_identical() {
    let first = design_k_weighting(176400.0);
    let second = design_k_weighting(176400.0);
    assert!(
        Arc::ptr_eq(&first, &second),
        "same rate must hit the same cache entry"
    );
}

#[test]
fn magnitude_response_matches_k_weighting_shape() {
    for rate in [44100.0, 48000.0, 96000.0] {
        let coeffs = design_k_weighting(rate);

        // Mid band: slightly above unity (the -0.691 offset compensates
        // the ~+0.7 dB the filter adds around 1 kHz)
        let mid = coeffs.magnitude_db(1000.0, rate);
        assert!(mid > 0.0 && mid < 1.5, "{rate} Hz: 1 kHz gain {mid} dB");

        // Low band: well into the high-pass stopband
        let low = coeffs.magnitude_db(30.0, rate);
        assert!(low < -5.0, "{rate} Hz: 30 Hz gain {low} dB");

        // High band: on the +4 dB shelf
        let high = coeffs.magnitude_db(10000.0, rate);
        assert!(
            high > 2.0 && high < 5.0,
            "{rate} Hz: 10 kHz gain {high} dB"
        );
    }
}

#[test]
fn redesigned_rates_track_the_reference_response() {
    // The redesigned filters must match the 48 kHz prototype's response
    // closely in the audible band (frequency warping only matters near
    // Nyquist)
    let reference = design_k_weighting(48000.0);
    for rate in [44100.0, 88200.0, 96000.0, 192000.0] {
        let coeffs = design_k_weighting(rate);
        for freq in [50.0, 100.0, 500.0, 1000.0, 4000.0, 8000.0] {
            let expected = reference.magnitude_db(freq, 48000.0);
            let actual = coeffs.magnitude_db(freq, rate);
            assert!(
                (actual - expected).abs() < 0.3,
                "{rate} Hz at {freq} Hz: {actual} vs {expected} dB"
            );
        }
    }
}

// ============================================================================
// Channel weighting and block energy
// ============================================================================

#[test]
fn channel_weights_match_bs1770() {
    for count in [1, 2] {
        for ch in 0..count {
            assert_eq!(channel_weight(ch, count), 1.0);
        }
    }
    let weights: Vec<f64> = (0..6).map(|ch| channel_weight(ch, 6)).collect();
    assert_eq!(weights, vec![1.0, 1.0, 1.0, 0.0, 1.41, 1.41]);
}

#[test]
fn lufs_identities() {
    assert!((lufs_from_mean_squares(&[0.5, 0.5], 2) - (-0.691)).abs() < 1e-9);
    assert_eq!(lufs_from_mean_squares(&[0.0], 1), f64::NEG_INFINITY);

    // All energy on the excluded LFE channel of a 5.1 program
    let lfe_only = [0.0, 0.0, 0.0, 0.9, 0.0, 0.0];
    assert_eq!(lufs_from_mean_squares(&lfe_only, 6), f64::NEG_INFINITY);
}

// ============================================================================
// Gating engine
// ============================================================================

#[test]
fn absolute_gate_scenario() {
    let mut state = GatingState::new(1);
    state.add_block(&[1e-9]);
    state.add_block(&[0.01]);
    let integrated = state.integrated_loudness();
    assert!((integrated - (-20.691)).abs() < 1e-6, "got {integrated}");
}

#[test]
fn relative_gate_scenario() {
    let mut state = GatingState::new(1);
    for _ in 0..10 {
        state.add_block(&[0.1]);
    }
    state.add_block(&[0.001]);
    let integrated = state.integrated_loudness();
    assert!(integrated > -12.0 && integrated < -9.0, "got {integrated}");
}

#[test]
fn lufs_domain_averaging_would_fail_this() {
    // Construct a program where energy-domain and LUFS-domain averages
    // differ by several LU; pin the energy-domain result
    let mut state = GatingState::new(1);
    for _ in 0..5 {
        state.add_block(&[0.9]);
    }
    for _ in 0..5 {
        state.add_block(&[0.009]);
    }

    let energy_mean: f64 = (5.0 * 0.9 + 5.0 * 0.009) / 10.0;
    let energy_domain = -0.691 + 10.0 * energy_mean.log10();
    let lufs_domain = ((-0.691 + 10.0 * 0.9_f64.log10()) + (-0.691 + 10.0 * 0.009_f64.log10()))
        / 2.0;
    assert!((energy_domain - lufs_domain).abs() > 3.0);

    // The quiet blocks sit more than 10 LU below the first pass (-21.2
    // vs ~-4.1), so the relative gate removes them
    let first_pass = energy_domain;
    let threshold = first_pass - 10.0;
    let quiet_lufs = -0.691 + 10.0 * 0.009_f64.log10();
    assert!(quiet_lufs < threshold, "quiet blocks fall to the gate");
    let expected = -0.691 + 10.0 * 0.9_f64.log10();

    let integrated = state.integrated_loudness();
    assert!((integrated - expected).abs() < 1e-9, "got {integrated}");
}

#[test]
fn finalization_is_idempotent() {
    let mut gating = GatingState::new(2);
    let mut lra = LraState::new(2);
    for i in 0..20 {
        let level = 0.01 + f64::from(i) * 0.001;
        gating.add_block(&[level, level]);
        lra.add_block(-20.0 + f64::from(i) * 0.2);
    }

    let il = gating.integrated_loudness();
    let range = lra.loudness_range();
    for _ in 0..3 {
        assert_eq!(gating.integrated_loudness(), il);
        assert_eq!(lra.loudness_range(), range);
    }
}

// ============================================================================
// Loudness range engine
// ============================================================================

#[test]
fn steady_program_has_zero_range() {
    let mut state = LraState::new(2);
    for _ in 0..100 {
        state.add_block(-14.0);
    }
    let lra = state.loudness_range();
    assert!(lra.abs() < 0.5, "got {lra}");
}

#[test]
fn two_level_program_spans_ten_lu() {
    let mut state = LraState::new(2);
    for _ in 0..50 {
        state.add_block(-20.0);
    }
    for _ in 0..50 {
        state.add_block(-10.0);
    }
    let lra = state.loudness_range();
    assert!(lra > 7.0 && lra < 13.0, "got {lra}");
}

#[test]
fn single_short_term_value_has_no_range() {
    let mut state = LraState::new(2);
    state.add_block(-14.0);
    assert_eq!(state.loudness_range(), 0.0);
}

#[test]
fn reset_restores_empty_measurements() {
    let mut gating = GatingState::new(2);
    let mut lra = LraState::new(2);
    gating.add_block(&[0.1, 0.1]);
    lra.add_block(-10.0);
    lra.add_block(-20.0);

    gating.reset();
    lra.reset();

    assert_eq!(gating.block_count(), 0);
    assert_eq!(gating.integrated_loudness(), f64::NEG_INFINITY);
    assert_eq!(lra.total_blocks(), 0);
    assert_eq!(lra.loudness_range(), 0.0);
}
