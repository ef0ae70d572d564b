//! K-weighting filter coefficient design
//!
//! BS.1770 specifies the K-weighting filter as two cascaded biquads — a
//! high-frequency shelf followed by a high-pass — but only publishes their
//! coefficients at 48 kHz. For any other sample rate the reference biquads
//! are mapped back to their continuous-time (analog) prototypes by
//! inverting the bilinear transform at 48 kHz, then re-discretized with a
//! forward bilinear transform at the target rate. Both steps are
//! closed-form polynomial substitutions; no iterative fitting is involved.
//!
//! Designed coefficient sets are immutable and cached per exact sample
//! rate (bit-pattern key, no tolerance merging), so the real-time
//! filtering stage can fetch them repeatedly without recomputation.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, OnceLock};

/// Sample rate the reference coefficients are specified at
pub const REFERENCE_SAMPLE_RATE: f64 = 48000.0;

/// Rates within this distance of 48 kHz use the reference table verbatim
const REFERENCE_RATE_TOLERANCE: f64 = 0.5;

/// One second-order IIR section
///
/// Transfer function `H(z) = (b0 + b1·z⁻¹ + b2·z⁻²) / (a0 + a1·z⁻¹ + a2·z⁻²)`
/// with `a[0]` normalized to exactly 1. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    /// Feed-forward (numerator) coefficients
    pub b: [f64; 3],
    /// Feedback (denominator) coefficients, `a[0] == 1`
    pub a: [f64; 3],
}

impl BiquadCoeffs {
    /// Squared magnitude response at the normalized frequency `omega`
    /// (radians per sample), evaluated on the unit circle
    fn magnitude_squared(&self, omega: f64) -> f64 {
        let (sin1, cos1) = omega.sin_cos();
        let (sin2, cos2) = (2.0 * omega).sin_cos();

        let num_re = self.b[0] + self.b[1] * cos1 + self.b[2] * cos2;
        let num_im = -(self.b[1] * sin1 + self.b[2] * sin2);
        let den_re = self.a[0] + self.a[1] * cos1 + self.a[2] * cos2;
        let den_im = -(self.a[1] * sin1 + self.a[2] * sin2);

        (num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)
    }
}

/// The two cascaded K-weighting stages for one sample rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KWeightingCoeffs {
    /// Stage 1: high-frequency shelf (+4 dB above ~1.5 kHz)
    pub shelf: BiquadCoeffs,
    /// Stage 2: high-pass (RLB weighting, ~38 Hz cutoff)
    pub highpass: BiquadCoeffs,
}

impl KWeightingCoeffs {
    /// Magnitude response of the full cascade in dB at `frequency_hz`,
    /// assuming the coefficients were designed for `sample_rate`
    pub fn magnitude_db(&self, frequency_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * frequency_hz / sample_rate;
        let mag_sq = self.shelf.magnitude_squared(omega) * self.highpass.magnitude_squared(omega);
        10.0 * mag_sq.log10()
    }
}

/// Shelf stage at 48 kHz (ITU-R BS.1770-4 Table 1)
const REFERENCE_SHELF: BiquadCoeffs = BiquadCoeffs {
    b: [1.53512485958697, -2.69169618940638, 1.19839281085285],
    a: [1.0, -1.69065929318241, 0.73248077421585],
};

/// High-pass stage at 48 kHz (ITU-R BS.1770-4 Table 2)
const REFERENCE_HIGHPASS: BiquadCoeffs = BiquadCoeffs {
    b: [1.0, -2.0, 1.0],
    a: [1.0, -1.99004745483398, 0.99007225036621],
};

const REFERENCE_COEFFS: KWeightingCoeffs = KWeightingCoeffs {
    shelf: REFERENCE_SHELF,
    highpass: REFERENCE_HIGHPASS,
};

/// Map a digital biquad back to its analog prototype by inverting the
/// bilinear transform: substitute `z⁻¹ = (k − s) / (k + s)` and expand.
/// Returns the s-domain quadratic `[s², s, 1]` coefficients (the common
/// `(k + s)²` factor cancels between numerator and denominator).
fn analog_prototype(c: &[f64; 3], k: f64) -> [f64; 3] {
    [
        c[0] - c[1] + c[2],
        2.0 * k * (c[0] - c[2]),
        k * k * (c[0] + c[1] + c[2]),
    ]
}

/// Discretize an s-domain quadratic with the forward bilinear transform:
/// substitute `s = k·(z − 1) / (z + 1)` and collect powers of `z⁻¹`.
fn discretize(p: &[f64; 3], k: f64) -> [f64; 3] {
    let quad = p[0] * k * k;
    [
        quad + p[1] * k + p[2],
        2.0 * (p[2] - quad),
        quad - p[1] * k + p[2],
    ]
}

/// Redesign one reference biquad for a new sample rate via the
/// bilinear-transform round trip, renormalizing so `a[0] == 1`
fn redesign_biquad(reference: &BiquadCoeffs, target_rate: f64) -> BiquadCoeffs {
    let k_ref = 2.0 * REFERENCE_SAMPLE_RATE;
    let k_tgt = 2.0 * target_rate;

    let num_s = analog_prototype(&reference.b, k_ref);
    let den_s = analog_prototype(&reference.a, k_ref);

    let b = discretize(&num_s, k_tgt);
    let a = discretize(&den_s, k_tgt);

    // A zero leading denominator term would make the renormalization
    // undefined. Not observed anywhere in 8 kHz..384 kHz (pinned by a
    // boundary test); surfaced loudly in debug builds.
    debug_assert!(
        a[0].is_finite() && a[0] != 0.0,
        "degenerate denominator at {target_rate} Hz"
    );

    BiquadCoeffs {
        b: [b[0] / a[0], b[1] / a[0], b[2] / a[0]],
        a: [1.0, a[1] / a[0], a[2] / a[0]],
    }
}

fn design_uncached(sample_rate: f64) -> KWeightingCoeffs {
    if (sample_rate - REFERENCE_SAMPLE_RATE).abs() < REFERENCE_RATE_TOLERANCE {
        // Exact-match fast path: hand back the published table untouched
        return REFERENCE_COEFFS;
    }

    KWeightingCoeffs {
        shelf: redesign_biquad(&REFERENCE_SHELF, sample_rate),
        highpass: redesign_biquad(&REFERENCE_HIGHPASS, sample_rate),
    }
}

/// Designs and caches K-weighting coefficients per sample rate
///
/// Entries are keyed by the exact bit pattern of the sample rate and are
/// immutable once inserted; `design` returns shared handles so repeated
/// calls for the same rate are cache-identical, not merely equal. First
/// insertion for a rate is serialized by the cache lock, so a caller can
/// never observe a partially constructed coefficient set.
#[derive(Debug, Default)]
pub struct KWeightingDesigner {
    cache: Mutex<HashMap<u64, Arc<KWeightingCoeffs>>>,
}

impl KWeightingDesigner {
    /// Create a designer with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficients for `sample_rate`, designing them on first request
    ///
    /// The sample rate must be positive and finite; this is a caller
    /// contract (validated by [`crate::LoudnessAnalyzer`]) and is not
    /// re-checked here.
    pub fn design(&self, sample_rate: f64) -> Arc<KWeightingCoeffs> {
        let key = sample_rate.to_bits();
        let mut cache = self.cache.lock().unwrap();
        if let Some(coeffs) = cache.get(&key) {
            return Arc::clone(coeffs);
        }

        let coeffs = Arc::new(design_uncached(sample_rate));
        cache.insert(key, Arc::clone(&coeffs));
        coeffs
    }

    /// Number of distinct sample rates designed so far
    pub fn cached_rates(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

static SHARED_DESIGNER: OnceLock<KWeightingDesigner> = OnceLock::new();

/// K-weighting coefficients for `sample_rate` from the process-wide cache
pub fn design_k_weighting(sample_rate: f64) -> Arc<KWeightingCoeffs> {
    SHARED_DESIGNER
        .get_or_init(KWeightingDesigner::new)
        .design(sample_rate)
}
