//! Small helpers over any `rand::Rng`, so every draw site reads like its documented range.

use rand::Rng;

/// Uniform in `[lo, hi)`; returns `lo` for an empty range instead of panicking.
pub(crate) fn between<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + rng.gen::<f64>() * (hi - lo)
}

/// Uniform in `[-span/2, span/2)`.
pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, span: f64) -> f64 {
    rng.gen::<f64>() * span - span / 2.0
}

/// True with probability `p`; out-of-range probabilities saturate.
pub(crate) fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Integer in `lo..lo + n`.
pub(crate) fn count<R: Rng + ?Sized>(rng: &mut R, lo: usize, n: usize) -> usize {
    if n == 0 {
        return lo;
    }
    lo + rng.gen_range(0..n)
}

/// `1.0` or `-1.0` with equal odds.
pub(crate) fn sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}
