//! Score combination: max-plus for CYK, log2-sum for Inside.

use crate::model::IMPOSSIBLE;

/// `log2(2^a + 2^b)` without overflow; `IMPOSSIBLE` is the identity.
#[inline]
pub fn log2_sum(a: f32, b: f32) -> f32 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if lo == IMPOSSIBLE {
        return hi;
    }
    hi + ((lo - hi).exp2()).ln_1p() / std::f32::consts::LN_2
}

/// Semiring used by a DP fill. Monomorphized per algorithm.
pub(crate) trait Combine {
    fn combine(a: f32, b: f32) -> f32;
}

/// CYK: keep the best parse.
pub(crate) struct MaxPlus;

/// Inside: sum over parses.
pub(crate) struct LogSum;

impl Combine for MaxPlus {
    #[inline(always)]
    fn combine(a: f32, b: f32) -> f32 {
        a.max(b)
    }
}

impl Combine for LogSum {
    #[inline(always)]
    fn combine(a: f32, b: f32) -> f32 {
        log2_sum(a, b)
    }
}
