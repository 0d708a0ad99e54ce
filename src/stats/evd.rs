//! Extreme-value distribution functions.
//!
//! Profile filter scores follow a Gumbel distribution (ungapped and Viterbi)
//! or an exponential tail (Forward). CM scores are fit with exponential tails
//! anchored at an extrapolated location.

/// Gumbel survival function P(S >= x).
///
/// Written with `expm1` so tiny tail probabilities do not round to zero.
#[inline]
pub fn gumbel_surv(x: f64, mu: f64, lambda: f64) -> f64 {
    -(-(-lambda * (x - mu)).exp()).exp_m1()
}

/// Score whose Gumbel survival probability equals `p`.
#[inline]
pub fn gumbel_invsurv(p: f64, mu: f64, lambda: f64) -> f64 {
    mu - (-(-p).ln_1p()).ln() / lambda
}

/// Exponential tail survival function. Scores below `mu` map to 1.
#[inline]
pub fn exp_surv(x: f64, mu: f64, lambda: f64) -> f64 {
    if x < mu {
        1.0
    } else {
        (-lambda * (x - mu)).exp()
    }
}

/// Score whose exponential-tail survival probability equals `p`.
#[inline]
pub fn exp_invsurv(p: f64, mu: f64, lambda: f64) -> f64 {
    mu - p.ln() / lambda
}
