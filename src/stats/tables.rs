//! Statistical parameter tables carried by models and profiles.

use crate::common::ScanAlgorithm;

use super::evd::{exp_invsurv, exp_surv, gumbel_invsurv, gumbel_surv};
use super::search_space::SearchSpace;

/// Gumbel location and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gumbel {
    pub mu: f64,
    pub lambda: f64,
}

impl Gumbel {
    #[inline]
    pub fn pvalue(&self, score: f64) -> f64 {
        gumbel_surv(score, self.mu, self.lambda)
    }

    /// Bit score threshold for a P-value.
    #[inline]
    pub fn score_for_pvalue(&self, p: f64) -> f64 {
        gumbel_invsurv(p, self.mu, self.lambda)
    }
}

/// Exponential tail location and slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpTail {
    pub mu: f64,
    pub lambda: f64,
}

impl ExpTail {
    #[inline]
    pub fn pvalue(&self, score: f64) -> f64 {
        exp_surv(score, self.mu, self.lambda)
    }

    #[inline]
    pub fn score_for_pvalue(&self, p: f64) -> f64 {
        exp_invsurv(p, self.mu, self.lambda)
    }
}

/// Calibrated exponential tail for one CM scoring mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CmTail {
    /// Location extrapolated from the fitted tail.
    pub mu_extrap: f64,
    pub lambda: f64,
    /// Residues in the calibration database.
    pub dbsize: f64,
    /// Random hits observed in the fitted tail.
    pub nrandhits: f64,
}

impl CmTail {
    #[inline]
    pub fn pvalue(&self, score: f64) -> f64 {
        exp_surv(score, self.mu_extrap, self.lambda)
    }

    #[inline]
    pub fn evalue(&self, score: f64, space: &SearchSpace) -> f64 {
        self.pvalue(score) * space.effective_hits(self)
    }

    #[inline]
    pub fn score_for_pvalue(&self, p: f64) -> f64 {
        exp_invsurv(p, self.mu_extrap, self.lambda)
    }

    /// Bit score whose E-value in `space` equals `e`.
    pub fn score_for_evalue(&self, e: f64, space: &SearchSpace) -> f64 {
        let eff = space.effective_hits(self);
        // P would exceed 1; every score qualifies.
        if e >= eff {
            return f64::NEG_INFINITY;
        }
        exp_invsurv(e / eff, self.mu_extrap, self.lambda)
    }
}

/// Tails for CYK and Inside scores, each in local and glocal configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelEvd {
    pub cyk_local: Option<CmTail>,
    pub cyk_glocal: Option<CmTail>,
    pub inside_local: Option<CmTail>,
    pub inside_glocal: Option<CmTail>,
}

impl ModelEvd {
    pub fn tail(&self, algorithm: ScanAlgorithm, local: bool) -> Option<&CmTail> {
        match (algorithm, local) {
            (ScanAlgorithm::Cyk, true) => self.cyk_local.as_ref(),
            (ScanAlgorithm::Cyk, false) => self.cyk_glocal.as_ref(),
            (ScanAlgorithm::Inside, true) => self.inside_local.as_ref(),
            (ScanAlgorithm::Inside, false) => self.inside_glocal.as_ref(),
        }
    }

    /// Same tail for every mode; handy for hand-built models.
    pub fn uniform(tail: CmTail) -> Self {
        Self {
            cyk_local: Some(tail),
            cyk_glocal: Some(tail),
            inside_local: Some(tail),
            inside_glocal: Some(tail),
        }
    }
}

/// Curated bit score thresholds stored with a model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BitCutoffs {
    /// Gathering threshold.
    pub ga: Option<f32>,
    /// Trusted cutoff.
    pub tc: Option<f32>,
    /// Noise cutoff.
    pub nc: Option<f32>,
}

/// Score distributions of the profile filter stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterEvd {
    /// Ungapped (stage 1).
    pub msv: Gumbel,
    /// Local Viterbi (stage 2).
    pub viterbi: Gumbel,
    /// Local Forward (stage 2, and local envelopes).
    pub forward: ExpTail,
    /// Glocal Forward (glocal envelopes).
    pub glocal_forward: ExpTail,
}
