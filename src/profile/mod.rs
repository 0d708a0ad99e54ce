//! Profile scorers for the filter stages.
//!
//! A profile scorer is the cheap, structure-blind counterpart of a covariance
//! model. The pipeline only talks to it through [`ProfileScorer`].

mod gapped;

pub use gapped::{GapScores, PssmProfile};

use crate::post::windows::Window;
use crate::seed::Seed;
use crate::sequence::DigitalSeq;
use crate::stats::FilterEvd;

/// A domain found during envelope definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub window: Window,
    /// Forward score of the profile restricted to the domain, bits.
    pub score: f32,
    /// Composition bias correction for the domain, bits.
    pub bias: f32,
}

pub trait ProfileScorer {
    fn name(&self) -> &str;

    /// Number of profile columns.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evd(&self) -> &FilterEvd;

    /// Ungapped segments in `region` scoring at least `min_score`.
    fn ungapped_seeds(&self, seq: &DigitalSeq, region: Window, min_score: f32) -> Vec<Seed>;

    /// Best ungapped segment score inside `win`.
    fn ungapped_score(&self, seq: &DigitalSeq, win: Window) -> f32;

    /// Local Viterbi score of `win`.
    fn viterbi(&self, seq: &DigitalSeq, win: Window) -> f32;

    /// Local Forward score of `win`.
    fn forward(&self, seq: &DigitalSeq, win: Window) -> f32;

    /// Composition bias of `win`, in bits, never negative.
    fn bias(&self, seq: &DigitalSeq, win: Window) -> f32;

    /// Domains in `win` whose best alignment scores at least `min_score`.
    fn domains(&self, seq: &DigitalSeq, win: Window, glocal: bool, min_score: f32) -> Vec<Domain>;
}
