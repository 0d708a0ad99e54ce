//! Fixtures and a brute-force reference scorer.

use std::collections::HashMap;

use cmsift::align::bands::NoBands;
use cmsift::common::PassKind;
use cmsift::config::{BandStrategy, FilterPreset, PipelineConfig, Threshold};
use cmsift::model::{Children, CovarianceModel, ModelBuilder, StateDef, StateType, IMPOSSIBLE};
use cmsift::profile::{GapScores, PssmProfile};
use cmsift::sequence::DigitalSeq;
use cmsift::stats::{CmTail, ExpTail, FilterEvd, Gumbel, ModelEvd};

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pair scores: Watson-Crick 3, wobble 1, anything else -2.
pub fn pair_scores() -> Vec<f32> {
    // A C G U
    let mut esc = vec![-2.0f32; 16];
    let wc = [(0, 3), (3, 0), (1, 2), (2, 1)];
    let wobble = [(2, 3), (3, 2)];
    for (a, b) in wc {
        esc[a * 4 + b] = 3.0;
    }
    for (a, b) in wobble {
        esc[a * 4 + b] = 1.0;
    }
    esc
}

/// Single scores favouring one residue: 2 for `favoured`, -1 otherwise.
pub fn single_scores(favoured: usize) -> Vec<f32> {
    let mut esc = vec![-1.0f32; 4];
    esc[favoured] = 2.0;
    esc
}

/// Ten-state model: a base pair enclosing a bifurcation whose branches each
/// emit one residue.
///
/// ```text
/// 0 S -> {1 MP, 2 D}       1 MP -> 3     2 D -> 3
/// 3 B (4, 7)
/// 4 BEGL -> 5 ML(C) -> 6 E
/// 7 BEGR -> 8 ML(G) -> 9 E
/// ```
pub fn toy_builder() -> ModelBuilder {
    ModelBuilder::new("toy")
        .state(StateDef::start(1, vec![-0.5, -3.0]))
        .state(
            StateDef::pair(3, vec![0.0], pair_scores())
                .with_marginals(vec![1.0, 0.5, 0.5, 0.0], vec![0.0, 0.5, 0.5, 1.0]),
        )
        .state(StateDef::delete(3, vec![0.0]))
        .state(StateDef::bifurcation(4, 7))
        .state(StateDef::bif_left_start(5, vec![0.0]))
        .state(StateDef::left(6, vec![0.0], single_scores(1)))
        .state(StateDef::end())
        .state(StateDef::start(8, vec![0.0]))
        .state(StateDef::left(9, vec![0.0], single_scores(2)))
        .state(StateDef::end())
        .max_width(8)
}

pub fn toy_tail() -> CmTail {
    CmTail {
        mu_extrap: 0.0,
        lambda: 0.693,
        dbsize: 1_000_000.0,
        nrandhits: 1_000_000.0,
    }
}

pub fn toy_model() -> CovarianceModel {
    toy_builder().evd(ModelEvd::uniform(toy_tail())).build().unwrap()
}

pub fn filter_evd() -> FilterEvd {
    FilterEvd {
        msv: Gumbel { mu: 2.0, lambda: 0.7 },
        viterbi: Gumbel { mu: 2.0, lambda: 0.7 },
        forward: ExpTail { mu: 2.0, lambda: 0.7 },
        glocal_forward: ExpTail { mu: 1.0, lambda: 0.7 },
    }
}

/// Profile counterpart of the toy model's consensus.
pub fn toy_profile() -> PssmProfile {
    PssmProfile::from_consensus("toy", b"ACGU", 2.0, -1.0, GapScores::default(), filter_evd()).unwrap()
}

/// All filters off, unbanded, reporting at `report_bits`. Scores are left
/// uncorrected for composition.
pub fn unfiltered_config(report_bits: f32) -> PipelineConfig {
    let mut cfg = PipelineConfig::preset(FilterPreset::Max);
    cfg.bands.filter_strategy = BandStrategy::Unbanded;
    cfg.bands.final_strategy = BandStrategy::Unbanded;
    cfg.final_algorithm = cmsift::ScanAlgorithm::Cyk;
    cfg.report = Threshold::BitScore(report_bits);
    cfg.inclusion = Threshold::BitScore(report_bits + 2.0);
    cfg.null3 = false;
    cfg
}

pub fn no_bands() -> NoBands {
    NoBands
}

pub fn seq(text: &str) -> DigitalSeq {
    DigitalSeq::from_text("target", text.as_bytes()).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum P {
    J,
    L,
    R,
    T,
}

/// `max` for CYK, `log2(2^a + 2^b)` for Inside.
fn comb(inside: bool, a: f32, b: f32) -> f32 {
    if !inside {
        return a.max(b);
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if lo == IMPOSSIBLE {
        hi
    } else {
        hi + (1.0 + (lo - hi).exp2()).log2()
    }
}

/// Memoized recursive CYK or Inside over every plane, written straight from
/// the recurrences with no bands and no rolling storage.
pub struct Reference<'a> {
    cm: &'a CovarianceModel,
    dsq: &'a [u8],
    inside: bool,
    memo: HashMap<(P, usize, usize, usize), f32>,
}

impl<'a> Reference<'a> {
    pub fn new(cm: &'a CovarianceModel, seq: &'a DigitalSeq) -> Self {
        Self {
            cm,
            dsq: seq.dsq(),
            inside: false,
            memo: HashMap::new(),
        }
    }

    /// Same recurrences summed over parses instead of maximized.
    pub fn inside(cm: &'a CovarianceModel, seq: &'a DigitalSeq) -> Self {
        Self {
            inside: true,
            ..Self::new(cm, seq)
        }
    }

    fn children(&self, v: usize) -> Vec<(usize, f32)> {
        self.cm.state(v).transitions().collect()
    }

    /// Score of state `v` aligned to residues `i..=j` (`j = i - 1` is empty).
    fn score(&mut self, p: P, v: usize, i: usize, j: usize) -> f32 {
        if let Some(&sc) = self.memo.get(&(p, v, i, j)) {
            return sc;
        }
        let sc = self.compute(p, v, i, j);
        self.memo.insert((p, v, i, j), sc);
        sc
    }

    fn best_child(&mut self, p: P, v: usize, i: usize, j: usize, skip_self: bool) -> f32 {
        let ins = self.inside;
        let mut best = IMPOSSIBLE;
        for (y, t) in self.children(v) {
            if skip_self && y == v {
                continue;
            }
            best = comb(ins, best, self.score(p, y, i, j) + t);
        }
        best
    }

    fn compute(&mut self, p: P, v: usize, i: usize, j: usize) -> f32 {
        let cm = self.cm;
        let ins = self.inside;
        let d = j + 1 - i;
        let kind = cm.state(v).kind;
        if d == 0 {
            return match (p, kind) {
                (P::J, StateType::End) | (P::L, StateType::End) | (P::R, StateType::End) => 0.0,
                (P::J, StateType::Start | StateType::Delete | StateType::BifLeftStart) => {
                    let c = self.best_child(P::J, v, i, j, false);
                    comb(ins, cm.end_init(v, 0), c)
                }
                (P::J, StateType::Bifurcation) => {
                    let (w, y) = split(cm, v);
                    self.score(P::J, w, i, j) + self.score(P::J, y, i, j)
                }
                _ => IMPOSSIBLE,
            };
        }
        let st = cm.state(v);
        match kind {
            StateType::End => IMPOSSIBLE,
            StateType::Start | StateType::Delete | StateType::BifLeftStart => match p {
                P::J => {
                    let c = self.best_child(P::J, v, i, j, false);
                    comb(ins, cm.end_init(v, d), c)
                }
                P::L | P::R => self.best_child(p, v, i, j, false),
                P::T => IMPOSSIBLE,
            },
            StateType::Left => {
                let esc = st.single(self.dsq[i]);
                match p {
                    P::J => {
                        let c = self.best_child(P::J, v, i + 1, j, false);
                        comb(ins, cm.end_init(v, d - 1), c) + esc
                    }
                    P::L if d >= 2 => self.best_child(P::L, v, i + 1, j, false) + esc,
                    P::L => esc,
                    P::R => {
                        let a = self.best_child(P::J, v, i, j, true);
                        let b = self.best_child(P::R, v, i, j, true);
                        comb(ins, a, b)
                    }
                    P::T => IMPOSSIBLE,
                }
            }
            StateType::Right => {
                let esc = st.single(self.dsq[j]);
                match p {
                    P::J => {
                        let c = self.best_child(P::J, v, i, j - 1, false);
                        comb(ins, cm.end_init(v, d - 1), c) + esc
                    }
                    P::R if d >= 2 => self.best_child(P::R, v, i, j - 1, false) + esc,
                    P::R => esc,
                    P::L => {
                        let a = self.best_child(P::J, v, i, j, true);
                        let b = self.best_child(P::L, v, i, j, true);
                        comb(ins, a, b)
                    }
                    P::T => IMPOSSIBLE,
                }
            }
            StateType::Pair => {
                let (xi, xj) = (self.dsq[i], self.dsq[j]);
                let (pair, lm, rm) = (st.pair(xi, xj), st.left_marginal(xi), st.right_marginal(xj));
                match p {
                    P::J if d >= 2 => {
                        let c = self.best_child(P::J, v, i + 1, j - 1, false);
                        comb(ins, cm.end_init(v, d - 2), c) + pair
                    }
                    P::L if d >= 2 => {
                        let a = self.best_child(P::J, v, i + 1, j, false);
                        let b = self.best_child(P::L, v, i + 1, j, false);
                        comb(ins, a, b) + lm
                    }
                    P::L => lm,
                    P::R if d >= 2 => {
                        let a = self.best_child(P::J, v, i, j - 1, false);
                        let b = self.best_child(P::R, v, i, j - 1, false);
                        comb(ins, a, b) + rm
                    }
                    P::R => rm,
                    _ => IMPOSSIBLE,
                }
            }
            StateType::Bifurcation => {
                let (w, y) = split(cm, v);
                let mut best = IMPOSSIBLE;
                // k residues go to the right child: left gets i..=j-k, right j-k+1..=j.
                for k in 0..=d {
                    let sc = match p {
                        P::J => self.score(P::J, w, i, j - k) + self.score(P::J, y, j - k + 1, j),
                        P::L => self.score(P::J, w, i, j - k) + self.score(P::L, y, j - k + 1, j),
                        P::R => self.score(P::R, w, i, j - k) + self.score(P::J, y, j - k + 1, j),
                        P::T if k >= 1 && k < d => {
                            self.score(P::R, w, i, j - k) + self.score(P::L, y, j - k + 1, j)
                        }
                        P::T => IMPOSSIBLE,
                    };
                    best = comb(ins, best, sc);
                }
                match p {
                    P::L => {
                        let (a, b) = (self.score(P::J, w, i, j), self.score(P::L, w, i, j));
                        comb(ins, comb(ins, best, a), b)
                    }
                    P::R => {
                        let (a, b) = (self.score(P::J, y, i, j), self.score(P::R, y, i, j));
                        comb(ins, comb(ins, best, a), b)
                    }
                    _ => best,
                }
            }
        }
    }

    /// Root score of span `i..=j` in `pass`.
    pub fn root(&mut self, pass: PassKind, i: usize, j: usize) -> f32 {
        let cm = self.cm;
        let ins = self.inside;
        let d = j + 1 - i;
        let mut best = IMPOSSIBLE;
        for &mode in pass.root_planes() {
            let p = match mode {
                cmsift::TruncMode::Joint => P::J,
                cmsift::TruncMode::Left => P::L,
                cmsift::TruncMode::Right => P::R,
                cmsift::TruncMode::Both => P::T,
            };
            if p == P::J {
                best = comb(ins, best, cm.end_init(0, d));
                for y in 1..cm.len() {
                    let b = cm.state(y).begin_sc;
                    if b != IMPOSSIBLE {
                        let sc = self.score(P::J, y, i, j) + b;
                        best = comb(ins, best, sc);
                    }
                }
            } else if let Some(pen) = cm.trunc_penalty {
                for y in 1..cm.len() {
                    if cm.is_truncated_entry(y) {
                        let sc = self.score(p, y, i, j) + pen;
                        best = comb(ins, best, sc);
                    }
                }
            }
            let c = self.best_child(p, 0, i, j, false);
            best = comb(ins, best, c);
        }
        best
    }

    /// Best root score over spans of `i0..=j0` no longer than W, honoring
    /// the pass's forced termini. Returns `(score, i, j)`.
    pub fn best(&mut self, pass: PassKind, i0: usize, j0: usize) -> (f32, usize, usize) {
        let w = self.cm.max_width;
        let mut best = (IMPOSSIBLE, 0, 0);
        for j in i0..=j0 {
            for d in 1..=w.min(j + 1 - i0) {
                let i = j + 1 - d;
                if (pass.forces_start() && i != i0) || (pass.forces_end() && j != j0) {
                    continue;
                }
                let sc = self.root(pass, i, j);
                if sc > best.0 {
                    best = (sc, i, j);
                }
            }
        }
        best
    }
}

fn split(cm: &CovarianceModel, v: usize) -> (usize, usize) {
    match cm.state(v).children {
        Children::Split { left, right } => (left, right),
        _ => panic!("state {v} is not a bifurcation"),
    }
}
