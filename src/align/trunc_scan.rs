//! Banded truncated CYK/Inside scan.
//!
//! For each end position j in the range and each state v (from M-1 down to
//! 1), the fill computes J/L/R/T scores over all lengths d allowed by the
//! band. The root is then combined over the planes the pass allows and fed to
//! the best-score tracker, the envelope tracker and the hit resolver.
//!
//! Plane semantics follow the emission rules of each state type:
//! a left emitter in L mode still emits i, in R mode it only passes through;
//! a pair state in L mode emits only its left residue (marginal score) and in
//! R mode only its right residue. Bifurcations may place the whole truncated
//! parse in one child, and in T mode split it between an R-mode left child
//! and an L-mode right child.

use log::trace;

use crate::common::{PassKind, ScanAlgorithm, TruncMode};
use crate::error::ScanError;
use crate::model::{Children, CovarianceModel, StateType, IMPOSSIBLE};
use crate::sequence::DigitalSeq;

use super::gamma::{GammaHitMx, ScanHit};
use super::logsum::{Combine, LogSum, MaxPlus};
use super::matrix::{Plane, ScanMatrix};

/// What to scan and what to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRequest {
    pub i0: usize,
    pub j0: usize,
    pub algorithm: ScanAlgorithm,
    pub pass: PassKind,
    /// Resolve hits with root score at or above this cutoff.
    pub hit_cutoff: Option<f32>,
    /// Track the span of root scores at or above this cutoff.
    pub env_cutoff: Option<f32>,
    /// Resolve hits greedily instead of by the gamma parse.
    pub greedy: bool,
    /// Report the best score reached by every state.
    pub state_best: bool,
}

impl ScanRequest {
    pub fn new(i0: usize, j0: usize, algorithm: ScanAlgorithm, pass: PassKind) -> Self {
        Self {
            i0,
            j0,
            algorithm,
            pass,
            hit_cutoff: None,
            env_cutoff: None,
            greedy: false,
            state_best: false,
        }
    }

    pub fn with_hits(mut self, cutoff: f32, greedy: bool) -> Self {
        self.hit_cutoff = Some(cutoff);
        self.greedy = greedy;
        self
    }

    pub fn with_envelope(mut self, cutoff: f32) -> Self {
        self.env_cutoff = Some(cutoff);
        self
    }

    pub fn with_state_best(mut self) -> Self {
        self.state_best = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Best root score in the range, `IMPOSSIBLE` if nothing aligned.
    pub best_score: f32,
    pub best_start: usize,
    pub best_end: usize,
    pub best_root: usize,
    pub best_mode: TruncMode,
    /// Resolved hits, sorted by start; empty unless requested.
    pub hits: Vec<ScanHit>,
    /// Smallest start and largest end of root scores above the envelope
    /// cutoff.
    pub envelope: Option<(usize, usize)>,
    pub state_best: Option<Vec<f32>>,
}

/// Check a request against the model, matrix and sequence.
fn validate(
    model: &CovarianceModel,
    mx: &ScanMatrix,
    seq: &DigitalSeq,
    req: &ScanRequest,
) -> Result<(), ScanError> {
    if req.i0 < 1 || req.j0 < req.i0 || req.j0 > seq.len() {
        return Err(ScanError::InvertedRange {
            i0: req.i0,
            j0: req.j0,
            len: seq.len(),
        });
    }
    if req.algorithm == ScanAlgorithm::Inside && !model.supports_inside {
        return Err(ScanError::Incompatible(format!(
            "model '{}' has no Inside scoring tables",
            model.name
        )));
    }
    if req.pass.is_truncated() {
        if !model.has_marginals {
            return Err(ScanError::Incompatible(format!(
                "model '{}' has no marginal emission tables for a {} pass",
                model.name,
                req.pass.label()
            )));
        }
        if !mx.is_truncated() {
            return Err(ScanError::Incompatible(
                "matrix was allocated without truncated planes".to_string(),
            ));
        }
    }
    if mx.bands().len() != model.len() {
        return Err(ScanError::Incompatible(format!(
            "band table covers {} states, model '{}' has {}",
            mx.bands().len(),
            model.name,
            model.len()
        )));
    }
    Ok(())
}

/// Scan `seq[req.i0..=req.j0]` with `model`, reusing `mx`.
pub fn trunc_scan(
    model: &CovarianceModel,
    mx: &mut ScanMatrix,
    seq: &DigitalSeq,
    req: &ScanRequest,
) -> Result<ScanOutcome, ScanError> {
    validate(model, mx, seq, req)?;
    let out = match req.algorithm {
        ScanAlgorithm::Cyk => fill::<MaxPlus>(model, mx, seq, req),
        ScanAlgorithm::Inside => fill::<LogSum>(model, mx, seq, req),
    };
    trace!(
        "{} {} scan [{}, {}]: best {:.2} at ({}, {})",
        req.pass.label(),
        req.algorithm,
        req.i0,
        req.j0,
        out.best_score,
        out.best_start,
        out.best_end
    );
    Ok(out)
}

/// Scores of one bifurcation cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BifScores {
    pub j: f32,
    pub l: f32,
    pub r: f32,
    pub t: f32,
}

/// Bifurcation recurrence at (j, d) with left child `w` and right child `y`.
pub(crate) fn bif_scores<C: Combine>(
    mx: &ScanMatrix,
    w: usize,
    y: usize,
    j: usize,
    d: usize,
    trunc: bool,
) -> BifScores {
    let kmin = d.saturating_sub(mx.deck_max(w));
    let kmax = mx.deck_max(y).min(d);

    let mut out = BifScores {
        j: IMPOSSIBLE,
        l: IMPOSSIBLE,
        r: IMPOSSIBLE,
        t: IMPOSSIBLE,
    };
    if kmin > kmax {
        return out;
    }
    for k in kmin..=kmax {
        out.j = C::combine(
            out.j,
            mx.get(Plane::J, w, j - k, d - k) + mx.get(Plane::J, y, j, k),
        );
    }
    if !trunc {
        return out;
    }

    for k in kmin..=kmax {
        out.l = C::combine(
            out.l,
            mx.get(Plane::J, w, j - k, d - k) + mx.get(Plane::L, y, j, k),
        );
        out.r = C::combine(
            out.r,
            mx.get(Plane::R, w, j - k, d - k) + mx.get(Plane::J, y, j, k),
        );
    }
    // Whole parse in the left child, right child truncated away.
    if kmin == 0 {
        out.l = C::combine(out.l, mx.get(Plane::J, w, j, d));
        out.l = C::combine(out.l, mx.get(Plane::L, w, j, d));
    }
    // Whole parse in the right child, left child truncated away.
    if kmax == d {
        out.r = C::combine(out.r, mx.get(Plane::J, y, j, d));
        out.r = C::combine(out.r, mx.get(Plane::R, y, j, d));
    }
    // Both children must contribute residues.
    let tmin = kmin.max(1);
    let tmax = kmax.min(d.saturating_sub(1));
    for k in tmin..=tmax {
        out.t = C::combine(
            out.t,
            mx.get(Plane::R, w, j - k, d - k) + mx.get(Plane::L, y, j, k),
        );
    }
    out
}

/// Running combination over root contributors that remembers the largest.
struct RootCell<C> {
    total: f32,
    top: f32,
    state: usize,
    mode: TruncMode,
    _c: std::marker::PhantomData<C>,
}

impl<C: Combine> RootCell<C> {
    fn new() -> Self {
        Self {
            total: IMPOSSIBLE,
            top: IMPOSSIBLE,
            state: 0,
            mode: TruncMode::Joint,
            _c: std::marker::PhantomData,
        }
    }

    #[inline]
    fn add(&mut self, sc: f32, state: usize, mode: TruncMode) {
        self.total = C::combine(self.total, sc);
        if sc > self.top {
            self.top = sc;
            self.state = state;
            self.mode = mode;
        }
    }
}

fn fill<C: Combine>(
    model: &CovarianceModel,
    mx: &mut ScanMatrix,
    seq: &DigitalSeq,
    req: &ScanRequest,
) -> ScanOutcome {
    mx.reset_with::<C>(model);

    let m = model.len();
    let w = mx.width();
    let trunc = req.pass.is_truncated();
    let dsq = seq.dsq();
    let root_state = model.state(0);

    let begins: Vec<(usize, f32)> = if model.local_begins {
        (1..m)
            .map(|y| (y, model.state(y).begin_sc))
            .filter(|&(_, sc)| sc != IMPOSSIBLE)
            .collect()
    } else {
        Vec::new()
    };
    let trunc_entries: Vec<usize> = match (trunc, model.trunc_penalty) {
        (true, Some(_)) => (1..m).filter(|&y| model.is_truncated_entry(y)).collect(),
        _ => Vec::new(),
    };
    let penalty = model.trunc_penalty.unwrap_or(IMPOSSIBLE);

    let mut root = vec![IMPOSSIBLE; w + 1];
    let mut root_from = vec![0usize; w + 1];
    let mut root_mode = vec![TruncMode::Joint; w + 1];
    let mut gamma = req
        .hit_cutoff
        .map(|c| GammaHitMx::new(req.i0, req.j0 - req.i0 + 1, c, req.greedy));
    let mut vbest = req.state_best.then(|| vec![IMPOSSIBLE; m]);

    let mut best = (IMPOSSIBLE, 0usize, 0usize, 0usize, TruncMode::Joint);
    let mut envelope: Option<(usize, usize)> = None;

    for j in req.i0..=req.j0 {
        let jp = j - req.i0 + 1;

        for v in (1..m).rev() {
            let (dmin, _) = mx.bands().bounds(v);
            let dx = jp.min(mx.deck_max(v));
            let dn = if trunc { 1 } else { dmin.max(1) };
            if dn > dx {
                continue;
            }
            let st = model.state(v);
            match st.kind {
                StateType::End => {}
                StateType::Start | StateType::Delete | StateType::BifLeftStart => {
                    for d in dn..=dx {
                        let mut sj = model.end_init(v, d);
                        let (mut sl, mut sr) = (IMPOSSIBLE, IMPOSSIBLE);
                        for (y, t) in st.transitions() {
                            sj = C::combine(sj, mx.get(Plane::J, y, j, d) + t);
                            if trunc {
                                sl = C::combine(sl, mx.get(Plane::L, y, j, d) + t);
                                sr = C::combine(sr, mx.get(Plane::R, y, j, d) + t);
                            }
                        }
                        mx.set(Plane::J, v, j, d, sj);
                        if trunc {
                            mx.set(Plane::L, v, j, d, sl);
                            mx.set(Plane::R, v, j, d, sr);
                        }
                    }
                }
                StateType::Left => {
                    for d in dn..=dx {
                        let esc = st.single(dsq[j + 1 - d]);
                        let mut sj = model.end_init(v, d - 1);
                        for (y, t) in st.transitions() {
                            sj = C::combine(sj, mx.get(Plane::J, y, j, d - 1) + t);
                        }
                        mx.set(Plane::J, v, j, d, sj + esc);
                        if !trunc {
                            continue;
                        }
                        let sl = if d >= 2 {
                            st.transitions().fold(IMPOSSIBLE, |acc, (y, t)| {
                                C::combine(acc, mx.get(Plane::L, y, j, d - 1) + t)
                            }) + esc
                        } else {
                            esc
                        };
                        let sr = st
                            .transitions()
                            .filter(|&(y, _)| y != v)
                            .fold(IMPOSSIBLE, |acc, (y, t)| {
                                let jr = C::combine(
                                    mx.get(Plane::J, y, j, d),
                                    mx.get(Plane::R, y, j, d),
                                );
                                C::combine(acc, jr + t)
                            });
                        mx.set(Plane::L, v, j, d, sl);
                        mx.set(Plane::R, v, j, d, sr);
                    }
                }
                StateType::Right => {
                    let esc = st.single(dsq[j]);
                    for d in dn..=dx {
                        let mut sj = model.end_init(v, d - 1);
                        for (y, t) in st.transitions() {
                            sj = C::combine(sj, mx.get(Plane::J, y, j - 1, d - 1) + t);
                        }
                        mx.set(Plane::J, v, j, d, sj + esc);
                        if !trunc {
                            continue;
                        }
                        let sr = if d >= 2 {
                            st.transitions().fold(IMPOSSIBLE, |acc, (y, t)| {
                                C::combine(acc, mx.get(Plane::R, y, j - 1, d - 1) + t)
                            }) + esc
                        } else {
                            esc
                        };
                        let sl = st
                            .transitions()
                            .filter(|&(y, _)| y != v)
                            .fold(IMPOSSIBLE, |acc, (y, t)| {
                                let jl = C::combine(
                                    mx.get(Plane::J, y, j, d),
                                    mx.get(Plane::L, y, j, d),
                                );
                                C::combine(acc, jl + t)
                            });
                        mx.set(Plane::L, v, j, d, sl);
                        mx.set(Plane::R, v, j, d, sr);
                    }
                }
                StateType::Pair => {
                    let xj = dsq[j];
                    for d in dn..=dx {
                        let xi = dsq[j + 1 - d];
                        let sj = if d >= 2 {
                            st.transitions()
                                .fold(model.end_init(v, d - 2), |acc, (y, t)| {
                                    C::combine(acc, mx.get(Plane::J, y, j - 1, d - 2) + t)
                                })
                                + st.pair(xi, xj)
                        } else {
                            IMPOSSIBLE
                        };
                        mx.set(Plane::J, v, j, d, sj);
                        if !trunc {
                            continue;
                        }
                        let (sl, sr) = if d >= 2 {
                            let (mut sl, mut sr) = (IMPOSSIBLE, IMPOSSIBLE);
                            for (y, t) in st.transitions() {
                                let jl = C::combine(
                                    mx.get(Plane::J, y, j, d - 1),
                                    mx.get(Plane::L, y, j, d - 1),
                                );
                                let jr = C::combine(
                                    mx.get(Plane::J, y, j - 1, d - 1),
                                    mx.get(Plane::R, y, j - 1, d - 1),
                                );
                                sl = C::combine(sl, jl + t);
                                sr = C::combine(sr, jr + t);
                            }
                            (sl + st.left_marginal(xi), sr + st.right_marginal(xj))
                        } else {
                            (st.left_marginal(xi), st.right_marginal(xj))
                        };
                        mx.set(Plane::L, v, j, d, sl);
                        mx.set(Plane::R, v, j, d, sr);
                    }
                }
                StateType::Bifurcation => {
                    let (wl, yr) = match st.children {
                        Children::Split { left, right } => (left, right),
                        _ => continue,
                    };
                    for d in dn..=dx {
                        let b = bif_scores::<C>(mx, wl, yr, j, d, trunc);
                        mx.set(Plane::J, v, j, d, b.j);
                        if trunc {
                            mx.set(Plane::L, v, j, d, b.l);
                            mx.set(Plane::R, v, j, d, b.r);
                            mx.set(Plane::T, v, j, d, b.t);
                        }
                    }
                }
            }

            if let Some(vb) = vbest.as_mut() {
                for d in dn..=dx {
                    let sc = mx
                        .get(Plane::J, v, j, d)
                        .max(mx.get(Plane::L, v, j, d))
                        .max(mx.get(Plane::R, v, j, d))
                        .max(mx.get(Plane::T, v, j, d));
                    vb[v] = vb[v].max(sc);
                }
            }
        }

        // Root.
        let (dmin0, _) = mx.bands().bounds(0);
        let dx = jp.min(mx.deck_max(0));
        let dn = if trunc { 1 } else { dmin0.max(1) };
        root[..=dx].fill(IMPOSSIBLE);
        for d in dn..=dx {
            let i = j + 1 - d;
            if (req.pass.forces_start() && i != req.i0) || (req.pass.forces_end() && j != req.j0) {
                continue;
            }
            let mut cell = RootCell::<C>::new();
            for &mode in req.pass.root_planes() {
                let plane = match mode {
                    TruncMode::Joint => Plane::J,
                    TruncMode::Left => Plane::L,
                    TruncMode::Right => Plane::R,
                    TruncMode::Both => Plane::T,
                };
                if mode == TruncMode::Joint {
                    cell.add(model.end_init(0, d), 0, mode);
                    for &(y, bsc) in &begins {
                        cell.add(mx.get(Plane::J, y, j, d) + bsc, y, mode);
                    }
                } else {
                    for &y in &trunc_entries {
                        cell.add(mx.get(plane, y, j, d) + penalty, y, mode);
                    }
                }
                for (y, t) in root_state.transitions() {
                    cell.add(mx.get(plane, y, j, d) + t, 0, mode);
                }
            }
            root[d] = cell.total;
            root_from[d] = cell.state;
            root_mode[d] = cell.mode;

            if cell.total > best.0 {
                best = (cell.total, i, j, cell.state, cell.mode);
            }
            if let Some(ec) = req.env_cutoff {
                if cell.total >= ec {
                    envelope = Some(match envelope {
                        Some((ei, ej)) => (ei.min(i), ej.max(j)),
                        None => (i, j),
                    });
                }
            }
        }
        if let Some(g) = gamma.as_mut() {
            g.update(j, &root[..=dx], &root_from[..=dx], &root_mode[..=dx]);
        }
    }

    if let Some(vb) = vbest.as_mut() {
        vb[0] = best.0;
    }

    ScanOutcome {
        best_score: best.0,
        best_start: best.1,
        best_end: best.2,
        best_root: best.3,
        best_mode: best.4,
        hits: gamma.map(GammaHitMx::finish).unwrap_or_default(),
        envelope,
        state_best: vbest,
    }
}
