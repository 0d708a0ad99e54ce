//! Hit resolution over root scores of a scan.
//!
//! The non-greedy resolver is a semi-Markov parse: `mx[jp]` is the best total
//! score of non-overlapping hits within the first `jp` residues of the range.
//! The greedy resolver keeps the best candidate ending at each position and
//! picks the best non-overlapping subset at the end.

use std::collections::BTreeMap;

use crate::common::TruncMode;
use crate::model::IMPOSSIBLE;

/// A hit found by a scan, in the coordinates of the scanned sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanHit {
    pub start: usize,
    pub end: usize,
    pub score: f32,
    pub root_state: usize,
    pub mode: TruncMode,
}

#[derive(Debug, Clone, Copy)]
struct Saved {
    start: usize,
    score: f32,
    root_state: usize,
    mode: TruncMode,
}

#[derive(Debug)]
pub struct GammaHitMx {
    i0: usize,
    cutoff: f32,
    greedy: bool,
    mx: Vec<f32>,
    back: Vec<Option<Saved>>,
    candidates: Vec<ScanHit>,
}

impl GammaHitMx {
    /// Resolver for the range starting at `i0` and spanning `len` residues.
    pub fn new(i0: usize, len: usize, cutoff: f32, greedy: bool) -> Self {
        let (mx, back) = if greedy {
            (Vec::new(), Vec::new())
        } else {
            (vec![0.0; len + 1], vec![None; len + 1])
        };
        Self {
            i0,
            cutoff,
            greedy,
            mx,
            back,
            candidates: Vec::new(),
        }
    }

    /// Consume the root scores of end position `j`. `root[d]` is the score of
    /// the span `j-d+1..=j`; `root_state` and `mode` name its best contributor.
    pub fn update(&mut self, j: usize, root: &[f32], root_state: &[usize], mode: &[TruncMode]) {
        if self.greedy {
            let mut best: Option<usize> = None;
            for d in 1..root.len() {
                if root[d] >= self.cutoff && root[d] > IMPOSSIBLE && best.is_none_or(|b| root[d] > root[b]) {
                    best = Some(d);
                }
            }
            if let Some(d) = best {
                self.candidates.push(ScanHit {
                    start: j + 1 - d,
                    end: j,
                    score: root[d],
                    root_state: root_state[d],
                    mode: mode[d],
                });
            }
            return;
        }

        let jp = j + 1 - self.i0;
        self.mx[jp] = self.mx[jp - 1];
        self.back[jp] = None;
        for d in 1..root.len().min(jp + 1) {
            if root[d] < self.cutoff {
                continue;
            }
            let sc = self.mx[jp - d] + root[d];
            if sc > self.mx[jp] {
                self.mx[jp] = sc;
                self.back[jp] = Some(Saved {
                    start: j + 1 - d,
                    score: root[d],
                    root_state: root_state[d],
                    mode: mode[d],
                });
            }
        }
    }

    /// Resolved hits, sorted by start.
    pub fn finish(self) -> Vec<ScanHit> {
        if self.greedy {
            return greedy_select(self.candidates);
        }
        let mut hits = Vec::new();
        let mut jp = self.mx.len() - 1;
        while jp > 0 {
            match self.back[jp] {
                Some(s) => {
                    hits.push(ScanHit {
                        start: s.start,
                        end: self.i0 + jp - 1,
                        score: s.score,
                        root_state: s.root_state,
                        mode: s.mode,
                    });
                    jp = s.start - self.i0;
                }
                None => jp -= 1,
            }
        }
        hits.reverse();
        hits
    }
}

fn greedy_select(mut candidates: Vec<ScanHit>) -> Vec<ScanHit> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.start.cmp(&b.start))
    });
    // Kept hits are disjoint, keyed by start. Only the last one starting at
    // or before a candidate's end can overlap it.
    let mut kept: BTreeMap<usize, ScanHit> = BTreeMap::new();
    for c in candidates {
        let clash = kept
            .range(..=c.end)
            .next_back()
            .is_some_and(|(_, k)| k.end >= c.start);
        if !clash {
            kept.insert(c.start, c);
        }
    }
    kept.into_values().collect()
}
