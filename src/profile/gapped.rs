//! Position-specific profile with Viterbi and Forward DP.
//!
//! Three states per column (match, insert, delete), log2 scores. Local mode
//! enters any match state with a uniform entry score and exits from any match
//! state; glocal mode must enter at column 1 and leave from the last column.

use crate::align::logsum::{log2_sum, Combine, LogSum, MaxPlus};
use crate::error::SequenceError;
use crate::model::IMPOSSIBLE;
use crate::post::windows::Window;
use crate::seed::{best_ungapped, diagonal_seeds, Seed};
use crate::sequence::{DigitalSeq, BACKGROUND, DEGENERATE, K, KP};
use crate::stats::FilterEvd;

use super::{Domain, ProfileScorer};

/// Transition scores between profile states, bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapScores {
    pub mm: f32,
    pub mi: f32,
    pub md: f32,
    pub im: f32,
    pub ii: f32,
    pub dm: f32,
    pub dd: f32,
}

impl Default for GapScores {
    fn default() -> Self {
        Self {
            mm: -0.05,
            mi: -6.0,
            md: -6.0,
            im: -0.6,
            ii: -1.0,
            dm: -0.6,
            dd: -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PssmProfile {
    name: String,
    msc: Vec<[f32; KP]>,
    gaps: GapScores,
    evd: FilterEvd,
    local_entry: f32,
}

/// Best score and where it came from.
#[derive(Debug, Clone, Copy)]
struct Cell {
    sc: f32,
    start: usize,
}

impl Cell {
    const NONE: Cell = Cell {
        sc: IMPOSSIBLE,
        start: 0,
    };

    #[inline]
    fn add<C: Combine>(&mut self, sc: f32, start: usize) {
        if sc > self.sc {
            self.start = start;
        }
        self.sc = C::combine(self.sc, sc);
    }
}

/// Result of one DP sweep.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    score: f32,
    start: usize,
    end: usize,
}

impl PssmProfile {
    /// Build from per-column canonical scores; degenerate scores are derived
    /// as the background-weighted mean.
    pub fn new(name: &str, columns: &[[f32; K]], gaps: GapScores, evd: FilterEvd) -> Self {
        let msc: Vec<[f32; KP]> = columns
            .iter()
            .map(|col| {
                let mut row = [0.0f32; KP];
                row[..K].copy_from_slice(col);
                let mean: f32 = col
                    .iter()
                    .zip(BACKGROUND.iter())
                    .map(|(&sc, &f)| f * sc.exp2())
                    .sum();
                row[DEGENERATE as usize] = mean.log2();
                row
            })
            .collect();
        let m = msc.len().max(1);
        let local_entry = (2.0 / (m * (m + 1)) as f32).log2();
        Self {
            name: name.to_string(),
            msc,
            gaps,
            evd,
            local_entry,
        }
    }

    /// Profile that scores `matched` for the consensus residue of each column
    /// and `mismatched` otherwise.
    pub fn from_consensus(
        name: &str,
        consensus: &[u8],
        matched: f32,
        mismatched: f32,
        gaps: GapScores,
        evd: FilterEvd,
    ) -> Result<Self, SequenceError> {
        let seq = DigitalSeq::from_text(name, consensus)?;
        let columns: Vec<[f32; K]> = seq
            .residues()
            .iter()
            .map(|&x| {
                let mut col = [mismatched; K];
                if (x as usize) < K {
                    col[x as usize] = matched;
                }
                col
            })
            .collect();
        Ok(Self::new(name, &columns, gaps, evd))
    }

    /// Viterbi (`MaxPlus`) or Forward (`LogSum`) over residues `lo..=hi`.
    fn sweep<C: Combine>(&self, dsq: &[u8], lo: usize, hi: usize, glocal: bool) -> Sweep {
        let m = self.msc.len();
        let g = &self.gaps;
        let mut out = Sweep {
            score: IMPOSSIBLE,
            start: 0,
            end: 0,
        };
        if m == 0 || hi < lo {
            return out;
        }

        let mut mp = vec![Cell::NONE; m + 1];
        let mut ip = vec![Cell::NONE; m + 1];
        let mut dp = vec![Cell::NONE; m + 1];
        let mut mc = vec![Cell::NONE; m + 1];
        let mut ic = vec![Cell::NONE; m + 1];
        let mut dc = vec![Cell::NONE; m + 1];

        for i in lo..=hi {
            let x = dsq[i] as usize;
            for k in 1..=m {
                let mut cm = Cell::NONE;
                if !glocal {
                    cm.add::<C>(self.local_entry, i);
                } else if k == 1 {
                    cm.add::<C>(0.0, i);
                }
                if k > 1 {
                    cm.add::<C>(mp[k - 1].sc + g.mm, mp[k - 1].start);
                    cm.add::<C>(ip[k - 1].sc + g.im, ip[k - 1].start);
                    cm.add::<C>(dp[k - 1].sc + g.dm, dp[k - 1].start);
                }
                cm.sc += self.msc[k - 1][x];
                mc[k] = cm;

                let mut ci = Cell::NONE;
                if k < m {
                    ci.add::<C>(mp[k].sc + g.mi, mp[k].start);
                    ci.add::<C>(ip[k].sc + g.ii, ip[k].start);
                }
                ic[k] = ci;

                let mut cd = Cell::NONE;
                if k > 1 {
                    cd.add::<C>(mc[k - 1].sc + g.md, mc[k - 1].start);
                    cd.add::<C>(dc[k - 1].sc + g.dd, dc[k - 1].start);
                }
                dc[k] = cd;
            }

            let mut end = Cell::NONE;
            if glocal {
                end.add::<C>(mc[m].sc, mc[m].start);
                end.add::<C>(dc[m].sc, dc[m].start);
            } else {
                for cell in &mc[1..] {
                    end.add::<C>(cell.sc, cell.start);
                }
            }
            // Viterbi keeps the best end; Forward sums over ends.
            if end.sc > IMPOSSIBLE {
                let better = end.sc > out.score;
                out.score = C::combine(out.score, end.sc);
                if better {
                    out.start = end.start;
                    out.end = i;
                }
            }

            std::mem::swap(&mut mp, &mut mc);
            std::mem::swap(&mut ip, &mut ic);
            std::mem::swap(&mut dp, &mut dc);
        }
        out
    }

    fn viterbi_span(&self, dsq: &[u8], lo: usize, hi: usize, glocal: bool) -> Option<Sweep> {
        let s = self.sweep::<MaxPlus>(dsq, lo, hi, glocal);
        (s.score > IMPOSSIBLE).then_some(s)
    }
}

/// Bias of residues `lo..=hi` against a composition model fit to those same
/// residues, mixed in with prior weight 1/256.
fn composition_bias(dsq: &[u8], lo: usize, hi: usize) -> f32 {
    let mut counts = [1.0f32; K];
    for &x in &dsq[lo..=hi] {
        if (x as usize) < K {
            counts[x as usize] += 1.0;
        }
    }
    let total: f32 = counts.iter().sum();
    let null2: f32 = dsq[lo..=hi]
        .iter()
        .filter(|&&x| (x as usize) < K)
        .map(|&x| (counts[x as usize] / total / BACKGROUND[x as usize]).log2())
        .sum();
    log2_sum(0.0, (1.0f32 / 256.0).log2() + null2)
}

impl ProfileScorer for PssmProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.msc.len()
    }

    fn evd(&self) -> &FilterEvd {
        &self.evd
    }

    fn ungapped_seeds(&self, seq: &DigitalSeq, region: Window, min_score: f32) -> Vec<Seed> {
        diagonal_seeds(&self.msc, seq.dsq(), region.start, region.end, min_score)
    }

    fn ungapped_score(&self, seq: &DigitalSeq, win: Window) -> f32 {
        best_ungapped(&self.msc, seq.dsq(), win.start, win.end)
    }

    fn viterbi(&self, seq: &DigitalSeq, win: Window) -> f32 {
        self.sweep::<MaxPlus>(seq.dsq(), win.start, win.end, false).score
    }

    fn forward(&self, seq: &DigitalSeq, win: Window) -> f32 {
        self.sweep::<LogSum>(seq.dsq(), win.start, win.end, false).score
    }

    fn bias(&self, seq: &DigitalSeq, win: Window) -> f32 {
        composition_bias(seq.dsq(), win.start, win.end)
    }

    fn domains(&self, seq: &DigitalSeq, win: Window, glocal: bool, min_score: f32) -> Vec<Domain> {
        let dsq = seq.dsq();
        let mut found = Vec::new();
        let mut stack = vec![(win.start, win.end)];
        while let Some((lo, hi)) = stack.pop() {
            if hi < lo {
                continue;
            }
            let Some(best) = self.viterbi_span(dsq, lo, hi, glocal) else {
                continue;
            };
            if best.score < min_score {
                continue;
            }
            let env = Window::new(best.start, best.end);
            found.push(Domain {
                window: env,
                score: self.sweep::<LogSum>(dsq, env.start, env.end, glocal).score,
                bias: composition_bias(dsq, env.start, env.end),
            });
            if best.start > lo {
                stack.push((lo, best.start - 1));
            }
            if best.end < hi {
                stack.push((best.end + 1, hi));
            }
        }
        found.sort_by_key(|d| d.window);
        found
    }
}
