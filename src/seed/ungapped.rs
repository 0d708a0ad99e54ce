//! Ungapped diagonal scoring of a profile against a target.
//!
//! Profile column k against residue i lies on diagonal `i - k`. Along each
//! diagonal a Kadane scan finds the maximal-scoring segments; a segment is
//! closed when the running score falls to zero or the diagonal ends.

use crate::sequence::KP;

/// A high-scoring ungapped segment, target coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

/// Walk every diagonal touching residues `lo..=hi`, calling `on_segment`
/// with each closed maximal segment.
fn scan_diagonals(
    msc: &[[f32; KP]],
    dsq: &[u8],
    lo: usize,
    hi: usize,
    mut on_segment: impl FnMut(Seed),
) {
    let m = msc.len();
    if m == 0 || hi < lo {
        return;
    }
    // Diagonal o pairs column k (0-based) with residue k + o.
    let first = lo as isize - (m as isize - 1);
    for o in first..=hi as isize {
        let k0 = (lo as isize - o).max(0) as usize;
        let mut run = 0.0f32;
        let mut run_start = 0usize;
        let mut best: Option<Seed> = None;
        let mut k = k0;
        while k < m {
            let i = (k as isize + o) as usize;
            if i > hi {
                break;
            }
            if run <= 0.0 {
                run = 0.0;
                run_start = i;
            }
            run += msc[k][dsq[i] as usize];
            if best.map_or(run > 0.0, |b| run > b.score) {
                best = Some(Seed {
                    start: run_start,
                    end: i,
                    score: run,
                });
            }
            if run <= 0.0 {
                if let Some(b) = best.take() {
                    on_segment(b);
                }
            }
            k += 1;
        }
        if let Some(b) = best {
            on_segment(b);
        }
    }
}

/// Segments scoring at least `min_score`.
pub fn diagonal_seeds(
    msc: &[[f32; KP]],
    dsq: &[u8],
    lo: usize,
    hi: usize,
    min_score: f32,
) -> Vec<Seed> {
    let mut seeds = Vec::new();
    scan_diagonals(msc, dsq, lo, hi, |s| {
        if s.score >= min_score {
            seeds.push(s);
        }
    });
    seeds.sort_by_key(|s| (s.start, s.end));
    seeds
}

/// Best ungapped segment score within `lo..=hi`; 0 if nothing scores
/// positive.
pub fn best_ungapped(msc: &[[f32; KP]], dsq: &[u8], lo: usize, hi: usize) -> f32 {
    let mut best = 0.0f32;
    scan_diagonals(msc, dsq, lo, hi, |s| best = best.max(s.score));
    best
}
