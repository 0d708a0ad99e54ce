//! Composition bias correction for final hit scores.
//!
//! A hit whose residue composition is far from the background scores well
//! against any model. The correction treats the hit's own composition as a
//! third null model, mixed in with weight `omega`, and subtracts the bits it
//! explains.

use crate::sequence::{BACKGROUND, DEGENERATE, K};

/// Prior weight of the composition null model.
pub const NULL3_OMEGA: f64 = 1.0 / 65536.0;

/// Residue frequencies of `residues`. A degenerate residue counts `1/K`
/// toward every canonical residue.
pub fn composition(residues: &[u8]) -> [f64; K] {
    let mut comp = [0.0f64; K];
    for &x in residues {
        match x as usize {
            c if c < K => comp[c] += 1.0,
            _ if x == DEGENERATE => comp.iter_mut().for_each(|f| *f += 1.0 / K as f64),
            _ => {}
        }
    }
    let total: f64 = comp.iter().sum();
    if total > 0.0 {
        comp.iter_mut().for_each(|f| *f /= total);
    }
    comp
}

/// Bits to subtract from a hit covering `residues`:
/// `log2(1 + omega * 2^sc)`, with `sc` the log-odds of the residues under
/// their own composition against the background.
pub fn null3_correction(residues: &[u8], omega: f64) -> f32 {
    let comp = composition(residues);
    let per_residue: f64 = comp
        .iter()
        .zip(BACKGROUND.iter())
        .filter(|(&f, _)| f > 0.0)
        .map(|(&f, &bg)| f * (f / bg as f64).log2())
        .sum();
    let x = omega.log2() + residues.len() as f64 * per_residue;
    // log2(1 + 2^x) without overflow for large x.
    let bits = if x > 0.0 {
        x + (-x).exp2().ln_1p() / std::f64::consts::LN_2
    } else {
        x.exp2().ln_1p() / std::f64::consts::LN_2
    };
    bits as f32
}
