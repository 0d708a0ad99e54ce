//! Sequence representation
//!
//! RNA residues are digitized into a small integer alphabet. Position 0 and
//! position n+1 of every digital sequence hold a sentinel so DP code can use
//! 1-based coordinates directly.

pub mod digital;

pub use digital::*;

/// Number of canonical residues (A, C, G, U).
pub const K: usize = 4;
/// Canonical residues plus the degenerate code.
pub const KP: usize = 5;
/// Digital code for any degenerate residue (N, R, Y, ...).
pub const DEGENERATE: u8 = 4;
/// Digital code stored at both ends of a digital sequence.
pub const SENTINEL: u8 = 255;

/// Background frequency assumed for canonical residues.
pub const BACKGROUND: [f32; K] = [0.25; K];

/// Digitize one text residue. T is read as U; IUPAC ambiguity codes collapse
/// to [`DEGENERATE`].
#[inline]
pub fn digitize_residue(c: u8) -> Option<u8> {
    match c.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'U' | b'T' => Some(3),
        b'N' | b'R' | b'Y' | b'K' | b'M' | b'S' | b'W' | b'B' | b'D' | b'H' | b'V' => {
            Some(DEGENERATE)
        }
        _ => None,
    }
}

/// Text symbol for a digital residue.
#[inline]
pub fn residue_symbol(x: u8) -> char {
    match x {
        0 => 'A',
        1 => 'C',
        2 => 'G',
        3 => 'U',
        DEGENERATE => 'N',
        _ => '*',
    }
}

/// Complement of a digital residue; the degenerate code maps to itself.
#[inline]
pub fn complement(x: u8) -> u8 {
    match x {
        0..=3 => 3 - x,
        other => other,
    }
}
