use crate::error::SequenceError;

use super::{complement, digitize_residue, SENTINEL};

/// Which strand of the source sequence a [`DigitalSeq`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

/// A digitized target sequence, possibly a sub-window of a longer source.
///
/// `start` and `full_len` are in the coordinates of the searched strand:
/// residue 1 of this sequence is residue `start` of a `full_len`-long strand.
/// The pipeline needs both to decide whether a terminus is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalSeq {
    pub name: String,
    dsq: Vec<u8>,
    pub start: usize,
    pub full_len: usize,
    pub strand: Strand,
}

impl DigitalSeq {
    /// Digitize a complete forward-strand sequence.
    pub fn from_text(name: &str, text: &[u8]) -> Result<Self, SequenceError> {
        let mut dsq = Vec::with_capacity(text.len() + 2);
        dsq.push(SENTINEL);
        for (idx, &c) in text.iter().enumerate() {
            let x = digitize_residue(c).ok_or_else(|| SequenceError::InvalidResidue {
                name: name.to_string(),
                pos: idx + 1,
                byte: c as char,
            })?;
            dsq.push(x);
        }
        dsq.push(SENTINEL);
        let n = text.len();
        Ok(Self {
            name: name.to_string(),
            dsq,
            start: 1,
            full_len: n,
            strand: Strand::Forward,
        })
    }

    /// Wrap already digitized residues (codes `0..KP`).
    pub fn from_digital(name: &str, residues: &[u8]) -> Self {
        let mut dsq = Vec::with_capacity(residues.len() + 2);
        dsq.push(SENTINEL);
        dsq.extend_from_slice(residues);
        dsq.push(SENTINEL);
        Self {
            name: name.to_string(),
            dsq,
            start: 1,
            full_len: residues.len(),
            strand: Strand::Forward,
        }
    }

    /// Declare where this fragment sits in its source strand.
    pub fn with_source(
        mut self,
        start: usize,
        full_len: usize,
        strand: Strand,
    ) -> Result<Self, SequenceError> {
        let end = start + self.len().saturating_sub(1);
        if start == 0 || end > full_len {
            return Err(SequenceError::SourceOutOfBounds {
                name: self.name,
                start,
                end,
                full_len,
            });
        }
        self.start = start;
        self.full_len = full_len;
        self.strand = strand;
        Ok(self)
    }

    /// Reverse complement, placed on the opposite strand of the same source.
    pub fn reverse_complement(&self) -> Self {
        let n = self.len();
        let mut dsq = Vec::with_capacity(n + 2);
        dsq.push(SENTINEL);
        dsq.extend(self.residues().iter().rev().map(|&x| complement(x)));
        dsq.push(SENTINEL);
        let end = self.start + n.saturating_sub(1);
        Self {
            name: self.name.clone(),
            dsq,
            start: self.full_len + 1 - end.max(1).min(self.full_len.max(1)),
            full_len: self.full_len,
            strand: match self.strand {
                Strand::Forward => Strand::Reverse,
                Strand::Reverse => Strand::Forward,
            },
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dsq.len() - 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full digital array including both sentinels; index `i` is residue `i`.
    #[inline]
    pub fn dsq(&self) -> &[u8] {
        &self.dsq
    }

    /// Residues `1..=n` without sentinels.
    #[inline]
    pub fn residues(&self) -> &[u8] {
        &self.dsq[1..self.dsq.len() - 1]
    }

    /// Residues `i..=j` (1-based, inclusive).
    #[inline]
    pub fn range(&self, i: usize, j: usize) -> &[u8] {
        &self.dsq[i..=j]
    }

    /// True if residue 1 is the first residue of the source strand.
    pub fn has_five_prime_end(&self) -> bool {
        self.start == 1
    }

    /// True if residue n is the last residue of the source strand.
    pub fn has_three_prime_end(&self) -> bool {
        self.start + self.len().saturating_sub(1) == self.full_len
    }

    /// Copy of residues `i..=j` as a new sequence, re-based to start at 1 but
    /// still placed correctly in the source.
    pub fn subseq(&self, i: usize, j: usize) -> Self {
        let mut dsq = Vec::with_capacity(j + 3 - i);
        dsq.push(SENTINEL);
        dsq.extend_from_slice(self.range(i, j));
        dsq.push(SENTINEL);
        Self {
            name: self.name.clone(),
            dsq,
            start: self.start + i - 1,
            full_len: self.full_len,
            strand: self.strand,
        }
    }

    /// Map local coordinates `(i, j)` to source coordinates on the forward
    /// strand. Reverse-strand hits come back with `start > end`.
    pub fn source_coords(&self, i: usize, j: usize) -> (usize, usize) {
        let a = self.start + i - 1;
        let b = self.start + j - 1;
        match self.strand {
            Strand::Forward => (a, b),
            Strand::Reverse => (self.full_len + 1 - a, self.full_len + 1 - b),
        }
    }
}
