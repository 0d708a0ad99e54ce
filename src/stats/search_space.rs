use super::tables::CmTail;

/// Size of the searched database, in residues.
///
/// E-values scale with the number of random hits a calibration database of
/// `dbsize` residues produced above the fitted tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSpace {
    /// Total residues searched, both strands counted.
    pub residues: f64,
}

impl SearchSpace {
    /// Search space given in millions of residues (`-Z`).
    pub fn from_mb(z: f64) -> Self {
        Self {
            residues: z * 1_000_000.0,
        }
    }

    /// Search space equal to a single target's length.
    pub fn from_target(len: usize) -> Self {
        Self {
            residues: len as f64,
        }
    }

    /// Independent W-long windows in this space, at least one. Profile
    /// E-values are P-values scaled by this count.
    #[inline]
    pub fn windows(&self, w: usize) -> f64 {
        (self.residues / w.max(1) as f64).max(1.0)
    }

    /// Expected number of random hits above the tail location in this space.
    #[inline]
    pub fn effective_hits(&self, tail: &CmTail) -> f64 {
        tail.nrandhits * (self.residues / tail.dbsize)
    }
}
