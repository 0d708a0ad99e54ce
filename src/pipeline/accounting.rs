//! Per-pass survival counters.
//!
//! Every stage records how many windows (or envelopes) survived it and how
//! many residues those windows cover. Residues are counted over the union of
//! surviving windows so overlapping windows do not inflate the totals.

use std::fmt;
use std::ops::AddAssign;

use crate::common::PassKind;

/// Windows and residues surviving one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCount {
    pub windows: u64,
    pub residues: u64,
}

impl StageCount {
    pub fn new(windows: usize, residues: u64) -> Self {
        Self {
            windows: windows as u64,
            residues,
        }
    }
}

impl AddAssign for StageCount {
    fn add_assign(&mut self, rhs: Self) {
        self.windows += rhs.windows;
        self.residues += rhs.residues;
    }
}

/// Counters for one truncation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Times the pass ran.
    pub runs: u64,
    /// Residues the pass was given.
    pub searched: u64,
    pub msv: StageCount,
    pub msv_bias: StageCount,
    pub vit: StageCount,
    pub vit_bias: StageCount,
    pub fwd: StageCount,
    pub fwd_bias: StageCount,
    pub envelopes: StageCount,
    pub dom_bias: StageCount,
    pub cyk: StageCount,
    /// Envelopes the final stage ran on.
    pub final_scans: StageCount,
    /// Band modes abandoned because the matrix would not fit.
    pub band_fallbacks: u64,
    /// Envelopes dropped after every band mode was abandoned.
    pub skipped_envelopes: u64,
    /// Hits passed to the sink.
    pub hits: u64,
}

impl PassStats {
    /// Windows that survived stages 1 and 2.
    pub fn stage2_survivors(&self) -> u64 {
        self.fwd_bias.windows
    }
}

impl AddAssign<&PassStats> for PassStats {
    fn add_assign(&mut self, rhs: &PassStats) {
        self.runs += rhs.runs;
        self.searched += rhs.searched;
        self.msv += rhs.msv;
        self.msv_bias += rhs.msv_bias;
        self.vit += rhs.vit;
        self.vit_bias += rhs.vit_bias;
        self.fwd += rhs.fwd;
        self.fwd_bias += rhs.fwd_bias;
        self.envelopes += rhs.envelopes;
        self.dom_bias += rhs.dom_bias;
        self.cyk += rhs.cyk;
        self.final_scans += rhs.final_scans;
        self.band_fallbacks += rhs.band_fallbacks;
        self.skipped_envelopes += rhs.skipped_envelopes;
        self.hits += rhs.hits;
    }
}

/// Counters for one or more target sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub nseqs: u64,
    pub nres: u64,
    passes: [PassStats; 5],
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(&self, pass: PassKind) -> &PassStats {
        &self.passes[pass.index()]
    }

    pub fn pass_mut(&mut self, pass: PassKind) -> &mut PassStats {
        &mut self.passes[pass.index()]
    }

    /// Sum of every pass bucket.
    pub fn total(&self) -> PassStats {
        let mut total = PassStats::default();
        for p in &self.passes {
            total += p;
        }
        total
    }

    pub fn hits(&self) -> u64 {
        self.passes.iter().map(|p| p.hits).sum()
    }

    /// Fold another sequence's counters into these.
    pub fn merge(&mut self, other: &PipelineStats) {
        *self += other;
    }
}

impl AddAssign<&PipelineStats> for PipelineStats {
    fn add_assign(&mut self, rhs: &PipelineStats) {
        self.nseqs += rhs.nseqs;
        self.nres += rhs.nres;
        for (a, b) in self.passes.iter_mut().zip(rhs.passes.iter()) {
            *a += b;
        }
    }
}

fn write_stage(f: &mut fmt::Formatter<'_>, label: &str, c: StageCount, searched: u64) -> fmt::Result {
    let frac = if searched > 0 {
        c.residues as f64 / searched as f64
    } else {
        0.0
    };
    writeln!(f, "  {:<28} {:>10}  ({:.4}; {} res)", label, c.windows, frac, c.residues)
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Target sequences:              {:>10}  ({} residues searched)", self.nseqs, self.nres)?;
        for pass in PassKind::ALL {
            let p = self.pass(pass);
            if p.runs == 0 {
                continue;
            }
            writeln!(f, "Pass: {} ({} runs, {} residues)", pass.label(), p.runs, p.searched)?;
            write_stage(f, "Windows passing ungapped:", p.msv, p.searched)?;
            write_stage(f, "Windows passing bias filter:", p.msv_bias, p.searched)?;
            write_stage(f, "Windows passing Vit filter:", p.vit, p.searched)?;
            write_stage(f, "Windows passing Vit bias:", p.vit_bias, p.searched)?;
            write_stage(f, "Windows passing Fwd filter:", p.fwd, p.searched)?;
            write_stage(f, "Windows passing Fwd bias:", p.fwd_bias, p.searched)?;
            write_stage(f, "Envelopes passing glocal:", p.envelopes, p.searched)?;
            write_stage(f, "Envelopes passing bias:", p.dom_bias, p.searched)?;
            write_stage(f, "Envelopes passing CYK:", p.cyk, p.searched)?;
            write_stage(f, "Envelopes scanned (final):", p.final_scans, p.searched)?;
            if p.band_fallbacks > 0 || p.skipped_envelopes > 0 {
                writeln!(
                    f,
                    "  Band fallbacks:              {:>10}  (skipped envelopes: {})",
                    p.band_fallbacks, p.skipped_envelopes
                )?;
            }
            writeln!(f, "  Total hits:                  {:>10}", p.hits)?;
        }
        write!(f, "Total hits reported:           {:>10}", self.hits())
    }
}
