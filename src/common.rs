use std::cmp::Ordering;
use std::fmt;

use crate::align::bands::BandMode;
use crate::sequence::Strand;

/// Scoring algorithm used by the DP engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanAlgorithm {
    /// Best single parse (max-plus).
    Cyk,
    /// Sum over all parses, log2 space.
    #[default]
    Inside,
}

impl fmt::Display for ScanAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanAlgorithm::Cyk => write!(f, "cyk"),
            ScanAlgorithm::Inside => write!(f, "inside"),
        }
    }
}

/// Score plane an alignment was rooted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncMode {
    /// Full-length alignment.
    Joint,
    /// Left (5') end of the model missing.
    Left,
    /// Right (3') end of the model missing.
    Right,
    /// Both ends missing; only rooted at bifurcations.
    Both,
}

impl TruncMode {
    pub fn label(self) -> &'static str {
        match self {
            TruncMode::Joint => "no",
            TruncMode::Left => "5'",
            TruncMode::Right => "3'",
            TruncMode::Both => "5'&3'",
        }
    }
}

/// One pass of the pipeline over a target sequence.
///
/// Passes run in declaration order; each has its own accounting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Standard,
    FivePrime,
    ThreePrime,
    BothTermini,
    AnyTruncation,
}

impl PassKind {
    pub const ALL: [PassKind; 5] = [
        PassKind::Standard,
        PassKind::FivePrime,
        PassKind::ThreePrime,
        PassKind::BothTermini,
        PassKind::AnyTruncation,
    ];

    /// Index of this pass's accounting bucket.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PassKind::Standard => 0,
            PassKind::FivePrime => 1,
            PassKind::ThreePrime => 2,
            PassKind::BothTermini => 3,
            PassKind::AnyTruncation => 4,
        }
    }

    /// Root planes whose scores this pass may report.
    pub fn root_planes(self) -> &'static [TruncMode] {
        match self {
            PassKind::Standard => &[TruncMode::Joint],
            PassKind::FivePrime => &[TruncMode::Left],
            PassKind::ThreePrime => &[TruncMode::Right],
            PassKind::BothTermini => &[TruncMode::Both],
            PassKind::AnyTruncation => &[TruncMode::Left, TruncMode::Right, TruncMode::Both],
        }
    }

    /// Reported alignments must begin at the first residue of the range.
    #[inline]
    pub fn forces_start(self) -> bool {
        matches!(self, PassKind::FivePrime | PassKind::BothTermini)
    }

    /// Reported alignments must end at the last residue of the range.
    #[inline]
    pub fn forces_end(self) -> bool {
        matches!(self, PassKind::ThreePrime | PassKind::BothTermini)
    }

    /// True if the pass fills the L/R/T planes.
    #[inline]
    pub fn is_truncated(self) -> bool {
        !matches!(self, PassKind::Standard)
    }

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Standard => "standard",
            PassKind::FivePrime => "5' truncated",
            PassKind::ThreePrime => "3' truncated",
            PassKind::BothTermini => "5'&3' truncated",
            PassKind::AnyTruncation => "any truncation",
        }
    }
}

/// What produced a hit's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scorer {
    /// Covariance model scan with the bands it finally ran under.
    Cm { algorithm: ScanAlgorithm, bands: BandMode },
    /// Profile envelope domain; the covariance model never ran.
    Profile,
}

impl Scorer {
    pub fn label(self) -> &'static str {
        match self {
            Scorer::Cm { .. } => "cm",
            Scorer::Profile => "hmm",
        }
    }

    pub fn band_label(self) -> &'static str {
        match self {
            Scorer::Cm { bands, .. } => bands.label(),
            Scorer::Profile => "-",
        }
    }
}

/// A finalized hit. Coordinates are in the source sequence; on the reverse
/// strand `start > end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub target: String,
    pub model: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    /// Bit score.
    pub score: f32,
    pub pvalue: f64,
    pub evalue: f64,
    pub pass: PassKind,
    pub trunc_mode: TruncMode,
    /// State the root score came from (0 for a standard root entry).
    pub root_state: usize,
    pub scorer: Scorer,
    /// Envelope the hit was found in, source coordinates.
    pub envelope: (usize, usize),
    pub included: bool,
}

impl Hit {
    /// Lowest and highest source coordinate covered.
    #[inline]
    pub fn span(&self) -> (usize, usize) {
        (self.start.min(self.end), self.start.max(self.end))
    }

    #[inline]
    pub fn len(&self) -> usize {
        let (lo, hi) = self.span();
        hi - lo + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Compare two E-values, treating values below 1e-180 as equal.
#[inline]
fn evalue_comp(evalue1: f64, evalue2: f64) -> Ordering {
    const EPSILON: f64 = 1.0e-180;
    if evalue1 < EPSILON && evalue2 < EPSILON {
        Ordering::Equal
    } else if evalue1 < evalue2 {
        Ordering::Less
    } else if evalue1 > evalue2 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Report order: E-value ASC, score DESC, target, low coordinate ASC.
pub fn hit_report_order(a: &Hit, b: &Hit) -> Ordering {
    match evalue_comp(a.evalue, b.evalue) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match b.score.partial_cmp(&a.score) {
        Some(Ordering::Equal) | None => {}
        Some(ord) => return ord,
    }
    match a.target.cmp(&b.target) {
        Ordering::Equal => {}
        ord => return ord,
    }
    a.span().0.cmp(&b.span().0)
}

/// Receiver of finalized hits.
pub trait HitSink {
    fn push(&mut self, hit: Hit);
}

impl HitSink for Vec<Hit> {
    fn push(&mut self, hit: Hit) {
        Vec::push(self, hit);
    }
}

/// In-memory hit collection.
#[derive(Debug, Clone, Default)]
pub struct HitList {
    hits: Vec<Hit>,
}

impl HitList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    pub fn as_slice(&self) -> &[Hit] {
        &self.hits
    }

    /// Sort into report order.
    pub fn sort(&mut self) {
        self.hits.sort_by(hit_report_order);
    }

    /// Drop hits overlapping a higher-scoring hit on the same target and strand.
    pub fn remove_overlaps(&mut self) {
        let hits = std::mem::take(&mut self.hits);
        self.hits = crate::post::filter::remove_overlaps(hits);
    }

    /// Number of hits flagged as included.
    pub fn n_included(&self) -> usize {
        self.hits.iter().filter(|h| h.included).count()
    }

    pub fn into_vec(self) -> Vec<Hit> {
        self.hits
    }
}

impl HitSink for HitList {
    fn push(&mut self, hit: Hit) {
        self.hits.push(hit);
    }
}

impl Extend<Hit> for HitList {
    fn extend<I: IntoIterator<Item = Hit>>(&mut self, iter: I) {
        self.hits.extend(iter);
    }
}
