//! Per-state subsequence length bands.

use crate::sequence::DigitalSeq;

/// Band source used for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BandMode {
    /// Every state may span 0..=W residues.
    #[default]
    Unbanded,
    /// Fixed per-model bands keyed by the tail loss beta.
    QueryDependent,
    /// Per-window bands from HMM posteriors, keyed by tau.
    Posterior,
}

impl BandMode {
    pub fn label(self) -> &'static str {
        match self {
            BandMode::Unbanded => "nb",
            BandMode::QueryDependent => "qdb",
            BandMode::Posterior => "hmmb",
        }
    }
}

/// Inclusive bounds on the length of the subsequence a state may align to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub dmin: usize,
    pub dmax: usize,
}

/// One band per model state.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    mode: BandMode,
    /// beta or tau, 0 for unbanded tables.
    key: f64,
    bands: Vec<Band>,
}

impl BandTable {
    pub fn new(mode: BandMode, key: f64, bands: Vec<Band>) -> Self {
        Self { mode, key, bands }
    }

    /// Table admitting every length up to `w` for `m` states.
    pub fn unbanded(m: usize, w: usize) -> Self {
        Self {
            mode: BandMode::Unbanded,
            key: 0.0,
            bands: vec![Band { dmin: 0, dmax: w }; m],
        }
    }

    pub fn from_pairs(mode: BandMode, key: f64, pairs: &[(usize, usize)]) -> Self {
        Self::new(
            mode,
            key,
            pairs
                .iter()
                .map(|&(dmin, dmax)| Band { dmin, dmax })
                .collect(),
        )
    }

    /// `(dmin, dmax)` of state `v`.
    #[inline]
    pub fn bounds(&self, v: usize) -> (usize, usize) {
        let b = self.bands[v];
        (b.dmin, b.dmax)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    #[inline]
    pub fn mode(&self) -> BandMode {
        self.mode
    }

    #[inline]
    pub fn key(&self) -> f64 {
        self.key
    }
}

/// Source of band tables for the scanning engine.
///
/// Band computation itself (QDB tail integration, HMM posterior decoding)
/// lives outside this crate.
pub trait BandProvider {
    /// Query-dependent bands for tail loss `beta`, if computed.
    fn query_dependent(&self, beta: f64) -> Option<&BandTable>;

    /// Posterior bands for residues `i0..=j0` of `seq`.
    fn posterior(&self, seq: &DigitalSeq, i0: usize, j0: usize, tau: f64) -> Option<BandTable>;

    /// Whether `posterior` can ever succeed.
    fn has_posterior(&self) -> bool {
        true
    }
}

/// Provider with no bands at all; only unbanded scans succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBands;

impl BandProvider for NoBands {
    fn query_dependent(&self, _beta: f64) -> Option<&BandTable> {
        None
    }

    fn posterior(&self, _seq: &DigitalSeq, _i0: usize, _j0: usize, _tau: f64) -> Option<BandTable> {
        None
    }

    fn has_posterior(&self) -> bool {
        false
    }
}

/// Provider backed by precomputed tables.
///
/// Query-dependent tables are matched on beta; the posterior table, if any,
/// is handed out for every window regardless of tau.
#[derive(Debug, Clone, Default)]
pub struct StaticBands {
    qdb: Vec<BandTable>,
    posterior: Option<BandTable>,
}

impl StaticBands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_qdb(mut self, table: BandTable) -> Self {
        self.qdb.push(table);
        self
    }

    pub fn with_posterior(mut self, table: BandTable) -> Self {
        self.posterior = Some(table);
        self
    }
}

impl BandProvider for StaticBands {
    fn query_dependent(&self, beta: f64) -> Option<&BandTable> {
        self.qdb
            .iter()
            .find(|t| t.key == beta || ((t.key - beta) / beta).abs() < 1e-9)
    }

    fn posterior(&self, _seq: &DigitalSeq, _i0: usize, _j0: usize, _tau: f64) -> Option<BandTable> {
        self.posterior.clone()
    }

    fn has_posterior(&self) -> bool {
        self.posterior.is_some()
    }
}
