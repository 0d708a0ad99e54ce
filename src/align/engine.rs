//! Scan engine driver: matrix caching and band-mode fallback.

use std::collections::hash_map::Entry;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::error::ScanError;
use crate::model::CovarianceModel;
use crate::sequence::DigitalSeq;

use super::bands::{BandMode, BandProvider, BandTable};
use super::matrix::ScanMatrix;
use super::trunc_scan::{trunc_scan, ScanOutcome, ScanRequest};

/// One entry of a band fallback chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRequest {
    pub mode: BandMode,
    /// beta for query-dependent bands, tau for posterior bands.
    pub tail: f64,
}

impl BandRequest {
    pub fn unbanded() -> Self {
        Self {
            mode: BandMode::Unbanded,
            tail: 0.0,
        }
    }

    pub fn query_dependent(beta: f64) -> Self {
        Self {
            mode: BandMode::QueryDependent,
            tail: beta,
        }
    }

    pub fn posterior(tau: f64) -> Self {
        Self {
            mode: BandMode::Posterior,
            tail: tau,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MatrixKey {
    mode: BandMode,
    tail_bits: u64,
    truncated: bool,
}

/// Owns the scan matrices of one model.
///
/// Query-dependent and unbanded matrices are allocated once per band key and
/// reused; posterior matrices are built per window and checked against the
/// memory ceiling first.
#[derive(Debug)]
pub struct ScanEngine {
    cache: FxHashMap<MatrixKey, ScanMatrix>,
    limit_mb: f64,
}

impl ScanEngine {
    pub fn new(limit_mb: f64) -> Self {
        Self {
            cache: FxHashMap::default(),
            limit_mb,
        }
    }

    pub fn limit_mb(&self) -> f64 {
        self.limit_mb
    }

    /// Drop cached matrices, e.g. before scanning with another model.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Scan with a single band mode.
    pub fn scan(
        &mut self,
        model: &CovarianceModel,
        bands: &dyn BandProvider,
        seq: &DigitalSeq,
        band: BandRequest,
        req: &ScanRequest,
    ) -> Result<ScanOutcome, ScanError> {
        let truncated = req.pass.is_truncated();
        if band.mode == BandMode::Posterior {
            let table = bands
                .posterior(seq, req.i0, req.j0, band.tail)
                .ok_or(ScanError::MissingBands(BandMode::Posterior))?;
            let needed_mb = ScanMatrix::estimate_mb(model, &table, truncated)?;
            if needed_mb > self.limit_mb {
                return Err(ScanError::MatrixTooLarge {
                    needed_mb,
                    limit_mb: self.limit_mb,
                });
            }
            let mut mx = ScanMatrix::new(model, table, truncated)?;
            return trunc_scan(model, &mut mx, seq, req);
        }

        let key = MatrixKey {
            mode: band.mode,
            tail_bits: band.tail.to_bits(),
            truncated,
        };
        let mx = match self.cache.entry(key) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let table = match band.mode {
                    BandMode::QueryDependent => bands
                        .query_dependent(band.tail)
                        .cloned()
                        .ok_or(ScanError::MissingBands(BandMode::QueryDependent))?,
                    _ => BandTable::unbanded(model.len(), model.max_width),
                };
                let mx = ScanMatrix::new(model, table, truncated)?;
                debug!(
                    "allocated {} scan matrix for '{}' ({:.2} MB, truncated={})",
                    band.mode.label(),
                    model.name,
                    mx.size_mb(),
                    truncated
                );
                e.insert(mx)
            }
        };
        trunc_scan(model, mx, seq, req)
    }

    /// Try each band request in order. A matrix that would exceed the memory
    /// ceiling moves on to the next request and bumps `fallbacks`; any other
    /// error is returned. `Ok(None)` means the chain ran out.
    pub fn scan_with_fallback(
        &mut self,
        model: &CovarianceModel,
        bands: &dyn BandProvider,
        seq: &DigitalSeq,
        chain: &[BandRequest],
        req: &ScanRequest,
        fallbacks: &mut u64,
    ) -> Result<Option<(ScanOutcome, BandMode)>, ScanError> {
        if chain.is_empty() {
            return Err(ScanError::NoBandMode);
        }
        for band in chain {
            match self.scan(model, bands, seq, *band, req) {
                Ok(out) => return Ok(Some((out, band.mode))),
                Err(e) if e.is_resource() => {
                    *fallbacks += 1;
                    warn!(
                        "{}: {} bands for [{}, {}] rejected ({}), falling back",
                        seq.name,
                        band.mode.label(),
                        req.i0,
                        req.j0,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
