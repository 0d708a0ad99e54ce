//! Covariance model stages: the CYK filter and the final scan.

use log::{debug, trace, warn};

use crate::align::bands::{BandMode, BandProvider};
use crate::align::engine::{BandRequest, ScanEngine};
use crate::align::trunc_scan::{ScanOutcome, ScanRequest};
use crate::common::{Hit, PassKind, ScanAlgorithm, Scorer};
use crate::config::{model_cutoff, PipelineConfig, Threshold};
use crate::error::ScanError;
use crate::model::{CovarianceModel, IMPOSSIBLE};
use crate::post::windows::{covered_residues, merge, Window};
use crate::sequence::DigitalSeq;
use crate::stats::{null3_correction, CmTail, SearchSpace, NULL3_OMEGA};

use super::accounting::{PassStats, StageCount};

/// Score thresholds resolved for one target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cutoffs {
    pub space: SearchSpace,
    /// Final-stage hits must score at least this.
    pub report_bits: f32,
    /// Root score bounding a redefined envelope.
    pub env_bits: Option<f32>,
}

pub(crate) struct CmStages<'a> {
    pub model: &'a CovarianceModel,
    pub bands: &'a dyn BandProvider,
    pub config: &'a PipelineConfig,
    pub filter_chain: &'a [BandRequest],
    pub final_chain: &'a [BandRequest],
}

impl CmStages<'_> {
    fn tail(&self, algorithm: ScanAlgorithm) -> Option<&CmTail> {
        self.model.evd.tail(algorithm, self.model.is_local())
    }

    pub fn cutoffs(&self, target_len: usize) -> Cutoffs {
        let space = match self.config.search_space_mb {
            Some(z) => SearchSpace::from_mb(z),
            None => SearchSpace::from_target(target_len),
        };
        let report_bits = match self.config.report {
            Threshold::EValue(e) => self
                .tail(self.config.final_algorithm)
                .map_or(IMPOSSIBLE, |t| t.score_for_evalue(e, &space) as f32),
            Threshold::BitScore(t) => t,
            Threshold::Model(cut) => model_cutoff(self.model, cut).unwrap_or(f32::INFINITY),
        };
        let env_bits = if self.config.filters.redefine_envelope {
            self.tail(ScanAlgorithm::Cyk)
                .map(|t| t.score_for_pvalue(self.config.thresholds.f6) as f32)
        } else {
            None
        };
        Cutoffs {
            space,
            report_bits,
            env_bits,
        }
    }

    /// Run one scan through a band chain. `Ok(None)` means every band mode was
    /// abandoned and the envelope is skipped.
    fn scan(
        &self,
        engine: &mut ScanEngine,
        seq: &DigitalSeq,
        chain: &[BandRequest],
        req: &ScanRequest,
        stats: &mut PassStats,
    ) -> Result<Option<(ScanOutcome, BandMode)>, ScanError> {
        let out = engine.scan_with_fallback(self.model, self.bands, seq, chain, req, &mut stats.band_fallbacks)?;
        if out.is_none() {
            stats.skipped_envelopes += 1;
            warn!(
                "{}: skipping envelope [{}, {}], no band mode fits in {:.0} MB",
                seq.name,
                req.i0,
                req.j0,
                engine.limit_mb()
            );
        }
        Ok(out)
    }

    /// Stage 4: keep envelopes whose best CYK score is significant, narrowing
    /// them to the span of high-scoring roots if asked.
    #[allow(clippy::too_many_arguments)]
    pub fn cyk_filter(
        &self,
        engine: &mut ScanEngine,
        seq: &DigitalSeq,
        region: Window,
        envelopes: Vec<Window>,
        pass: PassKind,
        cut: &Cutoffs,
        stats: &mut PassStats,
    ) -> Result<Vec<Window>, ScanError> {
        let cfg = self.config;
        if !cfg.filters.cyk {
            stats.cyk = StageCount::new(envelopes.len(), covered_residues(&envelopes));
            return Ok(envelopes);
        }
        let Some(tail) = self.tail(ScanAlgorithm::Cyk) else {
            return Err(ScanError::Incompatible(format!(
                "model '{}' has no CYK statistics for the CYK filter",
                self.model.name
            )));
        };

        let mut kept = Vec::with_capacity(envelopes.len());
        for env in envelopes {
            let mut req = ScanRequest::new(env.start, env.end, ScanAlgorithm::Cyk, pass);
            if let Some(bits) = cut.env_bits {
                req = req.with_envelope(bits);
            }
            let Some((out, _)) = self.scan(engine, seq, self.filter_chain, &req, stats)? else {
                continue;
            };
            let score = out.best_score as f64;
            let pass_filter = match cfg.thresholds.e4 {
                Some(e4) => tail.evalue(score, &cut.space) <= e4,
                None => tail.pvalue(score) <= cfg.thresholds.f4,
            };
            trace!(
                "{}: cyk [{}, {}] = {:.2} bits{}",
                seq.name,
                env.start,
                env.end,
                score,
                if pass_filter { "" } else { " (rejected)" }
            );
            if !pass_filter {
                continue;
            }
            let mut narrowed = match out.envelope {
                Some((s, e)) => Window::new(s, e),
                None => env,
            };
            if pass.forces_start() {
                narrowed.start = region.start;
            }
            if pass.forces_end() {
                narrowed.end = region.end;
            }
            kept.push(narrowed);
        }
        let kept = merge(kept);
        stats.cyk = StageCount::new(kept.len(), covered_residues(&kept));
        debug!("{} [{}]: {} envelopes after CYK filter", seq.name, pass.label(), kept.len());
        Ok(kept)
    }

    /// Stage 5: resolve hits in each envelope with the final algorithm. The
    /// composition correction is applied to each resolved hit, so a hit can
    /// fall below the reporting threshold after the parse has chosen it.
    #[allow(clippy::too_many_arguments)]
    pub fn final_scan(
        &self,
        engine: &mut ScanEngine,
        seq: &DigitalSeq,
        envelopes: &[Window],
        pass: PassKind,
        cut: &Cutoffs,
        stats: &mut PassStats,
        hits: &mut Vec<Hit>,
    ) -> Result<(), ScanError> {
        let cfg = self.config;
        let algorithm = cfg.final_algorithm;
        let tail = self.tail(algorithm);
        let mut scanned = Vec::with_capacity(envelopes.len());
        for &env in envelopes {
            let req = ScanRequest::new(env.start, env.end, algorithm, pass).with_hits(cut.report_bits, cfg.greedy);
            let Some((out, band_mode)) = self.scan(engine, seq, self.final_chain, &req, stats)? else {
                continue;
            };
            scanned.push(env);
            let envelope = seq.source_coords(env.start, env.end);
            for h in out.hits {
                let score = if cfg.null3 {
                    h.score - null3_correction(seq.range(h.start, h.end), NULL3_OMEGA)
                } else {
                    h.score
                };
                if score < cut.report_bits {
                    continue;
                }
                let (pvalue, evalue) = match tail {
                    Some(t) => (t.pvalue(score as f64), t.evalue(score as f64, &cut.space)),
                    None => (1.0, f64::INFINITY),
                };
                if let Threshold::EValue(e) = cfg.report {
                    if evalue > e {
                        continue;
                    }
                }
                let (start, end) = seq.source_coords(h.start, h.end);
                hits.push(Hit {
                    target: seq.name.clone(),
                    model: self.model.name.clone(),
                    start,
                    end,
                    strand: seq.strand,
                    score,
                    pvalue,
                    evalue,
                    pass,
                    trunc_mode: h.mode,
                    root_state: h.root_state,
                    scorer: Scorer::Cm {
                        algorithm,
                        bands: band_mode,
                    },
                    envelope,
                    included: cfg.inclusion.accepts(self.model, score, evalue),
                });
            }
        }
        stats.final_scans = StageCount::new(scanned.len(), covered_residues(&scanned));
        Ok(())
    }
}
