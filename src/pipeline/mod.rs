//! The filter pipeline.
//!
//! A target is searched in up to five passes (standard, then the truncated
//! passes its termini allow). Each pass sends windows through the profile
//! filters, turns survivors into envelopes, checks them with a CYK scan and
//! resolves hits with the final algorithm. Hits from all passes are cleaned of
//! overlaps before they reach the sink.
//!
//! With the covariance model turned off, only the standard pass runs and its
//! scored envelope domains are reported directly.

mod accounting;
mod cm_stage;
mod passes;
mod profile_stage;
mod stages;

pub use accounting::{PassStats, PipelineStats, StageCount};

use anyhow::Context;
use log::{debug, info};

use crate::align::bands::BandProvider;
use crate::align::engine::{BandRequest, ScanEngine};
use crate::common::{Hit, HitSink, PassKind};
use crate::config::{PipelineConfig, Stage, TruncationMode};
use crate::error::{ConfigError, PipelineError};
use crate::model::CovarianceModel;
use crate::post::filter::remove_overlaps;
use crate::profile::ProfileScorer;
use crate::sequence::DigitalSeq;

use cm_stage::CmStages;
use passes::plan_passes;
use profile_stage::ProfileHits;
use stages::{Filtered, ProfileStages};

/// Searches targets with one model. Owns the scan matrices, so one pipeline
/// serves one thread.
pub struct Pipeline<'a> {
    model: &'a CovarianceModel,
    profile: &'a dyn ProfileScorer,
    bands: &'a dyn BandProvider,
    config: PipelineConfig,
    engine: ScanEngine,
    filter_chain: Vec<BandRequest>,
    final_chain: Vec<BandRequest>,
}

impl<'a> Pipeline<'a> {
    /// Validate `config` against the model and band provider and set up the
    /// scan engine. Nothing is scanned here.
    pub fn new(
        model: &'a CovarianceModel,
        profile: &'a dyn ProfileScorer,
        bands: &'a dyn BandProvider,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate(model, bands)?;
        if profile.is_empty() && config.filters.any_profile_filter() {
            return Err(ConfigError::Unsupported(format!(
                "profile '{}' is empty but profile filters are on",
                profile.name()
            )));
        }
        debug!(
            "pipeline for '{}': W = {}, final = {}, truncation = {:?}",
            model.name, model.max_width, config.final_algorithm, config.truncation
        );
        Ok(Self {
            model,
            profile,
            bands,
            filter_chain: config.filter_chain(),
            final_chain: config.final_chain(),
            engine: ScanEngine::new(config.mxsize_mb),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &CovarianceModel {
        self.model
    }

    /// Search one target. Hits go to `sink`; the counters of this target are
    /// returned for the caller to merge.
    pub fn search_sequence(
        &mut self,
        seq: &DigitalSeq,
        sink: &mut dyn HitSink,
    ) -> Result<PipelineStats, PipelineError> {
        let mut stats = PipelineStats::new();
        stats.nseqs = 1;
        stats.nres = seq.len() as u64;

        let w = self.model.max_width;
        let profile_stages = ProfileStages {
            profile: self.profile,
            config: &self.config,
            w,
        };
        let cm = CmStages {
            model: self.model,
            bands: self.bands,
            config: &self.config,
            filter_chain: &self.filter_chain,
            final_chain: &self.final_chain,
        };
        let cutoffs = cm.cutoffs(seq.len());
        let truncation = if self.config.use_cm {
            self.config.truncation
        } else {
            TruncationMode::Off
        };

        let mut hits: Vec<Hit> = Vec::new();
        for plan in plan_passes(seq, w, truncation) {
            if plan.pass != PassKind::Standard
                && self.config.filters.any_profile_filter()
                && stats.pass(PassKind::Standard).stage2_survivors() == 0
            {
                debug!("{}: no standard-pass survivors, skipping truncated passes", seq.name);
                break;
            }
            let pstats = stats.pass_mut(plan.pass);
            pstats.runs += 1;
            pstats.searched += plan.region.len() as u64;

            if !self.config.use_cm {
                let Some(domains) = profile_stages.scored_domains(&plan.seq, plan.region, plan.pass, pstats) else {
                    continue;
                };
                if self.config.stop_after.is_none() {
                    let reporter = ProfileHits {
                        model: self.model,
                        config: &self.config,
                    };
                    reporter.report(&plan.seq, &domains, plan.pass, &cutoffs.space, &mut hits);
                }
                continue;
            }

            let envelopes = match profile_stages.run(&plan.seq, plan.region, plan.pass, pstats) {
                Filtered::Envelopes(envs) => envs,
                Filtered::Stopped => continue,
            };
            let envelopes =
                cm.cyk_filter(&mut self.engine, &plan.seq, plan.region, envelopes, plan.pass, &cutoffs, pstats)?;
            if self.config.stop_after == Some(Stage::Cyk) {
                continue;
            }
            cm.final_scan(&mut self.engine, &plan.seq, &envelopes, plan.pass, &cutoffs, pstats, &mut hits)?;
        }

        if self.config.remove_overlaps {
            hits = remove_overlaps(hits);
        }
        for hit in hits {
            stats.pass_mut(hit.pass).hits += 1;
            sink.push(hit);
        }
        info!(
            "{}: {} residues, {} hits ({} band fallbacks)",
            seq.name,
            seq.len(),
            stats.hits(),
            stats.total().band_fallbacks
        );
        Ok(stats)
    }

    /// Search every target in turn and return the merged counters.
    pub fn search_all<'s, I>(&mut self, seqs: I, sink: &mut dyn HitSink) -> anyhow::Result<PipelineStats>
    where
        I: IntoIterator<Item = &'s DigitalSeq>,
    {
        let mut total = PipelineStats::new();
        for seq in seqs {
            let stats = self
                .search_sequence(seq, sink)
                .with_context(|| format!("failed to search '{}' with model '{}'", seq.name, self.model.name))?;
            total.merge(&stats);
        }
        Ok(total)
    }
}
