//! Pipeline configuration.
//!
//! Defaults reproduce the standard filter settings: F1 0.35, F2 0.10,
//! F3 0.02, dF3 0.01, F4 5e-4, E 10, incE 0.01.

pub mod args;
pub mod modes;

pub use args::SearchArgs;
pub use modes::{BandStrategy, FilterPreset, ModelCutoff, Stage, TruncationMode};

use crate::align::bands::BandProvider;
use crate::align::engine::BandRequest;
use crate::common::ScanAlgorithm;
use crate::error::ConfigError;
use crate::model::CovarianceModel;

/// On/off switch of every filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSwitches {
    /// Stage 1 ungapped filter.
    pub msv: bool,
    pub msv_bias: bool,
    /// Stage 2 Viterbi filter.
    pub vit: bool,
    pub vit_bias: bool,
    /// Stage 2 Forward filter.
    pub fwd: bool,
    pub fwd_bias: bool,
    /// Stage 3 envelope definition.
    pub envelope: bool,
    pub dom_bias: bool,
    /// Stage 4 CYK filter.
    pub cyk: bool,
    /// Narrow envelopes to the span of CYK root scores above the F6 score.
    pub redefine_envelope: bool,
}

impl Default for StageSwitches {
    fn default() -> Self {
        Self {
            msv: true,
            msv_bias: false,
            vit: true,
            vit_bias: true,
            fwd: true,
            fwd_bias: true,
            envelope: true,
            dom_bias: true,
            cyk: true,
            redefine_envelope: true,
        }
    }
}

impl StageSwitches {
    /// True if any of stages 1-3 can reject a window.
    pub fn any_profile_filter(&self) -> bool {
        self.msv || self.vit || self.fwd || self.envelope
    }

    /// Turn off stages 1-3 and their bias filters.
    pub fn disable_profile(&mut self) {
        self.msv = false;
        self.msv_bias = false;
        self.vit = false;
        self.vit_bias = false;
        self.fwd = false;
        self.fwd_bias = false;
        self.envelope = false;
        self.dom_bias = false;
    }
}

/// P-value thresholds of the filter stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    /// Envelope score threshold.
    pub df3: f64,
    /// CYK filter P-value threshold.
    pub f4: f64,
    /// CYK filter E-value threshold; replaces `f4` when set.
    pub e4: Option<f64>,
    /// P-value whose score bounds a redefined envelope.
    pub f6: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            f1: 0.35,
            f2: 0.10,
            f3: 0.02,
            df3: 0.01,
            f4: 5e-4,
            e4: None,
            f6: 1e-4,
        }
    }
}

/// Band tail parameters and preferred band sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandConfig {
    /// Query-dependent band tail loss for the CYK filter.
    pub fbeta: f64,
    /// Query-dependent band tail loss for the final stage.
    pub beta: f64,
    /// Posterior band tail loss for the CYK filter.
    pub ftau: f64,
    /// Posterior band tail loss for the final stage.
    pub tau: f64,
    pub filter_strategy: BandStrategy,
    pub final_strategy: BandStrategy,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            fbeta: 1e-9,
            beta: 1e-15,
            ftau: 5e-6,
            tau: 5e-7,
            filter_strategy: BandStrategy::QueryDependent,
            final_strategy: BandStrategy::Posterior,
        }
    }
}

/// Source of the reporting or inclusion threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    EValue(f64),
    BitScore(f32),
    Model(ModelCutoff),
}

impl Threshold {
    /// True if a hit scoring `score` bits with `evalue` meets the threshold.
    /// A missing model cutoff accepts nothing.
    pub fn accepts(self, model: &CovarianceModel, score: f32, evalue: f64) -> bool {
        match self {
            Threshold::EValue(e) => evalue <= e,
            Threshold::BitScore(t) => score >= t,
            Threshold::Model(cut) => model_cutoff(model, cut).is_some_and(|t| score >= t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub filters: StageSwitches,
    pub thresholds: Thresholds,
    pub bands: BandConfig,
    pub final_algorithm: ScanAlgorithm,
    pub report: Threshold,
    pub inclusion: Threshold,
    pub truncation: TruncationMode,
    /// Search space in millions of residues; defaults to each target's
    /// length.
    pub search_space_mb: Option<f64>,
    /// Memory ceiling for posterior-banded matrices.
    pub mxsize_mb: f64,
    /// Windows longer than `wmult * W` are re-tiled.
    pub wmult: f64,
    pub split_windows: bool,
    pub pad_envelopes: bool,
    /// Resolve overlapping hits greedily instead of by the gamma parse.
    pub greedy: bool,
    /// Remove hits that overlap a better one after all passes.
    pub remove_overlaps: bool,
    /// Stop after this stage and report nothing.
    pub stop_after: Option<Stage>,
    /// Subtract the composition correction from final hit scores.
    pub null3: bool,
    /// Run the covariance model stages. Off, envelope domains are reported
    /// as profile hits from the standard pass.
    pub use_cm: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filters: StageSwitches::default(),
            thresholds: Thresholds::default(),
            bands: BandConfig::default(),
            final_algorithm: ScanAlgorithm::Inside,
            report: Threshold::EValue(10.0),
            inclusion: Threshold::EValue(0.01),
            truncation: TruncationMode::Termini,
            search_space_mb: None,
            mxsize_mb: 1024.0,
            wmult: 3.0,
            split_windows: true,
            pad_envelopes: true,
            greedy: false,
            remove_overlaps: true,
            stop_after: None,
            null3: true,
            use_cm: true,
        }
    }
}

impl PipelineConfig {
    pub fn preset(preset: FilterPreset) -> Self {
        let mut cfg = Self::default();
        cfg.apply_preset(preset);
        cfg
    }

    pub fn apply_preset(&mut self, preset: FilterPreset) {
        let t = &mut self.thresholds;
        let f = &mut self.filters;
        match preset {
            FilterPreset::Max => {
                f.disable_profile();
                f.cyk = false;
                f.redefine_envelope = false;
                t.f1 = 1.0;
                t.f2 = 1.0;
                t.f3 = 1.0;
                t.df3 = 1.0;
                t.f4 = 1.0;
            }
            FilterPreset::Mid => {
                f.msv = false;
                f.msv_bias = false;
                f.vit_bias = false;
                f.fwd_bias = false;
                f.dom_bias = false;
                t.f2 = 0.1;
                t.f3 = 0.05;
                t.df3 = 0.1;
                t.f4 = 0.001;
            }
            FilterPreset::Default => {
                *t = Thresholds::default();
                *f = StageSwitches::default();
            }
            FilterPreset::Fast => {
                t.f1 = 0.02;
                t.f2 = 0.001;
                t.f3 = 1e-5;
                t.df3 = 1e-4;
            }
        }
    }

    /// Band chain for the CYK filter stage.
    pub fn filter_chain(&self) -> Vec<BandRequest> {
        chain(self.bands.filter_strategy, self.bands.ftau, self.bands.fbeta)
    }

    /// Band chain for the final stage.
    pub fn final_chain(&self) -> Vec<BandRequest> {
        chain(self.bands.final_strategy, self.bands.tau, self.bands.beta)
    }

    /// Check the configuration against a model and band provider. Every
    /// contract violation is reported here, before any scanning.
    pub fn validate(&self, model: &CovarianceModel, bands: &dyn BandProvider) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("F1", t.f1),
            ("F2", t.f2),
            ("F3", t.f3),
            ("dF3", t.df3),
            ("F4", t.f4),
            ("F6", t.f6),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Threshold { name, value });
            }
        }
        if let Some(e4) = t.e4 {
            if !(e4 > 0.0) {
                return Err(ConfigError::Threshold { name: "E4", value: e4 });
            }
        }
        for (name, threshold) in [("E", self.report), ("incE", self.inclusion)] {
            if let Threshold::EValue(e) = threshold {
                if !(e > 0.0) {
                    return Err(ConfigError::Threshold { name, value: e });
                }
            }
        }
        if !(self.wmult >= 1.0) {
            return Err(ConfigError::Threshold {
                name: "wmult",
                value: self.wmult,
            });
        }
        if let Some(z) = self.search_space_mb {
            if !(z > 0.0) {
                return Err(ConfigError::Threshold { name: "Z", value: z });
            }
        }

        for threshold in [self.report, self.inclusion] {
            if let Threshold::Model(cut) = threshold {
                if model_cutoff(model, cut).is_none() {
                    return Err(ConfigError::MissingCutoff {
                        model: model.name.clone(),
                        cutoff: cut.label(),
                    });
                }
            }
        }

        if !self.use_cm {
            if !self.filters.envelope {
                return Err(ConfigError::Unsupported(
                    "profile-only search reports envelope domains; envelope definition must be on".to_string(),
                ));
            }
            return Ok(());
        }

        let local = model.is_local();
        let needs_final_tail = matches!(self.report, Threshold::EValue(_))
            || matches!(self.inclusion, Threshold::EValue(_))
            || self.stop_after.is_none();
        if needs_final_tail && model.evd.tail(self.final_algorithm, local).is_none() {
            return Err(ConfigError::MissingStatistics {
                model: model.name.clone(),
                mode: format!("{} {}", self.final_algorithm, if local { "local" } else { "glocal" }),
            });
        }
        if (self.filters.cyk || self.filters.redefine_envelope)
            && model.evd.tail(ScanAlgorithm::Cyk, local).is_none()
        {
            return Err(ConfigError::MissingStatistics {
                model: model.name.clone(),
                mode: format!("cyk {}", if local { "local" } else { "glocal" }),
            });
        }

        if self.final_algorithm == ScanAlgorithm::Inside && !model.supports_inside {
            return Err(ConfigError::Unsupported(format!(
                "model '{}' cannot be scored with Inside",
                model.name
            )));
        }
        if self.truncation != TruncationMode::Off && !model.has_marginals {
            return Err(ConfigError::Unsupported(format!(
                "model '{}' has no marginal tables; truncated passes need them",
                model.name
            )));
        }

        let mut chains = self.final_chain();
        if self.filters.cyk {
            chains.extend(self.filter_chain());
        }
        for req in chains {
            match req.mode {
                crate::align::bands::BandMode::QueryDependent => {
                    if bands.query_dependent(req.tail).is_none() {
                        return Err(ConfigError::MissingBands(req.tail));
                    }
                }
                crate::align::bands::BandMode::Posterior => {
                    if !bands.has_posterior() {
                        return Err(ConfigError::Unsupported(
                            "band provider cannot compute posterior bands".to_string(),
                        ));
                    }
                }
                crate::align::bands::BandMode::Unbanded => {}
            }
        }
        Ok(())
    }
}

/// Bit score cutoff `cut` of `model`, if it has one.
pub fn model_cutoff(model: &CovarianceModel, cut: ModelCutoff) -> Option<f32> {
    match cut {
        ModelCutoff::Ga => model.cutoffs.ga,
        ModelCutoff::Tc => model.cutoffs.tc,
        ModelCutoff::Nc => model.cutoffs.nc,
    }
}

fn chain(strategy: BandStrategy, tau: f64, beta: f64) -> Vec<BandRequest> {
    match strategy {
        BandStrategy::Posterior => vec![
            BandRequest::posterior(tau),
            BandRequest::query_dependent(beta),
            BandRequest::unbanded(),
        ],
        BandStrategy::QueryDependent => {
            vec![BandRequest::query_dependent(beta), BandRequest::unbanded()]
        }
        BandStrategy::Unbanded => vec![BandRequest::unbanded()],
    }
}
