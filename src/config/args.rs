use clap::Args;

use super::{BandStrategy, FilterPreset, ModelCutoff, PipelineConfig, Threshold, TruncationMode};
use crate::common::ScanAlgorithm;
use crate::error::ConfigError;

/// Command-line search options. Options left unset keep the preset's value.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Turn off every filter.
    #[arg(long, default_value_t = false, conflicts_with_all = ["mid", "rfam"])]
    pub max: bool,
    #[arg(long, default_value_t = false, conflicts_with = "rfam")]
    pub mid: bool,
    /// Strict filter thresholds for large searches.
    #[arg(long, default_value_t = false)]
    pub rfam: bool,
    /// Report hits with E-value at or below this.
    #[arg(short = 'E', long)]
    pub evalue: Option<f64>,
    /// Report hits with bit score at or above this.
    #[arg(short = 'T', long)]
    pub bitscore: Option<f32>,
    /// Include hits with E-value at or below this.
    #[arg(long = "incE")]
    pub inc_evalue: Option<f64>,
    #[arg(long = "incT")]
    pub inc_bitscore: Option<f32>,
    /// Use the model's gathering cutoff for reporting and inclusion.
    #[arg(long = "cut_ga", default_value_t = false, conflicts_with_all = ["cut_tc", "cut_nc"])]
    pub cut_ga: bool,
    #[arg(long = "cut_tc", default_value_t = false, conflicts_with = "cut_nc")]
    pub cut_tc: bool,
    #[arg(long = "cut_nc", default_value_t = false)]
    pub cut_nc: bool,
    /// Search space size in millions of residues.
    #[arg(short = 'Z')]
    pub search_space: Option<f64>,

    #[arg(long = "F1")]
    pub f1: Option<f64>,
    #[arg(long = "F2")]
    pub f2: Option<f64>,
    #[arg(long = "F3")]
    pub f3: Option<f64>,
    #[arg(long = "dF3")]
    pub df3: Option<f64>,
    #[arg(long = "F4")]
    pub f4: Option<f64>,
    #[arg(long = "E4")]
    pub e4: Option<f64>,
    #[arg(long = "F6")]
    pub f6: Option<f64>,

    #[arg(long = "noF1", default_value_t = false)]
    pub no_f1: bool,
    #[arg(long = "noF2", default_value_t = false)]
    pub no_f2: bool,
    #[arg(long = "noF3", default_value_t = false)]
    pub no_f3: bool,
    /// Skip envelope definition; windows become envelopes.
    #[arg(long = "nohmmenv", default_value_t = false)]
    pub no_envelope: bool,
    #[arg(long = "noF4", default_value_t = false)]
    pub no_f4: bool,
    #[arg(long = "nobias", default_value_t = false)]
    pub no_bias: bool,
    /// Turn on the composition bias filter after stage 1.
    #[arg(long = "doF1b", default_value_t = false)]
    pub do_f1_bias: bool,
    #[arg(long = "nocykenv", default_value_t = false)]
    pub no_cyk_envelope: bool,

    /// Report profile envelope domains; skip the covariance model stages.
    #[arg(long, default_value_t = false, conflicts_with = "nohmm")]
    pub hmm: bool,
    /// Turn off every profile filter stage.
    #[arg(long, default_value_t = false)]
    pub nohmm: bool,
    /// Keep final scores free of the composition correction.
    #[arg(long, default_value_t = false)]
    pub nonull3: bool,

    /// Score the final stage with CYK instead of Inside.
    #[arg(long, default_value_t = false)]
    pub cyk: bool,
    /// Search for full-length alignments only.
    #[arg(long, default_value_t = false, conflicts_with = "anytrunc")]
    pub notrunc: bool,
    /// Allow truncated alignments to start and end anywhere.
    #[arg(long, default_value_t = false)]
    pub anytrunc: bool,
    /// Scan every stage without bands.
    #[arg(long, default_value_t = false)]
    pub nonbanded: bool,
    /// Band strategy for the CYK filter: posterior, qdb or unbanded.
    #[arg(long = "fbands")]
    pub filter_bands: Option<String>,
    /// Band strategy for the final stage.
    #[arg(long = "bands")]
    pub final_bands: Option<String>,
    #[arg(long)]
    pub beta: Option<f64>,
    #[arg(long)]
    pub fbeta: Option<f64>,
    #[arg(long)]
    pub tau: Option<f64>,
    #[arg(long)]
    pub ftau: Option<f64>,
    /// Memory ceiling for a posterior-banded matrix, MB.
    #[arg(long)]
    pub mxsize: Option<f64>,
    #[arg(long)]
    pub wmult: Option<f64>,
    #[arg(long = "nosplit", default_value_t = false)]
    pub no_split: bool,
    #[arg(long = "nopad", default_value_t = false)]
    pub no_pad: bool,
    /// Resolve overlapping hits greedily.
    #[arg(long, default_value_t = false)]
    pub greedy: bool,
    /// Keep hits that overlap a better hit.
    #[arg(long = "keep-overlaps", default_value_t = false)]
    pub keep_overlaps: bool,
    /// Stop after this stage: ungapped, viterbi, forward, envelope or cyk.
    #[arg(long = "stop-after")]
    pub stop_after: Option<String>,
}

impl SearchArgs {
    fn preset(&self) -> FilterPreset {
        if self.max {
            FilterPreset::Max
        } else if self.mid {
            FilterPreset::Mid
        } else if self.rfam {
            FilterPreset::Fast
        } else {
            FilterPreset::Default
        }
    }

    fn model_cutoff(&self) -> Option<ModelCutoff> {
        if self.cut_ga {
            Some(ModelCutoff::Ga)
        } else if self.cut_tc {
            Some(ModelCutoff::Tc)
        } else if self.cut_nc {
            Some(ModelCutoff::Nc)
        } else {
            None
        }
    }
}

impl TryFrom<&SearchArgs> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(args: &SearchArgs) -> Result<Self, Self::Error> {
        let mut cfg = PipelineConfig::preset(args.preset());

        if let Some(cut) = args.model_cutoff() {
            cfg.report = Threshold::Model(cut);
            cfg.inclusion = Threshold::Model(cut);
        }
        if let Some(e) = args.evalue {
            cfg.report = Threshold::EValue(e);
        }
        if let Some(t) = args.bitscore {
            cfg.report = Threshold::BitScore(t);
        }
        if let Some(e) = args.inc_evalue {
            cfg.inclusion = Threshold::EValue(e);
        }
        if let Some(t) = args.inc_bitscore {
            cfg.inclusion = Threshold::BitScore(t);
        }
        cfg.search_space_mb = args.search_space.or(cfg.search_space_mb);

        let t = &mut cfg.thresholds;
        t.f1 = args.f1.unwrap_or(t.f1);
        t.f2 = args.f2.unwrap_or(t.f2);
        t.f3 = args.f3.unwrap_or(t.f3);
        t.df3 = args.df3.unwrap_or(t.df3);
        t.f4 = args.f4.unwrap_or(t.f4);
        t.e4 = args.e4.or(t.e4);
        t.f6 = args.f6.unwrap_or(t.f6);

        let f = &mut cfg.filters;
        f.msv &= !args.no_f1;
        f.vit &= !args.no_f2;
        f.fwd &= !args.no_f3;
        f.envelope &= !args.no_envelope;
        f.cyk &= !args.no_f4;
        f.redefine_envelope &= !args.no_cyk_envelope;
        if args.nohmm {
            f.disable_profile();
        }
        if args.hmm {
            cfg.use_cm = false;
            f.cyk = false;
        }
        if args.no_bias {
            f.msv_bias = false;
            f.vit_bias = false;
            f.fwd_bias = false;
            f.dom_bias = false;
        } else if args.do_f1_bias {
            f.msv_bias = true;
        }

        if args.cyk {
            cfg.final_algorithm = ScanAlgorithm::Cyk;
        }
        if args.notrunc {
            cfg.truncation = TruncationMode::Off;
        } else if args.anytrunc {
            cfg.truncation = TruncationMode::Anywhere;
        }
        let b = &mut cfg.bands;
        if args.nonbanded {
            b.filter_strategy = BandStrategy::Unbanded;
            b.final_strategy = BandStrategy::Unbanded;
        }
        if let Some(s) = &args.filter_bands {
            b.filter_strategy = s.parse()?;
        }
        if let Some(s) = &args.final_bands {
            b.final_strategy = s.parse()?;
        }
        b.beta = args.beta.unwrap_or(b.beta);
        b.fbeta = args.fbeta.unwrap_or(b.fbeta);
        b.tau = args.tau.unwrap_or(b.tau);
        b.ftau = args.ftau.unwrap_or(b.ftau);

        cfg.mxsize_mb = args.mxsize.unwrap_or(cfg.mxsize_mb);
        cfg.wmult = args.wmult.unwrap_or(cfg.wmult);
        cfg.split_windows &= !args.no_split;
        cfg.pad_envelopes &= !args.no_pad;
        cfg.greedy = args.greedy;
        cfg.remove_overlaps = !args.keep_overlaps;
        cfg.null3 = !args.nonull3;
        if let Some(stage) = &args.stop_after {
            cfg.stop_after = Some(stage.parse()?);
        }
        Ok(cfg)
    }
}
