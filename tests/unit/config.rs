//! Configuration contract errors, raised by `Pipeline::new` before any scan.

use cmsift::align::bands::StaticBands;
use cmsift::config::{BandStrategy, ModelCutoff, PipelineConfig, Threshold, TruncationMode};
use cmsift::model::{ModelBuilder, StateDef};
use cmsift::pipeline::Pipeline;
use cmsift::profile::{GapScores, PssmProfile};
use cmsift::stats::{BitCutoffs, ModelEvd};
use cmsift::{ConfigError, ScanAlgorithm};

use crate::helpers::{filter_evd, no_bands, pair_scores, toy_builder, toy_model, toy_profile, toy_tail, unfiltered_config};

fn new_err(cm: &cmsift::CovarianceModel, cfg: PipelineConfig) -> ConfigError {
    let profile = toy_profile();
    let bands = no_bands();
    match Pipeline::new(cm, &profile, &bands, cfg) {
        Ok(_) => panic!("configuration was accepted"),
        Err(e) => e,
    }
}

#[test]
fn test_missing_model_cutoff() {
    let cm = toy_model();
    let mut cfg = unfiltered_config(3.0);
    cfg.report = Threshold::Model(ModelCutoff::Ga);
    assert_eq!(
        new_err(&cm, cfg),
        ConfigError::MissingCutoff {
            model: "toy".into(),
            cutoff: "GA"
        }
    );
}

#[test]
fn test_model_cutoff_present() {
    let cm = toy_builder()
        .evd(ModelEvd::uniform(toy_tail()))
        .cutoffs(BitCutoffs {
            ga: Some(5.0),
            tc: None,
            nc: None,
        })
        .build()
        .unwrap();
    let mut cfg = unfiltered_config(3.0);
    cfg.report = Threshold::Model(ModelCutoff::Ga);
    cfg.inclusion = Threshold::Model(ModelCutoff::Ga);
    let profile = toy_profile();
    let bands = no_bands();
    assert!(Pipeline::new(&cm, &profile, &bands, cfg).is_ok());
}

#[test]
fn test_missing_statistics() {
    let cm = toy_builder().build().unwrap();
    assert!(matches!(
        new_err(&cm, unfiltered_config(3.0)),
        ConfigError::MissingStatistics { .. }
    ));
}

#[test]
fn test_threshold_out_of_range() {
    let cm = toy_model();
    let mut cfg = unfiltered_config(3.0);
    cfg.thresholds.f1 = 0.0;
    assert_eq!(new_err(&cm, cfg), ConfigError::Threshold { name: "F1", value: 0.0 });

    let mut cfg = unfiltered_config(3.0);
    cfg.inclusion = Threshold::EValue(-1.0);
    assert!(matches!(new_err(&cm, cfg), ConfigError::Threshold { name: "incE", .. }));

    let mut cfg = unfiltered_config(3.0);
    cfg.search_space_mb = Some(0.0);
    assert!(matches!(new_err(&cm, cfg), ConfigError::Threshold { name: "Z", .. }));
}

#[test]
fn test_inside_without_tables() {
    let cm = toy_builder()
        .evd(ModelEvd::uniform(toy_tail()))
        .without_inside()
        .build()
        .unwrap();
    let mut cfg = unfiltered_config(3.0);
    cfg.final_algorithm = ScanAlgorithm::Inside;
    assert!(matches!(new_err(&cm, cfg), ConfigError::Unsupported(_)));
}

#[test]
fn test_truncation_without_marginals() {
    let cm = ModelBuilder::new("bare")
        .state(StateDef::start(1, vec![0.0]))
        .state(StateDef::pair(2, vec![0.0], pair_scores()))
        .state(StateDef::end())
        .without_marginals()
        .evd(ModelEvd::uniform(toy_tail()))
        .build()
        .unwrap();
    assert!(!cm.has_marginals);
    let cfg = unfiltered_config(3.0);
    assert!(matches!(new_err(&cm, cfg.clone()), ConfigError::Unsupported(_)));

    let mut off = cfg;
    off.truncation = TruncationMode::Off;
    let profile = toy_profile();
    let bands = no_bands();
    assert!(Pipeline::new(&cm, &profile, &bands, off).is_ok());
}

#[test]
fn test_qdb_strategy_without_table() {
    let cm = toy_model();
    let mut cfg = unfiltered_config(3.0);
    cfg.bands.final_strategy = BandStrategy::QueryDependent;
    assert_eq!(new_err(&cm, cfg), ConfigError::MissingBands(1e-15));
}

#[test]
fn test_posterior_strategy_without_provider() {
    let cm = toy_model();
    let mut cfg = unfiltered_config(3.0);
    cfg.bands.final_strategy = BandStrategy::Posterior;
    assert!(matches!(new_err(&cm, cfg), ConfigError::Unsupported(_)));
}

#[test]
fn test_default_config_needs_filter_bands() {
    // Default bands are posterior for the final stage and QDB for the CYK filter.
    let cm = toy_model();
    let profile = toy_profile();
    let bands = StaticBands::new();
    assert!(Pipeline::new(&cm, &profile, &bands, PipelineConfig::default()).is_err());
}

#[test]
fn test_empty_profile_with_filters_on() {
    let cm = toy_model();
    let profile = PssmProfile::new("empty", &[], GapScores::default(), filter_evd());
    let bands = no_bands();
    let mut cfg = unfiltered_config(3.0);
    cfg.filters.vit = true;
    assert!(matches!(
        Pipeline::new(&cm, &profile, &bands, cfg),
        Err(ConfigError::Unsupported(_))
    ));
}

#[test]
fn test_profile_only_skips_model_checks() {
    // No score statistics and no bands: only the profile stages will run.
    let cm = toy_builder().build().unwrap();
    let mut cfg = PipelineConfig::default();
    cfg.use_cm = false;
    cfg.filters.cyk = false;
    let profile = toy_profile();
    let bands = no_bands();
    assert!(Pipeline::new(&cm, &profile, &bands, cfg.clone()).is_ok());

    cfg.use_cm = true;
    assert!(matches!(new_err(&cm, cfg), ConfigError::MissingStatistics { .. }));
}
