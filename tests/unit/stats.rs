//! Score distributions and search-space scaling.

use cmsift::stats::{null3_correction, CmTail, ExpTail, Gumbel, ModelEvd, SearchSpace, NULL3_OMEGA};
use cmsift::ScanAlgorithm;
use proptest::prelude::*;

use crate::helpers::toy_tail;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn gumbel_threshold_roundtrip(p in 1e-12f64..0.9, mu in -5.0f64..5.0, lambda in 0.3f64..2.0) {
        let g = Gumbel { mu, lambda };
        let x = g.score_for_pvalue(p);
        prop_assert!(close(g.pvalue(x), p), "p={} back={}", p, g.pvalue(x));
    }

    #[test]
    fn exp_tail_pvalue_is_monotone(a in -10.0f64..40.0, b in -10.0f64..40.0) {
        let t = ExpTail { mu: 1.0, lambda: 0.69 };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(t.pvalue(lo) >= t.pvalue(hi));
        prop_assert!(t.pvalue(lo) <= 1.0);
    }
}

#[test]
fn test_evalue_scales_with_search_space() {
    let tail = toy_tail();
    let small = SearchSpace::from_target(1_000);
    let large = SearchSpace::from_mb(1.0);
    let score = 12.0;
    let ratio = tail.evalue(score, &large) / tail.evalue(score, &small);
    assert!(close(ratio, 1_000.0), "ratio {ratio}");
    assert!(close(tail.evalue(score, &large), tail.pvalue(score) * 1_000_000.0));
}

#[test]
fn test_report_threshold_rises_with_search_space() {
    let tail = CmTail {
        mu_extrap: -1.0,
        lambda: 0.7,
        dbsize: 2_000_000.0,
        nrandhits: 20.0,
    };
    let t_small = tail.score_for_evalue(0.01, &SearchSpace::from_mb(1.0));
    let t_large = tail.score_for_evalue(0.01, &SearchSpace::from_mb(100.0));
    assert!(t_large > t_small);
    assert!(close(tail.evalue(t_large, &SearchSpace::from_mb(100.0)), 0.01));
}

#[test]
fn test_model_evd_tail_selection() {
    let local = CmTail { lambda: 0.5, ..toy_tail() };
    let evd = ModelEvd {
        cyk_local: Some(local),
        inside_glocal: Some(toy_tail()),
        ..ModelEvd::default()
    };
    assert_eq!(evd.tail(ScanAlgorithm::Cyk, true), Some(&local));
    assert!(evd.tail(ScanAlgorithm::Cyk, false).is_none());
    assert_eq!(evd.tail(ScanAlgorithm::Inside, false), Some(&toy_tail()));
    assert!(evd.tail(ScanAlgorithm::Inside, true).is_none());
}

#[test]
fn test_null3_penalizes_low_complexity() {
    let poly_a = vec![0u8; 40];
    // 40 * log2(1 / 0.25) = 80 bits of composition, less 16 for omega.
    assert!((null3_correction(&poly_a, NULL3_OMEGA) - 64.0).abs() < 1e-3);

    let uniform: Vec<u8> = (0..40).map(|k| (k % 4) as u8).collect();
    let flat = null3_correction(&uniform, NULL3_OMEGA);
    assert!(flat > 0.0 && flat < 1e-4, "{}", flat);
}

#[test]
fn test_null3_grows_with_skew() {
    let skewed = null3_correction(&[0, 0, 2, 3], NULL3_OMEGA);
    let balanced = null3_correction(&[0, 1, 2, 3], NULL3_OMEGA);
    assert!(skewed > balanced);
}

#[test]
fn test_profile_windows_scale_with_width() {
    let space = SearchSpace::from_mb(1.0);
    assert_eq!(space.windows(100), 10_000.0);
    assert_eq!(SearchSpace::from_target(5).windows(100), 1.0);
}
