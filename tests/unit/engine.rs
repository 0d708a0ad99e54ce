//! Truncated scan engine against hand-computed values and the brute-force
//! reference.

use cmsift::align::bands::{BandMode, BandTable};
use cmsift::align::matrix::ScanMatrix;
use cmsift::align::trunc_scan::{trunc_scan, ScanOutcome, ScanRequest};
use cmsift::common::{PassKind, ScanAlgorithm, TruncMode};
use cmsift::model::{CovarianceModel, IMPOSSIBLE};
use cmsift::sequence::DigitalSeq;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::helpers::{init_logging, seq, toy_builder, toy_model, Reference};

fn scan(cm: &CovarianceModel, s: &DigitalSeq, req: ScanRequest) -> ScanOutcome {
    let table = BandTable::unbanded(cm.len(), cm.max_width);
    let mut mx = ScanMatrix::new(cm, table, req.pass.is_truncated()).unwrap();
    trunc_scan(cm, &mut mx, s, &req).unwrap()
}

fn close(a: f32, b: f32) -> bool {
    a == b || (a - b).abs() < 1e-4
}

#[test]
fn test_toy_standard_best() {
    init_logging();
    let cm = toy_model();
    let s = seq("ACGUACGU");
    let out = scan(&cm, &s, ScanRequest::new(1, 8, ScanAlgorithm::Cyk, PassKind::Standard));
    assert_eq!(out.best_score, 6.5);
    assert_eq!((out.best_start, out.best_end), (1, 4));
    assert_eq!(out.best_mode, TruncMode::Joint);
}

#[test]
fn test_toy_gamma_hits() {
    let cm = toy_model();
    let s = seq("ACGUACGU");
    let req = ScanRequest::new(1, 8, ScanAlgorithm::Cyk, PassKind::Standard).with_hits(0.0, false);
    let spans: Vec<_> = scan(&cm, &s, req).hits.iter().map(|h| (h.start, h.end, h.score)).collect();
    assert_eq!(spans, vec![(1, 4, 6.5), (5, 8, 6.5)]);
}

#[test]
fn test_five_prime_pass_uses_left_marginal() {
    let cm = toy_model();
    let s = seq("ACGU");
    let out = scan(&cm, &s, ScanRequest::new(1, 4, ScanAlgorithm::Cyk, PassKind::FivePrime));
    assert_eq!(out.best_score, 4.5);
    assert_eq!((out.best_start, out.best_end), (1, 3));
    assert_eq!(out.best_mode, TruncMode::Left);
}

#[test]
fn test_three_prime_pass_forces_end() {
    let cm = toy_model();
    let s = seq("CGUA");
    let out = scan(&cm, &s, ScanRequest::new(1, 4, ScanAlgorithm::Cyk, PassKind::ThreePrime));
    assert_eq!(out.best_end, 4);
    let mut reference = Reference::new(&cm, &s);
    assert!(close(out.best_score, reference.best(PassKind::ThreePrime, 1, 4).0));
}

#[test]
fn test_both_termini_needs_whole_range() {
    let cm = toy_model();
    let s = seq("ACGUACGUA");
    // Longer than W: no span can touch both ends.
    let out = scan(&cm, &s, ScanRequest::new(1, 9, ScanAlgorithm::Cyk, PassKind::BothTermini));
    assert_eq!(out.best_score, IMPOSSIBLE);
}

#[test]
fn test_band_excluding_parse_leaves_sentinel() {
    let cm = toy_model();
    let s = seq("ACGU");
    let mut pairs = vec![(0, 8); cm.len()];
    // The pair state may only cover 6..=8 residues.
    pairs[1] = (6, 8);
    let table = BandTable::from_pairs(BandMode::QueryDependent, 1e-9, &pairs);
    let mut mx = ScanMatrix::new(&cm, table, false).unwrap();
    let out = trunc_scan(&cm, &mut mx, &s, &ScanRequest::new(1, 4, ScanAlgorithm::Cyk, PassKind::Standard)).unwrap();
    // Only the delete path remains: -3 + C + G.
    assert_eq!(out.best_score, 1.0);
    assert_eq!((out.best_start, out.best_end), (2, 3));
    assert_eq!(mx.get(cmsift::align::Plane::J, 1, 4, 4), IMPOSSIBLE);
}

#[test]
fn test_envelope_spans_high_roots() {
    let cm = toy_model();
    let s = seq("GGACGUGG");
    let req = ScanRequest::new(1, 8, ScanAlgorithm::Cyk, PassKind::Standard).with_envelope(6.0);
    let out = scan(&cm, &s, req);
    assert_eq!(out.envelope, Some((3, 6)));
}

#[test]
fn test_state_best_reports_every_state() {
    let cm = toy_model();
    let s = seq("ACGU");
    let out = scan(&cm, &s, ScanRequest::new(1, 4, ScanAlgorithm::Cyk, PassKind::Standard).with_state_best());
    let vb = out.state_best.unwrap();
    assert_eq!(vb.len(), cm.len());
    assert_eq!(vb[0], 6.5);
    // BEGL -> ML(C) on the single C.
    assert_eq!(vb[4], 2.0);
}

fn residues() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('A'), Just('C'), Just('G'), Just('U')], 1..=12)
        .prop_map(|v| v.into_iter().collect())
}

fn passes() -> impl Strategy<Value = PassKind> {
    proptest::sample::select(PassKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_engine_matches_reference(text in residues(), pass in passes()) {
        let cm = toy_model();
        let s = seq(&text);
        let n = s.len();
        let out = scan(&cm, &s, ScanRequest::new(1, n, ScanAlgorithm::Cyk, pass));
        let mut reference = Reference::new(&cm, &s);
        let (expected, _, _) = reference.best(pass, 1, n);
        prop_assert!(close(out.best_score, expected), "{} {:?}: engine {} reference {}", text, pass, out.best_score, expected);
    }

    #[test]
    fn prop_engine_matches_reference_with_truncated_entries(text in residues(), pass in passes()) {
        let cm = toy_builder().trunc_penalty(Some(-1.5)).build().unwrap();
        let s = seq(&text);
        let n = s.len();
        let out = scan(&cm, &s, ScanRequest::new(1, n, ScanAlgorithm::Cyk, pass));
        let mut reference = Reference::new(&cm, &s);
        let (expected, _, _) = reference.best(pass, 1, n);
        prop_assert!(close(out.best_score, expected), "{} {:?}: engine {} reference {}", text, pass, out.best_score, expected);
    }

    #[test]
    fn prop_inside_not_below_cyk(text in residues(), pass in passes()) {
        let cm = toy_model();
        let s = seq(&text);
        let n = s.len();
        let cyk = scan(&cm, &s, ScanRequest::new(1, n, ScanAlgorithm::Cyk, pass)).best_score;
        let inside = scan(&cm, &s, ScanRequest::new(1, n, ScanAlgorithm::Inside, pass)).best_score;
        prop_assert!(inside >= cyk - 1e-4, "{}: inside {} < cyk {}", text, inside, cyk);
    }
}

/// Lengths each toy state can span in a standard pass.
const TOY_LENGTHS: [(usize, usize); 10] =
    [(2, 4), (4, 4), (2, 2), (2, 2), (1, 1), (1, 1), (0, 0), (1, 1), (1, 1), (0, 0)];

fn covering_bands() -> impl Strategy<Value = (BandMode, Vec<(usize, usize)>)> {
    let mode = prop_oneof![Just(BandMode::QueryDependent), Just(BandMode::Posterior)];
    let slack = proptest::collection::vec((0usize..=2, 0usize..=4), TOY_LENGTHS.len());
    (mode, slack).prop_map(|(mode, slack)| {
        let pairs = TOY_LENGTHS
            .iter()
            .zip(slack)
            .map(|(&(lo, hi), (a, b))| (lo.saturating_sub(a), (hi + b).min(8)))
            .collect();
        (mode, pairs)
    })
}

fn algorithms() -> impl Strategy<Value = ScanAlgorithm> {
    prop_oneof![Just(ScanAlgorithm::Cyk), Just(ScanAlgorithm::Inside)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_inside_matches_reference(text in residues(), pass in passes()) {
        let cm = toy_model();
        let s = seq(&text);
        let n = s.len();
        let out = scan(&cm, &s, ScanRequest::new(1, n, ScanAlgorithm::Inside, pass));
        let mut reference = Reference::inside(&cm, &s);
        let (expected, _, _) = reference.best(pass, 1, n);
        prop_assert!(close(out.best_score, expected), "{} {:?}: engine {} reference {}", text, pass, out.best_score, expected);
    }

    #[test]
    fn prop_inside_matches_reference_with_truncated_entries(text in residues(), pass in passes()) {
        let cm = toy_builder().trunc_penalty(Some(-1.5)).build().unwrap();
        let s = seq(&text);
        let n = s.len();
        let out = scan(&cm, &s, ScanRequest::new(1, n, ScanAlgorithm::Inside, pass));
        let mut reference = Reference::inside(&cm, &s);
        let (expected, _, _) = reference.best(pass, 1, n);
        prop_assert!(close(out.best_score, expected), "{} {:?}: engine {} reference {}", text, pass, out.best_score, expected);
    }

    #[test]
    fn prop_covering_bands_match_unbanded(text in residues(), (mode, pairs) in covering_bands(), algorithm in algorithms()) {
        let cm = toy_model();
        let s = seq(&text);
        let n = s.len();
        let req = ScanRequest::new(1, n, algorithm, PassKind::Standard).with_hits(0.0, false);
        let full = scan(&cm, &s, req);
        let table = BandTable::from_pairs(mode, 1e-7, &pairs);
        let mut mx = ScanMatrix::new(&cm, table, false).unwrap();
        let banded = trunc_scan(&cm, &mut mx, &s, &req).unwrap();
        prop_assert!(close(banded.best_score, full.best_score), "{} {:?}: banded {} unbanded {}", text, pairs, banded.best_score, full.best_score);
        prop_assert_eq!(
            (banded.best_start, banded.best_end),
            (full.best_start, full.best_end)
        );
        let spans = |o: &ScanOutcome| o.hits.iter().map(|h| (h.start, h.end)).collect::<Vec<_>>();
        prop_assert_eq!(spans(&banded), spans(&full));
    }
}
