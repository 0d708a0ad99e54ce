//! Model assembly and validation.

use cmsift::model::{Children, ModelBuilder, StateDef, StateType};
use cmsift::sequence::{DEGENERATE, KP};
use cmsift::ModelError;
use pretty_assertions::assert_eq;

use crate::helpers::{pair_scores, single_scores, toy_builder, toy_model};

fn start_end() -> [StateDef; 2] {
    [StateDef::start(1, vec![0.0]), StateDef::end()]
}

#[test]
fn test_toy_model_shape() {
    let cm = toy_model();
    assert_eq!(cm.len(), 10);
    assert_eq!(cm.clen, 4);
    assert_eq!(cm.max_width, 8);
    assert!(cm.has_marginals);
    assert!(!cm.is_local());
    assert_eq!(cm.state(3).children, Children::Split { left: 4, right: 7 });
    let entries: Vec<usize> = (0..cm.len()).filter(|&v| cm.is_truncated_entry(v)).collect();
    assert_eq!(entries, vec![1, 3, 5, 8]);
}

#[test]
fn test_empty_and_bad_root() {
    assert_eq!(ModelBuilder::new("e").build().unwrap_err(), ModelError::Empty);
    let err = ModelBuilder::new("r")
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::BadRoot(StateType::End));
}

#[test]
fn test_zero_width_rejected() {
    let err = ModelBuilder::new("w")
        .states(start_end())
        .max_width(0)
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::ZeroWidth);
}

#[test]
fn test_child_out_of_range() {
    let err = ModelBuilder::new("o")
        .state(StateDef::start(1, vec![0.0, 0.0]))
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::ChildOutOfRange { state: 0, child: 2, m: 2 });
}

#[test]
fn test_transition_count_must_match_children() {
    let mut def = StateDef::start(1, vec![0.0]);
    def.tsc.push(-1.0);
    let err = ModelBuilder::new("t")
        .state(def)
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::TransitionCount {
            state: 0,
            expected: 1,
            got: 2
        }
    );
}

#[test]
fn test_emission_table_size_checked() {
    let err = ModelBuilder::new("s")
        .state(StateDef::start(1, vec![0.0]))
        .state(StateDef::left(2, vec![0.0], vec![0.0; 3]))
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::EmissionSize {
            state: 1,
            expected: KP,
            got: 3
        }
    );

    // Marginals belong to pair states only.
    let err = ModelBuilder::new("m")
        .state(StateDef::start(1, vec![0.0]))
        .state(StateDef::left(2, vec![0.0], single_scores(0)).with_marginals(vec![0.0; 4], vec![0.0; 4]))
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert!(matches!(err, ModelError::EmissionSize { state: 1, .. }));
}

#[test]
fn test_bif_left_start_only_under_bifurcation() {
    let err = ModelBuilder::new("l")
        .state(StateDef::start(1, vec![0.0]))
        .state(StateDef::bif_left_start(2, vec![0.0]))
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert!(matches!(err, ModelError::Topology { state: 0, .. }));
}

#[test]
fn test_end_state_takes_no_children() {
    let mut end = StateDef::end();
    end.children = Children::Run { first: 2, count: 1 };
    let err = ModelBuilder::new("x")
        .state(StateDef::start(1, vec![0.0]))
        .state(end)
        .state(StateDef::end())
        .build()
        .unwrap_err();
    assert!(matches!(err, ModelError::Topology { state: 1, .. }));
}

#[test]
fn test_local_begin_marks_model_local() {
    let states = [
        StateDef::start(1, vec![0.0]),
        StateDef::pair(2, vec![0.0], pair_scores()).with_begin(-1.0).with_end(-4.0),
        StateDef::end(),
    ];
    let cm = ModelBuilder::new("local").states(states).el_self_sc(-0.5).build().unwrap();
    assert!(cm.is_local());
    assert_eq!(cm.state(1).begin_sc, -1.0);
    assert_eq!(cm.end_init(1, 2), -5.0);
    assert_eq!(cm.end_init(0, 2), f32::NEG_INFINITY);
}

#[test]
fn test_degenerate_pair_scores_derived() {
    let cm = toy_model();
    let mp = cm.state(1);
    // Row A against N: background mean of 2^{3,-2,-2,-2}.
    let expected = (0.25f32 * (8.0 + 3.0 * 0.25)).log2();
    assert!((mp.pair(0, DEGENERATE) - expected).abs() < 1e-6);
    // Explicit marginals are kept as given.
    assert_eq!(mp.left_marginal(0), 1.0);
    assert_eq!(mp.right_marginal(3), 1.0);
}

#[test]
fn test_default_trunc_penalty() {
    let cm = toy_builder().default_trunc_penalty().build().unwrap();
    let expected = (1.0f32 / 10.0).log2();
    let got = cm.trunc_penalty.unwrap();
    assert!((got - expected).abs() < 1e-6, "{got} vs {expected}");
}
