//! Window merging, tiling and envelope padding.

use cmsift::post::windows::{covered_residues, expand_seed, merge, pad_envelope, split_long, tile, Window};
use proptest::prelude::*;

/// Windows of 0 to 30 residues; a zero-length one has `end = start - 1`.
fn arb_windows() -> impl Strategy<Value = Vec<Window>> {
    proptest::collection::vec((1usize..200, 0usize..=30), 0..20)
        .prop_map(|v| v.into_iter().map(|(s, len)| Window::new(s, s + len - 1)).collect())
}

fn coverage(windows: &[Window]) -> Vec<usize> {
    let mut pos: Vec<usize> = windows.iter().flat_map(|w| w.start..=w.end).collect();
    pos.sort_unstable();
    pos.dedup();
    pos
}

proptest! {
    #[test]
    fn merge_is_sorted_disjoint_and_idempotent(ws in arb_windows()) {
        let merged = merge(ws.clone());
        for pair in merged.windows(2) {
            // Neither overlapping nor touching.
            prop_assert!(pair[0].end + 1 < pair[1].start, "{:?}", pair);
        }
        prop_assert_eq!(coverage(&merged), coverage(&ws));
        prop_assert_eq!(merge(merged.clone()), merged.clone());
        prop_assert_eq!(covered_residues(&ws), coverage(&ws).len() as u64);
        prop_assert!(merged.iter().all(|w| !w.is_empty()));
    }

    #[test]
    fn tile_holds_every_short_span(lo in 1usize..50, len in 0usize..300, w in 1usize..40) {
        let hi = lo + len;
        let tiles = tile(lo, hi, w);
        prop_assert_eq!(tiles.first().map(|t| t.start), Some(lo));
        prop_assert_eq!(tiles.last().map(|t| t.end), Some(hi));
        for t in &tiles {
            prop_assert!(t.len() <= 2 * w);
        }
        // Every span of length at most W fits in some tile.
        let span = w.min(len + 1);
        for s in lo..=hi + 1 - span {
            let e = s + span - 1;
            prop_assert!(tiles.iter().any(|t| t.contains(s, e)), "[{}, {}] not covered by {:?}", s, e, tiles);
        }
    }

    #[test]
    fn padded_envelope_contains_input(start in 1usize..100, len in 0usize..40, w in 1usize..30) {
        let win = Window::new(1, 200);
        let env = Window::new(start, start + len);
        let padded = pad_envelope(env, win, w);
        prop_assert!(padded.contains(env.start, env.end));
        prop_assert!(win.contains(padded.start, padded.end));
    }
}

#[test]
fn test_split_long_only_touches_long_windows() {
    let ws = vec![Window::new(1, 20), Window::new(100, 150)];
    let out = split_long(ws, 8, 3.0);
    assert_eq!(out[0], Window::new(1, 20));
    assert!(out.len() > 2);
    assert!(out[1..].iter().all(|t| t.len() <= 16));
    assert_eq!(out.last().map(|t| t.end), Some(150));
}

#[test]
fn test_expand_seed_clips_to_region() {
    assert_eq!(expand_seed(5, 8, 10, 1, 30), Window::new(1, 18));
    assert_eq!(expand_seed(25, 27, 10, 1, 30), Window::new(15, 30));
    assert_eq!(expand_seed(25, 27, 10, 20, 100), Window::new(20, 37));
}

#[test]
fn test_empty_range_tiles_to_nothing() {
    assert!(tile(10, 9, 8).is_empty());
    assert!(merge(Vec::new()).is_empty());
}

#[test]
fn test_inverted_window_is_empty() {
    let w = Window::new(5, 4);
    assert!(w.is_empty());
    assert_eq!(w.len(), 0);
    assert!(!Window::new(5, 5).is_empty());
    assert_eq!(merge(vec![w, Window::new(1, 2)]), vec![Window::new(1, 2)]);
    assert_eq!(covered_residues(&[w]), 0);
}
