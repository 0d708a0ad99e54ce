//! Covariance model state graph.
//!
//! States are stored in preorder: every child has a larger index than its
//! parent, except insert states, which may list themselves as first child.
//! The scanning engine relies on this order to fill states from M-1 down to 0.

mod builder;

pub use builder::{ModelBuilder, StateDef};

use crate::sequence::KP;
use crate::stats::{BitCutoffs, ModelEvd};

/// Score of an impossible parse. Identity for both max and log-sum.
pub const IMPOSSIBLE: f32 = f32::NEG_INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateType {
    /// Emits a base pair (i, j).
    Pair,
    /// Emits the left residue i.
    Left,
    /// Emits the right residue j.
    Right,
    /// Emits nothing.
    Delete,
    /// Root, or the right branch of a bifurcation.
    Start,
    /// Splits the subsequence between two subtrees.
    Bifurcation,
    /// Left branch of a bifurcation.
    BifLeftStart,
    End,
}

impl StateType {
    #[inline]
    pub fn emits_left(self) -> bool {
        matches!(self, StateType::Pair | StateType::Left)
    }

    #[inline]
    pub fn emits_right(self) -> bool {
        matches!(self, StateType::Pair | StateType::Right)
    }
}

/// Child layout of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Children {
    None,
    /// Contiguous children `first..first + count`, one transition each.
    Run { first: usize, count: usize },
    /// Bifurcation children; no transition scores.
    Split { left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub kind: StateType,
    pub children: Children,
    /// One log2 transition score per child of a `Run`.
    pub tsc: Vec<f32>,
    /// `KP` entries for single emitters, `KP * KP` for pairs, indexed by
    /// `x_i * KP + x_j`.
    pub esc: Vec<f32>,
    /// Pair states: score of the left residue with its partner missing.
    pub lmesc: Vec<f32>,
    /// Pair states: score of the right residue with its partner missing.
    pub rmesc: Vec<f32>,
    /// Local begin score, `IMPOSSIBLE` if the state is not an entry point.
    pub begin_sc: f32,
    /// Local end score, `IMPOSSIBLE` if the state cannot exit early.
    pub end_sc: f32,
}

impl State {
    /// Iterate `(child, transition score)` for `Run` children.
    #[inline]
    pub fn transitions(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (first, count) = match self.children {
            Children::Run { first, count } => (first, count),
            _ => (0, 0),
        };
        (first..first + count).zip(self.tsc.iter().copied())
    }

    /// Single-residue emission score.
    #[inline]
    pub fn single(&self, x: u8) -> f32 {
        self.esc[x as usize]
    }

    #[inline]
    pub fn pair(&self, xi: u8, xj: u8) -> f32 {
        self.esc[xi as usize * KP + xj as usize]
    }

    #[inline]
    pub fn left_marginal(&self, x: u8) -> f32 {
        self.lmesc[x as usize]
    }

    #[inline]
    pub fn right_marginal(&self, x: u8) -> f32 {
        self.rmesc[x as usize]
    }
}

/// A built, validated covariance model. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceModel {
    pub name: String,
    states: Vec<State>,
    /// Consensus length: two per pair state, one per non-insert singlet.
    pub clen: usize,
    /// Maximum hit length W.
    pub max_width: usize,
    /// Per-residue score of a local end.
    pub el_self_sc: f32,
    /// Score of entering the model at a truncated state, if truncated
    /// begins are scored.
    pub trunc_penalty: Option<f32>,
    /// True if any state carries a finite local begin score.
    pub local_begins: bool,
    pub has_marginals: bool,
    pub supports_inside: bool,
    pub evd: ModelEvd,
    pub cutoffs: BitCutoffs,
}

impl CovarianceModel {
    /// Number of states M.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn state(&self, v: usize) -> &State {
        &self.states[v]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// True if `v` is an insert state (a singlet emitter with a self-loop).
    #[inline]
    pub fn is_insert(&self, v: usize) -> bool {
        let s = &self.states[v];
        matches!(s.kind, StateType::Left | StateType::Right)
            && matches!(s.children, Children::Run { first, .. } if first == v)
    }

    /// States whose L/R (and T) scores may seed a truncated root entry.
    #[inline]
    pub fn is_truncated_entry(&self, v: usize) -> bool {
        match self.states[v].kind {
            StateType::Pair | StateType::Bifurcation => true,
            StateType::Left | StateType::Right => !self.is_insert(v),
            _ => false,
        }
    }

    /// Score of a local end absorbing `len` residues.
    #[inline]
    pub fn end_init(&self, v: usize, len: usize) -> f32 {
        let end = self.states[v].end_sc;
        if end == IMPOSSIBLE {
            IMPOSSIBLE
        } else {
            end + self.el_self_sc * len as f32
        }
    }

    /// Local configuration decides which E-value tail applies.
    #[inline]
    pub fn is_local(&self) -> bool {
        self.local_begins
    }

    /// Conventional truncated-begin penalty: uniform over the
    /// `clen * (clen + 1) / 2` possible truncated spans.
    pub fn default_trunc_penalty(clen: usize) -> f32 {
        let spans = (clen * (clen + 1)).max(2) as f64 / 2.0;
        (1.0 / spans).log2() as f32
    }
}
