use log::debug;

use crate::error::ModelError;
use crate::sequence::{BACKGROUND, DEGENERATE, K, KP};
use crate::stats::{BitCutoffs, ModelEvd};

use super::{Children, CovarianceModel, State, StateType, IMPOSSIBLE};

/// Definition of one state, as handed to [`ModelBuilder`].
///
/// Emission tables may be given over the canonical alphabet (`K` or `K * K`
/// entries), in which case the degenerate-residue scores are derived, or over
/// the full alphabet (`KP` or `KP * KP`).
#[derive(Debug, Clone, PartialEq)]
pub struct StateDef {
    pub kind: StateType,
    pub children: Children,
    pub tsc: Vec<f32>,
    pub esc: Vec<f32>,
    pub lmesc: Option<Vec<f32>>,
    pub rmesc: Option<Vec<f32>>,
    pub begin_sc: Option<f32>,
    pub end_sc: Option<f32>,
}

impl StateDef {
    fn bare(kind: StateType, children: Children, tsc: Vec<f32>) -> Self {
        Self {
            kind,
            children,
            tsc,
            esc: Vec::new(),
            lmesc: None,
            rmesc: None,
            begin_sc: None,
            end_sc: None,
        }
    }

    /// Start state with contiguous children.
    pub fn start(first: usize, tsc: Vec<f32>) -> Self {
        let count = tsc.len();
        Self::bare(StateType::Start, Children::Run { first, count }, tsc)
    }

    pub fn delete(first: usize, tsc: Vec<f32>) -> Self {
        let count = tsc.len();
        Self::bare(StateType::Delete, Children::Run { first, count }, tsc)
    }

    pub fn bif_left_start(first: usize, tsc: Vec<f32>) -> Self {
        let count = tsc.len();
        Self::bare(StateType::BifLeftStart, Children::Run { first, count }, tsc)
    }

    pub fn bifurcation(left: usize, right: usize) -> Self {
        Self::bare(
            StateType::Bifurcation,
            Children::Split { left, right },
            Vec::new(),
        )
    }

    pub fn end() -> Self {
        Self::bare(StateType::End, Children::None, Vec::new())
    }

    pub fn pair(first: usize, tsc: Vec<f32>, esc: Vec<f32>) -> Self {
        let count = tsc.len();
        Self {
            esc,
            ..Self::bare(StateType::Pair, Children::Run { first, count }, tsc)
        }
    }

    pub fn left(first: usize, tsc: Vec<f32>, esc: Vec<f32>) -> Self {
        let count = tsc.len();
        Self {
            esc,
            ..Self::bare(StateType::Left, Children::Run { first, count }, tsc)
        }
    }

    pub fn right(first: usize, tsc: Vec<f32>, esc: Vec<f32>) -> Self {
        let count = tsc.len();
        Self {
            esc,
            ..Self::bare(StateType::Right, Children::Run { first, count }, tsc)
        }
    }

    pub fn with_marginals(mut self, lmesc: Vec<f32>, rmesc: Vec<f32>) -> Self {
        self.lmesc = Some(lmesc);
        self.rmesc = Some(rmesc);
        self
    }

    pub fn with_begin(mut self, sc: f32) -> Self {
        self.begin_sc = Some(sc);
        self
    }

    pub fn with_end(mut self, sc: f32) -> Self {
        self.end_sc = Some(sc);
        self
    }
}

/// Assembles and validates a [`CovarianceModel`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    states: Vec<StateDef>,
    max_width: Option<usize>,
    el_self_sc: f32,
    trunc_penalty: Option<f32>,
    derive_marginals: bool,
    inside_tables: bool,
    evd: ModelEvd,
    cutoffs: BitCutoffs,
}

impl ModelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            states: Vec::new(),
            max_width: None,
            el_self_sc: 0.0,
            trunc_penalty: None,
            derive_marginals: true,
            inside_tables: true,
            evd: ModelEvd::default(),
            cutoffs: BitCutoffs::default(),
        }
    }

    pub fn state(mut self, def: StateDef) -> Self {
        self.states.push(def);
        self
    }

    pub fn states<I: IntoIterator<Item = StateDef>>(mut self, defs: I) -> Self {
        self.states.extend(defs);
        self
    }

    /// Maximum hit length W. Defaults to twice the consensus length.
    pub fn max_width(mut self, w: usize) -> Self {
        self.max_width = Some(w);
        self
    }

    pub fn el_self_sc(mut self, sc: f32) -> Self {
        self.el_self_sc = sc;
        self
    }

    pub fn trunc_penalty(mut self, penalty: Option<f32>) -> Self {
        self.trunc_penalty = penalty;
        self
    }

    /// Score truncated begins with [`CovarianceModel::default_trunc_penalty`].
    pub fn default_trunc_penalty(mut self) -> Self {
        let clen = consensus_len(&self.states);
        self.trunc_penalty = Some(CovarianceModel::default_trunc_penalty(clen));
        self
    }

    /// Do not derive marginal tables; pair states without explicit marginals
    /// then make the model unusable for truncated passes.
    pub fn without_marginals(mut self) -> Self {
        self.derive_marginals = false;
        self
    }

    /// Mark the model as lacking the tables needed for Inside scoring.
    pub fn without_inside(mut self) -> Self {
        self.inside_tables = false;
        self
    }

    pub fn evd(mut self, evd: ModelEvd) -> Self {
        self.evd = evd;
        self
    }

    pub fn cutoffs(mut self, cutoffs: BitCutoffs) -> Self {
        self.cutoffs = cutoffs;
        self
    }

    pub fn build(self) -> Result<CovarianceModel, ModelError> {
        let m = self.states.len();
        if m == 0 {
            return Err(ModelError::Empty);
        }
        if self.states[0].kind != StateType::Start {
            return Err(ModelError::BadRoot(self.states[0].kind));
        }
        if self.max_width == Some(0) {
            return Err(ModelError::ZeroWidth);
        }

        for (v, def) in self.states.iter().enumerate() {
            check_topology(v, def, &self.states)?;
            check_tables(v, def)?;
        }

        let clen = consensus_len(&self.states);
        let mut has_marginals = true;
        let mut local_begins = false;
        let mut states = Vec::with_capacity(m);
        for (v, def) in self.states.into_iter().enumerate() {
            let is_insert = is_insert_def(v, &def);
            if let Some(b) = def.begin_sc {
                if is_insert && b.is_finite() {
                    return Err(ModelError::InsertLocalBegin(v));
                }
                local_begins |= b.is_finite();
            }
            let esc = expand_emissions(def.kind, &def.esc);
            let (lmesc, rmesc) = if def.kind == StateType::Pair {
                match (def.lmesc, def.rmesc) {
                    (Some(l), Some(r)) => (expand_single(&l), expand_single(&r)),
                    _ if self.derive_marginals => marginals(&esc),
                    _ => {
                        has_marginals = false;
                        (Vec::new(), Vec::new())
                    }
                }
            } else {
                (Vec::new(), Vec::new())
            };
            states.push(State {
                kind: def.kind,
                children: def.children,
                tsc: def.tsc,
                esc,
                lmesc,
                rmesc,
                begin_sc: def.begin_sc.unwrap_or(IMPOSSIBLE),
                end_sc: def.end_sc.unwrap_or(IMPOSSIBLE),
            });
        }

        let max_width = self.max_width.unwrap_or((2 * clen).max(1));
        debug!(
            "built model '{}': M={} clen={} W={} local={} marginals={}",
            self.name, m, clen, max_width, local_begins, has_marginals
        );

        Ok(CovarianceModel {
            name: self.name,
            states,
            clen,
            max_width,
            el_self_sc: self.el_self_sc,
            trunc_penalty: self.trunc_penalty,
            local_begins,
            has_marginals,
            supports_inside: self.inside_tables,
            evd: self.evd,
            cutoffs: self.cutoffs,
        })
    }
}

fn is_insert_def(v: usize, def: &StateDef) -> bool {
    matches!(def.kind, StateType::Left | StateType::Right)
        && matches!(def.children, Children::Run { first, .. } if first == v)
}

fn consensus_len(defs: &[StateDef]) -> usize {
    defs.iter()
        .enumerate()
        .map(|(v, d)| match d.kind {
            StateType::Pair => 2,
            StateType::Left | StateType::Right if !is_insert_def(v, d) => 1,
            _ => 0,
        })
        .sum()
}

fn check_topology(v: usize, def: &StateDef, all: &[StateDef]) -> Result<(), ModelError> {
    let m = all.len();
    let topology = |reason: &str| ModelError::Topology {
        state: v,
        reason: reason.to_string(),
    };
    match (def.kind, def.children) {
        (StateType::End, Children::None) => {}
        (StateType::End, _) => return Err(topology("end states take no children")),
        (StateType::Bifurcation, Children::Split { left, right }) => {
            for child in [left, right] {
                if child >= m {
                    return Err(ModelError::ChildOutOfRange { state: v, child, m });
                }
                if child <= v {
                    return Err(ModelError::ChildOrder { state: v, child });
                }
            }
            if all[left].kind != StateType::BifLeftStart {
                return Err(topology("left child of a bifurcation must be BifLeftStart"));
            }
            if all[right].kind != StateType::Start {
                return Err(topology("right child of a bifurcation must be Start"));
            }
        }
        (StateType::Bifurcation, _) => {
            return Err(topology("bifurcations take exactly a left and a right child"))
        }
        (_, Children::Run { first, count }) => {
            if !(1..=6).contains(&count) {
                return Err(topology("states take between 1 and 6 children"));
            }
            if first + count > m {
                return Err(ModelError::ChildOutOfRange {
                    state: v,
                    child: first + count - 1,
                    m,
                });
            }
            if first <= v && !(first == v && is_insert_def(v, def)) {
                return Err(ModelError::ChildOrder { state: v, child: first });
            }
            if (first..first + count).any(|y| all[y].kind == StateType::BifLeftStart) {
                return Err(topology("BifLeftStart states are reachable only from a bifurcation"));
            }
            if def.tsc.len() != count {
                return Err(ModelError::TransitionCount {
                    state: v,
                    expected: count,
                    got: def.tsc.len(),
                });
            }
        }
        (_, _) => return Err(topology("non-end states need at least one child")),
    }
    Ok(())
}

fn check_tables(v: usize, def: &StateDef) -> Result<(), ModelError> {
    let got = def.esc.len();
    let ok = match def.kind {
        StateType::Pair => got == K * K || got == KP * KP,
        StateType::Left | StateType::Right => got == K || got == KP,
        _ => got == 0,
    };
    if !ok {
        let expected = match def.kind {
            StateType::Pair => KP * KP,
            StateType::Left | StateType::Right => KP,
            _ => 0,
        };
        return Err(ModelError::EmissionSize {
            state: v,
            expected,
            got,
        });
    }
    for table in [&def.lmesc, &def.rmesc].into_iter().flatten() {
        if def.kind != StateType::Pair || !(table.len() == K || table.len() == KP) {
            return Err(ModelError::EmissionSize {
                state: v,
                expected: KP,
                got: table.len(),
            });
        }
    }
    Ok(())
}

/// log2 of the background-weighted mean of `2^sc`.
fn weighted_log2_mean(scores: impl Iterator<Item = (f32, f32)>) -> f32 {
    let sum: f32 = scores.map(|(sc, f)| f * sc.exp2()).sum();
    if sum > 0.0 {
        sum.log2()
    } else {
        IMPOSSIBLE
    }
}

fn expand_single(esc: &[f32]) -> Vec<f32> {
    if esc.len() == KP {
        return esc.to_vec();
    }
    let mut out = esc[..K].to_vec();
    out.push(weighted_log2_mean(
        esc.iter().copied().zip(BACKGROUND.iter().copied()),
    ));
    out
}

fn expand_emissions(kind: StateType, esc: &[f32]) -> Vec<f32> {
    match kind {
        StateType::Left | StateType::Right => expand_single(esc),
        StateType::Pair if esc.len() == K * K => {
            let mut out = vec![IMPOSSIBLE; KP * KP];
            for a in 0..K {
                for b in 0..K {
                    out[a * KP + b] = esc[a * K + b];
                }
            }
            let n = DEGENERATE as usize;
            for a in 0..K {
                out[a * KP + n] = weighted_log2_mean(
                    (0..K).map(|b| (esc[a * K + b], BACKGROUND[b])),
                );
                out[n * KP + a] = weighted_log2_mean(
                    (0..K).map(|b| (esc[b * K + a], BACKGROUND[b])),
                );
            }
            out[n * KP + n] = weighted_log2_mean(
                (0..K * K).map(|ab| (esc[ab], BACKGROUND[ab / K] * BACKGROUND[ab % K])),
            );
            out
        }
        _ => esc.to_vec(),
    }
}

/// Marginal tables of a full `KP * KP` pair table: `lm[a] = log2 sum_b
/// 2^esc[a][b] f(b)`, and symmetrically for `rm`.
fn marginals(esc: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let left: Vec<f32> = (0..K)
        .map(|a| weighted_log2_mean((0..K).map(|b| (esc[a * KP + b], BACKGROUND[b]))))
        .collect();
    let right: Vec<f32> = (0..K)
        .map(|b| weighted_log2_mean((0..K).map(|a| (esc[a * KP + b], BACKGROUND[a]))))
        .collect();
    (expand_single(&left), expand_single(&right))
}
