//! Scan matrix: four score planes over (state, end position, length).
//!
//! Every plane is one contiguous allocation split into per-state decks of
//! `min(dmax, W) + 1` cells. Decks of ordinary states keep two rows (j and
//! j-1); decks of bifurcation left-branch states keep the last W+1 rows
//! because a bifurcation reads them at arbitrary earlier end points. The T
//! plane exists only for bifurcation states and only for the current row.

use crate::common::ScanAlgorithm;
use crate::error::ScanError;
use crate::model::{Children, CovarianceModel, StateType, IMPOSSIBLE};

use super::bands::BandTable;
use super::logsum::{Combine, LogSum, MaxPlus};

/// Score plane selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    J,
    L,
    R,
    T,
}

#[derive(Debug, Clone, Copy, Default)]
struct Deck {
    offset: usize,
    len: usize,
    rows: usize,
}

impl Deck {
    #[inline]
    fn cell(&self, j: usize, d: usize) -> Option<Cell> {
        if d < self.len {
            Some(Cell(self.offset + (j % self.rows) * self.len + d))
        } else {
            None
        }
    }
}

/// Position of one score inside a plane. Only obtainable through
/// [`ScanMatrix`], so raw offsets never leak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cell(usize);

#[derive(Debug, Clone)]
pub struct ScanMatrix {
    w: usize,
    truncated: bool,
    bands: BandTable,
    decks: Vec<Deck>,
    t_decks: Vec<Deck>,
    jmx: Vec<f32>,
    lmx: Vec<f32>,
    rmx: Vec<f32>,
    tmx: Vec<f32>,
}

/// Deck layout shared by `new` and `estimate_mb`.
fn layout(model: &CovarianceModel, bands: &BandTable, w: usize) -> (Vec<Deck>, Vec<Deck>, usize, usize) {
    let mut decks = Vec::with_capacity(model.len());
    let mut t_decks = Vec::with_capacity(model.len());
    let (mut total, mut t_total) = (0usize, 0usize);
    for v in 0..model.len() {
        let (_, dmax) = bands.bounds(v);
        let len = dmax.min(w) + 1;
        let rows = if model.state(v).kind == StateType::BifLeftStart {
            w + 1
        } else {
            2
        };
        decks.push(Deck {
            offset: total,
            len,
            rows,
        });
        total += len * rows;
        if model.state(v).kind == StateType::Bifurcation {
            t_decks.push(Deck {
                offset: t_total,
                len,
                rows: 1,
            });
            t_total += len;
        } else {
            t_decks.push(Deck::default());
        }
    }
    (decks, t_decks, total, t_total)
}

fn check_bands(model: &CovarianceModel, bands: &BandTable) -> Result<(), ScanError> {
    if bands.len() != model.len() {
        return Err(ScanError::Incompatible(format!(
            "band table covers {} states, model '{}' has {}",
            bands.len(),
            model.name,
            model.len()
        )));
    }
    Ok(())
}

impl ScanMatrix {
    /// Allocate a matrix for `model` under `bands`. `truncated` adds the
    /// L/R/T planes.
    pub fn new(model: &CovarianceModel, bands: BandTable, truncated: bool) -> Result<Self, ScanError> {
        check_bands(model, &bands)?;
        let w = model.max_width;
        let (decks, t_decks, total, t_total) = layout(model, &bands, w);
        let (lr, t) = if truncated { (total, t_total) } else { (0, 0) };
        Ok(Self {
            w,
            truncated,
            bands,
            decks,
            t_decks,
            jmx: vec![IMPOSSIBLE; total],
            lmx: vec![IMPOSSIBLE; lr],
            rmx: vec![IMPOSSIBLE; lr],
            tmx: vec![IMPOSSIBLE; t],
        })
    }

    /// Size in MB a matrix would need, without allocating it.
    pub fn estimate_mb(model: &CovarianceModel, bands: &BandTable, truncated: bool) -> Result<f64, ScanError> {
        check_bands(model, bands)?;
        let (_, _, total, t_total) = layout(model, bands, model.max_width);
        let cells = if truncated {
            3 * total + t_total
        } else {
            total
        };
        Ok((cells * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0))
    }

    /// Size in MB of this matrix.
    pub fn size_mb(&self) -> f64 {
        let cells = self.jmx.len() + self.lmx.len() + self.rmx.len() + self.tmx.len();
        (cells * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0)
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// Largest length stored for state `v`.
    #[inline]
    pub fn deck_max(&self, v: usize) -> usize {
        self.decks[v].len - 1
    }

    #[inline]
    fn plane(&self, plane: Plane) -> &[f32] {
        match plane {
            Plane::J => &self.jmx,
            Plane::L => &self.lmx,
            Plane::R => &self.rmx,
            Plane::T => &self.tmx,
        }
    }

    #[inline]
    fn plane_mut(&mut self, plane: Plane) -> &mut [f32] {
        match plane {
            Plane::J => &mut self.jmx,
            Plane::L => &mut self.lmx,
            Plane::R => &mut self.rmx,
            Plane::T => &mut self.tmx,
        }
    }

    #[inline]
    pub(crate) fn cell(&self, plane: Plane, v: usize, j: usize, d: usize) -> Option<Cell> {
        let deck = if plane == Plane::T {
            &self.t_decks[v]
        } else {
            &self.decks[v]
        };
        deck.cell(j, d)
    }

    /// Score of state `v` aligned to the `d` residues ending at `j`.
    /// Reads outside the deck (or of an unallocated plane) give `IMPOSSIBLE`.
    #[inline]
    pub fn get(&self, plane: Plane, v: usize, j: usize, d: usize) -> f32 {
        match self.cell(plane, v, j, d) {
            Some(Cell(idx)) => self.plane(plane).get(idx).copied().unwrap_or(IMPOSSIBLE),
            None => IMPOSSIBLE,
        }
    }

    /// Store a score; writes outside the deck are dropped.
    #[inline]
    pub fn set(&mut self, plane: Plane, v: usize, j: usize, d: usize, sc: f32) {
        if let Some(Cell(idx)) = self.cell(plane, v, j, d) {
            if let Some(slot) = self.plane_mut(plane).get_mut(idx) {
                *slot = sc;
            }
        }
    }

    /// Refill every plane with the sentinel and re-initialize zero-length
    /// cells for `algorithm`.
    pub fn reset(&mut self, model: &CovarianceModel, algorithm: ScanAlgorithm) {
        match algorithm {
            ScanAlgorithm::Cyk => self.reset_with::<MaxPlus>(model),
            ScanAlgorithm::Inside => self.reset_with::<LogSum>(model),
        }
    }

    pub(crate) fn reset_with<C: Combine>(&mut self, model: &CovarianceModel) {
        self.jmx.fill(IMPOSSIBLE);
        self.lmx.fill(IMPOSSIBLE);
        self.rmx.fill(IMPOSSIBLE);
        self.tmx.fill(IMPOSSIBLE);

        for v in (0..model.len()).rev() {
            let (dmin, _) = self.bands.bounds(v);
            if !self.truncated && dmin > 0 {
                continue;
            }
            let state = model.state(v);
            let sc = match state.kind {
                StateType::End => 0.0,
                StateType::Start | StateType::Delete | StateType::BifLeftStart => state
                    .transitions()
                    .fold(model.end_init(v, 0), |acc, (y, t)| {
                        C::combine(acc, self.get(Plane::J, y, 0, 0) + t)
                    }),
                StateType::Bifurcation => match state.children {
                    Children::Split { left, right } => {
                        self.get(Plane::J, left, 0, 0) + self.get(Plane::J, right, 0, 0)
                    }
                    _ => IMPOSSIBLE,
                },
                StateType::Pair | StateType::Left | StateType::Right => IMPOSSIBLE,
            };
            let rows = self.decks[v].rows;
            for row in 0..rows {
                self.set(Plane::J, v, row, 0, sc);
                if self.truncated && state.kind == StateType::End {
                    self.set(Plane::L, v, row, 0, 0.0);
                    self.set(Plane::R, v, row, 0, 0.0);
                }
            }
        }
    }
}
