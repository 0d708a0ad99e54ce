//! Structured error types.
//!
//! Contract and resource failures are typed so the pipeline driver can tell a
//! recoverable matrix-size error from a fatal configuration mistake.

use thiserror::Error;

use crate::align::bands::BandMode;

/// Errors raised while digitizing a sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("invalid residue {byte:?} at position {pos} of sequence '{name}'")]
    InvalidResidue { name: String, pos: usize, byte: char },

    #[error("sequence '{name}' spans {start}..{end} but the source is only {full_len} residues long")]
    SourceOutOfBounds {
        name: String,
        start: usize,
        end: usize,
        full_len: usize,
    },
}

/// Errors raised by [`crate::model::ModelBuilder::build`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model has no states")]
    Empty,

    #[error("state 0 must be a Start state, found {0:?}")]
    BadRoot(crate::model::StateType),

    #[error("state {state}: child {child} does not follow its parent")]
    ChildOrder { state: usize, child: usize },

    #[error("state {state}: child index {child} out of range (M = {m})")]
    ChildOutOfRange { state: usize, child: usize, m: usize },

    #[error("state {state}: {reason}")]
    Topology { state: usize, reason: String },

    #[error("state {state}: expected {expected} transition scores, got {got}")]
    TransitionCount {
        state: usize,
        expected: usize,
        got: usize,
    },

    #[error("state {state}: emission table has {got} entries, expected {expected}")]
    EmissionSize {
        state: usize,
        expected: usize,
        got: usize,
    },

    #[error("state {0} is an insert state and cannot take a local begin score")]
    InsertLocalBegin(usize),

    #[error("maximum width must be at least 1")]
    ZeroWidth,
}

/// Errors raised by the scanning engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    /// The request cannot be served by this model or matrix.
    #[error("incompatible scan request: {0}")]
    Incompatible(String),

    #[error("inverted or out-of-bounds scan range [{i0}, {j0}] for a sequence of length {len}")]
    InvertedRange { i0: usize, j0: usize, len: usize },

    #[error("no band tables available for {0:?} scanning")]
    MissingBands(BandMode),

    /// Resource error; callers are expected to retry with a cheaper mode.
    #[error("DP matrix would need {needed_mb:.2} MB, limit is {limit_mb:.2} MB")]
    MatrixTooLarge { needed_mb: f64, limit_mb: f64 },

    #[error("band fallback chain is empty")]
    NoBandMode,
}

impl ScanError {
    /// True for errors a caller may recover from by switching band mode.
    pub fn is_resource(&self) -> bool {
        matches!(self, ScanError::MatrixTooLarge { .. })
    }
}

/// Configuration contract violations, detected before any scanning.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("model '{model}' has no {cutoff} bit score cutoff")]
    MissingCutoff { model: String, cutoff: &'static str },

    #[error("model '{model}' lacks extreme-value parameters for {mode}")]
    MissingStatistics { model: String, mode: String },

    #[error("threshold {name} = {value} is out of range")]
    Threshold { name: &'static str, value: f64 },

    #[error("{0}")]
    Unsupported(String),

    #[error("band provider has no query-dependent bands for beta = {0:e}")]
    MissingBands(f64),

    #[error("unknown {kind} '{value}'")]
    Parse { kind: &'static str, value: String },
}

/// Errors surfaced by [`crate::pipeline::Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}
