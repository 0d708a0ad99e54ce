pub mod common;
pub mod error;
pub mod sequence;

pub mod align;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod post;
pub mod profile;
pub mod report;
pub mod seed;
pub mod stats;

pub use common::{Hit, HitList, HitSink, PassKind, ScanAlgorithm, Scorer, TruncMode};
pub use config::PipelineConfig;
pub use error::{ConfigError, ModelError, PipelineError, ScanError, SequenceError};
pub use model::{CovarianceModel, ModelBuilder, StateDef, StateType};
pub use pipeline::{PassStats, Pipeline, PipelineStats};
pub use sequence::DigitalSeq;
