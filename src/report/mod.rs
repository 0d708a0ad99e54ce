//! Text output for hits and pipeline counters.

pub mod tabular;

pub use tabular::{format_evalue, write_stats, write_tabular, TabularOptions};
