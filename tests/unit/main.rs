//! Integration tests for cmsift.
//!
//! - `engine` - truncated CYK/Inside scans against a brute-force reference
//! - `model` - model construction and validation
//! - `windows` - window bookkeeping properties
//! - `pipeline` - end-to-end searches, passes and accounting
//! - `config` - configuration contract errors
//! - `stats` - score statistics

mod helpers;

mod config;
mod engine;
mod model;
mod stats;
mod windows;
