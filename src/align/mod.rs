pub mod bands;
pub mod engine;
pub mod gamma;
pub mod logsum;
pub mod matrix;
pub mod trunc_scan;

pub use bands::{Band, BandMode, BandProvider, BandTable, NoBands, StaticBands};
pub use engine::{BandRequest, ScanEngine};
pub use gamma::ScanHit;
pub use matrix::{Plane, ScanMatrix};
pub use trunc_scan::{trunc_scan, ScanOutcome, ScanRequest};
