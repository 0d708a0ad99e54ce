pub mod ungapped;

pub use ungapped::{best_ungapped, diagonal_seeds, Seed};
