pub mod filter;
pub mod windows;

pub use filter::remove_overlaps;
pub use windows::Window;
