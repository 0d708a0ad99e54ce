pub mod evd;
pub mod null3;
pub mod search_space;
pub mod tables;

pub use evd::*;
pub use null3::*;
pub use search_space::*;
pub use tables::*;
