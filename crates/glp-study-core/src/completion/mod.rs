//! Data-capture completion tracking.
//!
//! Pipeline: Roster → Captured records → Per-animal check → Summary → Cache

mod aggregator;
mod cache;
mod rollup;

pub use aggregator::*;
pub use cache::*;
pub use rollup::*;
