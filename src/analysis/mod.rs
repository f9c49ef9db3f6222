//! Analysis modules.
//!
//! Pure aggregation over snapshots of backend records: dashboard and
//! report figures, search filters, and local rollups.

pub mod aggregator;
pub mod rollup;
pub mod search;

pub use aggregator::*;
pub use rollup::*;
pub use search::*;
