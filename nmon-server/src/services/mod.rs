//! Domain engines: pure functions over data loaded by `crate::db`

pub mod dedup;
pub mod hotspots;
pub mod noise_filter;
pub mod plan_compare;
pub mod success;
