//! Data structures shared across the scan pipeline.

pub mod contract;
pub mod entry;
pub mod enums;
pub mod quote;
