//! Index operations.

pub mod chunks;
pub mod stats;
pub mod vectors;
