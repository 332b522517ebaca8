//! Analysis modules.
//!
//! Turns flat enrollment records into the department hierarchy.

pub mod aggregator;

pub use aggregator::*;
