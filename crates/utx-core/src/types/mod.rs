//! Core data types.

pub mod transaction;

pub use transaction::*;
