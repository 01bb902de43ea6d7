//! Theoretical lookup: diameter -> expected FSC/SSC ratio.
//!
//! - `builder`: validated, monotone curve construction for one strategy
//! - `cache`: caller-owned memo of built curves keyed by every input

pub mod builder;
pub mod cache;

pub use builder::*;
pub use cache::*;
