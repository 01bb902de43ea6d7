//! Data sources for analyses that do not start from an instrument export.

pub mod synthetic;

pub use synthetic::*;
