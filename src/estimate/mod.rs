//! Diameter estimation from measured FSC/SSC ratios.
//!
//! - `measurements`: event cleaning and ratio derivation
//! - `estimator`: batched nearest-ratio matching against a theoretical curve

pub mod estimator;
pub mod measurements;

pub use estimator::*;
