//! Numerical utilities: grids, quadrature, monotone post-processing, interpolation.

pub mod grid;
pub mod integrate;
pub mod monotone;

pub use grid::*;
pub use integrate::*;
pub use monotone::*;
