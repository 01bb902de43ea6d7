//! Output helpers.
//!
//! - curve JSON read/write (`curve`)
//! - per-event result export (CSV) (`export`)

pub mod curve;
pub mod export;

pub use curve::*;
pub use export::*;
