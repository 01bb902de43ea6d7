//! `ev-sizing` library crate.
//!
//! The binary (`evsize`) is a thin wrapper around this library so that:
//!
//! - the lookup builder and estimator are testable without spawning processes
//! - other front-ends (batch jobs, notebooks) can call the same pipeline
//!
//! Core flow: [`lookup::CurveBuilder`] turns optics plus a diameter grid into a
//! monotone [`domain::TheoreticalCurve`]; [`estimate::estimate_diameters`]
//! maps measured FSC/SSC ratios onto it by nearest ratio.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod io;
pub mod lookup;
pub mod math;
pub mod report;
pub mod scatter;
