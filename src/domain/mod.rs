//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - instrument inputs (`OpticalParameters`, `AngleRange`, `DiameterGrid`)
//! - the lookup (`TheoreticalCurve`, `SurrogateParams`, `ScatteringKind`)
//! - events and estimator outputs (`MeasurementSet`, `EstimationResult`)
//! - run configuration (`SizingConfig`, `SizeRange`)

pub mod types;

pub use types::*;
