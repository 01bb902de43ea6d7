//! Curve construction.
//!
//! For each diameter of the grid we ask the scattering strategy for a raw
//! FSC/SSC ratio. Failures for individual diameters are logged and recorded as
//! NaN; the envelope pass then patches them and enforces monotonicity:
//!
//! 1) NaN -> largest finite ratio
//! 2) running maximum over increasing diameter
//!
//! If nothing was finite the curve degrades to all zeros (flagged degenerate),
//! which makes the estimator match every event to the smallest diameter.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{DiameterGrid, OpticalParameters, TheoreticalCurve};
use crate::error::SizingError;
use crate::math::{Envelope, linspace, monotone_envelope};
use crate::scatter::ScatteringStrategy;

/// Angular samples over [0, 180] deg used for acceptance integration.
pub const ANGULAR_SAMPLES: usize = 1000;

/// Builds theoretical curves with a strategy fixed at construction.
#[derive(Debug, Clone)]
pub struct CurveBuilder {
    strategy: ScatteringStrategy,
    angles_deg: Vec<f64>,
}

impl CurveBuilder {
    pub fn new(strategy: ScatteringStrategy) -> Self {
        Self {
            strategy,
            angles_deg: linspace(0.0, 180.0, ANGULAR_SAMPLES),
        }
    }

    pub fn strategy(&self) -> &ScatteringStrategy {
        &self.strategy
    }

    pub fn angles_deg(&self) -> &[f64] {
        &self.angles_deg
    }

    /// Build the monotone lookup for `optical` over `diameters`.
    ///
    /// Only parameter validation can fail; scattering failures degrade the
    /// curve instead of aborting it.
    pub fn build(
        &self,
        optical: &OpticalParameters,
        diameters: &DiameterGrid,
    ) -> Result<TheoreticalCurve, SizingError> {
        optical.validate()?;
        self.strategy.validate()?;

        let raw = self.raw_ratios(optical, diameters);
        let failed = raw.iter().filter(|r| !r.is_finite()).count();
        let kind = self.strategy.kind();

        match monotone_envelope(&raw) {
            Envelope::Curve(ratios) => {
                if failed > 0 {
                    debug!(
                        failed,
                        total = raw.len(),
                        "patched undefined ratios with the largest finite ratio"
                    );
                }
                TheoreticalCurve::from_ratios(ratios, kind)
            }
            Envelope::Degenerate => {
                warn!(
                    model = kind.display_name(),
                    points = raw.len(),
                    "no diameter produced a usable ratio; falling back to an all-zero curve"
                );
                Ok(TheoreticalCurve::zeros(raw.len(), kind))
            }
        }
    }

    /// Per-diameter raw ratios in grid order; failures become NaN.
    fn raw_ratios(&self, optical: &OpticalParameters, diameters: &DiameterGrid) -> Vec<f64> {
        diameters
            .as_slice()
            .par_iter()
            .map(|&diameter_nm| {
                match self.strategy.raw_ratio(optical, diameter_nm, &self.angles_deg) {
                    Ok(ratio) => ratio,
                    Err(err) => {
                        debug!(diameter_nm, error = %err, "scattering computation failed");
                        f64::NAN
                    }
                }
            })
            .collect()
    }
}
