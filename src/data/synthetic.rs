//! Synthetic FSC/SSC events from a known diameter distribution.
//!
//! Generation per event:
//!
//! - diameter ~ LogNormal with the requested mean/std (nm)
//! - expected ratio = theoretical curve interpolated at that diameter
//! - observed ratio = expected * exp(noise * z), z ~ N(0, 1)
//! - SSC ~ LogNormal around `ssc_median`, FSC = ratio * SSC
//!
//! A fraction of events is corrupted the way raw acquisitions are (zero SSC,
//! missing FSC, negative channel) so cleaning and unknown-row handling are
//! exercised end to end. Output is deterministic for a given seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::domain::{DiameterGrid, Measurement, MeasurementSet, TheoreticalCurve};
use crate::error::AppError;
use crate::math::interp_linear;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub count: usize,
    pub seed: u64,
    pub mean_nm: f64,
    pub std_nm: f64,
    /// Log-scale sigma of multiplicative ratio noise.
    pub ratio_noise: f64,
    /// Share of corrupted events, in [0, 1).
    pub invalid_fraction: f64,
    pub ssc_median: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            seed: 42,
            mean_nm: 100.0,
            std_nm: 30.0,
            ratio_noise: 0.05,
            invalid_fraction: 0.02,
            ssc_median: 1_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticEvents {
    pub measurements: MeasurementSet,
    /// Diameter each event was drawn with (row-aligned with `measurements`).
    pub true_diameters_nm: Vec<f64>,
}

pub fn generate_events(
    config: &SyntheticConfig,
    curve: &TheoreticalCurve,
    grid: &DiameterGrid,
) -> Result<SyntheticEvents, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Synthetic event count must be > 0."));
    }
    if !(config.mean_nm.is_finite() && config.mean_nm > 0.0 && config.std_nm.is_finite() && config.std_nm >= 0.0) {
        return Err(AppError::new(2, "Invalid synthetic diameter distribution (need mean > 0, std >= 0)."));
    }
    if !(config.ratio_noise.is_finite() && config.ratio_noise >= 0.0) {
        return Err(AppError::new(2, "Ratio noise must be finite and >= 0."));
    }
    if !(0.0..1.0).contains(&config.invalid_fraction) {
        return Err(AppError::new(2, "Invalid fraction must be in [0, 1)."));
    }
    if !(config.ssc_median.is_finite() && config.ssc_median > 0.0) {
        return Err(AppError::new(2, "SSC median must be finite and > 0."));
    }
    if curve.len() != grid.len() {
        return Err(AppError::new(4, "Curve and diameter grid lengths differ."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let cv = (config.std_nm / config.mean_nm).max(0.01);
    let log_std = (1.0 + cv * cv).ln().sqrt();
    let log_mean = (config.mean_nm / (1.0 + cv * cv).sqrt()).ln();
    let size_dist = LogNormal::new(log_mean, log_std)
        .map_err(|e| AppError::new(4, format!("Diameter distribution error: {e}")))?;
    let ssc_dist = LogNormal::new(config.ssc_median.ln(), 0.5)
        .map_err(|e| AppError::new(4, format!("SSC distribution error: {e}")))?;
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut events = Vec::with_capacity(config.count);
    let mut true_diameters_nm = Vec::with_capacity(config.count);

    for _ in 0..config.count {
        let diameter = size_dist.sample(&mut rng).max(1.0);
        let expected = interp_linear(diameter, grid.as_slice(), curve.ratios());
        let ratio = expected * (config.ratio_noise * noise.sample(&mut rng)).exp();
        let ssc = ssc_dist.sample(&mut rng);
        let mut event = Measurement { fsc: ratio * ssc, ssc };

        if rng.gen_bool(config.invalid_fraction) {
            match rng.gen_range(0..3) {
                0 => event.ssc = 0.0,
                1 => event.fsc = f64::NAN,
                _ => event.fsc = -event.fsc.abs().max(1.0),
            }
        }

        events.push(event);
        true_diameters_nm.push(diameter);
    }

    Ok(SyntheticEvents {
        measurements: MeasurementSet::new(events),
        true_diameters_nm,
    })
}
