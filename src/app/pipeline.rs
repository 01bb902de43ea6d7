//! Shared "sizing pipeline" used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! lookup (built or loaded) -> cleaning -> ratios -> estimation -> summary/ranges
//!
//! Subcommands can then focus on presentation and exports.

use std::time::Instant;

use tracing::info;

use crate::domain::{
    DiameterGrid, EstimationResult, MeasurementSet, OpticalParameters, SizingConfig,
    TheoreticalCurve,
};
use crate::error::AppError;
use crate::estimate::estimate_diameters_batched;
use crate::lookup::{CurveBuilder, CurveCache};
use crate::report::{RangeReport, SizeSummary, count_ranges, summarize};
use crate::scatter::ScatteringStrategy;

/// The lookup a run estimates against.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub optical: OpticalParameters,
    pub grid: DiameterGrid,
    pub curve: TheoreticalCurve,
}

/// All computed outputs of one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub lookup: Lookup,
    /// Events after cleaning, row-aligned with `ratios` and `estimates`.
    /// `None` when the analysis started from ratios.
    pub measurements: Option<MeasurementSet>,
    /// Input row of every analysed row.
    pub kept_rows: Vec<usize>,
    pub ratios: Vec<f64>,
    pub estimates: EstimationResult,
    pub summary: SizeSummary,
    pub ranges: RangeReport,
}

/// Strategy + builder for `config`, resolved once per run.
pub fn curve_builder(config: &SizingConfig) -> Result<CurveBuilder, AppError> {
    let strategy = ScatteringStrategy::select(config.scattering)?;
    info!(model = strategy.kind().display_name(), "scattering model selected");
    Ok(CurveBuilder::new(strategy))
}

/// Resolve the lookup for `config`: load `curve_path` if given, else build
/// through `cache`.
pub fn resolve_lookup(
    config: &SizingConfig,
    builder: &CurveBuilder,
    cache: &mut CurveCache,
) -> Result<Lookup, AppError> {
    if let Some(path) = &config.curve_path {
        let file = crate::io::curve::read_curve_json(path)?;
        let optical = file.optical;
        let (curve, grid) = file.into_lookup()?;
        info!(
            path = %path.display(),
            points = grid.len(),
            model = curve.kind().display_name(),
            "theoretical curve loaded"
        );
        return Ok(Lookup {
            optical,
            grid,
            curve,
        });
    }

    let grid = config.diameter_grid()?;
    let started = Instant::now();
    let curve = cache.get_or_build(builder, &config.optical, &grid)?.clone();
    info!(
        points = grid.len(),
        model = curve.kind().display_name(),
        degenerate = curve.is_degenerate(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "theoretical curve ready"
    );
    Ok(Lookup {
        optical: config.optical,
        grid,
        curve,
    })
}

/// Size `measurements` against an already resolved lookup.
pub fn analyze(
    config: &SizingConfig,
    lookup: Lookup,
    measurements: &MeasurementSet,
) -> Result<AnalysisOutput, AppError> {
    let (cleaned, kept_rows) = measurements.clean_with_rows(config.cleaning);
    if cleaned.len() < measurements.len() {
        info!(
            dropped = measurements.len() - cleaned.len(),
            "events with a missing channel dropped"
        );
    }
    let ratios = cleaned.ratios();
    estimate_into_output(config, lookup, Some(cleaned), kept_rows, ratios)
}

/// Size precomputed FSC/SSC ratios. No cleaning is applied; non-finite
/// ratios stay as unknown rows.
pub fn analyze_ratios(
    config: &SizingConfig,
    lookup: Lookup,
    ratios: &[f64],
) -> Result<AnalysisOutput, AppError> {
    let kept_rows = (0..ratios.len()).collect();
    estimate_into_output(config, lookup, None, kept_rows, ratios.to_vec())
}

fn estimate_into_output(
    config: &SizingConfig,
    lookup: Lookup,
    measurements: Option<MeasurementSet>,
    kept_rows: Vec<usize>,
    ratios: Vec<f64>,
) -> Result<AnalysisOutput, AppError> {
    let started = Instant::now();

    let estimates = estimate_diameters_batched(&ratios, &lookup.curve, &lookup.grid, config.batch_rows)?;
    let summary = summarize(&estimates);
    let ranges = count_ranges(&estimates, &config.size_ranges);

    info!(
        rows = ratios.len(),
        sized = summary.n_sized,
        unknown = summary.n_unknown(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "diameters estimated"
    );

    Ok(AnalysisOutput {
        lookup,
        measurements,
        kept_rows,
        ratios,
        estimates,
        summary,
        ranges,
    })
}

/// Resolve the lookup and size `measurements` in one call.
pub fn run_analysis(
    config: &SizingConfig,
    builder: &CurveBuilder,
    cache: &mut CurveCache,
    measurements: &MeasurementSet,
) -> Result<AnalysisOutput, AppError> {
    let lookup = resolve_lookup(config, builder, cache)?;
    analyze(config, lookup, measurements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScatteringModel, SizeRange, SurrogateParams};

    fn surrogate_config() -> SizingConfig {
        SizingConfig {
            scattering: ScatteringModel::Surrogate,
            diameter_points: 141,
            size_ranges: vec![
                SizeRange::new("Small", 30.0, 100.0),
                SizeRange::new("Large", 100.0, 200.0),
            ],
            ..SizingConfig::default()
        }
    }

    #[test]
    fn analysis_drops_missing_events_and_sizes_the_rest() {
        let config = surrogate_config();
        let builder = curve_builder(&config).unwrap();
        let mut cache = CurveCache::new();

        let grid = config.diameter_grid().unwrap();
        let params = SurrogateParams::default();
        let r60 = crate::scatter::surrogate::ratio(&params, 60.0).unwrap();
        let r150 = crate::scatter::surrogate::ratio(&params, 150.0).unwrap();
        assert_eq!(grid.len(), 141);

        let events = MeasurementSet::from_pairs(&[r60 * 100.0, f64::NAN, r150 * 10.0, -3.0], &[100.0, 5.0, 10.0, 1.0]);
        let out = run_analysis(&config, &builder, &mut cache, &events).unwrap();

        assert_eq!(out.measurements.as_ref().map(MeasurementSet::len), Some(2));
        assert_eq!(out.kept_rows, vec![0, 2]);
        assert_eq!(out.estimates.len(), 2);
        assert!((out.estimates.estimated_diameter_nm[0] - 60.0).abs() < 1e-9);
        assert!((out.estimates.estimated_diameter_nm[1] - 150.0).abs() < 1e-9);
        assert_eq!(out.summary.n_sized, 2);
        assert_eq!(out.ranges.counts[0].count, 1);
        assert_eq!(out.ranges.counts[1].count, 1);
    }

    #[test]
    fn ratio_analysis_keeps_unknown_rows() {
        let config = surrogate_config();
        let builder = curve_builder(&config).unwrap();
        let lookup = resolve_lookup(&config, &builder, &mut CurveCache::new()).unwrap();
        let smallest = lookup.curve.ratios()[0];

        let out = analyze_ratios(&config, lookup, &[smallest, f64::NAN, 1e9]).unwrap();
        assert!(out.measurements.is_none());
        assert_eq!(out.estimates.matched_index, vec![Some(0), None, Some(140)]);
        assert_eq!(out.summary.n_unknown(), 1);
    }

    #[test]
    fn repeated_runs_reuse_the_cached_curve() {
        let config = surrogate_config();
        let builder = curve_builder(&config).unwrap();
        let mut cache = CurveCache::new();
        let events = MeasurementSet::from_pairs(&[1.0], &[1.0]);

        let a = run_analysis(&config, &builder, &mut cache, &events).unwrap();
        let b = run_analysis(&config, &builder, &mut cache, &events).unwrap();
        assert_eq!(a.estimates, b.estimates);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn saved_curve_replaces_the_build() {
        let config = surrogate_config();
        let builder = curve_builder(&config).unwrap();
        let mut cache = CurveCache::new();
        let built = resolve_lookup(&config, &builder, &mut cache).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        crate::io::curve::write_curve_json(&path, &built.curve, &built.grid, &built.optical).unwrap();

        let loaded_config = SizingConfig {
            curve_path: Some(path),
            d_min_nm: 1.0,
            d_max_nm: 2.0,
            ..surrogate_config()
        };
        let mut empty = CurveCache::new();
        let loaded = resolve_lookup(&loaded_config, &builder, &mut empty).unwrap();
        assert_eq!(loaded.grid, built.grid);
        assert_eq!(loaded.curve, built.curve);
        assert!(empty.is_empty());
    }
}
