//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds or loads the theoretical lookup
//! - sizes command-line or synthetic events
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, CurveArgs, EstimateArgs, LookupArgs, SimulateArgs};
use crate::data::{SyntheticConfig, generate_events};
use crate::domain::{CleaningOptions, MeasurementSet, OpticalParameters, SizeRange, SizingConfig};
use crate::error::AppError;
use crate::lookup::CurveCache;
use crate::report;

use self::pipeline::{AnalysisOutput, Lookup};

pub mod pipeline;

/// Entry point for the `evsize` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Curve(args) => handle_curve(args),
        Command::Estimate(args) => handle_estimate(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    let mut config = sizing_config_from_args(&args.lookup, Vec::new());
    config.export_curve = args.export_curve.clone();

    let builder = pipeline::curve_builder(&config)?;
    let lookup = pipeline::resolve_lookup(&config, &builder, &mut CurveCache::new())?;

    println!("{}", report::format_run_header(&lookup.optical, &lookup.curve, &lookup.grid));
    println!("{}", report::format_curve_table(&lookup.curve, &lookup.grid, args.stride));

    export_curve(&config, &lookup)
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    if args.ratios.is_empty() && args.events.is_empty() {
        return Err(AppError::new(2, "Nothing to estimate: pass --ratio or --event values."));
    }
    if args.export.is_some() && args.events.is_empty() {
        return Err(AppError::new(2, "--export needs --event input (FSC and SSC columns)."));
    }

    let mut config = sizing_config_from_args(&args.lookup, args.ranges.resolve());
    config.curve_path = args.curve.clone();
    config.export_results = args.export.clone();
    config.export_curve = args.export_curve.clone();

    let builder = pipeline::curve_builder(&config)?;
    let lookup = pipeline::resolve_lookup(&config, &builder, &mut CurveCache::new())?;
    warn_on_optics_mismatch(&config, &lookup);

    let output = if args.events.is_empty() {
        pipeline::analyze_ratios(&config, lookup, &args.ratios)?
    } else {
        pipeline::analyze(&config, lookup, &MeasurementSet::new(args.events.clone()))?
    };

    print_analysis(&output, args.show);
    export_outputs(&config, &output)
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let mut config = sizing_config_from_args(&args.lookup, args.ranges.resolve());
    config.export_results = args.export.clone();
    config.export_curve = args.export_curve.clone();

    let builder = pipeline::curve_builder(&config)?;
    let lookup = pipeline::resolve_lookup(&config, &builder, &mut CurveCache::new())?;

    let synthetic = SyntheticConfig {
        count: args.count,
        seed: args.seed,
        mean_nm: args.mean_nm,
        std_nm: args.std_nm,
        ratio_noise: args.noise,
        invalid_fraction: args.invalid_fraction,
        ..SyntheticConfig::default()
    };
    let events = generate_events(&synthetic, &lookup.curve, &lookup.grid)?;
    info!(
        count = synthetic.count,
        seed = synthetic.seed,
        mean_nm = synthetic.mean_nm,
        std_nm = synthetic.std_nm,
        "synthetic events generated"
    );

    let output = pipeline::analyze(&config, lookup, &events.measurements)?;
    print_analysis(&output, args.show);

    let truth: Vec<f64> = output
        .kept_rows
        .iter()
        .map(|&row| events.true_diameters_nm[row])
        .collect();
    match report::compare_to_truth(&output.estimates, &truth) {
        Some(c) => println!("{}", report::format_truth_comparison(&c)),
        None => println!("Accuracy vs truth: no sized events."),
    }

    export_outputs(&config, &output)
}

/// Map shared CLI flags into a [`SizingConfig`].
pub fn sizing_config_from_args(args: &LookupArgs, size_ranges: Vec<SizeRange>) -> SizingConfig {
    SizingConfig {
        optical: OpticalParameters {
            wavelength_nm: args.wavelength,
            n_particle: args.n_particle,
            n_medium: args.n_medium,
            fsc_range: args.fsc,
            ssc_range: args.ssc,
        },
        d_min_nm: args.d_min,
        d_max_nm: args.d_max,
        diameter_points: args.points,
        scattering: args.scattering,
        cleaning: CleaningOptions {
            ignore_negative: !args.keep_negative,
            drop_missing: !args.keep_missing,
        },
        size_ranges,
        batch_rows: args.batch_rows,
        curve_path: None,
        export_results: None,
        export_curve: None,
    }
}

fn print_analysis(output: &AnalysisOutput, show: usize) {
    let lookup = &output.lookup;
    println!(
        "{}",
        report::format_run_header(&lookup.optical, &lookup.curve, &lookup.grid)
    );
    if show > 0 {
        println!("{}", report::format_estimates(&output.ratios, &output.estimates, show));
    }
    println!("{}", report::format_summary(&output.summary));
    let ranges = report::format_ranges(&output.ranges);
    if !ranges.is_empty() {
        println!("{ranges}");
    }
}

/// A loaded curve carries its own optics; flags that disagree are ignored.
fn warn_on_optics_mismatch(config: &SizingConfig, lookup: &Lookup) {
    if config.curve_path.is_some() && config.optical != lookup.optical {
        tracing::warn!(
            "optical flags differ from the loaded curve; the curve's optics are used"
        );
    }
}

fn export_curve(config: &SizingConfig, lookup: &Lookup) -> Result<(), AppError> {
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &lookup.curve, &lookup.grid, &lookup.optical)?;
        info!(path = %path.display(), "curve exported");
    }
    Ok(())
}

fn export_outputs(config: &SizingConfig, output: &AnalysisOutput) -> Result<(), AppError> {
    if let Some(path) = &config.export_results {
        let Some(measurements) = &output.measurements else {
            return Err(AppError::new(2, "Per-event export needs FSC/SSC events."));
        };
        crate::io::export::write_results_csv(path, measurements, &output.estimates)?;
        info!(path = %path.display(), rows = output.estimates.len(), "results exported");
    }
    export_curve(config, &output.lookup)
}
