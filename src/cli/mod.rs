//! Command-line parsing for the EV sizing tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the scattering/estimation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AngleRange, Measurement, RangePreset, ScatteringModel, SizeRange};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "evsize", version, about = "EV diameter estimation from FSC/SSC ratios")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the theoretical ratio-vs-diameter curve and print it.
    Curve(CurveArgs),
    /// Estimate diameters for ratios or FSC/SSC pairs given on the command line.
    Estimate(EstimateArgs),
    /// Generate synthetic events from a known size distribution and size them.
    Simulate(SimulateArgs),
}

/// Optics, grid and cleaning options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct LookupArgs {
    /// Laser wavelength (nm).
    #[arg(long, default_value_t = 488.0)]
    pub wavelength: f64,

    /// Particle refractive index.
    #[arg(long, default_value_t = 1.38)]
    pub n_particle: f64,

    /// Medium refractive index.
    #[arg(long, default_value_t = 1.33)]
    pub n_medium: f64,

    /// Forward-scatter collection range, `LO:HI` degrees.
    #[arg(long, default_value = "1:15")]
    pub fsc: AngleRange,

    /// Side-scatter collection range, `LO:HI` degrees.
    #[arg(long, default_value = "85:95")]
    pub ssc: AngleRange,

    /// Smallest diameter of the lookup grid (nm).
    #[arg(long, default_value_t = 40.0)]
    pub d_min: f64,

    /// Largest diameter of the lookup grid (nm).
    #[arg(long, default_value_t = 180.0)]
    pub d_max: f64,

    /// Number of grid diameters.
    #[arg(long, default_value_t = 200)]
    pub points: usize,

    /// Scattering model for the lookup.
    #[arg(long, value_enum, default_value_t = ScatteringModel::Auto)]
    pub scattering: ScatteringModel,

    /// Keep negative FSC/SSC values instead of treating them as missing.
    #[arg(long)]
    pub keep_negative: bool,

    /// Keep events with a missing channel (they are reported as unknown).
    #[arg(long)]
    pub keep_missing: bool,

    /// Measurements per difference-matrix block.
    #[arg(long, default_value_t = crate::estimate::DEFAULT_BATCH_ROWS)]
    pub batch_rows: usize,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    #[command(flatten)]
    pub lookup: LookupArgs,

    /// Print every N-th grid row.
    #[arg(long, default_value_t = 10)]
    pub stride: usize,

    /// Export the curve (optics + grid + ratios) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Size-range selection shared by `estimate` and `simulate`.
#[derive(Debug, Args, Clone)]
pub struct RangeArgs {
    /// Custom size range `NAME:MIN:MAX` (nm); repeatable. Overrides `--preset`.
    #[arg(long = "range")]
    pub ranges: Vec<SizeRange>,

    /// Built-in size-range preset.
    #[arg(long, value_enum, default_value_t = RangePreset::Default)]
    pub preset: RangePreset,
}

impl RangeArgs {
    pub fn resolve(&self) -> Vec<SizeRange> {
        if self.ranges.is_empty() {
            self.preset.ranges()
        } else {
            self.ranges.clone()
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub lookup: LookupArgs,

    #[command(flatten)]
    pub ranges: RangeArgs,

    /// Measured FSC/SSC ratio; repeatable. Use `nan` for an unknown value.
    #[arg(long = "ratio", allow_negative_numbers = true, conflicts_with = "events")]
    pub ratios: Vec<f64>,

    /// Raw event `FSC,SSC`; repeatable.
    #[arg(long = "event", allow_negative_numbers = true)]
    pub events: Vec<Measurement>,

    /// Reuse a curve JSON from `evsize curve --export-curve` instead of building one.
    #[arg(long)]
    pub curve: Option<PathBuf>,

    /// Rows of the per-event table to print.
    #[arg(long, default_value_t = 50)]
    pub show: usize,

    /// Export per-event results to CSV (requires `--event`).
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the curve that was used to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub lookup: LookupArgs,

    #[command(flatten)]
    pub ranges: RangeArgs,

    /// Number of synthetic events.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Mean particle diameter (nm).
    #[arg(long, default_value_t = 100.0)]
    pub mean_nm: f64,

    /// Standard deviation of the particle diameter (nm).
    #[arg(long, default_value_t = 30.0)]
    pub std_nm: f64,

    /// Log-scale sigma of multiplicative ratio noise.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Share of corrupted events (zero SSC, missing or negative channel).
    #[arg(long, default_value_t = 0.02)]
    pub invalid_fraction: f64,

    /// Rows of the per-event table to print.
    #[arg(long, default_value_t = 20)]
    pub show: usize,

    /// Export per-event results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the curve that was used to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn estimate_parses_events_and_ranges() {
        let cli = Cli::parse_from([
            "evsize",
            "estimate",
            "--event",
            "100,50",
            "--event",
            "3.5,0",
            "--range",
            "Tiny:10:40",
            "--fsc",
            "2:20",
        ]);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.events.len(), 2);
        assert_eq!(args.events[0], Measurement { fsc: 100.0, ssc: 50.0 });
        assert_eq!(args.lookup.fsc, AngleRange::new(2.0, 20.0));
        assert_eq!(args.lookup.ssc, AngleRange::new(85.0, 95.0));
        let ranges = args.ranges.resolve();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Tiny");
    }

    #[test]
    fn preset_applies_without_custom_ranges() {
        let cli = Cli::parse_from(["evsize", "simulate", "--preset", "exosome", "-n", "10"]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.count, 10);
        let ranges = args.ranges.resolve();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].min_nm, 40.0);
    }
}
