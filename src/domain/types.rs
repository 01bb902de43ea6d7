//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the lookup builder, the estimator and the reporting layer
//! - exported to JSON/CSV
//! - reloaded later (a saved curve can be reused instead of rebuilt)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SizingError;

/// Angular acceptance of a detector channel, in degrees.
///
/// Both ends are inclusive when selecting angular samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub lo: f64,
    pub hi: f64,
}

impl AngleRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, angle_deg: f64) -> bool {
        angle_deg >= self.lo && angle_deg <= self.hi
    }

    /// Check `0 <= lo < hi <= 180`.
    pub fn validate(&self, name: &'static str) -> Result<(), SizingError> {
        let ok = self.lo.is_finite()
            && self.hi.is_finite()
            && self.lo >= 0.0
            && self.hi <= 180.0
            && self.lo < self.hi;
        if ok {
            Ok(())
        } else {
            Err(SizingError::invalid(
                name,
                format!(
                    "range [{}, {}] deg must satisfy 0 <= lo < hi <= 180",
                    self.lo, self.hi
                ),
            ))
        }
    }
}

impl fmt::Display for AngleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} deg", self.lo, self.hi)
    }
}

/// Parses `LO:HI` (e.g. `1:15`).
impl FromStr for AngleRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lo, hi) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LO:HI, got '{s}'"))?;
        let lo: f64 = lo.trim().parse().map_err(|e| format!("bad lower angle '{lo}': {e}"))?;
        let hi: f64 = hi.trim().parse().map_err(|e| format!("bad upper angle '{hi}': {e}"))?;
        Ok(AngleRange::new(lo, hi))
    }
}

/// Instrument optics used to build the theoretical lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticalParameters {
    /// Laser wavelength in vacuum (nm).
    pub wavelength_nm: f64,
    pub n_particle: f64,
    pub n_medium: f64,
    pub fsc_range: AngleRange,
    pub ssc_range: AngleRange,
}

impl Default for OpticalParameters {
    /// 488 nm laser, EVs (n = 1.38) in buffer (n = 1.33).
    fn default() -> Self {
        Self {
            wavelength_nm: 488.0,
            n_particle: 1.38,
            n_medium: 1.33,
            fsc_range: AngleRange::new(1.0, 15.0),
            ssc_range: AngleRange::new(85.0, 95.0),
        }
    }
}

impl OpticalParameters {
    pub fn validate(&self) -> Result<(), SizingError> {
        positive_finite("wavelength", self.wavelength_nm)?;
        positive_finite("particle refractive index", self.n_particle)?;
        positive_finite("medium refractive index", self.n_medium)?;
        self.fsc_range.validate("FSC angle range")?;
        self.ssc_range.validate("SSC angle range")?;
        Ok(())
    }

    /// Particle index relative to the medium.
    pub fn relative_index(&self) -> f64 {
        self.n_particle / self.n_medium
    }

    /// Wavelength inside the medium (nm).
    pub fn medium_wavelength_nm(&self) -> f64 {
        self.wavelength_nm / self.n_medium
    }
}

fn positive_finite(name: &'static str, value: f64) -> Result<(), SizingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SizingError::invalid(name, format!("{value} must be finite and > 0")))
    }
}

/// Candidate diameters (nm), strictly increasing, at least two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DiameterGrid {
    values: Vec<f64>,
}

impl DiameterGrid {
    pub fn new(values: Vec<f64>) -> Result<Self, SizingError> {
        if values.len() < 2 {
            return Err(SizingError::invalid(
                "diameter grid",
                format!("needs at least 2 points, got {}", values.len()),
            ));
        }
        if let Some(bad) = values.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(SizingError::invalid(
                "diameter grid",
                format!("diameter {bad} must be finite and > 0"),
            ));
        }
        if values.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SizingError::invalid(
                "diameter grid",
                "diameters must be strictly increasing",
            ));
        }
        Ok(Self { values })
    }

    /// `points` evenly spaced diameters from `min_nm` to `max_nm` (inclusive).
    pub fn linspace(min_nm: f64, max_nm: f64, points: usize) -> Result<Self, SizingError> {
        if !(min_nm.is_finite() && max_nm.is_finite() && min_nm > 0.0 && max_nm > min_nm) {
            return Err(SizingError::invalid(
                "diameter range",
                format!("min={min_nm}, max={max_nm} (must be finite, > 0 and max > min)"),
            ));
        }
        if points < 2 {
            return Err(SizingError::invalid(
                "diameter points",
                format!("{points} (must be >= 2)"),
            ));
        }
        Self::new(crate::math::linspace(min_nm, max_nm, points))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

impl TryFrom<Vec<f64>> for DiameterGrid {
    type Error = SizingError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        DiameterGrid::new(values)
    }
}

impl From<DiameterGrid> for Vec<f64> {
    fn from(grid: DiameterGrid) -> Self {
        grid.values
    }
}

/// Which scattering model the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScatteringModel {
    /// Mie when available, otherwise the surrogate.
    Auto,
    Mie,
    Surrogate,
}

/// Which scattering model actually produced a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScatteringKind {
    Mie,
    Surrogate,
}

impl ScatteringKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ScatteringKind::Mie => "Mie",
            ScatteringKind::Surrogate => "power-law surrogate",
        }
    }
}

/// Calibration of the closed-form surrogate `A * D^p / (B + D^q)`.
///
/// The constants are a policy choice tuned for EVs (roughly 10-500 nm), not a
/// physical law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurrogateParams {
    pub a: f64,
    pub p: f64,
    pub b: f64,
    pub q: f64,
}

impl Default for SurrogateParams {
    fn default() -> Self {
        Self {
            a: 1e-6,
            p: 5.5,
            b: 1e-2,
            q: 3.0,
        }
    }
}

/// Expected FSC/SSC ratio per grid diameter.
///
/// Invariant: finite, non-negative and non-decreasing in diameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TheoreticalCurve {
    ratios: Vec<f64>,
    kind: ScatteringKind,
    /// True when no diameter produced a usable ratio and the curve is all zeros.
    degenerate: bool,
}

impl TheoreticalCurve {
    /// Wrap precomputed ratios, checking the curve invariant.
    pub fn from_ratios(ratios: Vec<f64>, kind: ScatteringKind) -> Result<Self, SizingError> {
        if ratios.is_empty() {
            return Err(SizingError::invalid("theoretical curve", "no ratios"));
        }
        if let Some(bad) = ratios.iter().find(|r| !(r.is_finite() && **r >= 0.0)) {
            return Err(SizingError::invalid(
                "theoretical curve",
                format!("ratio {bad} must be finite and >= 0"),
            ));
        }
        if ratios.windows(2).any(|w| w[1] < w[0]) {
            return Err(SizingError::invalid(
                "theoretical curve",
                "ratios must be non-decreasing in diameter",
            ));
        }
        let degenerate = ratios.iter().all(|r| *r == 0.0);
        Ok(Self {
            ratios,
            kind,
            degenerate,
        })
    }

    /// All-zero fallback used when every diameter failed.
    pub fn zeros(len: usize, kind: ScatteringKind) -> Self {
        Self {
            ratios: vec![0.0; len],
            kind,
            degenerate: true,
        }
    }

    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn kind(&self) -> ScatteringKind {
        self.kind
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}

/// One detected event: raw forward and side scatter intensities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub fsc: f64,
    pub ssc: f64,
}

/// Ordered events of one acquisition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub events: Vec<Measurement>,
}

/// Parses `FSC,SSC` (e.g. `1520.5,310`).
impl FromStr for Measurement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (fsc, ssc) = s
            .split_once(',')
            .ok_or_else(|| format!("expected FSC,SSC, got '{s}'"))?;
        let fsc: f64 = fsc.trim().parse().map_err(|e| format!("bad FSC value '{fsc}': {e}"))?;
        let ssc: f64 = ssc.trim().parse().map_err(|e| format!("bad SSC value '{ssc}': {e}"))?;
        Ok(Measurement { fsc, ssc })
    }
}

/// Event cleaning applied before ratios are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningOptions {
    /// Treat negative channel values as missing.
    pub ignore_negative: bool,
    /// Drop events whose FSC or SSC is missing after cleaning.
    pub drop_missing: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            ignore_negative: true,
            drop_missing: true,
        }
    }
}

/// Estimator output, one entry per input measurement (column layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Estimated diameter (nm); NaN for unknown inputs.
    pub estimated_diameter_nm: Vec<f64>,
    /// Matched curve ratio; NaN for unknown inputs.
    pub matched_theoretical_ratio: Vec<f64>,
    /// Index into the diameter grid; `None` for unknown inputs.
    pub matched_index: Vec<Option<usize>>,
}

impl EstimationResult {
    pub fn len(&self) -> usize {
        self.estimated_diameter_nm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimated_diameter_nm.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = EstimateRow> + '_ {
        self.estimated_diameter_nm
            .iter()
            .zip(&self.matched_theoretical_ratio)
            .zip(&self.matched_index)
            .map(|((&d, &r), &i)| EstimateRow {
                estimated_diameter_nm: d,
                matched_theoretical_ratio: r,
                matched_index: i,
            })
    }

    /// Finite estimated diameters only.
    pub fn sized_diameters(&self) -> Vec<f64> {
        self.estimated_diameter_nm
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .collect()
    }
}

/// Row view of an `EstimationResult`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateRow {
    pub estimated_diameter_nm: f64,
    pub matched_theoretical_ratio: f64,
    pub matched_index: Option<usize>,
}

/// Named diameter bucket (nm), inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub name: String,
    pub min_nm: f64,
    pub max_nm: f64,
}

impl SizeRange {
    pub fn new(name: impl Into<String>, min_nm: f64, max_nm: f64) -> Self {
        Self {
            name: name.into(),
            min_nm,
            max_nm,
        }
    }

    pub fn contains(&self, diameter_nm: f64) -> bool {
        diameter_nm >= self.min_nm && diameter_nm <= self.max_nm
    }
}

/// Parses `NAME:MIN:MAX` (e.g. `Exosomes:40:80`).
impl FromStr for SizeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(max), Some(min), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected NAME:MIN:MAX, got '{s}'"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err("size range name must not be empty".to_string());
        }
        let min_nm: f64 = min.trim().parse().map_err(|e| format!("bad minimum '{min}': {e}"))?;
        let max_nm: f64 = max.trim().parse().map_err(|e| format!("bad maximum '{max}': {e}"))?;
        if !(min_nm.is_finite() && max_nm.is_finite() && min_nm < max_nm) {
            return Err(format!("size range '{name}' needs MIN < MAX"));
        }
        Ok(SizeRange::new(name, min_nm, max_nm))
    }
}

/// Built-in size range sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RangePreset {
    /// Small / medium / large EVs (30-100, 100-150, 150-200 nm).
    Default,
    /// Standard EV categorisation (30-100, 100-150 nm).
    Standard,
    /// Exosome-focused (40-80, 80-120 nm).
    Exosome,
}

impl RangePreset {
    pub fn ranges(self) -> Vec<SizeRange> {
        match self {
            RangePreset::Default => vec![
                SizeRange::new("Small EVs", 30.0, 100.0),
                SizeRange::new("Medium EVs", 100.0, 150.0),
                SizeRange::new("Large EVs", 150.0, 200.0),
            ],
            RangePreset::Standard => vec![
                SizeRange::new("Small EVs (30-100)", 30.0, 100.0),
                SizeRange::new("Medium EVs (100-150)", 100.0, 150.0),
            ],
            RangePreset::Exosome => vec![
                SizeRange::new("Exosomes (40-80)", 40.0, 80.0),
                SizeRange::new("Small MVs (80-120)", 80.0, 120.0),
            ],
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct SizingConfig {
    pub optical: OpticalParameters,

    pub d_min_nm: f64,
    pub d_max_nm: f64,
    pub diameter_points: usize,

    pub scattering: ScatteringModel,
    pub cleaning: CleaningOptions,
    pub size_ranges: Vec<SizeRange>,

    /// Rows per difference-matrix block in the estimator.
    pub batch_rows: usize,

    /// Reuse a previously exported curve instead of building one.
    pub curve_path: Option<PathBuf>,
    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            optical: OpticalParameters::default(),
            d_min_nm: 40.0,
            d_max_nm: 180.0,
            diameter_points: 200,
            scattering: ScatteringModel::Auto,
            cleaning: CleaningOptions::default(),
            size_ranges: RangePreset::Default.ranges(),
            batch_rows: crate::estimate::DEFAULT_BATCH_ROWS,
            curve_path: None,
            export_results: None,
            export_curve: None,
        }
    }
}

impl SizingConfig {
    pub fn diameter_grid(&self) -> Result<DiameterGrid, SizingError> {
        DiameterGrid::linspace(self.d_min_nm, self.d_max_nm, self.diameter_points)
    }
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub scattering: ScatteringKind,
    pub degenerate: bool,
    pub optical: OpticalParameters,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub diameter_nm: Vec<f64>,
    pub ratio: Vec<f64>,
}

impl CurveFile {
    /// Validate the stored lookup and split it into curve + grid.
    pub fn into_lookup(self) -> Result<(TheoreticalCurve, DiameterGrid), SizingError> {
        let grid = DiameterGrid::new(self.grid.diameter_nm)?;
        let curve = TheoreticalCurve::from_ratios(self.grid.ratio, self.scattering)?;
        if curve.len() != grid.len() {
            return Err(SizingError::LengthMismatch {
                curve: curve.len(),
                diameters: grid.len(),
            });
        }
        Ok((curve, grid))
    }
}
