//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the numeric core stays clean and testable
//! - output changes are localized

use crate::domain::{DiameterGrid, EstimationResult, OpticalParameters, TheoreticalCurve};
use crate::report::{RangeReport, SizeSummary, TruthComparison};

/// Run header: optics, grid and the lookup that was used.
pub fn format_run_header(optical: &OpticalParameters, curve: &TheoreticalCurve, grid: &DiameterGrid) -> String {
    let o = optical;
    let mut out = String::new();

    out.push_str("=== evsize - EV sizing from FSC/SSC ratios ===\n");
    out.push_str(&format!(
        "Optics: lambda={:.1}nm | n_particle={:.3} | n_medium={:.3} | FSC {} | SSC {}\n",
        o.wavelength_nm, o.n_particle, o.n_medium, o.fsc_range, o.ssc_range
    ));
    out.push_str(&format!(
        "Grid: {} diameters in [{:.1}, {:.1}] nm\n",
        grid.len(),
        grid.min(),
        grid.max()
    ));
    out.push_str(&format!("Lookup: {}", curve.kind().display_name()));
    if curve.is_degenerate() {
        out.push_str(" (DEGENERATE: all-zero curve, every event matches the smallest diameter)");
    }
    out.push('\n');
    out
}

/// Diameter / ratio table of the lookup, every `stride`-th row.
pub fn format_curve_table(curve: &TheoreticalCurve, grid: &DiameterGrid, stride: usize) -> String {
    let stride = stride.max(1);
    let mut out = String::new();
    out.push_str(&format!("{:>6} {:>12} {:>14}\n", "idx", "diameter_nm", "ratio"));
    out.push_str(&format!("{:-<6} {:-<12} {:-<14}\n", "", "", ""));

    let last = grid.len().saturating_sub(1);
    for (i, (d, r)) in grid.as_slice().iter().zip(curve.ratios()).enumerate() {
        if i % stride != 0 && i != last {
            continue;
        }
        out.push_str(&format!("{i:>6} {d:>12.2} {r:>14.6e}\n"));
    }
    out
}

/// Summary statistics block.
pub fn format_summary(summary: &SizeSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Events: n={} | sized={} | unknown={}\n",
        summary.n_events,
        summary.n_sized,
        summary.n_unknown()
    ));
    out.push_str(&format!(
        "Size: mean={} | median={} | std={}\n",
        fmt_nm(summary.mean_nm),
        fmt_nm(summary.median_nm),
        fmt_nm(summary.std_nm)
    ));
    out.push_str(&format!(
        "Percentiles: D10={} | D50={} | D90={}\n",
        fmt_nm(summary.d10_nm),
        fmt_nm(summary.d50_nm),
        fmt_nm(summary.d90_nm)
    ));
    out
}

/// Size-range distribution table.
pub fn format_ranges(report: &RangeReport) -> String {
    let mut out = String::new();
    if report.counts.is_empty() {
        return out;
    }
    out.push_str("Size ranges:\n");
    out.push_str(&format!("{:<24} {:>14} {:>10} {:>8}\n", "range", "nm", "count", "pct"));
    out.push_str(&format!("{:-<24} {:-<14} {:-<10} {:-<8}\n", "", "", "", ""));
    for c in &report.counts {
        let bounds = format!("{}-{}", c.range.min_nm, c.range.max_nm);
        out.push_str(&format!(
            "{:<24} {:>14} {:>10} {:>7.1}%\n",
            truncate(&c.range.name, 24),
            bounds,
            c.count,
            c.percentage
        ));
    }
    if report.uncategorized > 0 {
        out.push_str(&format!("({} sized events outside all ranges)\n", report.uncategorized));
    }
    out
}

/// Per-event estimates next to their measured ratios (first `limit` rows).
pub fn format_estimates(measured_ratios: &[f64], result: &EstimationResult, limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>6} {:>14} {:>12} {:>14} {:>6}\n",
        "event", "measured", "diameter_nm", "matched", "idx"
    ));
    out.push_str(&format!("{:-<6} {:-<14} {:-<12} {:-<14} {:-<6}\n", "", "", "", "", ""));
    for (i, (m, row)) in measured_ratios.iter().zip(result.rows()).enumerate().take(limit) {
        let idx = row
            .matched_index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{i:>6} {:>14} {:>12} {:>14} {idx:>6}\n",
            fmt_opt(*m, 6),
            fmt_opt(row.estimated_diameter_nm, 2),
            fmt_opt(row.matched_theoretical_ratio, 6),
        ));
    }
    if result.len() > limit {
        out.push_str(&format!("... {} more events\n", result.len() - limit));
    }
    out
}

/// Accuracy of a synthetic run against its true diameters.
pub fn format_truth_comparison(c: &TruthComparison) -> String {
    format!(
        "Accuracy vs truth: n={} | MAE={:.2}nm | bias={:+.2}nm | max={:.2}nm\n",
        c.n_compared, c.mean_abs_error_nm, c.bias_nm, c.max_abs_error_nm
    )
}

fn fmt_nm(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.1}nm")).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_opt(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        "NaN".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
