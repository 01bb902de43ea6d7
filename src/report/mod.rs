//! Reporting utilities: size statistics, size-range bucketing, terminal output.

pub mod format;

pub use format::*;

use crate::domain::{EstimationResult, SizeRange};

/// Summary of the estimated size distribution.
///
/// Statistics are over sized events only; `None` when there are too few.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeSummary {
    pub n_events: usize,
    pub n_sized: usize,
    pub mean_nm: Option<f64>,
    pub median_nm: Option<f64>,
    /// Sample standard deviation (n - 1 denominator).
    pub std_nm: Option<f64>,
    pub d10_nm: Option<f64>,
    pub d50_nm: Option<f64>,
    pub d90_nm: Option<f64>,
}

impl SizeSummary {
    pub fn n_unknown(&self) -> usize {
        self.n_events - self.n_sized
    }
}

/// Events falling into one size range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCount {
    pub range: SizeRange,
    pub count: usize,
    /// Share of sized events (0-100).
    pub percentage: f64,
}

/// Size-range table plus events outside every range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReport {
    pub counts: Vec<RangeCount>,
    pub uncategorized: usize,
}

pub fn summarize(result: &EstimationResult) -> SizeSummary {
    let mut sized = result.sized_diameters();
    sized.sort_by(|a, b| a.total_cmp(b));

    let n = sized.len();
    let mean = (n > 0).then(|| sized.iter().sum::<f64>() / n as f64);
    let std = match mean {
        Some(m) if n > 1 => {
            let ss: f64 = sized.iter().map(|d| (d - m) * (d - m)).sum();
            Some((ss / (n as f64 - 1.0)).sqrt())
        }
        _ => None,
    };

    SizeSummary {
        n_events: result.len(),
        n_sized: n,
        mean_nm: mean,
        median_nm: percentile_sorted(&sized, 50.0),
        std_nm: std,
        d10_nm: percentile_sorted(&sized, 10.0),
        d50_nm: percentile_sorted(&sized, 50.0),
        d90_nm: percentile_sorted(&sized, 90.0),
    }
}

/// Count sized events per range (inclusive bounds; overlapping ranges each count).
pub fn count_ranges(result: &EstimationResult, ranges: &[SizeRange]) -> RangeReport {
    let sized = result.sized_diameters();
    let total = sized.len();

    let counts: Vec<RangeCount> = ranges
        .iter()
        .map(|range| {
            let count = sized.iter().filter(|&&d| range.contains(d)).count();
            let percentage = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            RangeCount {
                range: range.clone(),
                count,
                percentage,
            }
        })
        .collect();

    let counted: usize = counts.iter().map(|c| c.count).sum();
    RangeReport {
        counts,
        uncategorized: total.saturating_sub(counted),
    }
}

/// Percentile `p` (0-100) of ascending `sorted` with linear interpolation
/// between closest ranks.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Estimated vs. true diameters for synthetic runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthComparison {
    pub n_compared: usize,
    pub mean_abs_error_nm: f64,
    /// Signed mean of `estimated - true`.
    pub bias_nm: f64,
    pub max_abs_error_nm: f64,
}

/// Compare sized rows of `result` against `truth_nm` (row-aligned).
///
/// Returns `None` when no row has both a finite estimate and a finite truth.
pub fn compare_to_truth(result: &EstimationResult, truth_nm: &[f64]) -> Option<TruthComparison> {
    let errors: Vec<f64> = result
        .estimated_diameter_nm
        .iter()
        .zip(truth_nm)
        .filter(|(e, t)| e.is_finite() && t.is_finite())
        .map(|(e, t)| e - t)
        .collect();
    if errors.is_empty() {
        return None;
    }
    let n = errors.len() as f64;
    Some(TruthComparison {
        n_compared: errors.len(),
        mean_abs_error_nm: errors.iter().map(|e| e.abs()).sum::<f64>() / n,
        bias_nm: errors.iter().sum::<f64>() / n,
        max_abs_error_nm: errors.iter().fold(0.0, |acc, e| acc.max(e.abs())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RangePreset;

    fn result(diameters: &[f64]) -> EstimationResult {
        EstimationResult {
            estimated_diameter_nm: diameters.to_vec(),
            matched_theoretical_ratio: vec![1.0; diameters.len()],
            matched_index: diameters.iter().map(|d| d.is_finite().then_some(0)).collect(),
        }
    }

    #[test]
    fn percentiles_interpolate_between_ranks() {
        let v = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile_sorted(&v, 0.0), Some(10.0));
        assert_eq!(percentile_sorted(&v, 50.0), Some(30.0));
        assert_eq!(percentile_sorted(&v, 100.0), Some(50.0));
        assert!((percentile_sorted(&v, 10.0).unwrap() - 14.0).abs() < 1e-12);
        assert!((percentile_sorted(&v, 90.0).unwrap() - 46.0).abs() < 1e-12);
        assert_eq!(percentile_sorted(&[], 50.0), None);
    }

    #[test]
    fn summary_ignores_unknown_events() {
        let s = summarize(&result(&[60.0, f64::NAN, 80.0, 100.0, f64::NAN]));
        assert_eq!(s.n_events, 5);
        assert_eq!(s.n_sized, 3);
        assert_eq!(s.n_unknown(), 2);
        assert_eq!(s.mean_nm, Some(80.0));
        assert_eq!(s.median_nm, Some(80.0));
        assert!((s.std_nm.unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn summary_of_nothing_sized() {
        let s = summarize(&result(&[f64::NAN]));
        assert_eq!(s.n_sized, 0);
        assert_eq!(s.mean_nm, None);
        assert_eq!(s.std_nm, None);
        assert_eq!(s.d90_nm, None);

        let single = summarize(&result(&[75.0]));
        assert_eq!(single.mean_nm, Some(75.0));
        assert_eq!(single.std_nm, None);
    }

    #[test]
    fn range_counts_are_inclusive_with_uncategorized_rest() {
        let r = result(&[30.0, 99.0, 100.0, 150.0, 175.0, 250.0, f64::NAN]);
        let report = count_ranges(&r, &RangePreset::Default.ranges());

        let counts: Vec<usize> = report.counts.iter().map(|c| c.count).collect();
        // 100 and 150 sit on shared boundaries and count in both neighbours.
        assert_eq!(counts, vec![3, 2, 2]);
        assert!((report.counts[0].percentage - 50.0).abs() < 1e-12);
        // Overlap makes the counted total exceed the sized total.
        assert_eq!(report.uncategorized, 0);

        let exo = count_ranges(&r, &RangePreset::Exosome.ranges());
        assert_eq!(exo.counts[1].count, 2);
        assert_eq!(exo.uncategorized, 4);
    }

    #[test]
    fn truth_comparison_skips_unknown_rows() {
        let r = result(&[50.0, f64::NAN, 120.0]);
        let c = compare_to_truth(&r, &[52.0, 80.0, 110.0]).unwrap();
        assert_eq!(c.n_compared, 2);
        assert!((c.mean_abs_error_nm - 6.0).abs() < 1e-12);
        assert!((c.bias_nm - 4.0).abs() < 1e-12);
        assert_eq!(c.max_abs_error_nm, 10.0);

        assert!(compare_to_truth(&result(&[f64::NAN]), &[50.0]).is_none());
    }
}
