//! Nearest-ratio matching.
//!
//! For every finite measured ratio we pick the grid index whose theoretical
//! ratio has the smallest absolute difference (first index wins on ties).
//!
//! The comparison is done as a matrix operation: valid measurements are split
//! into blocks and each block forms an `n_diameters x n_block` matrix of
//! `|curve_i - measured_j|`; the argmin of each column is that measurement's
//! match. Blocks bound the transient memory to `n_diameters * batch_rows`
//! values and are evaluated in parallel, then reassembled in input order.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{DiameterGrid, EstimationResult, TheoreticalCurve};
use crate::error::SizingError;

/// Default measurements per difference-matrix block.
pub const DEFAULT_BATCH_ROWS: usize = 8192;

/// Estimate a diameter for every measured ratio.
///
/// Non-finite ratios yield NaN diameter/ratio and no index. The output always
/// has `measured_ratios.len()` rows.
pub fn estimate_diameters(
    measured_ratios: &[f64],
    curve: &TheoreticalCurve,
    diameters: &DiameterGrid,
) -> Result<EstimationResult, SizingError> {
    estimate_diameters_batched(measured_ratios, curve, diameters, DEFAULT_BATCH_ROWS)
}

/// [`estimate_diameters`] with an explicit block size.
pub fn estimate_diameters_batched(
    measured_ratios: &[f64],
    curve: &TheoreticalCurve,
    diameters: &DiameterGrid,
    batch_rows: usize,
) -> Result<EstimationResult, SizingError> {
    if curve.len() != diameters.len() {
        return Err(SizingError::LengthMismatch {
            curve: curve.len(),
            diameters: diameters.len(),
        });
    }
    let batch_rows = batch_rows.max(1);
    let theoretical = curve.ratios();
    let grid = diameters.as_slice();

    let valid_rows: Vec<usize> = measured_ratios
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.is_finite().then_some(i))
        .collect();
    let valid_values: Vec<f64> = valid_rows.iter().map(|&i| measured_ratios[i]).collect();

    let matches: Vec<usize> = valid_values
        .par_chunks(batch_rows)
        .flat_map_iter(|block| nearest_indices(block, theoretical))
        .collect();

    let n = measured_ratios.len();
    let mut out = EstimationResult {
        estimated_diameter_nm: vec![f64::NAN; n],
        matched_theoretical_ratio: vec![f64::NAN; n],
        matched_index: vec![None; n],
    };
    for (&row, &idx) in valid_rows.iter().zip(&matches) {
        out.estimated_diameter_nm[row] = grid[idx];
        out.matched_theoretical_ratio[row] = theoretical[idx];
        out.matched_index[row] = Some(idx);
    }
    Ok(out)
}

/// Column-wise argmin of the block's absolute-difference matrix.
fn nearest_indices(block: &[f64], theoretical: &[f64]) -> Vec<usize> {
    let diffs = DMatrix::from_fn(theoretical.len(), block.len(), |i, j| {
        (block[j] - theoretical[i]).abs()
    });
    diffs
        .column_iter()
        .map(|col| first_argmin(col.iter().copied()))
        .collect()
}

/// Index of the smallest value; the earliest one wins ties.
fn first_argmin(values: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::INFINITY;
    for (i, v) in values.enumerate() {
        if v < best {
            best = v;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScatteringKind;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn lookup(diameters: &[f64], ratios: &[f64]) -> (TheoreticalCurve, DiameterGrid) {
        (
            TheoreticalCurve::from_ratios(ratios.to_vec(), ScatteringKind::Surrogate).unwrap(),
            DiameterGrid::new(diameters.to_vec()).unwrap(),
        )
    }

    /// Independent per-measurement scan used as the reference.
    fn nearest_scalar(measured: f64, theoretical: &[f64]) -> usize {
        let mut best = 0;
        for i in 1..theoretical.len() {
            if (measured - theoretical[i]).abs() < (measured - theoretical[best]).abs() {
                best = i;
            }
        }
        best
    }

    #[test]
    fn matches_nearest_and_clamps_to_ends() {
        let (curve, grid) = lookup(&[10.0, 20.0, 30.0], &[1.0, 2.0, 3.0]);
        let out = estimate_diameters(&[1.1, 2.9, f64::NAN, 5.0], &curve, &grid).unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(out.estimated_diameter_nm[0], 10.0);
        assert_eq!(out.estimated_diameter_nm[1], 30.0);
        assert!(out.estimated_diameter_nm[2].is_nan());
        assert_eq!(out.estimated_diameter_nm[3], 30.0);

        assert_eq!(out.matched_index, vec![Some(0), Some(2), None, Some(2)]);
        assert_eq!(out.matched_theoretical_ratio[3], 3.0);
        assert!(out.matched_theoretical_ratio[2].is_nan());
    }

    #[test]
    fn ties_resolve_to_smallest_index() {
        let (curve, grid) = lookup(&[10.0, 20.0, 30.0], &[1.0, 1.0, 2.0]);
        let out = estimate_diameters(&[1.0], &curve, &grid).unwrap();
        assert_eq!(out.matched_index, vec![Some(0)]);
        assert_eq!(out.estimated_diameter_nm, vec![10.0]);

        // Equidistant between two distinct ratios: the lower index wins.
        let (curve, grid) = lookup(&[10.0, 20.0], &[1.0, 3.0]);
        let out = estimate_diameters(&[2.0], &curve, &grid).unwrap();
        assert_eq!(out.matched_index, vec![Some(0)]);
    }

    #[test]
    fn output_length_follows_input_whatever_is_unknown() {
        let (curve, grid) = lookup(&[10.0, 20.0, 30.0], &[1.0, 2.0, 3.0]);
        for input in [
            vec![],
            vec![f64::NAN; 7],
            vec![f64::INFINITY, 1.0, f64::NEG_INFINITY],
        ] {
            let out = estimate_diameters(&input, &curve, &grid).unwrap();
            assert_eq!(out.len(), input.len());
            assert_eq!(out.matched_theoretical_ratio.len(), input.len());
            assert_eq!(out.matched_index.len(), input.len());
        }
    }

    #[test]
    fn mismatched_lookup_is_fatal() {
        let curve =
            TheoreticalCurve::from_ratios(vec![1.0, 2.0, 3.0], ScatteringKind::Surrogate).unwrap();
        let grid = DiameterGrid::new(vec![10.0, 20.0]).unwrap();
        assert_eq!(
            estimate_diameters(&[1.0], &curve, &grid),
            Err(SizingError::LengthMismatch {
                curve: 3,
                diameters: 2
            })
        );
    }

    #[test]
    fn zero_curve_matches_everything_to_first_diameter() {
        let curve = TheoreticalCurve::zeros(4, ScatteringKind::Mie);
        let grid = DiameterGrid::new(vec![40.0, 80.0, 120.0, 160.0]).unwrap();
        let out = estimate_diameters(&[0.5, 10.0, 1e6], &curve, &grid).unwrap();
        assert_eq!(out.estimated_diameter_nm, vec![40.0, 40.0, 40.0]);
    }

    #[test]
    fn batched_matches_scalar_reference_and_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = DiameterGrid::linspace(40.0, 180.0, 97).unwrap();
        let mut ratios: Vec<f64> = (0..97).map(|_| rng.gen_range(0.0..5.0)).collect();
        ratios.sort_by(|a, b| a.partial_cmp(b).unwrap());
        // Force a few plateaus so tie-breaking is exercised.
        ratios[10] = ratios[9];
        ratios[11] = ratios[9];
        let curve = TheoreticalCurve::from_ratios(ratios, ScatteringKind::Surrogate).unwrap();

        let measured: Vec<f64> = (0..5_000)
            .map(|i| {
                if i % 13 == 0 {
                    f64::NAN
                } else if i % 17 == 0 {
                    curve.ratios()[9]
                } else {
                    rng.gen_range(-1.0..6.0)
                }
            })
            .collect();

        // Small blocks to cross many block boundaries.
        let out = estimate_diameters_batched(&measured, &curve, &grid, 64).unwrap();
        for (row, &m) in measured.iter().enumerate() {
            if m.is_finite() {
                let idx = nearest_scalar(m, curve.ratios());
                assert_eq!(out.matched_index[row], Some(idx), "row {row}, ratio {m}");
                assert_eq!(out.estimated_diameter_nm[row], grid.as_slice()[idx]);
            } else {
                assert_eq!(out.matched_index[row], None);
            }
        }

        let again = estimate_diameters(&measured, &curve, &grid).unwrap();
        assert_eq!(out.matched_index, again.matched_index);
        for (a, b) in out.estimated_diameter_nm.iter().zip(&again.estimated_diameter_nm) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}
