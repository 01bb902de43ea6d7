//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a theoretical lookup:
//! - the optics it was built for
//! - which scattering model produced it (and whether it is degenerate)
//! - the diameter grid and the matching ratios
//!
//! The schema is defined by `domain::CurveFile`. A saved curve can be passed
//! back to `evsize estimate --curve` to skip rebuilding.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveFile, CurveGrid, DiameterGrid, OpticalParameters, TheoreticalCurve};
use crate::error::AppError;

/// Write a curve JSON file.
pub fn write_curve_json(
    path: &Path,
    curve: &TheoreticalCurve,
    grid: &DiameterGrid,
    optical: &OpticalParameters,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    let curve_file = CurveFile {
        tool: "evsize".to_string(),
        generated_at: Utc::now(),
        scattering: curve.kind(),
        degenerate: curve.is_degenerate(),
        optical: *optical,
        grid: CurveGrid {
            diameter_nm: grid.as_slice().to_vec(),
            ratio: curve.ratios().to_vec(),
        },
    };

    serde_json::to_writer_pretty(BufWriter::new(file), &curve_file)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScatteringKind;

    #[test]
    fn curve_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");

        let grid = DiameterGrid::new(vec![40.0, 60.0, 80.0]).unwrap();
        let curve =
            TheoreticalCurve::from_ratios(vec![0.5, 1.25, 1.25], ScatteringKind::Surrogate).unwrap();
        let optical = OpticalParameters::default();
        write_curve_json(&path, &curve, &grid, &optical).unwrap();

        let loaded = read_curve_json(&path).unwrap();
        assert_eq!(loaded.tool, "evsize");
        assert_eq!(loaded.optical, optical);
        assert!(!loaded.degenerate);

        let (curve2, grid2) = loaded.into_lookup().unwrap();
        assert_eq!(curve2, curve);
        assert_eq!(grid2, grid);
    }

    #[test]
    fn tampered_curve_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        let grid = DiameterGrid::new(vec![40.0, 60.0]).unwrap();
        let curve = TheoreticalCurve::from_ratios(vec![1.0, 2.0], ScatteringKind::Mie).unwrap();
        write_curve_json(&path, &curve, &grid, &OpticalParameters::default()).unwrap();

        let mut loaded = read_curve_json(&path).unwrap();
        loaded.grid.ratio = vec![2.0, 1.0];
        assert!(loaded.into_lookup().is_err());

        assert!(read_curve_json(&dir.path().join("missing.json")).is_err());
    }
}
