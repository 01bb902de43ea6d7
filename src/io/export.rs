//! Export per-event results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Unknown values are written as `NaN` (ratios/diameters) or left empty (index).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{EstimationResult, MeasurementSet};
use crate::error::AppError;

/// Write per-event results to a CSV file.
///
/// `measurements` and `result` must be row-aligned (the cleaned event set the
/// ratios were derived from).
pub fn write_results_csv(
    path: &Path,
    measurements: &MeasurementSet,
    result: &EstimationResult,
) -> Result<(), AppError> {
    if measurements.len() != result.len() {
        return Err(AppError::new(
            4,
            format!(
                "Cannot export {} estimates for {} events.",
                result.len(),
                measurements.len()
            ),
        ));
    }

    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut file = BufWriter::new(file);

    writeln!(
        file,
        "event,fsc,ssc,measured_ratio,estimated_diameter_nm,matched_theoretical_ratio,matched_index"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, (m, row)) in measurements.events.iter().zip(result.rows()).enumerate() {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            i,
            m.fsc,
            m.ssc,
            m.ratio(),
            row.estimated_diameter_nm,
            row.matched_theoretical_ratio,
            row.matched_index.map(|v| v.to_string()).unwrap_or_default(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_row_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sizes.csv");

        let events = MeasurementSet::from_pairs(&[300.0, 10.0], &[100.0, 0.0]);
        let result = EstimationResult {
            estimated_diameter_nm: vec![90.0, f64::NAN],
            matched_theoretical_ratio: vec![3.1, f64::NAN],
            matched_index: vec![Some(12), None],
        };
        write_results_csv(&path, &events, &result).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0,300,100,3,90,3.1,12");
        assert_eq!(lines[2], "1,10,0,NaN,NaN,NaN,");
    }

    #[test]
    fn misaligned_rows_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let events = MeasurementSet::from_pairs(&[1.0], &[1.0]);
        let result = EstimationResult {
            estimated_diameter_nm: vec![],
            matched_theoretical_ratio: vec![],
            matched_index: vec![],
        };
        let err = write_results_csv(&dir.path().join("x.csv"), &events, &result).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
