//! Export standards and unknowns to CSV.
//!
//! Records are flat, with the field names of the domain types, so the files
//! are easy to consume in spreadsheets or read back with `ingest`.

use std::io::Write;
use std::path::Path;

use crate::domain::{StandardPoint, UnknownSample};
use crate::error::{AppError, EXIT_INVALID};

pub fn write_standards_csv(path: &Path, points: &[StandardPoint]) -> Result<(), AppError> {
    let writer = csv::Writer::from_path(path).map_err(|e| create_error(path, e))?;
    write_records(writer, points)
}

pub fn write_unknowns_csv(path: &Path, samples: &[UnknownSample]) -> Result<(), AppError> {
    let writer = csv::Writer::from_path(path).map_err(|e| create_error(path, e))?;
    write_records(writer, samples)
}

/// Serialize records with a header row into any writer.
pub fn write_records<W: Write, T: serde::Serialize>(
    mut writer: csv::Writer<W>,
    records: &[T],
) -> Result<(), AppError> {
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::new(EXIT_INVALID, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_INVALID, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn create_error(path: &Path, e: csv::Error) -> AppError {
    AppError::new(
        EXIT_INVALID,
        format!("Failed to create export CSV '{}': {e}", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurveKey;

    fn to_string<T: serde::Serialize>(records: &[T]) -> String {
        let mut buf = Vec::new();
        write_records(csv::Writer::from_writer(&mut buf), records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn standards_have_flat_header() {
        let txt = to_string(&[StandardPoint {
            name: "Std1".to_string(),
            dilution_factor: 10.0,
            ct: 12.5,
            copies: 1e7,
        }]);
        let mut lines = txt.lines();
        assert_eq!(lines.next(), Some("name,dilution_factor,ct,copies"));
        assert_eq!(lines.next(), Some("Std1,10.0,12.5,10000000.0"));
    }

    #[test]
    fn unknowns_omit_curve_key() {
        let txt = to_string(&[UnknownSample {
            name: "U1".to_string(),
            ct: 20.0,
            dilution_factor: 2.0,
            copies: 350.5,
            out_of_range: false,
            curve_key: CurveKey(99),
        }]);
        assert_eq!(
            txt.lines().next(),
            Some("name,ct,dilution_factor,copies,out_of_range")
        );
        assert_eq!(txt.lines().nth(1), Some("U1,20.0,2.0,350.5,false"));
    }

    #[test]
    fn round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standards.csv");
        let points = crate::standards::build_dilution_series(1e8, 3, 10.0, 9.0, 3.0, &[]).unwrap();
        write_standards_csv(&path, &points).unwrap();

        let back = crate::io::load_standards_csv(&path).unwrap();
        assert!(back.row_errors.is_empty());
        assert_eq!(back.rows, points);
    }
}
