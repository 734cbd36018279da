//! CSV ingest for standards and unknowns.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no fitting logic here
//!
//! Standards: `name,dilution_factor,ct,copies`.
//! Unknowns: `name,ct[,dilution_factor]` (dilution defaults to 1).

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::warn;

use crate::domain::{StandardPoint, UnknownInput};
use crate::error::{AppError, EXIT_INVALID};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parsed rows plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub rows: Vec<T>,
    pub row_errors: Vec<RowError>,
}

pub fn load_standards_csv(path: &Path) -> Result<Ingested<StandardPoint>, AppError> {
    let file = open(path)?;
    read_standards(file)
}

pub fn load_unknowns_csv(path: &Path) -> Result<Ingested<UnknownInput>, AppError> {
    let file = open(path)?;
    read_unknowns(file)
}

pub fn read_standards<R: Read>(input: R) -> Result<Ingested<StandardPoint>, AppError> {
    read_rows(input, &["name", "dilution_factor", "ct", "copies"], |record, header| {
        let name = field(record, header, "name").unwrap_or_default().to_string();
        let dilution_factor = parse_f64(record, header, "dilution_factor")?;
        let ct = parse_f64(record, header, "ct")?;
        let copies = parse_f64(record, header, "copies")?;
        if !(dilution_factor.is_finite() && dilution_factor >= 1.0) {
            return Err(format!("dilution_factor must be >= 1, got {dilution_factor}"));
        }
        if !(ct.is_finite() && ct >= 0.0) {
            return Err(format!("ct must be non-negative, got {ct}"));
        }
        if !(copies.is_finite() && copies > 0.0) {
            return Err(format!("copies must be positive, got {copies}"));
        }
        Ok(StandardPoint {
            name,
            dilution_factor,
            ct,
            copies,
        })
    })
}

pub fn read_unknowns<R: Read>(input: R) -> Result<Ingested<UnknownInput>, AppError> {
    read_rows(input, &["name", "ct"], |record, header| {
        let name = field(record, header, "name").unwrap_or_default().to_string();
        let ct = parse_f64(record, header, "ct")?;
        let dilution_factor = match field(record, header, "dilution_factor") {
            Some(raw) if !raw.is_empty() => raw
                .parse::<f64>()
                .map_err(|_| format!("dilution_factor is not a number: '{raw}'"))?,
            _ => 1.0,
        };
        if !(ct.is_finite() && ct >= 0.0) {
            return Err(format!("ct must be non-negative, got {ct}"));
        }
        if !(dilution_factor.is_finite() && dilution_factor > 0.0) {
            return Err(format!("dilution_factor must be positive, got {dilution_factor}"));
        }
        Ok(UnknownInput {
            name,
            ct,
            dilution_factor,
        })
    })
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| {
        AppError::new(
            EXIT_INVALID,
            format!("Failed to open CSV '{}': {e}", path.display()),
        )
    })
}

fn read_rows<R, T, F>(input: R, required: &[&str], parse: F) -> Result<Ingested<T>, AppError>
where
    R: Read,
    F: Fn(&StringRecord, &HashMap<String, usize>) -> Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(EXIT_INVALID, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !header_map.contains_key(*col))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::new(
            EXIT_INVALID,
            format!("CSV is missing required column(s): {}", missing.join(", ")),
        ));
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; lines are 1-based.
        let line = idx + 2;
        let outcome = match result {
            Ok(record) => parse(&record, &header_map),
            Err(e) => Err(format!("CSV parse error: {e}")),
        };
        match outcome {
            Ok(row) => rows.push(row),
            Err(message) => {
                warn!("skipping CSV line {line}: {message}");
                row_errors.push(RowError { line, message });
            }
        }
    }

    Ok(Ingested { rows, row_errors })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace([' ', '-'], "_")
}

fn field<'a>(record: &'a StringRecord, header: &HashMap<String, usize>, col: &str) -> Option<&'a str> {
    header.get(col).and_then(|&idx| record.get(idx))
}

fn parse_f64(record: &StringRecord, header: &HashMap<String, usize>, col: &str) -> Result<f64, String> {
    let raw = field(record, header, col).unwrap_or_default();
    if raw.is_empty() {
        return Err(format!("missing value for '{col}'"));
    }
    raw.parse::<f64>()
        .map_err(|_| format!("{col} is not a number: '{raw}'"))
}
