//! Read/write session JSON files.
//!
//! A session is the portable state of a quantification run:
//! - the standards (names, dilutions, Ct, copies)
//! - the unknown sample inputs
//! - QC thresholds and bootstrap settings
//! - the audit log
//!
//! Fitted values are written for convenience only. A loaded session is always
//! refit from its standards.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::audit::AuditLog;
use crate::domain::{BootstrapSettings, QcThresholds, StandardPoint, UnknownInput};
use crate::error::{AppError, EXIT_INVALID};

pub const SESSION_TOOL: &str = "qpcr";
pub const SESSION_VERSION: u32 = 1;

/// Fit summary stored next to the inputs (informational).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSnapshot {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub efficiency_pct: f64,
    pub lod_copies: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub tool: String,
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub standards: Vec<StandardPoint>,
    #[serde(default)]
    pub unknowns: Vec<UnknownInput>,
    #[serde(default)]
    pub thresholds: QcThresholds,
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
    #[serde(default)]
    pub fit: Option<FitSnapshot>,
    #[serde(default)]
    pub audit: AuditLog,
}

pub fn write_session_json(path: &Path, session: &SessionFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            EXIT_INVALID,
            format!("Failed to create session JSON '{}': {e}", path.display()),
        )
    })?;

    serde_json::to_writer_pretty(file, session)
        .map_err(|e| AppError::new(EXIT_INVALID, format!("Failed to write session JSON: {e}")))?;

    Ok(())
}

pub fn read_session_json(path: &Path) -> Result<SessionFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            EXIT_INVALID,
            format!("Failed to open session JSON '{}': {e}", path.display()),
        )
    })?;
    let session: SessionFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(EXIT_INVALID, format!("Invalid session JSON: {e}")))?;

    if session.tool != SESSION_TOOL {
        return Err(AppError::new(
            EXIT_INVALID,
            format!("'{}' is not a {SESSION_TOOL} session (tool = '{}')", path.display(), session.tool),
        ));
    }
    if session.version > SESSION_VERSION {
        return Err(AppError::new(
            EXIT_INVALID,
            format!(
                "Session version {} is newer than supported version {SESSION_VERSION}",
                session.version
            ),
        ));
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionFile {
        let mut audit = AuditLog::new();
        audit.record("Standards defined");
        SessionFile {
            tool: SESSION_TOOL.to_string(),
            version: SESSION_VERSION,
            saved_at: Utc::now(),
            standards: crate::standards::build_dilution_series(1e9, 4, 10.0, 9.0, 3.3, &[]).unwrap(),
            unknowns: vec![UnknownInput {
                name: "U1".to_string(),
                ct: 17.5,
                dilution_factor: 1.0,
            }],
            thresholds: QcThresholds::default(),
            bootstrap: BootstrapSettings::default(),
            fit: None,
            audit,
        }
    }

    #[test]
    fn session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let original = session();
        write_session_json(&path, &original).unwrap();
        let loaded = read_session_json(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        let mut other = session();
        other.tool = "other-tool".to_string();
        write_session_json(&path, &other).unwrap();
        assert_eq!(read_session_json(&path).unwrap_err().exit_code(), EXIT_INVALID);
    }
}
