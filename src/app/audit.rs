//! Timestamped record of what a run did.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current time.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.entries.push(AuditEntry {
            at: Utc::now(),
            message,
        });
    }

    /// Append entries carried over from an earlier run.
    pub fn extend(&mut self, earlier: AuditLog) {
        self.entries.extend(earlier.entries);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per entry: `<RFC 3339 time> - <message>`.
    pub fn format(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("{} - {}\n", entry.at.to_rfc3339(), entry.message));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut log = AuditLog::new();
        log.record("Standards defined");
        log.record("Curve fitted");
        let messages: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Standards defined", "Curve fitted"]);
        assert!(log.entries()[0].at <= log.entries()[1].at);
        assert_eq!(log.format().lines().count(), 2);
        assert!(log.format().lines().next().unwrap().ends_with(" - Standards defined"));
    }
}
