use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::JobStatus;
use crate::error::RevenaError;
use crate::items::AuditItem;

/// Severity of a job log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A single line of a job's analysis log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub at: DateTime<Utc>,
    pub message: String,
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, kind: LogKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            at: Utc::now(),
            message: message.into(),
            kind,
        }
    }

    /// Wall-clock time of the entry as `HH:MM:SS`.
    pub fn timestamp(&self) -> String {
        self.at.with_timezone(&Local).format("%H:%M:%S").to_string()
    }
}

/// Hand-authored test document content, used instead of a real upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringData {
    pub patient_name: String,
    pub procedure: String,
    pub description: String,
}

impl AuthoringData {
    pub fn new(
        patient_name: impl Into<String>,
        procedure: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            patient_name: patient_name.into(),
            procedure: procedure.into(),
            description: description.into(),
        }
    }

    /// Every field is required.
    pub fn validate(&self) -> Result<(), RevenaError> {
        let fields = [
            ("patient name", &self.patient_name),
            ("procedure", &self.procedure),
            ("description", &self.description),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(RevenaError::IncompleteAuthoring(field));
            }
        }
        Ok(())
    }

    /// Synthetic document name, e.g. `Custom_Test_Maria_Silva.pdf`.
    pub fn filename(&self) -> String {
        let patient = self.patient_name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("Custom_Test_{patient}.pdf")
    }
}

/// One uploaded document and its audit lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditJob {
    pub id: String,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub status: JobStatus,
    pub progress_step: Option<String>,
    pub item_count: Option<usize>,
    pub authoring: Option<AuthoringData>,
    pub logs: Vec<LogEntry>,
    pub results: Option<Vec<AuditItem>>,
}

impl AuditJob {
    pub fn new(filename: String, authoring: Option<AuthoringData>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename,
            upload_date: Utc::now(),
            status: JobStatus::Queued,
            progress_step: None,
            item_count: None,
            authoring,
            logs: Vec::new(),
            results: None,
        }
    }

    /// Append a log entry, keeping timestamps non-decreasing.
    pub fn push_log(&mut self, mut entry: LogEntry) -> &LogEntry {
        if let Some(last) = self.logs.last() {
            if entry.at < last.at {
                entry.at = last.at;
            }
        }
        self.logs.push(entry);
        &self.logs[self.logs.len() - 1]
    }
}
