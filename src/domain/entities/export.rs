use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    Single,
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPhase {
    #[default]
    Idle,
    Collecting,
    Archiving,
    Saving,
}

/// Coarse state shown by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSignal {
    #[default]
    Idle,
    Busy,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportOutcome {
    Completed { file_name: String, items: usize },
    PartialBatchFailure { file_name: String, succeeded: usize, failed: usize },
    Failed { message: String },
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStatus {
    pub signal: StatusSignal,
    pub phase: ExportPhase,
    pub mode: Option<ExportMode>,
    pub last_outcome: Option<ExportOutcome>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ExportStatus {
    fn default() -> Self {
        ExportStatus {
            signal: StatusSignal::Idle,
            phase: ExportPhase::Idle,
            mode: None,
            last_outcome: None,
            updated_at: Utc::now(),
        }
    }
}

impl ExportStatus {
    pub fn is_busy(&self) -> bool {
        self.phase != ExportPhase::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadTicket(pub Uuid);

impl DownloadTicket {
    pub fn new() -> Self {
        DownloadTicket(Uuid::new_v4())
    }
}

impl Default for DownloadTicket {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DownloadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Bytes handed to the browser as a single download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRendition {
    pub record_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub mode: ExportMode,
    pub ticket: Option<DownloadTicket>,
    pub file_name: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailedRendition>,
}

impl ExportReport {
    pub fn empty(mode: ExportMode) -> Self {
        ExportReport {
            mode,
            ticket: None,
            file_name: None,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Renditions gathered by one batch export, consumed by serialization.
#[derive(Debug, Default)]
pub struct ArchiveJob {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file_name: String, bytes: Vec<u8>) {
        self.entries.push(ArchiveEntry { file_name, bytes });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.entries
    }
}
