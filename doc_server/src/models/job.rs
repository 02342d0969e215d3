//! docproc.job — one upload batch moving through the processor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::output_file::OutputFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Convert,
    Brand,
}

impl StepAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::Brand => "brand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Success,
    Failure,
    Skipped,
}

/// One unit of work against one file, with its timing.
#[derive(Debug, Clone, Serialize)]
pub struct JobStep {
    pub file: String,
    pub action: StepAction,
    pub sequence: u32,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    /// Uploaded file names, as staged on disk.
    pub files: Vec<String>,
    /// Processed artifacts with sizes and digests.
    pub outputs: Vec<OutputFile>,
    pub steps: Vec<JobStep>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(files: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            files,
            outputs: Vec::new(),
            steps: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
            error: None,
        }
    }
}
