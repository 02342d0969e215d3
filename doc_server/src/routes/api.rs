//! REST API for jobs — JSON shapes over the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::job::{Job, JobStatus, StepAction, StepStatus};
use crate::models::output_file::OutputFile;
use crate::store::JobStore;

/// JSON response for a job with its steps and outputs.
#[derive(Debug, Serialize)]
pub struct JobJson {
    pub id: Uuid,
    pub status: JobStatus,
    pub files: Vec<String>,
    pub processed_files: Vec<String>,
    pub outputs: Vec<OutputFile>,
    pub steps: Vec<StepJson>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StepJson {
    pub file: String,
    pub action: StepAction,
    pub sequence: u32,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl From<Job> for JobJson {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            processed_files: job.outputs.iter().map(|o| o.name.clone()).collect(),
            files: job.files,
            outputs: job.outputs,
            steps: job
                .steps
                .into_iter()
                .map(|s| StepJson {
                    file: s.file,
                    action: s.action,
                    sequence: s.sequence,
                    status: s.status,
                    duration_ms: s.duration_ms,
                    error: s.error,
                })
                .collect(),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            duration_ms: job.duration_ms,
            error: job.error,
        }
    }
}

/// Response for an accepted upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: Uuid,
    pub status: String,
    pub message: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Get a job by ID with its steps and outputs.
pub async fn get_job(store: &Arc<JobStore>, id: Uuid) -> Option<JobJson> {
    store.get(id).await.map(JobJson::from)
}

/// List recent jobs, newest first.
pub async fn list_jobs(store: &Arc<JobStore>, limit: usize) -> Vec<JobJson> {
    store
        .list_recent(limit)
        .await
        .into_iter()
        .map(JobJson::from)
        .collect()
}
