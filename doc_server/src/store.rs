//! In-memory job registry.
//!
//! The filesystem holds the documents; the store holds the transient
//! bookkeeping. Every transition goes through one write lock, so a
//! queued job can be claimed exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::job::{Job, JobStatus, JobStep, StepAction, StepStatus};
use crate::models::output_file::OutputFile;

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<Job> {
        self.jobs.write().await.remove(&id)
    }

    /// Recent jobs, newest first.
    pub async fn list_recent(&self, limit: usize) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        all
    }

    pub async fn count_with_status(&self, status: JobStatus) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|job| job.status == status)
            .count()
    }

    /// Claim the oldest queued job, marking it processing. The whole
    /// selection and transition happens under one write lock.
    pub async fn claim_next_queued(&self) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        let id = jobs
            .values()
            .filter(|job| job.status == JobStatus::Queued)
            .min_by_key(|job| job.created_at)
            .map(|job| job.id)?;
        let job = jobs.get_mut(&id)?;
        job.status = JobStatus::Processing;
        job.started_at = Some(Utc::now());
        Some(job.clone())
    }

    /// Record a step starting; returns its sequence number.
    pub async fn start_step(&self, id: Uuid, file: &str, action: StepAction) -> u32 {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            return 0;
        };
        let sequence = job.steps.len() as u32 + 1;
        job.steps.push(JobStep {
            file: file.to_string(),
            action,
            sequence,
            status: StepStatus::Running,
            duration_ms: None,
            error: None,
        });
        sequence
    }

    pub async fn complete_step(
        &self,
        id: Uuid,
        sequence: u32,
        status: StepStatus,
        duration_ms: u64,
        error: Option<String>,
    ) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            return;
        };
        if let Some(step) = job.steps.iter_mut().find(|s| s.sequence == sequence) {
            step.status = status;
            step.duration_ms = Some(duration_ms);
            step.error = error;
        }
    }

    /// Record a step that never ran because an earlier one failed.
    pub async fn skip_step(&self, id: Uuid, file: &str, action: StepAction) {
        let sequence = self.start_step(id, file, action).await;
        self.complete_step(
            id,
            sequence,
            StepStatus::Skipped,
            0,
            Some("skipped (previous step failed)".to_string()),
        )
        .await;
    }

    pub async fn add_output(&self, id: Uuid, output: OutputFile) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.outputs.push(output);
        }
    }

    /// Move a job to a terminal status with timing.
    pub async fn finish(&self, id: Uuid, status: JobStatus, duration_ms: u64, error: Option<String>) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.status = status;
            job.completed_at = Some(Utc::now());
            job.duration_ms = Some(duration_ms);
            job.error = error;
        }
    }

    pub async fn snapshot(&self) -> Vec<Job> {
        self.jobs.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_marks_processing_and_takes_oldest_first() {
        let store = JobStore::new();
        let mut first = Job::new(vec!["a.docx".to_string()]);
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        let first_id = first.id;
        let second = Job::new(vec!["b.docx".to_string()]);
        store.insert(first).await;
        store.insert(second).await;

        let claimed = store.claim_next_queued().await.unwrap();
        assert_eq!(claimed.id, first_id);
        assert_eq!(claimed.status, JobStatus::Processing);
        assert!(claimed.started_at.is_some());

        assert_eq!(store.count_with_status(JobStatus::Processing).await, 1);
        assert_eq!(store.count_with_status(JobStatus::Queued).await, 1);
    }

    #[tokio::test]
    async fn claim_returns_none_when_nothing_is_queued() {
        let store = JobStore::new();
        assert!(store.claim_next_queued().await.is_none());

        let job = Job::new(vec![]);
        store.insert(job).await;
        store.claim_next_queued().await.unwrap();
        assert!(store.claim_next_queued().await.is_none());
    }

    #[tokio::test]
    async fn steps_are_sequenced_and_completable() {
        let store = JobStore::new();
        let job = Job::new(vec!["a.pdf".to_string()]);
        let id = job.id;
        store.insert(job).await;

        let s1 = store.start_step(id, "a.pdf", StepAction::Convert).await;
        let s2 = store.start_step(id, "a.pdf", StepAction::Brand).await;
        assert_eq!((s1, s2), (1, 2));

        store
            .complete_step(id, s1, StepStatus::Failure, 42, Some("bad pdf".to_string()))
            .await;

        let job = store.get(id).await.unwrap();
        assert_eq!(job.steps[0].status, StepStatus::Failure);
        assert_eq!(job.steps[0].duration_ms, Some(42));
        assert_eq!(job.steps[1].status, StepStatus::Running);
    }

    #[tokio::test]
    async fn finish_records_terminal_state() {
        let store = JobStore::new();
        let job = Job::new(vec![]);
        let id = job.id;
        store.insert(job).await;

        store.finish(id, JobStatus::Completed, 1234, None).await;

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.duration_ms, Some(1234));
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn list_recent_orders_newest_first_and_truncates() {
        let store = JobStore::new();
        for i in 0..5 {
            let mut job = Job::new(vec![]);
            job.created_at = Utc::now() - chrono::Duration::seconds(60 - i);
            store.insert(job).await;
        }

        let recent = store.list_recent(3).await;
        assert_eq!(recent.len(), 3);
        assert!(recent[0].created_at >= recent[1].created_at);
        assert!(recent[1].created_at >= recent[2].created_at);
    }
}
