//! KPI snapshots for the jobs dashboard.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::models::job::JobStatus;
use crate::store::JobStore;

/// Job success rate over N days (terminal jobs only).
#[derive(Debug, Serialize)]
pub struct JobSuccessRate {
    pub total: u64,
    pub completed: u64,
    pub rate: f64,
}

pub async fn success_rate(store: &Arc<JobStore>, days: i64) -> JobSuccessRate {
    let cutoff = Utc::now() - chrono::Duration::days(days);
    let jobs = store.snapshot().await;

    let terminal: Vec<_> = jobs
        .iter()
        .filter(|job| job.status.is_terminal() && job.created_at >= cutoff)
        .collect();
    let total = terminal.len() as u64;
    let completed = terminal
        .iter()
        .filter(|job| job.status == JobStatus::Completed)
        .count() as u64;
    let rate = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    };

    JobSuccessRate {
        total,
        completed,
        rate,
    }
}

/// Average job duration over N days.
#[derive(Debug, Serialize)]
pub struct AvgJobDuration {
    pub avg_ms: Option<f64>,
    pub count: u64,
}

pub async fn avg_duration(store: &Arc<JobStore>, days: i64) -> AvgJobDuration {
    let cutoff = Utc::now() - chrono::Duration::days(days);
    let jobs = store.snapshot().await;

    let durations: Vec<u64> = jobs
        .iter()
        .filter(|job| job.created_at >= cutoff)
        .filter_map(|job| job.duration_ms)
        .collect();
    let count = durations.len() as u64;
    let avg_ms = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<u64>() as f64 / count as f64)
    };

    AvgJobDuration { avg_ms, count }
}

/// Job counts per status over N days.
#[derive(Debug, Serialize)]
pub struct JobsByStatus {
    pub status: String,
    pub count: u64,
}

pub async fn jobs_by_status(store: &Arc<JobStore>, days: i64) -> Vec<JobsByStatus> {
    let cutoff = Utc::now() - chrono::Duration::days(days);
    let jobs = store.snapshot().await;

    [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ]
    .into_iter()
    .map(|status| JobsByStatus {
        status: status.as_str().to_string(),
        count: jobs
            .iter()
            .filter(|job| job.status == status && job.created_at >= cutoff)
            .count() as u64,
    })
    .collect()
}
