//! Job executor — background task that picks up queued jobs and runs
//! the document pipeline against them.
//!
//! DOCX files get one `brand` step; PDFs get a `convert` step and then
//! a `brand` step on the converted package. A failed file does not fail
//! the job: its steps record the error and the next file runs.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use docproc_pipeline::package::DocxPackage;
use docproc_pipeline::{apply_branding, brand_docx_file, convert_pdf, EngineError};

use crate::config::Config;
use crate::models::job::{Job, JobStatus, StepAction, StepStatus};
use crate::models::output_file::OutputFile;
use crate::store::JobStore;

/// Run the executor loop forever. Spawned as a background tokio task.
pub async fn run_executor(store: Arc<JobStore>, config: Arc<Config>, workers: usize) {
    tracing::info!(
        workers,
        template = %config.template_path.display(),
        "Job executor started"
    );

    loop {
        poll_and_spawn(&store, &config, workers).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}

/// Claim queued jobs while worker slots are free, spawning a task per
/// claimed job.
async fn poll_and_spawn(store: &Arc<JobStore>, config: &Arc<Config>, workers: usize) {
    while store.count_with_status(JobStatus::Processing).await < workers {
        let Some(job) = store.claim_next_queued().await else {
            return;
        };

        crate::metrics::job_status_changed("processing");
        crate::metrics::jobs_active(store.count_with_status(JobStatus::Processing).await);
        tracing::info!(job_id = %job.id, files = job.files.len(), "Executing job");

        let store = store.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let job_id = job.id;
            let timeout = Duration::from_secs(config.job_timeout_secs);
            let started = Instant::now();

            match tokio::time::timeout(timeout, process_job(&store, &config, job)).await {
                Ok(Ok(())) => finish_job(&store, job_id, JobStatus::Completed, started, None).await,
                Ok(Err(e)) => {
                    finish_job(
                        &store,
                        job_id,
                        JobStatus::Failed,
                        started,
                        Some(format!("{e:#}")),
                    )
                    .await
                }
                Err(_) => {
                    finish_job(
                        &store,
                        job_id,
                        JobStatus::Failed,
                        started,
                        Some(format!("job timed out after {}s", timeout.as_secs())),
                    )
                    .await
                }
            }
        });
    }
}

/// Process every staged file of one job, in name order.
async fn process_job(store: &Arc<JobStore>, config: &Arc<Config>, job: Job) -> anyhow::Result<()> {
    let upload_dir = config.upload_dir.join(job.id.to_string());
    let output_dir = config.output_dir.join(job.id.to_string());
    tokio::fs::create_dir_all(&output_dir).await?;

    let mut files = job.files.clone();
    files.sort();

    for file in files {
        let input_path = upload_dir.join(&file);
        let lower = file.to_ascii_lowercase();

        if lower.ends_with(".docx") {
            let template = config.template_path.clone();
            let output_path = output_dir.join(&file);
            let produced = run_step(store, job.id, &file, StepAction::Brand, move || {
                brand_docx_file(&template, &input_path, &output_path)?;
                Ok(output_path)
            })
            .await;
            if let Some(path) = produced {
                record_output(store, job.id, &path).await;
            }
        } else if lower.ends_with(".pdf") {
            let pdf_path = input_path.clone();
            let converted = run_step(store, job.id, &file, StepAction::Convert, move || {
                convert_pdf(&pdf_path)
            })
            .await;

            let Some(package) = converted else {
                store.skip_step(job.id, &file, StepAction::Brand).await;
                continue;
            };

            let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&file);
            let output_path = output_dir.join(format!("{stem}.docx"));
            let template = config.template_path.clone();
            let produced = run_step(store, job.id, &file, StepAction::Brand, move || {
                let template = DocxPackage::open(&template)?;
                let mut package = package;
                apply_branding(&template, &mut package)?;
                package.write_to(&output_path)?;
                Ok(output_path)
            })
            .await;
            if let Some(path) = produced {
                record_output(store, job.id, &path).await;
            }
        } else {
            // staged names are pre-filtered at upload; nothing to do
            tracing::debug!(job_id = %job.id, file, "Skipping unsupported staged file");
        }
    }

    Ok(())
}

/// Run one engine call on the blocking pool, recording the step with
/// its timing. Returns the produced value on success.
async fn run_step<T, F>(
    store: &Arc<JobStore>,
    job_id: Uuid,
    file: &str,
    action: StepAction,
    f: F,
) -> Option<T>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    let sequence = store.start_step(job_id, file, action).await;
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(f).await;
    let duration = started.elapsed().as_millis() as u64;
    crate::metrics::step_duration(action.as_str(), duration);

    match result {
        Ok(Ok(value)) => {
            store
                .complete_step(job_id, sequence, StepStatus::Success, duration, None)
                .await;
            tracing::info!(
                job_id = %job_id,
                file,
                action = action.as_str(),
                duration_ms = duration,
                "Step passed"
            );
            Some(value)
        }
        Ok(Err(e)) => {
            tracing::warn!(
                job_id = %job_id,
                file,
                action = action.as_str(),
                "Step failed: {e}"
            );
            store
                .complete_step(job_id, sequence, StepStatus::Failure, duration, Some(e.to_string()))
                .await;
            None
        }
        Err(join_err) => {
            tracing::error!(
                job_id = %job_id,
                file,
                action = action.as_str(),
                "Step task aborted: {join_err}"
            );
            store
                .complete_step(
                    job_id,
                    sequence,
                    StepStatus::Failure,
                    duration,
                    Some("processing task aborted".to_string()),
                )
                .await;
            None
        }
    }
}

async fn record_output(store: &Arc<JobStore>, job_id: Uuid, path: &Path) {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let digest = Sha256::digest(&bytes);
            store
                .add_output(
                    job_id,
                    OutputFile {
                        name,
                        size_bytes: bytes.len() as u64,
                        sha256: hex::encode(digest),
                    },
                )
                .await;
        }
        Err(e) => {
            tracing::warn!(job_id = %job_id, "Failed to read output {}: {e}", path.display());
        }
    }
}

/// Update the job to a terminal status with timing.
async fn finish_job(
    store: &Arc<JobStore>,
    job_id: Uuid,
    status: JobStatus,
    started: Instant,
    error: Option<String>,
) {
    let duration = started.elapsed().as_millis() as u64;
    store.finish(job_id, status, duration, error).await;

    crate::metrics::job_status_changed(status.as_str());
    crate::metrics::job_duration(duration);
    crate::metrics::jobs_active(store.count_with_status(JobStatus::Processing).await);

    tracing::info!(
        job_id = %job_id,
        status = status.as_str(),
        duration_ms = duration,
        "Job finished"
    );
}
