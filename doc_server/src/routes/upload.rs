//! Upload intake — multipart documents become a queued job.

use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::Multipart;
use axum::http::StatusCode;
use axum::Json;

use crate::config::Config;
use crate::models::job::Job;
use crate::routes::api::UploadResponse;
use crate::store::JobStore;

/// Handle a multipart upload. Unsupported and unusable fields are
/// skipped; the request only fails when nothing supported remains.
pub async fn handle_upload(
    config: &Arc<Config>,
    store: &Arc<JobStore>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), StatusCode> {
    let mut saved: Vec<(String, Bytes)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let Some(raw_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let Some(name) = sanitize_file_name(&raw_name) else {
            tracing::debug!("Ignoring upload field with unusable name: {raw_name}");
            continue;
        };
        let Some(kind) = supported_kind(&name) else {
            tracing::debug!("Skipping unsupported file: {name}");
            continue;
        };

        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        crate::metrics::upload_received(kind);
        saved.push((name, data));
    }

    if saved.is_empty() {
        tracing::debug!("Upload rejected: no supported files (only .docx and .pdf are accepted)");
        return Err(StatusCode::BAD_REQUEST);
    }

    let names: Vec<String> = saved.iter().map(|(name, _)| name.clone()).collect();
    let job = Job::new(names.clone());
    let job_dir = config.upload_dir.join(job.id.to_string());

    tokio::fs::create_dir_all(&job_dir).await.map_err(|e| {
        tracing::error!("Failed to create {}: {e}", job_dir.display());
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    for (name, data) in &saved {
        tokio::fs::write(job_dir.join(name), data).await.map_err(|e| {
            tracing::error!("Failed to store upload {name}: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    }

    let job_id = job.id;
    let count = saved.len();
    store.insert(job).await;
    crate::metrics::job_status_changed("queued");
    tracing::info!(job_id = %job_id, files = count, "Job created from upload");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            job_id,
            status: "queued".to_string(),
            message: format!("Processing {count} files"),
            files: names,
        }),
    ))
}

/// Final path component only; rejects traversal and empty names.
pub(crate) fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = Path::new(raw).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn supported_kind(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".docx") {
        Some("docx")
    } else if lower.ends_with(".pdf") {
        Some("pdf")
    } else {
        None
    }
}
