//! Document processor HTTP routes — uploads, jobs, downloads, KPIs.

pub mod api;
pub mod upload;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::multipart::Multipart;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::models::job::JobStatus;
use crate::services;
use crate::store::JobStore;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Matches the process manager's fixed request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared state for route handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<JobStore>,
    pub config: Arc<Config>,
}

/// Build the service's Axum router.
pub fn router(state: ApiState) -> Router {
    // the hosting platform fronts the service; any origin may call it
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Upload
        .route("/upload-files", post(upload_handler))
        // Job API
        .route("/job-status/{job_id}", get(job_status_handler))
        .route("/download/{job_id}/{filename}", get(download_file_handler))
        .route("/download-all/{job_id}", get(download_all_handler))
        .route("/job/{job_id}", delete(delete_job_handler))
        .route("/api/jobs", get(list_jobs_handler))
        // KPI API
        .route("/api/kpi/success_rate", get(kpi_success_rate))
        .route("/api/kpi/avg_duration", get(kpi_avg_duration))
        .route("/api/kpi/jobs_by_status", get(kpi_jobs_by_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Document Template Processor API" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Upload ──

async fn upload_handler(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<api::UploadResponse>), StatusCode> {
    upload::handle_upload(&state.config, &state.store, multipart).await
}

// ── Job API ──

async fn job_status_handler(
    State(state): State<ApiState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<api::JobJson>, StatusCode> {
    api::get_job(&state.store, job_id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn download_file_handler(
    State(state): State<ApiState>,
    Path((job_id, filename)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    if state.store.get(job_id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    // only plain names are ever produced; anything path-like is bogus
    let safe = upload::sanitize_file_name(&filename)
        .filter(|name| *name == filename)
        .ok_or(StatusCode::NOT_FOUND)?;

    let path = state
        .config
        .output_dir
        .join(job_id.to_string())
        .join(&safe);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let headers = [
        (header::CONTENT_TYPE, DOCX_MIME.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{safe}\""),
        ),
    ];
    Ok((headers, bytes))
}

async fn download_all_handler(
    State(state): State<ApiState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let job = state
        .store
        .get(job_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    if job.status != JobStatus::Completed {
        return Err(StatusCode::BAD_REQUEST);
    }

    let archive = services::archive::archive_outputs(&state.config.output_dir, job_id)
        .await
        .map_err(|e| {
            tracing::error!(job_id = %job_id, "Archive error: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let bytes = tokio::fs::read(&archive).await.map_err(|e| {
        tracing::error!(job_id = %job_id, "Archive read error: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    services::archive::schedule_removal(
        archive,
        Duration::from_secs(state.config.archive_ttl_secs),
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{job_id}_documents.zip\""),
        ),
    ];
    Ok((headers, bytes))
}

async fn delete_job_handler(
    State(state): State<ApiState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<api::DeleteResponse>, StatusCode> {
    state
        .store
        .remove(job_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    for root in [&state.config.upload_dir, &state.config.output_dir] {
        let dir = root.join(job_id.to_string());
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {e}", dir.display());
            }
        }
    }

    tracing::info!(job_id = %job_id, "Job deleted");
    Ok(Json(api::DeleteResponse {
        message: "Job deleted successfully".to_string(),
    }))
}

#[derive(serde::Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<usize>,
}

async fn list_jobs_handler(
    State(state): State<ApiState>,
    Query(query): Query<ListJobsQuery>,
) -> Json<Vec<api::JobJson>> {
    Json(api::list_jobs(&state.store, query.limit.unwrap_or(20)).await)
}

// ── KPI API ──

#[derive(serde::Deserialize)]
pub struct KpiQuery {
    pub days: Option<i64>,
}

async fn kpi_success_rate(
    State(state): State<ApiState>,
    Query(query): Query<KpiQuery>,
) -> Json<crate::dashboard::kpi::JobSuccessRate> {
    Json(crate::dashboard::kpi::success_rate(&state.store, query.days.unwrap_or(30)).await)
}

async fn kpi_avg_duration(
    State(state): State<ApiState>,
    Query(query): Query<KpiQuery>,
) -> Json<crate::dashboard::kpi::AvgJobDuration> {
    Json(crate::dashboard::kpi::avg_duration(&state.store, query.days.unwrap_or(30)).await)
}

async fn kpi_jobs_by_status(
    State(state): State<ApiState>,
    Query(query): Query<KpiQuery>,
) -> Json<Vec<crate::dashboard::kpi::JobsByStatus>> {
    Json(crate::dashboard::kpi::jobs_by_status(&state.store, query.days.unwrap_or(30)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::models::job::Job;

    fn test_state(root: &std::path::Path) -> ApiState {
        ApiState {
            store: JobStore::new(),
            config: Arc::new(Config {
                upload_dir: root.join("uploads"),
                output_dir: root.join("output"),
                template_path: root.join("template.docx"),
                job_timeout_secs: 120,
                job_retention_secs: 86400,
                archive_ttl_secs: 300,
                sweep_interval_secs: 3600,
                max_upload_bytes: 1024 * 1024,
            }),
        }
    }

    fn multipart_body(name: &str, content: &[u8]) -> (String, Vec<u8>) {
        let boundary = "X-DOCPROC-TEST-BOUNDARY";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; \
                 filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn root_serves_the_banner() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["message"],
            "Document Template Processor API"
        );
    }

    #[tokio::test]
    async fn unknown_job_status_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/job-status/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_queues_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state.clone());

        let (content_type, body) = multipart_body("report.docx", b"PK\x03\x04fake");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-files")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = json_body(response).await;
        assert_eq!(payload["status"], "queued");
        assert_eq!(payload["files"][0], "report.docx");

        let job_id: Uuid = payload["job_id"].as_str().unwrap().parse().unwrap();
        let job = state.store.get(job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(state
            .config
            .upload_dir
            .join(job_id.to_string())
            .join("report.docx")
            .exists());
    }

    #[tokio::test]
    async fn upload_with_only_unsupported_files_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let (content_type, body) = multipart_body("notes.txt", b"plain text");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-files")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_all_requires_a_completed_job() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let job = Job::new(vec!["a.docx".to_string()]);
        let job_id = job.id;
        state.store.insert(job).await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/download-all/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_of_a_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let job = Job::new(vec![]);
        let job_id = job.id;
        state.store.insert(job).await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/download/{job_id}/nope.docx"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_serves_a_processed_file_with_attachment_headers() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let job = Job::new(vec!["a.docx".to_string()]);
        let job_id = job.id;
        state.store.insert(job).await;

        let out_dir = state.config.output_dir.join(job_id.to_string());
        std::fs::create_dir_all(&out_dir).unwrap();
        std::fs::write(out_dir.join("a.docx"), b"branded bytes").unwrap();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/download/{job_id}/a.docx"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            DOCX_MIME
        );
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("a.docx"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"branded bytes");
    }

    #[tokio::test]
    async fn delete_removes_the_job_and_its_directories() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let job = Job::new(vec![]);
        let job_id = job.id;
        state.store.insert(job).await;

        let upload_dir = state.config.upload_dir.join(job_id.to_string());
        std::fs::create_dir_all(&upload_dir).unwrap();

        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/job/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.get(job_id).await.is_none());
        assert!(!upload_dir.exists());
    }

    #[tokio::test]
    async fn list_jobs_returns_recent_entries() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        state.store.insert(Job::new(vec![])).await;
        state.store.insert(Job::new(vec![])).await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/jobs?limit=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn kpi_endpoints_respond() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state);

        for uri in [
            "/api/kpi/success_rate",
            "/api/kpi/avg_duration",
            "/api/kpi/jobs_by_status",
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
