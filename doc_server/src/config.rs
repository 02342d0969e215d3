//! Service configuration — loaded from environment variables.

use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory for incoming uploads, one subdirectory per job.
    pub upload_dir: PathBuf,
    /// Root directory for processed outputs, one subdirectory per job.
    pub output_dir: PathBuf,
    /// The branded template package applied to every document.
    pub template_path: PathBuf,
    /// Per-job processing timeout in seconds.
    pub job_timeout_secs: u64,
    /// Job directories older than this are swept.
    pub job_retention_secs: u64,
    /// Bundled download archives are deleted this long after creation.
    pub archive_ttl_secs: u64,
    /// Period of the retention sweep task.
    pub sweep_interval_secs: u64,
    /// Request body cap for uploads.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
        let output_dir =
            PathBuf::from(std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()));
        let template_path = PathBuf::from(
            std::env::var("TEMPLATE_DOCX").unwrap_or_else(|_| "branding-template.docx".to_string()),
        );
        let job_timeout_secs = std::env::var("JOB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120);
        let job_retention_secs = std::env::var("JOB_RETENTION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);
        let archive_ttl_secs = std::env::var("ARCHIVE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);
        let sweep_interval_secs = std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);
        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024);

        if !template_path.exists() {
            tracing::warn!(
                "Template {} not found -- processing will fail until it is provided",
                template_path.display()
            );
        }

        Self {
            upload_dir,
            output_dir,
            template_path,
            job_timeout_secs,
            job_retention_secs,
            archive_ttl_secs,
            sweep_interval_secs,
            max_upload_bytes,
        }
    }
}
