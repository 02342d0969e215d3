//! Retention sweeps — stale job directories and store entries.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::config::Config;
use crate::store::JobStore;

/// Sweep once at startup, then on the configured interval. Spawned as a
/// background tokio task.
pub async fn run_sweeper(store: Arc<JobStore>, config: Arc<Config>) {
    tracing::info!(
        retention_secs = config.job_retention_secs,
        "Retention sweeper started"
    );

    loop {
        if let Err(e) = sweep(&store, &config).await {
            tracing::error!("Retention sweep error: {e}");
        }
        tokio::time::sleep(Duration::from_secs(config.sweep_interval_secs)).await;
    }
}

/// Remove upload/output entries older than the retention window and
/// drop their store records. Orphans from a previous process and
/// archives left behind by a crash age out here too.
pub async fn sweep(store: &Arc<JobStore>, config: &Arc<Config>) -> anyhow::Result<()> {
    let cutoff = SystemTime::now() - Duration::from_secs(config.job_retention_secs);

    for root in [&config.upload_dir, &config.output_dir] {
        let Ok(mut entries) = tokio::fs::read_dir(root).await else {
            continue;
        };
        while let Some(entry) = entries.next_entry().await? {
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            if modified >= cutoff {
                continue;
            }

            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            let removed = if is_dir {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };

            match removed {
                Ok(()) => {
                    tracing::info!("Swept stale entry {}", path.display());
                    if let Some(id) = entry
                        .file_name()
                        .to_str()
                        .and_then(|name| name.parse::<Uuid>().ok())
                    {
                        store.remove(id).await;
                    }
                }
                Err(e) => tracing::warn!("Failed to sweep {}: {e}", path.display()),
            }
        }
    }

    Ok(())
}
