//! Bundle a job's outputs into a downloadable archive.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the job's output directory into `{job_id}_documents.zip` next to
/// it. Returns the archive path.
pub async fn archive_outputs(output_root: &Path, job_id: Uuid) -> anyhow::Result<PathBuf> {
    let job_dir = output_root.join(job_id.to_string());
    let archive_path = output_root.join(format!("{job_id}_documents.zip"));

    let path = archive_path.clone();
    tokio::task::spawn_blocking(move || write_archive(&job_dir, &path)).await??;

    Ok(archive_path)
}

fn write_archive(job_dir: &Path, archive_path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(archive_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(job_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(job_dir)?;
        zip.start_file(relative.to_string_lossy().into_owned(), options)?;
        let data = std::fs::read(entry.path())?;
        zip.write_all(&data)?;
    }

    zip.finish()?;
    Ok(())
}

/// Delete the archive once its TTL passes; the download has long
/// finished by then.
pub fn schedule_removal(path: PathBuf, ttl: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove archive {}: {e}", path.display());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn archives_every_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let job_id = Uuid::new_v4();
        let job_dir = dir.path().join(job_id.to_string());
        std::fs::create_dir_all(&job_dir).unwrap();
        std::fs::write(job_dir.join("a.docx"), b"first").unwrap();
        std::fs::write(job_dir.join("b.docx"), b"second").unwrap();

        let archive = archive_outputs(dir.path(), job_id).await.unwrap();
        assert_eq!(
            archive.file_name().unwrap().to_str().unwrap(),
            format!("{job_id}_documents.zip")
        );

        let file = std::fs::File::open(&archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = String::new();
        zip.by_name("a.docx").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "first");
    }

    #[tokio::test]
    async fn archives_an_empty_job_dir_as_an_empty_zip() {
        let dir = tempfile::tempdir().unwrap();
        let job_id = Uuid::new_v4();
        std::fs::create_dir_all(dir.path().join(job_id.to_string())).unwrap();

        let archive = archive_outputs(dir.path(), job_id).await.unwrap();

        let file = std::fs::File::open(&archive).unwrap();
        let zip = zip::ZipArchive::new(file).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
