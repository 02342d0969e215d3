//! docproc.output — a processed artifact with its digest.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OutputFile {
    pub name: String,
    pub size_bytes: u64,
    /// SHA-256 of the artifact, hex-encoded.
    pub sha256: String,
}
