//! Typed errors for the document transform pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The input could not be opened as a zip container at all.
    #[error("not a DOCX package: {0}")]
    NotDocx(zip::result::ZipError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML in {part}: {detail}")]
    Xml { part: String, detail: String },

    #[error("PDF parse error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("package is missing required part: {0}")]
    MissingPart(String),
}

impl EngineError {
    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        Self::Xml {
            part: part.to_string(),
            detail: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
