//! Document transform pipeline: DOCX branding and PDF conversion.
//!
//! The pipeline takes a branded template package and rewrites target
//! documents to carry its headers, footers, styles, media, and section
//! layout. PDFs are converted to a minimal DOCX first and then branded
//! like any other document.

pub mod brand;
pub mod builder;
pub mod error;
pub mod package;
pub mod pdf;
pub mod stages;
mod xml;

pub use brand::{apply_branding, brand_docx_file};
pub use error::{EngineError, Result};
pub use package::DocxPackage;
pub use pdf::convert_pdf;
