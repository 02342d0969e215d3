//! PDF to DOCX conversion.
//!
//! Text is extracted per page in page order and re-emitted as one
//! paragraph per non-empty line. Layout reconstruction is out of scope;
//! the branding pipeline supplies margins, styles, and headers/footers
//! downstream.

use std::path::Path;

use crate::builder;
use crate::error::Result;
use crate::package::DocxPackage;

pub fn convert_pdf(path: &Path) -> Result<DocxPackage> {
    let document = lopdf::Document::load(path)?;
    let pages = document.get_pages();

    let mut paragraphs = Vec::new();
    for page_number in pages.keys() {
        let text = document.extract_text(&[*page_number])?;
        for line in text.lines() {
            let line = line.trim();
            if !line.is_empty() {
                paragraphs.push(line.to_string());
            }
        }
    }

    // a scan-only PDF still yields a valid (empty) document
    if paragraphs.is_empty() {
        paragraphs.push(String::new());
    }

    builder::build_document(&paragraphs)
}
