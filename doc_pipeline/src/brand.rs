//! The branding pipeline — applies a template's look to a document.

use std::path::Path;

use crate::error::Result;
use crate::package::{parts, DocxPackage};
use crate::stages;

/// Run the pipeline stages in order against `target`.
///
/// Order matters: media and header/footer parts must exist before the
/// relationship stage links them, and the section stage needs the
/// remapped reference ids the relationship stage produces.
pub fn apply_branding(template: &DocxPackage, target: &mut DocxPackage) -> Result<()> {
    target.require(parts::DOCUMENT)?;

    let media = stages::media::run(template, target);
    stages::header_footer::run(template, target);
    let plan = stages::relationships::run(template, target, &media)?;
    stages::content_types::run(template, target)?;
    stages::styles::run(template, target)?;
    stages::section::run(target, &plan.refs)?;
    Ok(())
}

/// File-path convenience wrapper around [`apply_branding`].
pub fn brand_docx_file(template_path: &Path, input: &Path, output: &Path) -> Result<()> {
    let template = DocxPackage::open(template_path)?;
    let mut target = DocxPackage::open(input)?;
    apply_branding(&template, &mut target)?;
    target.write_to(output)
}
