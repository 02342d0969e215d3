//! Copy the template's media parts (logos, images) into the target.

use crate::package::{parts, DocxPackage};

/// Copy every `word/media/*` part from the template into the target,
/// overwriting on name collision so template artwork wins. Returns the
/// bare file names that were copied.
pub fn run(template: &DocxPackage, target: &mut DocxPackage) -> Vec<String> {
    let copied: Vec<(String, Vec<u8>)> = template
        .parts_under(parts::MEDIA_PREFIX)
        .map(|(name, data)| (name.to_string(), data.to_vec()))
        .collect();

    let mut names = Vec::with_capacity(copied.len());
    for (name, data) in copied {
        if let Some(file_name) = name.rsplit('/').next() {
            names.push(file_name.to_string());
        }
        target.set_part(name, data);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_media_and_reports_file_names() {
        let mut template = DocxPackage::new();
        template.set_part("word/media/image1.png", vec![1, 2, 3]);
        template.set_part("word/media/logo.jpeg", vec![4]);
        template.set_part("word/document.xml", b"<w:document/>".to_vec());

        let mut target = DocxPackage::new();
        let names = run(&template, &mut target);

        assert_eq!(names, vec!["image1.png", "logo.jpeg"]);
        assert!(target.has_part("word/media/image1.png"));
        assert!(!target.has_part("word/document.xml"));
    }
}
