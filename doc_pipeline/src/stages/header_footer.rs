//! Copy the template's header and footer parts, with their relationship
//! companions, into the target.

use crate::package::DocxPackage;

/// The part names Word uses for up to three headers and footers.
const HEADER_FOOTER_PARTS: [&str; 6] = [
    "word/header1.xml",
    "word/header2.xml",
    "word/header3.xml",
    "word/footer1.xml",
    "word/footer2.xml",
    "word/footer3.xml",
];

/// Copy each header/footer part present in the template, plus its
/// `word/_rels/<part>.rels` companion so media references inside the
/// headers keep resolving. Returns the copied part names.
pub fn run(template: &DocxPackage, target: &mut DocxPackage) -> Vec<String> {
    let mut copied = Vec::new();
    for part in HEADER_FOOTER_PARTS {
        let Some(data) = template.part(part) else {
            continue;
        };
        target.set_part(part, data.to_vec());
        copied.push(part.to_string());

        let rels = rels_name(part);
        if let Some(rels_data) = template.part(&rels) {
            target.set_part(rels, rels_data.to_vec());
        }
    }
    copied
}

fn rels_name(part: &str) -> String {
    // word/header1.xml -> word/_rels/header1.xml.rels
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}
