//! Carry the template's style and support parts over to the target.
//!
//! Support parts are copied only when the target lacks them; a target
//! that already has `styles.xml` gets a merge instead of a replacement
//! so its own paragraph styles survive.

use quick_xml::events::BytesStart;

use crate::error::Result;
use crate::package::{parts, DocxPackage};
use crate::xml;

/// Parts copied wholesale when the target does not have its own.
const COPY_IF_MISSING: [&str; 5] = [
    "word/theme/theme1.xml",
    "word/settings.xml",
    "word/fontTable.xml",
    "word/webSettings.xml",
    "word/numbering.xml",
];

pub fn run(template: &DocxPackage, target: &mut DocxPackage) -> Result<()> {
    for part in COPY_IF_MISSING {
        if target.has_part(part) {
            continue;
        }
        if let Some(data) = template.part(part) {
            target.set_part(part, data.to_vec());
        }
    }

    let Some(template_styles) = template.part(parts::STYLES) else {
        return Ok(());
    };

    match target.part(parts::STYLES).map(<[u8]>::to_vec) {
        None => {
            target.set_part(parts::STYLES, template_styles.to_vec());
        }
        Some(existing) => {
            let merged = merge(template_styles, &existing)?;
            target.set_part(parts::STYLES, merged);
        }
    }
    Ok(())
}

/// Insert the template's `w:docDefaults` when the target has none
/// (docDefaults leads the part, so it goes right after the opening
/// tag), then append template header/footer styles the target lacks.
fn merge(template_xml: &[u8], target_xml: &[u8]) -> Result<Vec<u8>> {
    let part = parts::STYLES;
    let mut out = target_xml.to_vec();

    if !xml::contains_element(part, &out, b"w:docDefaults")? {
        let defaults =
            xml::collect_elements(part, template_xml, |e| e.name().as_ref() == b"w:docDefaults")?;
        if let Some(block) = defaults.first() {
            out = xml::insert_after_open(part, &out, b"w:styles", block)?;
        }
    }

    let existing_ids = style_ids(&out)?;
    let wanted = xml::collect_elements(part, template_xml, |e| {
        e.name().as_ref() == b"w:style"
            && matches!(
                xml::attr_value(part, e, b"w:styleId"),
                Ok(Some(ref id)) if (id.contains("Header") || id.contains("Footer"))
                    && !existing_ids.iter().any(|have| have == id)
            )
    })?;

    if !wanted.is_empty() {
        let insert = wanted.concat();
        out = xml::insert_before_close(part, &out, b"w:styles", &insert)?;
    }

    Ok(out)
}

fn style_ids(styles_xml: &[u8]) -> Result<Vec<String>> {
    let part = parts::STYLES;
    let mut ids = Vec::new();
    // collect_elements visits every w:style; the ids are captured as a
    // side effect and the serialized fragments discarded.
    let capture = |e: &BytesStart<'_>| -> bool {
        if e.name().as_ref() == b"w:style" {
            if let Ok(Some(id)) = xml::attr_value(part, e, b"w:styleId") {
                ids.push(id);
            }
        }
        false
    };
    xml::collect_elements(part, styles_xml, capture)?;
    Ok(ids)
}
