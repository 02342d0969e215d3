//! Reconcile `[Content_Types].xml` so the copied parts stay declared.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{EngineError, Result};
use crate::package::{parts, DocxPackage};
use crate::xml;

/// Image extensions worth carrying over from the template's defaults.
const IMAGE_DEFAULTS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "wmf"];

#[derive(Debug, Default)]
struct Types {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

/// Add the template's header/footer/media `Override` entries and image
/// `Default` extensions that the target does not already declare.
pub fn run(template: &DocxPackage, target: &mut DocxPackage) -> Result<()> {
    let part = parts::CONTENT_TYPES;
    let Some(template_xml) = template.part(part) else {
        return Ok(());
    };
    let target_xml = target.require(part)?.to_vec();

    let tpl = parse_types(template_xml)?;
    let tgt = parse_types(&target_xml)?;

    let mut writer = Writer::new(Vec::new());

    for (ext, content_type) in &tpl.defaults {
        if !IMAGE_DEFAULTS.contains(&ext.as_str()) {
            continue;
        }
        if tgt.defaults.iter().any(|(e, _)| e == ext) {
            continue;
        }
        let mut el = BytesStart::new("Default");
        el.push_attribute(("Extension", ext.as_str()));
        el.push_attribute(("ContentType", content_type.as_str()));
        writer
            .write_event(Event::Empty(el))
            .map_err(|err| EngineError::xml(part, err))?;
    }

    for (part_name, content_type) in &tpl.overrides {
        let lower = part_name.to_ascii_lowercase();
        if !(lower.contains("header") || lower.contains("footer") || lower.contains("media")) {
            continue;
        }
        if tgt.overrides.iter().any(|(n, _)| n == part_name) {
            continue;
        }
        let mut el = BytesStart::new("Override");
        el.push_attribute(("PartName", part_name.as_str()));
        el.push_attribute(("ContentType", content_type.as_str()));
        writer
            .write_event(Event::Empty(el))
            .map_err(|err| EngineError::xml(part, err))?;
    }

    let insert = writer.into_inner();
    if insert.is_empty() {
        return Ok(());
    }

    let updated = xml::insert_before_close(part, &target_xml, b"Types", &insert)?;
    target.set_part(part, updated);
    Ok(())
}

fn parse_types(types_xml: &[u8]) -> Result<Types> {
    let part = parts::CONTENT_TYPES;
    let mut reader = Reader::from_reader(types_xml);
    let mut buf = Vec::new();
    let mut types = Types::default();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Default" => {
                let ext = xml::attr_value(part, &e, b"Extension")?.unwrap_or_default();
                let ct = xml::attr_value(part, &e, b"ContentType")?.unwrap_or_default();
                if !ext.is_empty() {
                    types.defaults.push((ext, ct));
                }
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Override" => {
                let name = xml::attr_value(part, &e, b"PartName")?.unwrap_or_default();
                let ct = xml::attr_value(part, &e, b"ContentType")?.unwrap_or_default();
                if !name.is_empty() {
                    types.overrides.push((name, ct));
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_CT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";

    #[test]
    fn declares_missing_header_override_and_image_default() {
        let mut template = DocxPackage::new();
        template.set_part(
            parts::CONTENT_TYPES,
            format!(
                r#"<Types><Default Extension="png" ContentType="image/png"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/header1.xml" ContentType="{HEADER_CT}"/></Types>"#
            )
            .into_bytes(),
        );

        let mut target = DocxPackage::new();
        target.set_part(
            parts::CONTENT_TYPES,
            br#"<Types><Default Extension="xml" ContentType="application/xml"/></Types>"#.to_vec(),
        );

        run(&template, &mut target).unwrap();

        let out = String::from_utf8(target.part(parts::CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert!(out.contains(r#"Extension="png""#));
        assert!(out.contains(r#"PartName="/word/header1.xml""#));
        // non-image defaults from the template are not dragged along
        assert_eq!(out.matches(r#"Extension="xml""#).count(), 1);
    }

    #[test]
    fn leaves_already_declared_entries_alone() {
        let mut template = DocxPackage::new();
        template.set_part(
            parts::CONTENT_TYPES,
            format!(r#"<Types><Override PartName="/word/footer1.xml" ContentType="{HEADER_CT}"/></Types>"#)
                .into_bytes(),
        );

        let mut target = DocxPackage::new();
        let original =
            format!(r#"<Types><Override PartName="/word/footer1.xml" ContentType="{HEADER_CT}"/></Types>"#);
        target.set_part(parts::CONTENT_TYPES, original.clone().into_bytes());

        run(&template, &mut target).unwrap();

        let out = String::from_utf8(target.part(parts::CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert_eq!(out, original);
    }
}
