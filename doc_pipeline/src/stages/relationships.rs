//! Wire the copied header/footer parts into the target's relationship
//! table and derive the section references the document must carry.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{EngineError, Result};
use crate::package::{parts, DocxPackage};
use crate::xml;

const EMPTY_RELS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Header,
    Footer,
}

/// A `w:headerReference`/`w:footerReference` to emit into the section
/// properties, already pointing at a relationship id in the target.
#[derive(Debug, Clone)]
pub struct SectionRef {
    pub kind: RefKind,
    pub ref_type: String,
    pub rid: String,
}

#[derive(Debug, Default)]
pub struct LinkPlan {
    pub refs: Vec<SectionRef>,
}

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Add relationships for the template's header/footer parts (and the
/// media they depend on) under ids that cannot collide with the
/// target's, then collect the template's section references remapped to
/// those new ids.
pub fn run(
    template: &DocxPackage,
    target: &mut DocxPackage,
    media_names: &[String],
) -> Result<LinkPlan> {
    let template_rels = match template.part(parts::DOCUMENT_RELS) {
        Some(rels_xml) => parse_relationships(rels_xml)?,
        None => Vec::new(),
    };

    let target_rels_xml = target
        .part(parts::DOCUMENT_RELS)
        .map(<[u8]>::to_vec)
        .unwrap_or_else(|| EMPTY_RELS.to_vec());
    let existing = parse_relationships(&target_rels_xml)?;

    // Fresh ids start past the highest numeric rId already in use.
    let mut next = existing
        .iter()
        .filter_map(|rel| rel.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0)
        + 1;

    let mut mapping: Vec<(String, String)> = Vec::new();
    let mut additions = Vec::new();
    for rel in &template_rels {
        let target_lower = rel.target.to_ascii_lowercase();
        let is_header_footer = target_lower.contains("header") || target_lower.contains("footer");
        let is_copied_media = media_names
            .iter()
            .any(|name| rel.target.ends_with(name.as_str()));
        if !is_header_footer && !is_copied_media {
            continue;
        }

        let new_id = format!("rId{next}");
        next += 1;
        mapping.push((rel.id.clone(), new_id.clone()));
        additions.push(Relationship {
            id: new_id,
            rel_type: rel.rel_type.clone(),
            target: rel.target.clone(),
        });
    }

    if additions.is_empty() {
        if !target.has_part(parts::DOCUMENT_RELS) {
            target.set_part(parts::DOCUMENT_RELS, target_rels_xml);
        }
    } else {
        let insert = serialize_relationships(&additions)?;
        let updated = xml::insert_before_close(
            parts::DOCUMENT_RELS,
            &target_rels_xml,
            b"Relationships",
            &insert,
        )?;
        target.set_part(parts::DOCUMENT_RELS, updated);
    }

    let refs = section_refs(template, &mapping)?;
    Ok(LinkPlan { refs })
}

fn parse_relationships(rels_xml: &[u8]) -> Result<Vec<Relationship>> {
    let part = parts::DOCUMENT_RELS;
    let mut reader = Reader::from_reader(rels_xml);
    let mut buf = Vec::new();
    let mut rels = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = xml::attr_value(part, &e, b"Id")?.unwrap_or_default();
                let rel_type = xml::attr_value(part, &e, b"Type")?.unwrap_or_default();
                let rel_target = xml::attr_value(part, &e, b"Target")?.unwrap_or_default();
                if !id.is_empty() {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target: rel_target,
                    });
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

fn serialize_relationships(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    for rel in rels {
        let mut el = BytesStart::new("Relationship");
        el.push_attribute(("Id", rel.id.as_str()));
        el.push_attribute(("Type", rel.rel_type.as_str()));
        el.push_attribute(("Target", rel.target.as_str()));
        writer
            .write_event(Event::Empty(el))
            .map_err(|err| EngineError::xml(parts::DOCUMENT_RELS, err))?;
    }
    Ok(writer.into_inner())
}

/// The template's header/footer references, with relationship ids
/// remapped into the target's id space. Unmapped ids pass through
/// unchanged.
fn section_refs(template: &DocxPackage, mapping: &[(String, String)]) -> Result<Vec<SectionRef>> {
    let Some(doc) = template.part(parts::DOCUMENT) else {
        return Ok(Vec::new());
    };
    let part = parts::DOCUMENT;
    let mut reader = Reader::from_reader(doc);
    let mut buf = Vec::new();
    let mut refs = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e)
                if matches!(e.name().as_ref(), b"w:headerReference" | b"w:footerReference") =>
            {
                let kind = if e.name().as_ref() == b"w:headerReference" {
                    RefKind::Header
                } else {
                    RefKind::Footer
                };
                let ref_type =
                    xml::attr_value(part, &e, b"w:type")?.unwrap_or_else(|| "default".to_string());
                let Some(old_id) = xml::attr_value(part, &e, b"r:id")? else {
                    continue;
                };
                let rid = mapping
                    .iter()
                    .find(|(old, _)| *old == old_id)
                    .map(|(_, new)| new.clone())
                    .unwrap_or(old_id);
                refs.push(SectionRef {
                    kind,
                    ref_type,
                    rid,
                });
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(refs)
}
