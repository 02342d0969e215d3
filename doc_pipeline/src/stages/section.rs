//! Rewrite the document's section properties to the template layout.
//!
//! Every `w:sectPr` in the body is dropped and one canonical section is
//! emitted before `</w:body>`: A4 portrait, one-inch page margins,
//! half-inch header/footer distances, and the remapped header/footer
//! references. Twentieths of a point: 1440 = 1", 720 = 0.5".

use std::io::Write;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{EngineError, Result};
use crate::package::{parts, DocxPackage};
use crate::stages::relationships::{RefKind, SectionRef};

const PAGE_MARGIN_TWIPS: &str = "1440";
const HEADER_FOOTER_TWIPS: &str = "720";
const A4_WIDTH_TWIPS: &str = "11906";
const A4_HEIGHT_TWIPS: &str = "16838";

pub fn run(target: &mut DocxPackage, refs: &[SectionRef]) -> Result<()> {
    let document = target.require(parts::DOCUMENT)?.to_vec();
    let rewritten = rewrite_document(&document, refs)?;
    target.set_part(parts::DOCUMENT, rewritten);
    Ok(())
}

fn rewrite_document(document: &[u8], refs: &[SectionRef]) -> Result<Vec<u8>> {
    let part = parts::DOCUMENT;
    let mut reader = Reader::from_reader(document);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut emitted = false;
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            // drop existing sections wherever they sit (body end or
            // paragraph-level breaks)
            Event::Start(e) if e.name().as_ref() == b"w:sectPr" => {
                let end = e.into_owned();
                let mut skip = Vec::new();
                reader
                    .read_to_end_into(end.name(), &mut skip)
                    .map_err(|err| EngineError::xml(part, err))?;
            }
            Event::Empty(e) if e.name().as_ref() == b"w:sectPr" => {}
            Event::End(e) if !emitted && e.name().as_ref() == b"w:body" => {
                write_section(&mut writer, refs)?;
                emitted = true;
                writer
                    .write_event(Event::End(e))
                    .map_err(|err| EngineError::xml(part, err))?;
            }
            event => {
                writer
                    .write_event(event)
                    .map_err(|err| EngineError::xml(part, err))?;
            }
        }
        buf.clear();
    }
    if !emitted {
        return Err(EngineError::xml(part, "document has no w:body element"));
    }
    Ok(writer.into_inner())
}

pub(crate) fn write_section<W: Write>(writer: &mut Writer<W>, refs: &[SectionRef]) -> Result<()> {
    let part = parts::DOCUMENT;
    let write = |writer: &mut Writer<W>, event: Event<'_>| {
        writer
            .write_event(event)
            .map_err(|err| EngineError::xml(part, err))
    };

    write(writer, Event::Start(BytesStart::new("w:sectPr")))?;

    // schema order: references first, then type, page size, margins
    for section_ref in refs {
        let name = match section_ref.kind {
            RefKind::Header => "w:headerReference",
            RefKind::Footer => "w:footerReference",
        };
        let mut el = BytesStart::new(name);
        el.push_attribute(("w:type", section_ref.ref_type.as_str()));
        el.push_attribute(("r:id", section_ref.rid.as_str()));
        write(writer, Event::Empty(el))?;
    }

    let mut section_type = BytesStart::new("w:type");
    section_type.push_attribute(("w:val", "nextPage"));
    write(writer, Event::Empty(section_type))?;

    let mut page_size = BytesStart::new("w:pgSz");
    page_size.push_attribute(("w:w", A4_WIDTH_TWIPS));
    page_size.push_attribute(("w:h", A4_HEIGHT_TWIPS));
    page_size.push_attribute(("w:orient", "portrait"));
    write(writer, Event::Empty(page_size))?;

    let mut margins = BytesStart::new("w:pgMar");
    margins.push_attribute(("w:top", PAGE_MARGIN_TWIPS));
    margins.push_attribute(("w:right", PAGE_MARGIN_TWIPS));
    margins.push_attribute(("w:bottom", PAGE_MARGIN_TWIPS));
    margins.push_attribute(("w:left", PAGE_MARGIN_TWIPS));
    margins.push_attribute(("w:header", HEADER_FOOTER_TWIPS));
    margins.push_attribute(("w:footer", HEADER_FOOTER_TWIPS));
    write(writer, Event::Empty(margins))?;

    write(writer, Event::End(quick_xml::events::BytesEnd::new("w:sectPr")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> Vec<SectionRef> {
        vec![SectionRef {
            kind: RefKind::Header,
            ref_type: "default".to_string(),
            rid: "rId9".to_string(),
        }]
    }

    #[test]
    fn replaces_existing_section_and_keeps_content() {
        let document = br#"<w:document><w:body><w:p><w:r><w:t>hello</w:t></w:r></w:p><w:sectPr><w:pgMar w:top="99"/></w:sectPr></w:body></w:document>"#;

        let out = String::from_utf8(rewrite_document(document, &refs()).unwrap()).unwrap();

        assert!(out.contains("<w:t>hello</w:t>"));
        assert_eq!(out.matches("<w:sectPr>").count(), 1);
        assert!(!out.contains(r#"w:top="99""#));
        assert!(out.contains(r#"<w:headerReference w:type="default" r:id="rId9"/>"#));
        assert!(out.contains(r#"<w:pgSz w:w="11906" w:h="16838" w:orient="portrait"/>"#));
        assert!(out.contains(r#"w:header="720""#));
        // section lands at the end of the body
        assert!(out.ends_with("</w:sectPr></w:body></w:document>"));
    }

    #[test]
    fn drops_paragraph_level_section_breaks() {
        let document = br#"<w:document><w:body><w:p><w:pPr><w:sectPr/></w:pPr></w:p></w:body></w:document>"#;

        let out = String::from_utf8(rewrite_document(document, &[]).unwrap()).unwrap();

        assert_eq!(out.matches("w:sectPr").count(), 2); // one open + close pair
        assert!(out.contains("<w:pPr></w:pPr>"));
    }

    #[test]
    fn errors_on_document_without_body() {
        let err = rewrite_document(b"<w:document/>", &[]).unwrap_err();
        assert!(matches!(err, EngineError::Xml { .. }));
    }
}
