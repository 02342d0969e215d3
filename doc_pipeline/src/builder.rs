//! Build a minimal, valid DOCX package from plain paragraphs.
//!
//! This is the landing format for PDF conversion: one paragraph per
//! extracted line, default section layout. The branding pipeline then
//! treats the result like any other document.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{EngineError, Result};
use crate::package::{parts, DocxPackage};
use crate::stages::section;

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

pub fn build_document(paragraphs: &[String]) -> Result<DocxPackage> {
    let mut pkg = DocxPackage::new();
    pkg.set_part(parts::CONTENT_TYPES, CONTENT_TYPES_XML.as_bytes().to_vec());
    pkg.set_part(parts::PACKAGE_RELS, PACKAGE_RELS_XML.as_bytes().to_vec());
    pkg.set_part(parts::DOCUMENT_RELS, DOCUMENT_RELS_XML.as_bytes().to_vec());
    pkg.set_part(parts::DOCUMENT, document_xml(paragraphs)?);
    Ok(pkg)
}

fn document_xml(paragraphs: &[String]) -> Result<Vec<u8>> {
    let part = parts::DOCUMENT;
    let mut writer = Writer::new(Vec::new());
    let write = |writer: &mut Writer<Vec<u8>>, event: Event<'_>| {
        writer
            .write_event(event)
            .map_err(|err| EngineError::xml(part, err))
    };

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;

    let mut document = BytesStart::new("w:document");
    document.push_attribute(("xmlns:w", WORDPROCESSING_NS));
    document.push_attribute(("xmlns:r", RELATIONSHIPS_NS));
    write(&mut writer, Event::Start(document))?;
    write(&mut writer, Event::Start(BytesStart::new("w:body")))?;

    for paragraph in paragraphs {
        write(&mut writer, Event::Start(BytesStart::new("w:p")))?;
        if !paragraph.is_empty() {
            write(&mut writer, Event::Start(BytesStart::new("w:r")))?;
            let mut text = BytesStart::new("w:t");
            text.push_attribute(("xml:space", "preserve"));
            write(&mut writer, Event::Start(text))?;
            write(&mut writer, Event::Text(BytesText::new(paragraph)))?;
            write(&mut writer, Event::End(BytesEnd::new("w:t")))?;
            write(&mut writer, Event::End(BytesEnd::new("w:r")))?;
        }
        write(&mut writer, Event::End(BytesEnd::new("w:p")))?;
    }

    section::write_section(&mut writer, &[])?;

    write(&mut writer, Event::End(BytesEnd::new("w:body")))?;
    write(&mut writer, Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}
