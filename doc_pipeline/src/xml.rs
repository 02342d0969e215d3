//! Shared quick-xml plumbing for the pipeline stages.
//!
//! OOXML parts are rewritten as event streams: read, transform, emit.
//! Name matching uses the conventional prefixes (`w:`, `r:`) that OOXML
//! writers emit rather than resolving namespace URIs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{EngineError, Result};

/// Unescaped value of the named attribute, if present.
pub(crate) fn attr_value(part: &str, el: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in el.attributes() {
        let attr = attr.map_err(|err| EngineError::xml(part, err))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| EngineError::xml(part, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// True when any element in `xml` has the given qualified name.
pub(crate) fn contains_element(part: &str, xml: &[u8], name: &[u8]) -> Result<bool> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => return Ok(false),
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == name => {
                return Ok(true);
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Serialize every element matching `matches` (subtree included) into
/// standalone XML fragments, in document order.
pub(crate) fn collect_elements<F>(part: &str, xml: &[u8], mut matches: F) -> Result<Vec<Vec<u8>>>
where
    F: FnMut(&BytesStart<'_>) -> bool,
{
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut found = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            Event::Empty(e) if matches(&e) => {
                let mut writer = Writer::new(Vec::new());
                writer
                    .write_event(Event::Empty(e))
                    .map_err(|err| EngineError::xml(part, err))?;
                found.push(writer.into_inner());
            }
            Event::Start(e) if matches(&e) => {
                let mut writer = Writer::new(Vec::new());
                writer
                    .write_event(Event::Start(e))
                    .map_err(|err| EngineError::xml(part, err))?;
                let mut depth = 1usize;
                let mut inner = Vec::new();
                while depth > 0 {
                    let event = reader
                        .read_event_into(&mut inner)
                        .map_err(|err| EngineError::xml(part, err))?;
                    match &event {
                        Event::Start(_) => depth += 1,
                        Event::End(_) => depth -= 1,
                        Event::Eof => {
                            return Err(EngineError::xml(part, "unexpected EOF inside element"))
                        }
                        _ => {}
                    }
                    writer
                        .write_event(event)
                        .map_err(|err| EngineError::xml(part, err))?;
                    inner.clear();
                }
                found.push(writer.into_inner());
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(found)
}

/// Stream-copy `xml`, splicing `insert` in immediately before the first
/// closing tag named `close_name`.
pub(crate) fn insert_before_close(
    part: &str,
    xml: &[u8],
    close_name: &[u8],
    insert: &[u8],
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut spliced = false;
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            Event::End(e) if !spliced && e.name().as_ref() == close_name => {
                writer.get_mut().extend_from_slice(insert);
                spliced = true;
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
    if !spliced {
        return Err(EngineError::xml(
            part,
            format!(
                "no closing tag {} found",
                String::from_utf8_lossy(close_name)
            ),
        ));
    }
    Ok(writer.into_inner())
}

/// Stream-copy `xml`, splicing `insert` in immediately after the first
/// opening tag named `open_name`.
pub(crate) fn insert_after_open(
    part: &str,
    xml: &[u8],
    open_name: &[u8],
    insert: &[u8],
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut spliced = false;
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| EngineError::xml(part, err))?
        {
            Event::Eof => break,
            Event::Start(e) if !spliced && e.name().as_ref() == open_name => {
                writer
                    .write_event(Event::Start(e))
                    .map_err(|err| EngineError::xml(part, err))?;
                writer.get_mut().extend_from_slice(insert);
                spliced = true;
            }
            event => {
                writer
                    .write_event(event)
                    .map_err(|err| EngineError::xml(part, err))?;
            }
        }
        buf.clear();
    }
    if !spliced {
        return Err(EngineError::xml(
            part,
            format!("no opening tag {} found", String::from_utf8_lossy(open_name)),
        ));
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_matching_subtrees() {
        let xml = br#"<root><a id="1"><b/></a><c/><a id="2"/></root>"#;
        let found = collect_elements("test", xml, |e| e.name().as_ref() == b"a").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(String::from_utf8(found[0].clone()).unwrap(), r#"<a id="1"><b/></a>"#);
        assert_eq!(String::from_utf8(found[1].clone()).unwrap(), r#"<a id="2"/>"#);
    }

    #[test]
    fn splices_before_closing_tag() {
        let xml = b"<root><a/></root>";
        let out = insert_before_close("test", xml, b"root", b"<b/>").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<root><a/><b/></root>");
    }

    #[test]
    fn splices_after_opening_tag() {
        let xml = b"<root><a/></root>";
        let out = insert_after_open("test", xml, b"root", b"<b/>").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<root><b/><a/></root>");
    }

    #[test]
    fn finds_elements_by_name() {
        let xml = b"<root><w:docDefaults/></root>";
        assert!(contains_element("test", xml, b"w:docDefaults").unwrap());
        assert!(!contains_element("test", xml, b"w:style").unwrap());
    }
}
