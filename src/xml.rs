//! Small helpers over quick-xml for worksheet markup

use crate::error::{ExcelError, Result};
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;

/// Pull-based XML reader with one reusable event buffer
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // `<row r="3"/>` must still produce a start and an end
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, or `None` at end of input
    pub(crate) fn next(&mut self) -> Result<Option<Event<'_>>> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Unescaped value of an attribute, looked up by its qualified name
pub(crate) fn attribute<'a>(node: &'a BytesStart<'a>, name: &str) -> Result<Option<Cow<'a, str>>> {
    match node.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?)),
        None => Ok(None),
    }
}

/// Append an entity or character reference (`&amp;`, `&#169;`, `&#x20AC;`)
pub(crate) fn push_reference(text: &mut String, reference: &BytesRef) -> Result<()> {
    let raw = reference.xml_content()?;
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        }
        .map_err(|_| ExcelError::ReadError(format!("Invalid character reference '&{};'", raw)))?;
        if let Some(character) = char::from_u32(code) {
            text.push(character);
        }
    } else if let Some(entity) = resolve_xml_entity(&raw) {
        text.push_str(entity);
    } else {
        return Err(ExcelError::ReadError(format!("Unknown entity '&{};'", raw)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(xml: &str) -> String {
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut text = String::new();
        while let Some(event) = reader.next().unwrap() {
            match event {
                Event::Text(t) => text.push_str(&t.xml_content().unwrap()),
                Event::GeneralRef(r) => push_reference(&mut text, &r).unwrap(),
                _ => {}
            }
        }
        text
    }

    #[test]
    fn test_references_resolved() {
        assert_eq!(text_of("<t>a &amp; b</t>"), "a & b");
        assert_eq!(text_of("<t>&lt;xml&gt;</t>"), "<xml>");
        assert_eq!(text_of("<t>&#169; &#x20AC;</t>"), "© €");
    }

    #[test]
    fn test_empty_elements_expanded() {
        let mut reader = XmlReader::new(r#"<row r="3"/>"#.as_bytes());
        let mut names = Vec::new();
        while let Some(event) = reader.next().unwrap() {
            match event {
                Event::Start(e) => {
                    assert_eq!(attribute(&e, "r").unwrap().as_deref(), Some("3"));
                    names.push("start");
                }
                Event::End(_) => names.push("end"),
                _ => {}
            }
        }
        assert_eq!(names, vec!["start", "end"]);
    }
}
