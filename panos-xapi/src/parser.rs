use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

use crate::element::Element;

/// Errors that can occur while parsing API bytes into an [`Element`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input XML could not be decoded or tokenized.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Input bytes were not valid UTF-8 for tag/attribute/text extraction.
    #[error("invalid UTF-8 while parsing XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// Failed to decode a text entity.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// Structural issue in the XML document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Parse API response bytes into an [`Element`] tree.
///
/// Responses are small (object listings top out at a few hundred entries),
/// so the whole body is held in memory and parsed in one pass.
pub fn parse(xml: &[u8]) -> Result<Element, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let element = element_from_start(&e, &reader)?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = element_from_start(&e, &reader)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    ParseError::Malformed("closing tag without open tag".to_string())
                })?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                push_text(&mut stack, &e.unescape()?);
            }
            Event::CData(e) => {
                push_text(&mut stack, std::str::from_utf8(e.as_ref())?);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed(
            "unclosed element(s) at end of document".to_string(),
        ));
    }

    root.ok_or_else(|| ParseError::Malformed("no root element found".to_string()))
}

/// Attach a finished element to its parent, or promote it to root.
fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Malformed(
            "multiple top-level elements found".to_string(),
        ));
    }
    *root = Some(element);
    Ok(())
}

/// Accumulate text content onto the currently open element.
fn push_text(stack: &mut [Element], text: &str) {
    let Some(current) = stack.last_mut() else {
        return;
    };
    if text.trim().is_empty() {
        return;
    }
    match &mut current.text {
        Some(existing) => existing.push_str(text),
        None => current.text = Some(text.to_string()),
    }
}

fn element_from_start(
    e: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<Element, ParseError> {
    let tag = qname_to_string(e.name())?;
    let mut element = Element::new(tag);

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = qname_to_string(attr.key)?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())?
            .into_owned();
        element.attributes.insert(key, value);
    }

    Ok(element)
}

fn qname_to_string(name: QName<'_>) -> Result<String, ParseError> {
    Ok(std::str::from_utf8(name.as_ref())?.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::parse;

    #[test]
    fn parses_keygen_response() {
        let root = parse(
            br#"<response status="success"><result><key>LUFRPT1abc==</key></result></response>"#,
        )
        .expect("parse");

        assert_eq!(root.tag, "response");
        assert_eq!(root.attr("status"), Some("success"));
        assert_eq!(root.text_at(&["result", "key"]), Some("LUFRPT1abc=="));
    }

    #[test]
    fn parses_entries_with_attributes_and_empty_elements() {
        let root = parse(
            br#"<address><entry name="HOST-10.0.0.5"><ip-netmask>10.0.0.5/32</ip-netmask></entry><entry name="dmz-web"><fqdn>web.example.net</fqdn></entry><placeholder/></address>"#,
        )
        .expect("parse");

        let entries: Vec<_> = root.children_named("entry").collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].attr("name"), Some("HOST-10.0.0.5"));
        assert_eq!(entries[1].text_at(&["fqdn"]), Some("web.example.net"));
    }

    #[test]
    fn reads_cdata_message_lines() {
        let root = parse(
            br#"<response status="error"><msg><line><![CDATA[  invalid xpath ]]></line></msg></response>"#,
        )
        .expect("parse");

        assert_eq!(
            root.child("msg")
                .and_then(|m| m.trimmed_text_at(&["line"])),
            Some("invalid xpath")
        );
    }

    #[test]
    fn rejects_truncated_document() {
        assert!(parse(br#"<response status="success"><result>"#).is_err());
    }
}
