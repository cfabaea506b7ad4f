use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::element::Element;

/// Errors that can occur while serializing an [`Element`] tree.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to serialize XML bytes.
    #[error("failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Serialized bytes were not valid UTF-8.
    #[error("serialized XML was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize an [`Element`] tree into a compact XML string.
///
/// No indentation: the output goes into the `element=` form parameter of a
/// config-set request, never in front of a human.
pub fn write(element: &Element) -> Result<String, WriteError> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(element.tag.as_str());

    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;

    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }

    for child in &element.children {
        write_element(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new(element.tag.as_str())))?;
    Ok(())
}
