use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// An XML element as exchanged with the PAN-OS management API.
///
/// The same type serves both directions: request payloads are composed with
/// the builder methods (`with_attr`, `with_child`, ...) and responses are
/// navigated with the accessors (`child`, `text_at`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements.
    pub children: Vec<Element>,
    /// Optional text content.
    pub text: Option<String>,
}

impl Element {
    /// Create an empty element with the provided tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Builder: set an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder: set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append a `<tag>text</tag>` child.
    ///
    /// This is the shape most PAN-OS config fields take, so it earns a
    /// shorthand.
    pub fn with_text_child(self, tag: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_child(Element::new(tag).with_text(text))
    }

    /// Return an attribute value by name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Return the first child with the provided tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Iterate over all children with the provided tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// Walk a nested child path and return the terminal node's text.
    pub fn text_at<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        let mut current = self;
        for segment in path {
            current = current.child(segment)?;
        }
        current.text.as_deref()
    }

    /// Like [`text_at`](Self::text_at), but trimmed and `None` for
    /// whitespace-only content. Device responses pad freely.
    pub fn trimmed_text_at<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        let value = self.text_at(path)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, value)?;
        }

        if self.children.is_empty() && self.text.is_none() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{}", text)?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}
