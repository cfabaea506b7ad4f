//! The `<response>` envelope every API call answers with.
//!
//! Successful calls look like `<response status="success"><result>...` and
//! failures like `<response status="error" code="403"><msg>...`. Error
//! message text moves around between firmware releases (`msg` text,
//! `msg/line` children, `result/msg`), so message collection walks the tree
//! rather than assuming one shape.

use thiserror::Error;

use crate::element::Element;
use crate::parser::ParseError;
use crate::writer::WriteError;

/// Errors surfaced by API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failure (connect, TLS, timeout, non-2xx status).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Response body was not parseable XML.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Request payload could not be serialized.
    #[error(transparent)]
    Write(#[from] WriteError),
    /// Response XML did not carry the expected envelope.
    #[error("unexpected API response: {0}")]
    Envelope(String),
    /// The device reported an error status.
    #[error("device returned error{}: {message}", format_code(.code))]
    Device {
        code: Option<String>,
        message: String,
    },
    /// A commit job finished with a FAIL result.
    #[error("commit job {job} failed: {details}")]
    CommitFailed { job: String, details: String },
    /// A commit job did not finish within the polling window.
    #[error("commit job {job} still active after {waited_secs}s")]
    CommitTimeout { job: String, waited_secs: u64 },
}

fn format_code(code: &Option<String>) -> String {
    match code {
        Some(code) => format!(" (code {code})"),
        None => String::new(),
    }
}

/// A checked API response: envelope validated, error status rejected.
#[derive(Debug)]
pub struct ApiResponse {
    root: Element,
}

impl ApiResponse {
    /// Validate the envelope of a parsed response document.
    pub fn from_root(root: Element) -> Result<Self, ApiError> {
        if root.tag != "response" {
            return Err(ApiError::Envelope(format!(
                "expected <response> root, got <{}>",
                root.tag
            )));
        }

        let status = root.attr("status").map(str::to_string);
        match status.as_deref() {
            Some("success") => Ok(Self { root }),
            Some("error") => Err(ApiError::Device {
                code: root.attr("code").map(str::to_string),
                message: collect_messages(&root),
            }),
            Some(other) => Err(ApiError::Envelope(format!(
                "unknown response status '{other}'"
            ))),
            None => Err(ApiError::Envelope(
                "response carries no status attribute".to_string(),
            )),
        }
    }

    /// The `<result>` payload, if the call produced one.
    pub fn result(&self) -> Option<&Element> {
        self.root.child("result")
    }

    /// Consume the response, keeping the `<result>` payload.
    pub fn into_result(self) -> Option<Element> {
        self.root
            .children
            .into_iter()
            .find(|child| child.tag == "result")
    }

    /// Human-readable message lines, wherever the device put them.
    pub fn message(&self) -> String {
        collect_messages(&self.root)
    }
}

/// Gather `msg`/`line` text from anywhere in the response tree.
fn collect_messages(root: &Element) -> String {
    let mut lines = Vec::new();
    collect_into(root, &mut lines);
    if lines.is_empty() {
        "(no message)".to_string()
    } else {
        lines.join("; ")
    }
}

fn collect_into(element: &Element, lines: &mut Vec<String>) {
    if matches!(element.tag.as_str(), "msg" | "line") {
        if let Some(text) = element.text.as_deref() {
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
    }
    for child in &element.children {
        collect_into(child, lines);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ApiError, ApiResponse};
    use crate::parser::parse;

    #[test]
    fn success_envelope_exposes_result() {
        let root = parse(
            br#"<response status="success"><result><key>LUFRPT1abc==</key></result></response>"#,
        )
        .expect("parse");
        let response = ApiResponse::from_root(root).expect("envelope");

        assert_eq!(
            response.result().and_then(|r| r.text_at(&["key"])),
            Some("LUFRPT1abc==")
        );
    }

    #[test]
    fn error_envelope_becomes_device_error() {
        let root = parse(
            br#"<response status="error" code="403"><result><msg>Invalid credentials</msg></result></response>"#,
        )
        .expect("parse");

        match ApiResponse::from_root(root) {
            Err(ApiError::Device { code, message }) => {
                assert_eq!(code.as_deref(), Some("403"));
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("expected device error, got {other:?}"),
        }
    }

    #[test]
    fn collects_multi_line_messages() {
        let root = parse(
            br#"<response status="error"><msg><line>first</line><line>second</line></msg></response>"#,
        )
        .expect("parse");

        match ApiResponse::from_root(root) {
            Err(ApiError::Device { message, .. }) => assert_eq!(message, "first; second"),
            other => panic!("expected device error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_foreign_root() {
        let root = parse(br#"<html><body/></html>"#).expect("parse");
        assert!(matches!(
            ApiResponse::from_root(root),
            Err(ApiError::Envelope(_))
        ));
    }
}
