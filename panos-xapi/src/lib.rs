//! Minimal blocking client for the PAN-OS XML management API.
//!
//! PAN-OS devices expose their management plane as an HTTPS endpoint that
//! accepts form-encoded requests and answers with small XML documents. This
//! crate covers the subset of that API needed to provision configuration:
//!
//! - [`client`] — session establishment (`type=keygen`), candidate-config
//!   reads and writes (`type=config`), operational commands (`type=op`),
//!   and commit with job polling (`type=commit`).
//! - [`element`] — the XML element tree used to compose request payloads
//!   and navigate responses.
//! - [`parser`] / [`writer`] — conversion between API bytes and elements.
//! - [`response`] — the `<response status=...>` envelope, turning device
//!   errors into typed failures.
//!
//! All calls are blocking and strictly sequential; there is no retry logic.
//! A failed call surfaces as an [`ApiError`] and it is up to the caller to
//! decide whether the device has been left half-configured.

pub mod client;
pub mod element;
pub mod parser;
pub mod response;
pub mod writer;

pub use client::{Client, CommitOutcome};
pub use element::Element;
pub use parser::{parse, ParseError};
pub use response::ApiError;
pub use writer::{write, WriteError};
