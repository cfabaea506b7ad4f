//! CSV-driven provisioning of PAN-OS firewall configuration.
//!
//! Two one-shot, operator-supervised imports:
//!
//! - **Interfaces**: a CSV of `(tag, zone, ip, virtual_router)` rows becomes
//!   tagged layer-3 sub-interfaces on a configured base aggregate interface,
//!   with zone and virtual-router bindings, followed by a commit.
//! - **Policies**: a CSV of rule rows becomes the minimal set of missing
//!   address and service objects plus the security rules that do not already
//!   exist on the device. Never commits — the operator reviews the candidate
//!   configuration first.
//!
//! # Architecture
//!
//! - [`csv_input`] — typed readers for the two fixed CSV schemas
//! - [`objects`] — address/service object naming and deduplication against
//!   remote state
//! - [`policy_import`] / [`interface_import`] — the two import flows,
//!   written against the device trait so they run identically on a fake
//! - [`device`] — the capability trait the flows are written against, plus
//!   the configuration object types
//! - [`xapi`] — the production device, backed by the `panos-xapi` client
//! - [`config`] — the TOML device profile (host, credentials, base
//!   interface, vsys)
//! - [`report`] — terminal and JSON rendering of run summaries
//!
//! Everything is strictly sequential: CSV rows are processed in file order,
//! object creation happens before rule creation, and any remote failure
//! aborts the run. There is no rollback — a mid-loop failure leaves the
//! device partially provisioned, which is why both flows print what they
//! created as they go.

pub mod config;
pub mod csv_input;
pub mod device;
pub mod interface_import;
pub mod objects;
pub mod policy_import;
pub mod report;
pub mod xapi;
