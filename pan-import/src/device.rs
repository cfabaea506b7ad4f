//! The device capability seam and the configuration object types.
//!
//! The import flows are written against [`Firewall`] so they can run
//! unchanged against the production XML-API device or a fake in tests. The
//! trait mirrors what the flows actually need from the management plane:
//! identity, HA sync assurance, enumeration of current state, batched
//! object creation, rule creation, commit.

use anyhow::Result;
use panos_xapi::CommitOutcome;
use serde::Serialize;

/// Transport protocol of a service object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tcp" => Some(Self::Tcp),
            "udp" => Some(Self::Udp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A named address object mapping to one CIDR value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressObject {
    pub name: String,
    /// Canonical `ip/prefix` form.
    pub cidr: String,
}

/// A named service object mapping to one protocol and destination port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceObject {
    pub name: String,
    pub protocol: Protocol,
    pub port: String,
}

/// One security rule, as staged into the rulebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRule {
    pub name: String,
    pub from_zone: String,
    pub to_zone: String,
    /// Address-object name or the literal `any`.
    pub source: String,
    /// Address-object name or the literal `any`.
    pub destination: String,
    pub application: String,
    /// Service-object name or one of the literals `any` /
    /// `application-default`.
    pub service: String,
    pub action: String,
    /// Omitted on the device when `None` (CSV field `none`).
    pub profile_group: Option<String>,
    /// Every imported rule is tagged so a bulk import can be found again.
    pub tag: String,
    pub log_end: bool,
}

/// One layer-3 sub-interface staged onto the base aggregate interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subinterface {
    /// `<base>.<tag>`, e.g. `ae1.120`.
    pub name: String,
    pub tag: u16,
    pub ip: String,
    /// The zone doubles as the interface comment.
    pub comment: String,
    pub zone: String,
    pub virtual_router: String,
}

/// Device identity line printed after connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub hostname: String,
    pub model: String,
    pub serial: String,
    pub sw_version: String,
}

/// Outcome of the pre-flight HA configuration-sync check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    /// HA not enabled; nothing to synchronize.
    Standalone,
    /// Peers already synchronized.
    InSync,
    /// Peers were out of sync; synchronization has been triggered.
    SyncTriggered,
}

/// Capability interface over one managed firewall.
///
/// Methods take `&mut self` so fakes can record calls; the production
/// implementation is free to ignore the mutability.
pub trait Firewall {
    /// Identity of the connected device.
    fn system_info(&mut self) -> Result<SystemInfo>;

    /// Check HA config-sync state and trigger synchronization when the
    /// peers have diverged.
    fn ensure_synced(&mut self) -> Result<SyncState>;

    /// Snapshot of address objects currently on the device.
    fn address_objects(&mut self) -> Result<Vec<AddressObject>>;

    /// Snapshot of service objects currently on the device.
    fn service_objects(&mut self) -> Result<Vec<ServiceObject>>;

    /// Names of the rules currently in the rulebase. Existence checks are
    /// by name only; rule content is never compared.
    fn security_rule_names(&mut self) -> Result<Vec<String>>;

    /// Stage and create address objects in one batch.
    fn create_address_objects(&mut self, objects: &[AddressObject]) -> Result<()>;

    /// Stage and create service objects in one batch.
    fn create_service_objects(&mut self, objects: &[ServiceObject]) -> Result<()>;

    /// Append one rule to the rulebase.
    fn create_security_rule(&mut self, rule: &SecurityRule) -> Result<()>;

    /// Ensure the base interface exists, then stage the sub-interfaces and
    /// their zone / virtual-router / vsys bindings.
    fn create_subinterfaces(&mut self, base: &str, subinterfaces: &[Subinterface]) -> Result<()>;

    /// Commit the candidate configuration and wait for the job.
    fn commit(&mut self, description: &str) -> Result<CommitOutcome>;
}
