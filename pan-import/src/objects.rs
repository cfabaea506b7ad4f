//! Address/service object naming and deduplication.
//!
//! Object names are pure functions of the value they carry, so a value can
//! never produce two different names within a run:
//!
//! - `10.0.0.5/32` → `HOST-10.0.0.5`
//! - `10.1.0.0/24` → `NET-10.1.0.0-24`
//! - tcp + `443`   → `tcp-443`
//!
//! Planning walks the policy rows in file order and collects the objects
//! that must be created: a value is skipped when it is already on the
//! device or already pending from an earlier row. Addresses are keyed by
//! their canonical CIDR value, services by the composed name.

use std::collections::BTreeSet;

use ipnetwork::IpNetwork;
use serde::Serialize;
use thiserror::Error;

use crate::csv_input::PolicyRow;
use crate::device::{AddressObject, Protocol, ServiceObject};

/// Wildcard literal: never becomes an object.
pub const ANY: &str = "any";
/// Service literal passed through to the rule untouched.
pub const APPLICATION_DEFAULT: &str = "application-default";

/// A planning failure. Planning runs before any device mutation, so these
/// abort the import with the device untouched.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("rule '{rule}': {field} '{value}' is not a valid CIDR value")]
    BadCidr {
        rule: String,
        field: &'static str,
        value: String,
    },
    #[error("rule '{rule}': protocol '{value}' is neither tcp nor udp")]
    BadProtocol { rule: String, value: String },
    #[error("rule '{rule}': service port is empty")]
    EmptyPort { rule: String },
    #[error("row {row}: rule name is empty")]
    EmptyRuleName { row: usize },
}

/// Parse a CSV address field into a network. A bare IP without a mask is a
/// /32 (or /128) host.
pub fn parse_cidr(raw: &str) -> Result<IpNetwork, ipnetwork::IpNetworkError> {
    raw.trim().parse()
}

/// Derived name for an address value: `HOST-<ip>` for host routes,
/// `NET-<ip>-<mask>` otherwise.
pub fn address_name(network: &IpNetwork) -> String {
    if is_host(network) {
        format!("HOST-{}", network.ip())
    } else {
        format!("NET-{}-{}", network.ip(), network.prefix())
    }
}

/// Derived name for a service value: `<protocol>-<port>`.
pub fn service_name(protocol: Protocol, port: &str) -> String {
    format!("{}-{}", protocol.as_str(), port)
}

fn is_host(network: &IpNetwork) -> bool {
    match network {
        IpNetwork::V4(net) => net.prefix() == 32,
        IpNetwork::V6(net) => net.prefix() == 128,
    }
}

fn address_object(network: &IpNetwork) -> AddressObject {
    AddressObject {
        name: address_name(network),
        cidr: network.to_string(),
    }
}

/// The deduplicated, order-preserving creation sets for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectPlan {
    pub addresses: Vec<AddressObject>,
    pub services: Vec<ServiceObject>,
}

impl ObjectPlan {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.services.is_empty()
    }
}

/// Compute the minimal object creation set for `rows`.
///
/// `existing_addresses` and `existing_services` are the device snapshots;
/// anything already present remotely never enters the plan. Within the CSV,
/// the first occurrence of a value wins and later repeats are dropped, so
/// the output preserves first-appearance order.
pub fn plan_objects(
    rows: &[PolicyRow],
    existing_addresses: &[AddressObject],
    existing_services: &[ServiceObject],
) -> Result<ObjectPlan, PlanError> {
    // Remote address values that are not CIDR-shaped (fqdn or range
    // objects) can never collide with a planned value, so they are ignored.
    let mut seen_cidrs: BTreeSet<String> = existing_addresses
        .iter()
        .filter_map(|object| parse_cidr(&object.cidr).ok())
        .map(|network| network.to_string())
        .collect();
    let mut seen_services: BTreeSet<String> = existing_services
        .iter()
        .map(|object| object.name.clone())
        .collect();

    let mut plan = ObjectPlan::default();

    for row in rows {
        for (field, value) in [
            ("source_net", row.source_net.as_str()),
            ("destination_net", row.destination_net.as_str()),
        ] {
            let value = value.trim();
            if value == ANY {
                continue;
            }
            let network = parse_cidr(value).map_err(|_| PlanError::BadCidr {
                rule: row.rule_name.clone(),
                field,
                value: value.to_string(),
            })?;
            if seen_cidrs.insert(network.to_string()) {
                plan.addresses.push(address_object(&network));
            }
        }

        let port = row.service.trim();
        if port == ANY || port == APPLICATION_DEFAULT {
            continue;
        }
        if port.is_empty() {
            return Err(PlanError::EmptyPort {
                rule: row.rule_name.clone(),
            });
        }
        let protocol = Protocol::parse(&row.protocol).ok_or_else(|| PlanError::BadProtocol {
            rule: row.rule_name.clone(),
            value: row.protocol.clone(),
        })?;
        let name = service_name(protocol, port);
        if seen_services.insert(name.clone()) {
            plan.services.push(ServiceObject {
                name,
                protocol,
                port: port.to_string(),
            });
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{address_name, parse_cidr, plan_objects, service_name, PlanError};
    use crate::csv_input::PolicyRow;
    use crate::device::{AddressObject, Protocol, ServiceObject};

    fn row(source: &str, destination: &str, protocol: &str, service: &str) -> PolicyRow {
        PolicyRow {
            source_zone: "trust".to_string(),
            destination_zone: "untrust".to_string(),
            source_net: source.to_string(),
            destination_net: destination.to_string(),
            application: "web-browsing".to_string(),
            protocol: protocol.to_string(),
            service: service.to_string(),
            action: "allow".to_string(),
            profile_group: "none".to_string(),
            rule_name: "allow-web".to_string(),
        }
    }

    #[test]
    fn host_mask_names_host_object() {
        let network = parse_cidr("10.0.0.5/32").expect("cidr");
        assert_eq!(address_name(&network), "HOST-10.0.0.5");
    }

    #[test]
    fn other_masks_name_net_objects() {
        let network = parse_cidr("10.1.0.0/24").expect("cidr");
        assert_eq!(address_name(&network), "NET-10.1.0.0-24");
    }

    #[test]
    fn bare_ip_is_a_host() {
        let network = parse_cidr("192.0.2.9").expect("cidr");
        assert_eq!(address_name(&network), "HOST-192.0.2.9");
    }

    #[test]
    fn example_row_yields_host_and_service() {
        let plan = plan_objects(&[row("10.0.0.5/32", "any", "tcp", "443")], &[], &[])
            .expect("plan");

        assert_eq!(plan.addresses.len(), 1);
        assert_eq!(plan.addresses[0].name, "HOST-10.0.0.5");
        assert_eq!(plan.addresses[0].cidr, "10.0.0.5/32");
        assert_eq!(plan.services.len(), 1);
        assert_eq!(plan.services[0].name, "tcp-443");
        assert_eq!(plan.services[0].port, "443");
    }

    #[test]
    fn any_never_becomes_an_object() {
        let plan = plan_objects(&[row("any", "any", "tcp", "any")], &[], &[]).expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn application_default_never_becomes_a_service() {
        let plan = plan_objects(
            &[row("any", "any", "tcp", "application-default")],
            &[],
            &[],
        )
        .expect("plan");
        assert!(plan.services.is_empty());
    }

    #[test]
    fn repeated_csv_values_appear_once() {
        let rows = vec![
            row("10.0.0.5/32", "10.1.0.0/24", "tcp", "443"),
            row("10.0.0.5/32", "any", "tcp", "443"),
            row("10.1.0.0/24", "10.0.0.5/32", "udp", "514"),
        ];
        let plan = plan_objects(&rows, &[], &[]).expect("plan");

        let names: Vec<&str> = plan.addresses.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["HOST-10.0.0.5", "NET-10.1.0.0-24"]);
        let services: Vec<&str> = plan.services.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(services, vec!["tcp-443", "udp-514"]);
    }

    #[test]
    fn values_present_remotely_are_never_planned() {
        let existing_addresses = vec![AddressObject {
            name: "legacy-web-host".to_string(),
            cidr: "10.0.0.5/32".to_string(),
        }];
        let existing_services = vec![ServiceObject {
            name: "tcp-443".to_string(),
            protocol: Protocol::Tcp,
            port: "443".to_string(),
        }];

        let plan = plan_objects(
            &[row("10.0.0.5/32", "10.1.0.0/24", "tcp", "443")],
            &existing_addresses,
            &existing_services,
        )
        .expect("plan");

        assert_eq!(plan.addresses.len(), 1);
        assert_eq!(plan.addresses[0].name, "NET-10.1.0.0-24");
        assert!(plan.services.is_empty());
    }

    #[test]
    fn remote_fqdn_objects_do_not_disturb_dedup() {
        let existing = vec![AddressObject {
            name: "web-fqdn".to_string(),
            cidr: "web.example.net".to_string(),
        }];
        let plan =
            plan_objects(&[row("10.0.0.5/32", "any", "tcp", "443")], &existing, &[])
                .expect("plan");
        assert_eq!(plan.addresses.len(), 1);
    }

    #[test]
    fn malformed_cidr_aborts_planning() {
        let result = plan_objects(&[row("10.0.0.5/99", "any", "tcp", "443")], &[], &[]);
        assert!(matches!(result, Err(PlanError::BadCidr { field, .. }) if field == "source_net"));
    }

    #[test]
    fn unknown_protocol_aborts_planning() {
        let result = plan_objects(&[row("any", "any", "icmp", "443")], &[], &[]);
        assert!(matches!(result, Err(PlanError::BadProtocol { .. })));
    }

    #[test]
    fn service_names_compose_protocol_and_port() {
        assert_eq!(service_name(Protocol::Udp, "514"), "udp-514");
    }
}
