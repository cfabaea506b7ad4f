//! The production [`Firewall`]: a PAN-OS device driven over the XML API.
//!
//! Configuration lives under the single-vsys xpath
//! `/config/devices/entry[@name='localhost.localdomain']/vsys/entry[...]`;
//! network plumbing (interfaces, virtual routers) sits beside it under
//! `network/`. All writes use `action=set`, which merges into the candidate
//! configuration — re-staging an existing entry overwrites it rather than
//! duplicating it, which is exactly the rerun behavior the interface import
//! relies on.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use panos_xapi::{Client, CommitOutcome, Element};

use crate::config::DeviceProfile;
use crate::device::{
    AddressObject, Firewall, Protocol, SecurityRule, ServiceObject, Subinterface, SyncState,
    SystemInfo,
};

const DEVICE_XPATH: &str = "/config/devices/entry[@name='localhost.localdomain']";

pub struct XapiFirewall {
    client: Client,
    vsys: String,
}

impl XapiFirewall {
    /// Connect per the device profile.
    ///
    /// With an HA pair, the session moves to the peer when the configured
    /// primary reports itself passive, so changes always land on the
    /// active node.
    pub fn connect(profile: &DeviceProfile) -> Result<Self> {
        let password = profile.resolve_password()?;
        let client = Client::connect(
            &profile.hostname,
            &profile.username,
            &password,
            profile.insecure_tls,
        )
        .with_context(|| format!("failed to connect to {}", profile.hostname))?;

        let mut fw = Self {
            client,
            vsys: profile.vsys.clone(),
        };

        if let Some(peer) = &profile.ha_hostname {
            if fw.local_ha_state()?.as_deref() == Some("passive") {
                fw.client = Client::connect(
                    peer,
                    &profile.username,
                    &password,
                    profile.insecure_tls,
                )
                .with_context(|| format!("failed to connect to HA peer {peer}"))?;
            }
        }

        Ok(fw)
    }

    /// Hostname of the node this session ended up on.
    pub fn host(&self) -> &str {
        self.client.host()
    }

    fn vsys_xpath(&self, suffix: &str) -> String {
        format!("{DEVICE_XPATH}/vsys/entry[@name='{}']{suffix}", self.vsys)
    }

    fn ha_state(&self) -> Result<Option<Element>> {
        let cmd = Element::new("show")
            .with_child(Element::new("high-availability").with_child(Element::new("state")));
        self.client
            .op(&cmd)
            .context("failed to query HA state")
    }

    fn local_ha_state(&self) -> Result<Option<String>> {
        let Some(state) = self.ha_state()? else {
            return Ok(None);
        };
        if state.trimmed_text_at(&["enabled"]) != Some("yes") {
            return Ok(None);
        }
        Ok(state
            .trimmed_text_at(&["group", "local-info", "state"])
            .map(str::to_string))
    }
}

impl Firewall for XapiFirewall {
    fn system_info(&mut self) -> Result<SystemInfo> {
        let cmd =
            Element::new("show").with_child(Element::new("system").with_child(Element::new("info")));
        let result = self
            .client
            .op(&cmd)
            .context("failed to query system info")?
            .context("system info query returned no result")?;

        let field = |name: &str| {
            result
                .trimmed_text_at(&["system", name])
                .unwrap_or("unknown")
                .to_string()
        };
        Ok(SystemInfo {
            hostname: field("hostname"),
            model: field("model"),
            serial: field("serial"),
            sw_version: field("sw-version"),
        })
    }

    fn ensure_synced(&mut self) -> Result<SyncState> {
        let Some(state) = self.ha_state()? else {
            return Ok(SyncState::Standalone);
        };
        if state.trimmed_text_at(&["enabled"]) != Some("yes") {
            return Ok(SyncState::Standalone);
        }
        if state.trimmed_text_at(&["group", "running-sync"]) == Some("synchronized") {
            return Ok(SyncState::InSync);
        }

        let sync = Element::new("request").with_child(
            Element::new("high-availability").with_child(
                Element::new("sync-to-remote").with_child(Element::new("running-config")),
            ),
        );
        self.client
            .op(&sync)
            .context("failed to trigger HA config synchronization")?;
        Ok(SyncState::SyncTriggered)
    }

    fn address_objects(&mut self) -> Result<Vec<AddressObject>> {
        let result = self
            .client
            .get_config(&self.vsys_xpath("/address"))
            .context("failed to list address objects")?;

        let mut objects = Vec::new();
        let entries = result
            .as_ref()
            .and_then(|result| result.child("address"));
        if let Some(address) = entries {
            for entry in address.children_named("entry") {
                // fqdn and range objects have no ip-netmask; they can never
                // collide with a planned CIDR value.
                let (Some(name), Some(cidr)) =
                    (entry.attr("name"), entry.trimmed_text_at(&["ip-netmask"]))
                else {
                    continue;
                };
                objects.push(AddressObject {
                    name: name.to_string(),
                    cidr: cidr.to_string(),
                });
            }
        }
        Ok(objects)
    }

    fn service_objects(&mut self) -> Result<Vec<ServiceObject>> {
        let result = self
            .client
            .get_config(&self.vsys_xpath("/service"))
            .context("failed to list service objects")?;

        let mut objects = Vec::new();
        let entries = result
            .as_ref()
            .and_then(|result| result.child("service"));
        if let Some(service) = entries {
            for entry in service.children_named("entry") {
                let Some(name) = entry.attr("name") else {
                    continue;
                };
                for protocol in [Protocol::Tcp, Protocol::Udp] {
                    if let Some(port) =
                        entry.trimmed_text_at(&["protocol", protocol.as_str(), "port"])
                    {
                        objects.push(ServiceObject {
                            name: name.to_string(),
                            protocol,
                            port: port.to_string(),
                        });
                    }
                }
            }
        }
        Ok(objects)
    }

    fn security_rule_names(&mut self) -> Result<Vec<String>> {
        let result = self
            .client
            .get_config(&self.vsys_xpath("/rulebase/security/rules"))
            .context("failed to list security rules")?;

        let mut names = Vec::new();
        let rules = result.as_ref().and_then(|result| result.child("rules"));
        if let Some(rules) = rules {
            for entry in rules.children_named("entry") {
                if let Some(name) = entry.attr("name") {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn create_address_objects(&mut self, objects: &[AddressObject]) -> Result<()> {
        let entries: Vec<Element> = objects.iter().map(address_entry).collect();
        self.client
            .set_config(&self.vsys_xpath("/address"), &entries)
            .context("failed to create address objects")?;
        Ok(())
    }

    fn create_service_objects(&mut self, objects: &[ServiceObject]) -> Result<()> {
        let entries: Vec<Element> = objects.iter().map(service_entry).collect();
        self.client
            .set_config(&self.vsys_xpath("/service"), &entries)
            .context("failed to create service objects")?;
        Ok(())
    }

    fn create_security_rule(&mut self, rule: &SecurityRule) -> Result<()> {
        self.client
            .set_config(
                &self.vsys_xpath("/rulebase/security/rules"),
                &[rule_entry(rule)],
            )
            .with_context(|| format!("failed to create rule '{}'", rule.name))?;
        Ok(())
    }

    fn create_subinterfaces(&mut self, base: &str, subinterfaces: &[Subinterface]) -> Result<()> {
        // Base interface first; set merges, so an existing base is
        // untouched apart from gaining layer3 mode.
        let base_entry = Element::new("entry")
            .with_attr("name", base)
            .with_child(Element::new("layer3"));
        self.client
            .set_config(
                &format!("{DEVICE_XPATH}/network/interface/aggregate-ethernet"),
                &[base_entry],
            )
            .with_context(|| format!("failed to ensure base interface {base}"))?;

        let units: Vec<Element> = subinterfaces.iter().map(unit_entry).collect();
        self.client
            .set_config(
                &format!(
                    "{DEVICE_XPATH}/network/interface/aggregate-ethernet/entry[@name='{base}']/layer3/units"
                ),
                &units,
            )
            .context("failed to create sub-interfaces")?;

        let zones = grouped_member_entries(subinterfaces, |sub| &sub.zone, "layer3", |list| {
            Element::new("network").with_child(list)
        });
        self.client
            .set_config(&self.vsys_xpath("/zone"), &zones)
            .context("failed to bind zones")?;

        let routers =
            grouped_member_entries(subinterfaces, |sub| &sub.virtual_router, "interface", |list| {
                list
            });
        self.client
            .set_config(&format!("{DEVICE_XPATH}/network/virtual-router"), &routers)
            .context("failed to bind virtual routers")?;

        // Register the new interfaces with the vsys, the equivalent of
        // organizing freshly created interfaces into the first vsys.
        let members: Vec<Element> = subinterfaces
            .iter()
            .map(|sub| Element::new("member").with_text(&sub.name))
            .collect();
        self.client
            .set_config(&self.vsys_xpath("/import/network/interface"), &members)
            .context("failed to import interfaces into vsys")?;

        Ok(())
    }

    fn commit(&mut self, description: &str) -> Result<CommitOutcome> {
        self.client
            .commit(description)
            .context("commit failed")
    }
}

fn address_entry(object: &AddressObject) -> Element {
    Element::new("entry")
        .with_attr("name", &object.name)
        .with_text_child("ip-netmask", &object.cidr)
}

fn service_entry(object: &ServiceObject) -> Element {
    Element::new("entry")
        .with_attr("name", &object.name)
        .with_child(
            Element::new("protocol").with_child(
                Element::new(object.protocol.as_str()).with_text_child("port", &object.port),
            ),
        )
}

fn rule_entry(rule: &SecurityRule) -> Element {
    let mut entry = Element::new("entry")
        .with_attr("name", &rule.name)
        .with_child(member_list("from", &rule.from_zone))
        .with_child(member_list("to", &rule.to_zone))
        .with_child(member_list("source", &rule.source))
        .with_child(member_list("destination", &rule.destination))
        .with_child(member_list("application", &rule.application))
        .with_child(member_list("service", &rule.service))
        .with_text_child("action", &rule.action)
        .with_text_child("log-end", if rule.log_end { "yes" } else { "no" })
        .with_child(member_list("tag", &rule.tag));

    if let Some(group) = &rule.profile_group {
        entry = entry.with_child(
            Element::new("profile-setting").with_child(member_list("group", group)),
        );
    }
    entry
}

fn unit_entry(sub: &Subinterface) -> Element {
    Element::new("entry")
        .with_attr("name", &sub.name)
        .with_text_child("tag", sub.tag.to_string())
        .with_child(
            Element::new("ip").with_child(Element::new("entry").with_attr("name", &sub.ip)),
        )
        .with_text_child("comment", &sub.comment)
}

fn member_list(tag: &str, member: &str) -> Element {
    Element::new(tag).with_text_child("member", member)
}

/// One `<entry name=K>` per distinct key, carrying a member list of every
/// sub-interface mapped to that key. Zones want the list tagged `layer3`
/// and nested under `network`; virtual routers want a bare `interface`
/// list — `list_tag` and `wrap` cover both shapes.
fn grouped_member_entries<'a>(
    subinterfaces: &'a [Subinterface],
    key: impl Fn(&'a Subinterface) -> &'a String,
    list_tag: &str,
    wrap: impl Fn(Element) -> Element,
) -> Vec<Element> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for sub in subinterfaces {
        groups.entry(key(sub).as_str()).or_default().push(&sub.name);
    }

    groups
        .into_iter()
        .map(|(name, members)| {
            let list = members
                .into_iter()
                .fold(Element::new(list_tag), |list, member| {
                    list.with_text_child("member", member)
                });
            Element::new("entry")
                .with_attr("name", name)
                .with_child(wrap(list))
        })
        .collect()
}
