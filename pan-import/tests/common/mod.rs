use anyhow::{bail, Result};
use pan_import::device::{
    AddressObject, Firewall, SecurityRule, ServiceObject, Subinterface, SyncState, SystemInfo,
};
use panos_xapi::CommitOutcome;

/// In-memory device: serves canned snapshots and records every mutation.
#[derive(Debug, Default)]
pub struct FakeFirewall {
    pub ha_enabled: bool,
    pub synced: bool,
    pub addresses: Vec<AddressObject>,
    pub services: Vec<ServiceObject>,
    pub rule_names: Vec<String>,
    /// Simulate a device-side failure when this rule comes up.
    pub fail_on_rule: Option<String>,

    pub created_addresses: Vec<AddressObject>,
    pub created_services: Vec<ServiceObject>,
    pub created_rules: Vec<SecurityRule>,
    pub created_subinterfaces: Vec<(String, Vec<Subinterface>)>,
    pub commits: Vec<String>,
    pub sync_triggers: usize,
}

impl Firewall for FakeFirewall {
    fn system_info(&mut self) -> Result<SystemInfo> {
        Ok(SystemInfo {
            hostname: "fake-fw".to_string(),
            model: "PA-FAKE".to_string(),
            serial: "000000000000".to_string(),
            sw_version: "11.1.0".to_string(),
        })
    }

    fn ensure_synced(&mut self) -> Result<SyncState> {
        if !self.ha_enabled {
            return Ok(SyncState::Standalone);
        }
        if self.synced {
            return Ok(SyncState::InSync);
        }
        self.sync_triggers += 1;
        Ok(SyncState::SyncTriggered)
    }

    fn address_objects(&mut self) -> Result<Vec<AddressObject>> {
        Ok(self.addresses.clone())
    }

    fn service_objects(&mut self) -> Result<Vec<ServiceObject>> {
        Ok(self.services.clone())
    }

    fn security_rule_names(&mut self) -> Result<Vec<String>> {
        Ok(self.rule_names.clone())
    }

    fn create_address_objects(&mut self, objects: &[AddressObject]) -> Result<()> {
        self.created_addresses.extend_from_slice(objects);
        Ok(())
    }

    fn create_service_objects(&mut self, objects: &[ServiceObject]) -> Result<()> {
        self.created_services.extend_from_slice(objects);
        Ok(())
    }

    fn create_security_rule(&mut self, rule: &SecurityRule) -> Result<()> {
        if self.fail_on_rule.as_deref() == Some(rule.name.as_str()) {
            bail!("device rejected rule '{}'", rule.name);
        }
        self.created_rules.push(rule.clone());
        Ok(())
    }

    fn create_subinterfaces(&mut self, base: &str, subinterfaces: &[Subinterface]) -> Result<()> {
        self.created_subinterfaces
            .push((base.to_string(), subinterfaces.to_vec()));
        Ok(())
    }

    fn commit(&mut self, description: &str) -> Result<CommitOutcome> {
        self.commits.push(description.to_string());
        Ok(CommitOutcome::Committed {
            job: "42".to_string(),
        })
    }
}
