use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Environment variable consulted when the profile carries no password.
pub const PASSWORD_ENV: &str = "PANOS_PASSWORD";

/// Connection profile for one managed firewall, loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceProfile {
    /// Management hostname or address of the primary device.
    pub hostname: String,
    /// HA peer hostname. When set and the primary reports itself passive,
    /// the import connects to the peer instead so changes land on the
    /// active node.
    #[serde(default)]
    pub ha_hostname: Option<String>,
    pub username: String,
    /// Prefer `PANOS_PASSWORD` over storing this in the file.
    #[serde(default)]
    pub password: Option<String>,
    /// Base aggregate interface that hosts imported sub-interfaces.
    /// Required by the interfaces import only.
    #[serde(default)]
    pub base_interface: Option<String>,
    #[serde(default = "default_vsys")]
    pub vsys: String,
    /// Management-plane certificates are self-signed on most deployments,
    /// so verification is off unless the profile opts in.
    #[serde(default = "default_true")]
    pub insecure_tls: bool,
}

fn default_vsys() -> String {
    "vsys1".to_string()
}

fn default_true() -> bool {
    true
}

impl DeviceProfile {
    /// The password from the profile, or from `PANOS_PASSWORD`.
    pub fn resolve_password(&self) -> Result<String> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        match std::env::var(PASSWORD_ENV) {
            Ok(password) if !password.is_empty() => Ok(password),
            _ => bail!(
                "no password in device profile and {} is not set",
                PASSWORD_ENV
            ),
        }
    }

    /// The base interface, required for the interfaces import.
    pub fn require_base_interface(&self) -> Result<&str> {
        self.base_interface
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
            .context("device profile does not set base_interface")
    }
}

/// Load a device profile from a TOML file.
pub fn load_profile(path: &Path) -> Result<DeviceProfile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read device profile {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse device profile {}", path.display()))
}
