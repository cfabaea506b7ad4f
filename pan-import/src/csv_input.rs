//! Typed readers for the two fixed CSV schemas.
//!
//! Both files start with a header row whose content carries no semantics —
//! it is skipped, and columns are bound by position. Row order is preserved;
//! the import flows process rows in file order.

use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

/// One sub-interface definition: `tag, zone, ip, virtual_router`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRow {
    pub tag: String,
    pub zone: String,
    pub ip: String,
    pub virtual_router: String,
}

/// One security-rule definition: `source_zone, destination_zone,
/// source_net, destination_net, application, protocol, service, action,
/// profile_group, rule_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRow {
    pub source_zone: String,
    pub destination_zone: String,
    pub source_net: String,
    pub destination_net: String,
    pub application: String,
    pub protocol: String,
    pub service: String,
    pub action: String,
    pub profile_group: String,
    pub rule_name: String,
}

/// Read interface rows from `path`, skipping the header row.
pub fn read_interface_rows(path: &Path) -> Result<Vec<InterfaceRow>> {
    read_rows(path)
}

/// Read policy rows from `path`, skipping the header row.
pub fn read_policy_rows(path: &Path) -> Result<Vec<PolicyRow>> {
    read_rows(path)
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    // has_headers(false) keeps binding positional: the header row is
    // skipped by index, not matched by name.
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record: StringRecord = record
            .with_context(|| format!("failed to read {} line {}", path.display(), index + 1))?;
        if index == 0 {
            continue;
        }
        let row: T = record.deserialize(None).with_context(|| {
            format!("malformed row at {} line {}", path.display(), index + 1)
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::{read_interface_rows, read_policy_rows};

    #[test]
    fn reads_interface_rows_in_file_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("interfaces.csv");
        fs::write(
            &path,
            "tag,zone,ip,virtual_router\n\
             120,dmz,192.0.2.1/28,vr-edge\n\
             121,guest,192.0.2.17/28,vr-edge\n",
        )
        .expect("write csv");

        let rows = read_interface_rows(&path).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tag, "120");
        assert_eq!(rows[0].zone, "dmz");
        assert_eq!(rows[1].ip, "192.0.2.17/28");
        assert_eq!(rows[1].virtual_router, "vr-edge");
    }

    #[test]
    fn header_content_carries_no_semantics() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("interfaces.csv");
        fs::write(
            &path,
            "whatever,the,operator,typed\n120,dmz,192.0.2.1/28,vr-edge\n",
        )
        .expect("write csv");

        let rows = read_interface_rows(&path).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag, "120");
    }

    #[test]
    fn reads_policy_rows_and_trims_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");
        fs::write(
            &path,
            "source_zone,destination_zone,source_net,destination_net,application,protocol,service,action,profile_group,rule_name\n\
             trust, untrust ,10.0.0.5/32,any,web-browsing,tcp,443,allow,none,allow-web\n",
        )
        .expect("write csv");

        let rows = read_policy_rows(&path).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].destination_zone, "untrust");
        assert_eq!(rows[0].source_net, "10.0.0.5/32");
        assert_eq!(rows[0].rule_name, "allow-web");
    }

    #[test]
    fn short_row_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("policies.csv");
        fs::write(
            &path,
            "source_zone,destination_zone,source_net,destination_net,application,protocol,service,action,profile_group,rule_name\n\
             trust,untrust,10.0.0.5/32\n",
        )
        .expect("write csv");

        assert!(read_policy_rows(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        assert!(read_policy_rows(&dir.path().join("nope.csv")).is_err());
    }
}
