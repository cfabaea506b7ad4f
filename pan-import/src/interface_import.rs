//! The interface import flow.
//!
//! Sequence: HA sync check → plan sub-interfaces → stage and create them on
//! the base aggregate interface → commit. No deduplication against remote
//! state: a rerun re-stages every row and the device decides whether to
//! reject or overwrite.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use panos_xapi::CommitOutcome;
use serde::Serialize;

use crate::csv_input::InterfaceRow;
use crate::device::{Firewall, Subinterface, SyncState};
use crate::objects;

/// VLAN tags valid on a layer-3 sub-interface.
const VLAN_TAG_RANGE: std::ops::RangeInclusive<u16> = 1..=4094;

/// The sub-interfaces one run intends to stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfacePlan {
    pub base: String,
    pub subinterfaces: Vec<Subinterface>,
}

/// Commit result in report form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitSummary {
    NoChanges,
    Committed { job: String },
}

impl From<CommitOutcome> for CommitSummary {
    fn from(outcome: CommitOutcome) -> Self {
        match outcome {
            CommitOutcome::NoChanges => Self::NoChanges,
            CommitOutcome::Committed { job } => Self::Committed { job },
        }
    }
}

/// Outcome of one interface import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceReport {
    pub sync: SyncState,
    pub plan: InterfacePlan,
    pub applied: bool,
    /// `None` until the post-import commit has run.
    pub commit: Option<CommitSummary>,
}

/// Build the sub-interface list for `rows`, in file order.
///
/// Sub-interface names are `<base>.<tag>`; the zone doubles as the
/// interface comment. Rows are validated (VLAN tag range, CIDR-shaped IP,
/// non-empty zone and virtual router) but not deduplicated.
pub fn plan_subinterfaces(base: &str, rows: &[InterfaceRow]) -> Result<InterfacePlan> {
    let base = base.trim();
    if base.is_empty() {
        bail!("base interface name is empty");
    }

    let mut subinterfaces = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let csv_row = index + 1;
        let tag: u16 = row
            .tag
            .trim()
            .parse()
            .ok()
            .filter(|tag| VLAN_TAG_RANGE.contains(tag))
            .with_context(|| {
                format!("row {csv_row}: tag '{}' is not a VLAN tag (1-4094)", row.tag)
            })?;

        let ip = row.ip.trim();
        objects::parse_cidr(ip)
            .ok()
            .with_context(|| format!("row {csv_row}: ip '{}' is not a valid CIDR value", row.ip))?;

        let zone = row.zone.trim();
        if zone.is_empty() {
            bail!("row {csv_row}: zone is empty");
        }
        let virtual_router = row.virtual_router.trim();
        if virtual_router.is_empty() {
            bail!("row {csv_row}: virtual_router is empty");
        }

        subinterfaces.push(Subinterface {
            name: format!("{base}.{tag}"),
            tag,
            ip: ip.to_string(),
            comment: zone.to_string(),
            zone: zone.to_string(),
            virtual_router: virtual_router.to_string(),
        });
    }

    Ok(InterfacePlan {
        base: base.to_string(),
        subinterfaces,
    })
}

/// Run the interface import against a connected device.
///
/// Unlike the policy import this commits at the end: sub-interfaces are
/// useless until activated, and there is nothing to review rule-by-rule.
pub fn run(
    fw: &mut dyn Firewall,
    base: &str,
    rows: &[InterfaceRow],
    dry_run: bool,
    plan_path: Option<&Path>,
) -> Result<InterfaceReport> {
    let sync = fw.ensure_synced()?;

    let plan = plan_subinterfaces(base, rows)?;

    if let Some(path) = plan_path {
        let json = serde_json::to_string_pretty(&plan)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write plan file {}", path.display()))?;
    }

    if dry_run {
        return Ok(InterfaceReport {
            sync,
            plan,
            applied: false,
            commit: None,
        });
    }

    fw.create_subinterfaces(&plan.base, &plan.subinterfaces)
        .context("failed to create sub-interfaces")?;

    let commit = fw
        .commit("pan-import: interface import")
        .context("commit failed after sub-interface creation")?;

    Ok(InterfaceReport {
        sync,
        plan,
        applied: true,
        commit: Some(commit.into()),
    })
}
