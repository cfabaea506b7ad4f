//! The policy import flow.
//!
//! Sequence (strictly in this order): HA sync check → snapshot remote
//! objects and rulebase → plan → create missing objects (one batch per
//! kind) → create missing rules (per row, file order). No commit: the
//! operator reviews the candidate configuration before activating it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::csv_input::PolicyRow;
use crate::device::{AddressObject, Firewall, Protocol, SecurityRule, ServiceObject, SyncState};
use crate::objects::{self, ObjectPlan, PlanError, ANY, APPLICATION_DEFAULT};

/// Tag attached to every imported rule.
pub const IMPORT_TAG: &str = "imported";

/// Everything the run intends to create, computed before any mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyPlan {
    pub objects: ObjectPlan,
    /// Rules to create, in CSV order.
    pub rules: Vec<SecurityRule>,
    /// Rule names skipped because the rulebase snapshot already has them.
    pub skipped_rules: Vec<String>,
}

/// Outcome of one policy import run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReport {
    pub sync: SyncState,
    pub plan: PolicyPlan,
    /// False for a dry run: the plan was computed but nothing was created.
    pub applied: bool,
}

/// Map one CSV row onto a security rule.
///
/// Address fields become derived object names unless they are the literal
/// `any`; the service field passes `any` / `application-default` through
/// untouched. A `profile_group` of `none` (or an empty field) omits the
/// profile group. Destinations with a /32 mask map to `HOST-<ip>` exactly
/// like sources.
pub fn rule_from_row(row: &PolicyRow, csv_row: usize) -> Result<SecurityRule, PlanError> {
    let name = row.rule_name.trim();
    if name.is_empty() {
        return Err(PlanError::EmptyRuleName { row: csv_row });
    }

    Ok(SecurityRule {
        name: name.to_string(),
        from_zone: row.source_zone.trim().to_string(),
        to_zone: row.destination_zone.trim().to_string(),
        source: address_reference(row, "source_net", &row.source_net)?,
        destination: address_reference(row, "destination_net", &row.destination_net)?,
        application: row.application.trim().to_string(),
        service: service_reference(row)?,
        action: row.action.trim().to_string(),
        profile_group: match row.profile_group.trim() {
            "none" | "" => None,
            group => Some(group.to_string()),
        },
        tag: IMPORT_TAG.to_string(),
        log_end: true,
    })
}

fn address_reference(
    row: &PolicyRow,
    field: &'static str,
    value: &str,
) -> Result<String, PlanError> {
    let value = value.trim();
    if value == ANY {
        return Ok(ANY.to_string());
    }
    let network = objects::parse_cidr(value).map_err(|_| PlanError::BadCidr {
        rule: row.rule_name.clone(),
        field,
        value: value.to_string(),
    })?;
    Ok(objects::address_name(&network))
}

fn service_reference(row: &PolicyRow) -> Result<String, PlanError> {
    let port = row.service.trim();
    if port == ANY || port == APPLICATION_DEFAULT {
        return Ok(port.to_string());
    }
    let protocol = Protocol::parse(&row.protocol).ok_or_else(|| PlanError::BadProtocol {
        rule: row.rule_name.clone(),
        value: row.protocol.clone(),
    })?;
    Ok(objects::service_name(protocol, port))
}

/// Name-equality existence check against the rulebase snapshot. First
/// match short-circuits; content is never compared.
pub fn rule_exists(snapshot: &[String], name: &str) -> bool {
    snapshot.iter().any(|existing| existing == name)
}

/// Compute the full creation plan for `rows` against the device snapshots.
pub fn build_plan(
    rows: &[PolicyRow],
    existing_addresses: &[AddressObject],
    existing_services: &[ServiceObject],
    existing_rule_names: &[String],
) -> Result<PolicyPlan, PlanError> {
    let objects = objects::plan_objects(rows, existing_addresses, existing_services)?;

    let mut rules = Vec::new();
    let mut skipped_rules = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let rule = rule_from_row(row, index + 1)?;
        if rule_exists(existing_rule_names, &rule.name) {
            skipped_rules.push(rule.name);
        } else {
            rules.push(rule);
        }
    }

    Ok(PolicyPlan {
        objects,
        rules,
        skipped_rules,
    })
}

/// Run the policy import against a connected device.
///
/// `plan_path` dumps the computed plan as JSON before anything is created;
/// `dry_run` stops right after that point.
pub fn run(
    fw: &mut dyn Firewall,
    rows: &[PolicyRow],
    dry_run: bool,
    plan_path: Option<&Path>,
) -> Result<PolicyReport> {
    let sync = fw.ensure_synced()?;

    let existing_addresses = fw.address_objects()?;
    let existing_services = fw.service_objects()?;
    let existing_rule_names = fw.security_rule_names()?;

    let plan = build_plan(
        rows,
        &existing_addresses,
        &existing_services,
        &existing_rule_names,
    )?;

    if let Some(path) = plan_path {
        let json = serde_json::to_string_pretty(&plan)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write plan file {}", path.display()))?;
    }

    if dry_run {
        return Ok(PolicyReport {
            sync,
            plan,
            applied: false,
        });
    }

    if !plan.objects.addresses.is_empty() {
        fw.create_address_objects(&plan.objects.addresses)
            .context("failed to create address objects")?;
    }
    if !plan.objects.services.is_empty() {
        fw.create_service_objects(&plan.objects.services)
            .context("failed to create service objects")?;
    }
    for rule in &plan.rules {
        fw.create_security_rule(rule)
            .with_context(|| format!("failed to create rule '{}'", rule.name))?;
    }

    // No commit here: the imported rulebase is reviewed on the device
    // before activation.

    Ok(PolicyReport {
        sync,
        plan,
        applied: true,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{build_plan, rule_exists, rule_from_row};
    use crate::csv_input::PolicyRow;
    use crate::objects::PlanError;

    fn row(name: &str) -> PolicyRow {
        PolicyRow {
            source_zone: "trust".to_string(),
            destination_zone: "untrust".to_string(),
            source_net: "10.0.0.5/32".to_string(),
            destination_net: "10.1.0.0/24".to_string(),
            application: "web-browsing".to_string(),
            protocol: "tcp".to_string(),
            service: "443".to_string(),
            action: "allow".to_string(),
            profile_group: "none".to_string(),
            rule_name: name.to_string(),
        }
    }

    #[test]
    fn maps_row_fields_onto_rule() {
        let rule = rule_from_row(&row("allow-web"), 1).expect("rule");

        assert_eq!(rule.name, "allow-web");
        assert_eq!(rule.from_zone, "trust");
        assert_eq!(rule.to_zone, "untrust");
        assert_eq!(rule.source, "HOST-10.0.0.5");
        assert_eq!(rule.destination, "NET-10.1.0.0-24");
        assert_eq!(rule.service, "tcp-443");
        assert_eq!(rule.profile_group, None);
        assert_eq!(rule.tag, "imported");
        assert!(rule.log_end);
    }

    #[test]
    fn host_destination_maps_to_host_object() {
        let mut r = row("allow-db");
        r.destination_net = "10.2.0.9/32".to_string();
        let rule = rule_from_row(&r, 1).expect("rule");
        assert_eq!(rule.destination, "HOST-10.2.0.9");
    }

    #[test]
    fn any_fields_pass_through() {
        let mut r = row("allow-out");
        r.source_net = "any".to_string();
        r.destination_net = "any".to_string();
        r.service = "application-default".to_string();
        let rule = rule_from_row(&r, 1).expect("rule");

        assert_eq!(rule.source, "any");
        assert_eq!(rule.destination, "any");
        assert_eq!(rule.service, "application-default");
    }

    #[test]
    fn profile_group_is_kept_when_set() {
        let mut r = row("allow-web");
        r.profile_group = "strict-ips".to_string();
        let rule = rule_from_row(&r, 1).expect("rule");
        assert_eq!(rule.profile_group.as_deref(), Some("strict-ips"));
    }

    #[test]
    fn empty_rule_name_is_rejected_with_row_number() {
        let result = rule_from_row(&row("  "), 7);
        assert!(matches!(result, Err(PlanError::EmptyRuleName { row: 7 })));
    }

    #[test]
    fn existing_rule_names_are_skipped() {
        let existing = vec!["allow-web".to_string()];
        let plan = build_plan(&[row("allow-web"), row("allow-api")], &[], &[], &existing)
            .expect("plan");

        assert_eq!(plan.skipped_rules, vec!["allow-web".to_string()]);
        let created: Vec<&str> = plan.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(created, vec!["allow-api"]);
        // The skipped rule's objects are still planned; object dedup is
        // independent of rule existence.
        assert_eq!(plan.objects.addresses.len(), 2);
    }

    #[test]
    fn rule_exists_matches_by_name_only() {
        let snapshot = vec!["allow-web".to_string(), "deny-all".to_string()];
        assert!(rule_exists(&snapshot, "deny-all"));
        assert!(!rule_exists(&snapshot, "deny-all-v6"));
    }
}
