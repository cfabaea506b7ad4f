use colored::Colorize;

use crate::device::SyncState;
use crate::interface_import::{CommitSummary, InterfaceReport};
use crate::policy_import::PolicyReport;

/// Render a policy import outcome for terminal output.
pub fn render_policy_report(report: &PolicyReport) -> String {
    let mut out = Vec::new();

    let verb = if report.applied { "created" } else { "planned" };
    out.push(header("policy import", report.applied));
    out.push(sync_line(report.sync));

    for object in &report.plan.objects.addresses {
        out.push(
            format!("+ address {} = {}", object.name, object.cidr)
                .green()
                .to_string(),
        );
    }
    for object in &report.plan.objects.services {
        out.push(
            format!(
                "+ service {} = {}/{}",
                object.name,
                object.protocol.as_str(),
                object.port
            )
            .green()
            .to_string(),
        );
    }
    for rule in &report.plan.rules {
        out.push(format!("+ rule {}", rule.name).green().to_string());
    }
    for name in &report.plan.skipped_rules {
        out.push(
            format!("= rule {name} (already present, skipped)")
                .yellow()
                .to_string(),
        );
    }

    out.push(
        format!(
            "{verb}: {} addresses, {} services, {} rules ({} skipped); no commit, review on device",
            report.plan.objects.addresses.len(),
            report.plan.objects.services.len(),
            report.plan.rules.len(),
            report.plan.skipped_rules.len()
        )
        .cyan()
        .to_string(),
    );

    out.join("\n")
}

/// Render an interface import outcome for terminal output.
pub fn render_interface_report(report: &InterfaceReport) -> String {
    let mut out = Vec::new();

    let verb = if report.applied { "created" } else { "planned" };
    out.push(header("interface import", report.applied));
    out.push(sync_line(report.sync));

    for sub in &report.plan.subinterfaces {
        out.push(
            format!(
                "+ subinterface {} ip={} zone={} vr={}",
                sub.name, sub.ip, sub.zone, sub.virtual_router
            )
            .green()
            .to_string(),
        );
    }

    out.push(
        format!(
            "{verb}: {} sub-interfaces on {}",
            report.plan.subinterfaces.len(),
            report.plan.base
        )
        .cyan()
        .to_string(),
    );

    match &report.commit {
        Some(CommitSummary::Committed { job }) => {
            out.push(format!("committed (job {job})").cyan().to_string());
        }
        Some(CommitSummary::NoChanges) => {
            out.push("commit skipped: no changes".yellow().to_string());
        }
        None => {}
    }

    out.join("\n")
}

fn header(title: &str, applied: bool) -> String {
    if applied {
        title.cyan().to_string()
    } else {
        format!("{title} (dry run)").cyan().to_string()
    }
}

fn sync_line(sync: SyncState) -> String {
    match sync {
        SyncState::Standalone => "ha: standalone".to_string(),
        SyncState::InSync => "ha: peers in sync".to_string(),
        SyncState::SyncTriggered => "ha: peers out of sync, synchronization triggered"
            .yellow()
            .to_string(),
    }
}
