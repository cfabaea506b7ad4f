use anyhow::{Context, Result};
use pan_import::config::load_profile;
use pan_import::csv_input::read_policy_rows;
use pan_import::device::Firewall;
use pan_import::policy_import;
use pan_import::report::render_policy_report;
use pan_import::xapi::XapiFirewall;

use crate::cli::{OutputFormat, PoliciesArgs};

pub fn run(args: PoliciesArgs) -> Result<()> {
    let profile = load_profile(&args.config)?;

    let mut fw = XapiFirewall::connect(&profile)?;
    let info = fw.system_info().context("failed to read system info")?;
    println!(
        "connected to {} ({} {}, PAN-OS {}, serial {})",
        fw.host(),
        info.hostname,
        info.model,
        info.sw_version,
        info.serial
    );

    let rows = read_policy_rows(&args.csv)?;
    let report = policy_import::run(&mut fw, &rows, args.dry_run, args.plan.as_deref())?;

    match args.format {
        OutputFormat::Text => println!("{}", render_policy_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
