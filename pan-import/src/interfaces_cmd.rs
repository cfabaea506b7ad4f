use anyhow::{Context, Result};
use pan_import::config::load_profile;
use pan_import::csv_input::read_interface_rows;
use pan_import::device::Firewall;
use pan_import::interface_import;
use pan_import::report::render_interface_report;
use pan_import::xapi::XapiFirewall;

use crate::cli::{InterfacesArgs, OutputFormat};

pub fn run(args: InterfacesArgs) -> Result<()> {
    let profile = load_profile(&args.config)?;
    let base = profile.require_base_interface()?.to_string();

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

    let rows = read_interface_rows(&args.csv)?;
    let report = interface_import::run(&mut fw, &base, &rows, args.dry_run, args.plan.as_deref())?;

    match args.format {
        OutputFormat::Text => println!("{}", render_interface_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
