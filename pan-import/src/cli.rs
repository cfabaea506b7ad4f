use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pan-import")]
#[command(about = "Import CSV-defined sub-interfaces and security policies into PAN-OS firewalls")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Create tagged sub-interfaces on the base aggregate interface, then
    /// commit.
    Interfaces(InterfacesArgs),
    /// Create missing address/service objects and security rules. Never
    /// commits: review the candidate configuration on the device first.
    Policies(PoliciesArgs),
}

#[derive(Parser, Debug)]
pub struct InterfacesArgs {
    /// CSV file with `tag, zone, ip, virtual_router` rows (header skipped).
    pub csv: PathBuf,
    /// Device profile TOML (hostname, credentials, base_interface, ...).
    #[arg(short, long)]
    pub config: PathBuf,
    /// Connect, check sync, and compute the plan; create nothing.
    #[arg(long)]
    pub dry_run: bool,
    /// Write the computed plan as JSON before anything is created.
    #[arg(long)]
    pub plan: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct PoliciesArgs {
    /// CSV file with `source_zone, destination_zone, source_net,
    /// destination_net, application, protocol, service, action,
    /// profile_group, rule_name` rows (header skipped).
    pub csv: PathBuf,
    /// Device profile TOML (hostname, credentials, ...).
    #[arg(short, long)]
    pub config: PathBuf,
    /// Connect, check sync, and compute the plan; create nothing.
    #[arg(long)]
    pub dry_run: bool,
    /// Write the computed plan as JSON before anything is created.
    #[arg(long)]
    pub plan: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
