// SPDX-License-Identifier: AGPL-3.0-or-later
//! spoke-shift: moves spoke gateways between transit gateways
//!
//! Main CLI entry point.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spoke_shift::{
    config::LogLevel,
    controller::{ControllerClient, HttpTransport},
    migration::Migrator,
    Settings,
};

/// spoke-shift: move spoke gateways between transit gateways
///
/// Records the security domain of each spoke, detaches the spokes from the
/// old transit gateway, attaches them to the new one and restores their
/// security domains.
#[derive(Parser, Debug)]
#[command(name = "spoke-shift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "spoke-shift.ini")]
    config: PathBuf,

    /// Enable debug logging regardless of the configured loglevel
    #[arg(long)]
    debug: bool,

    /// Dry run mode (read-only calls only)
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move every configured spoke to the new transit gateway
    #[command(alias = "run")]
    Migrate,

    /// Show the current security domain of every configured spoke
    Domains,

    /// Show configuration
    Config,

    /// Initialize a new configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{:#}", error);
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version => {
            println!("spoke-shift v{}", env!("CARGO_PKG_VERSION"));
            println!("Moves spoke gateways between transit gateways");
            Ok(())
        }

        Commands::Init { force } => {
            init_tracing(LogLevel::Info, cli.debug);
            init_config(&cli.config, force)
        }

        Commands::Config => show_config(&cli.config),

        Commands::Domains => {
            let settings = load_settings(&cli.config)?;
            init_tracing(settings.controller.log_level, cli.debug);
            show_domains(&settings).await
        }

        Commands::Migrate => {
            let settings = load_settings(&cli.config)?;
            init_tracing(settings.controller.log_level, cli.debug);
            migrate(&settings, cli.dry_run).await
        }
    }
}

/// Initialize logging; `RUST_LOG` wins over the configured level
fn init_tracing(level: LogLevel, force_debug: bool) {
    let level = if force_debug { LogLevel::Debug } else { level };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(level == LogLevel::Debug)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    Settings::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
}

/// Initialize a new configuration file
fn init_config(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let default_config = r#"; SPDX-License-Identifier: AGPL-3.0-or-later
; spoke-shift configuration

[aviatrix]
; debug adds per-request logging with controller and user fields
loglevel = info
controller_ip = 192.0.2.10
controller_username = admin
controller_password = change-me
; api_url = https://192.0.2.10/v1/api

[migration]
old_transit_gateway = transit1
new_transit_gateway = transit2
spoke_route_table =
spoke_gateways = spoke1,spoke2,spoke3,spoke4,spoke5
; enabled adds each spoke to the new transit's FireNet inspection policy
inspection = disabled
; abort stops the run when the controller answers return=false
on_controller_error = ignore
"#;

    std::fs::write(config_path, default_config)?;
    info!("Created configuration file: {}", config_path.display());
    println!("Created configuration file: {}", config_path.display());
    Ok(())
}

/// Show the effective configuration
fn show_config(config_path: &Path) -> anyhow::Result<()> {
    let settings = load_settings(config_path)?;
    print!("{}", settings.render_redacted());
    Ok(())
}

/// Record and print the current domains without changing anything
async fn show_domains(settings: &Settings) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&settings.controller)?;
    let migrator = Migrator::new(ControllerClient::new(transport), true);

    let snapshot = migrator
        .snapshot(&settings.controller.credentials(), &settings.migration)
        .await?;

    println!();
    if snapshot.is_empty() {
        println!("No spoke gateways configured");
    } else {
        println!("Security domains:");
        for (gateway, domain) in snapshot.iter() {
            println!("  {} -> {}", gateway, domain);
        }
    }

    Ok(())
}

/// Run the full migration
async fn migrate(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let plan = &settings.migration;
    let transport = HttpTransport::new(&settings.controller)?;
    let migrator = Migrator::new(ControllerClient::new(transport), dry_run);

    if dry_run {
        println!(
            "[DRY RUN] Would move {} spoke(s) from {} to {}",
            plan.spoke_gateways.len(),
            plan.old_transit_gateway,
            plan.new_transit_gateway
        );
    } else {
        println!(
            "Moving {} spoke(s) from {} to {}",
            plan.spoke_gateways.len(),
            plan.old_transit_gateway,
            plan.new_transit_gateway
        );
    }

    let report = migrator
        .execute(&settings.controller.credentials(), plan)
        .await?;

    println!();
    println!("Migration completed");
    println!();
    println!("Results:");
    println!("  Duration: {} ms", report.total_duration_ms);
    println!("  Detached: {}", report.detached);
    println!("  Attached: {}", report.attached);
    println!("  Re-associated: {}", report.associated);
    println!("  Inspection: {}", report.inspected);

    Ok(())
}
