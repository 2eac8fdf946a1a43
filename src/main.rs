//! Service lifecycle runner.
//!
//! Starts a service described by a TOML file (or by flags alone) and runs it
//! until SIGINT/SIGTERM.
//!
//! ```text
//!   config file ─┐
//!   CLI flags ───┴─▶ ServiceConfig ─▶ validate ─▶ options ─▶ Service::run
//!                                                                │
//!                                      exit code ◀─ ShutdownReport
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use service_lifecycle::config::{load_config, validate_config};
use service_lifecycle::observability::logging::init_logging;
use service_lifecycle::{Service, ServiceConfig};

#[derive(Parser)]
#[command(name = "service-lifecycle")]
#[command(about = "Run a service with status and gRPC listeners", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the service name
    #[arg(short, long)]
    name: Option<String>,

    /// Override the status listener address (ip:port or :port)
    #[arg(long)]
    status_address: Option<String>,

    /// Add a gRPC listener address; repeatable
    #[arg(long = "rpc-address")]
    rpc_addresses: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                init_logging("info");
                tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => ServiceConfig::default(),
    };

    if let Some(name) = cli.name {
        config.name = name;
    }
    if let Some(address) = cli.status_address {
        config.listeners.status = Some(address);
    }
    config.listeners.rpc.extend(cli.rpc_addresses);

    init_logging(&config.observability.log_level);

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(error = %error, "Invalid configuration");
        }
        return ExitCode::FAILURE;
    }

    tracing::info!(
        service = %config.name,
        version = env!("CARGO_PKG_VERSION"),
        status = ?config.listeners.status,
        rpc = ?config.listeners.rpc,
        "Configuration loaded"
    );

    let service = match Service::new(config.name.clone(), config.options()) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to configure service");
            return ExitCode::FAILURE;
        }
    };

    match service.run().await {
        Ok(report) => {
            tracing::info!(clean = report.is_clean(), "Shutdown complete");
            report.exit_code()
        }
        Err(e) => {
            tracing::error!(error = %e, "Service terminated");
            ExitCode::FAILURE
        }
    }
}
