//! Identity-aware proxy gateway binary

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use iap_gateway::{
    cli::{Cli, Command},
    config::{Config, ValidatedConfig},
    setup_tracing,
    web::Gateway,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::Check) => run_check(&cli),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

fn load(cli: &Cli) -> Result<ValidatedConfig, ExitCode> {
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(ExitCode::FAILURE);
        }
    };

    // CLI overrides
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host.clone_from(host);
    }
    if let Some(ref url) = cli.store_url {
        config.store.url.clone_from(url);
    }

    match config.validate() {
        Ok(validated) => Ok(validated),
        Err(e) => {
            error!("Invalid configuration: {e}");
            Err(ExitCode::FAILURE)
        }
    }
}

/// Validate the configuration and print a summary
fn run_check(cli: &Cli) -> ExitCode {
    match load(cli) {
        Ok(validated) => {
            println!(
                "configuration valid: {} service(s), identity claim '{}'",
                validated.catalog.services().len(),
                validated.oidc.identifier_claim
            );
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

/// Run the gateway web server
async fn run_server(cli: Cli) -> ExitCode {
    let config = match load(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        services = config.catalog.services().len(),
        "Starting IAP gateway"
    );

    let gateway = match Gateway::new(config).await {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
