//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Identity-aware proxy gateway
#[derive(Parser, Debug)]
#[command(name = "iap-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "IAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port the web server will be operating on
    #[arg(short, long, env = "IAP_PORT")]
    pub port: Option<u16>,

    /// Host the web server will be available under
    #[arg(long, env = "IAP_HOST")]
    pub host: Option<String>,

    /// Credential store URL, e.g. redis://127.0.0.1:6379
    #[arg(short = 'R', long, env = "IAP_STORE_URL")]
    pub store_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "IAP_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "IAP_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web front-end (default)
    Serve,

    /// Validate a configuration file and exit
    Check,
}
