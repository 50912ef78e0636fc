//! Identity-Aware Proxy Gateway
//!
//! Authenticates a user once against an external OIDC provider, then issues
//! short-lived identity-bound credentials that the HTTP and SOCKS5 proxy
//! front-ends validate on every connection. Access to upstream services is
//! gated by host-based routing rules and a declarative role matrix.
//!
//! The backing keyed store (Redis in production) is the single source of
//! truth for all ephemeral state; nothing is cached in-process.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod cli;
pub mod config;
pub mod error;
pub mod oidc;
pub mod secrets;
pub mod service;
pub mod store;
pub mod web;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
