//! Web front-end
//!
//! Hosts the login entry point, the OAuth2 callback, credential issuance,
//! and the store healthcheck. Each request is handled on its own task with
//! no shared mutable state; everything cross-request lives in the store.

pub mod handlers;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::get};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::broker::CredentialBroker;
use crate::config::{StoreBackend, ValidatedConfig};
use crate::oidc::OidcClient;
use crate::service::Catalog;
use crate::store::{CredentialStore, MemoryStore, RedisStore};
use crate::{Error, Result};

/// State shared by all handlers
pub struct AppState {
    /// Credential broker issuing and validating proxy credential pairs
    pub broker: CredentialBroker,
    /// Identity provider client
    pub oidc: OidcClient,
    /// Validated service and user catalog
    pub catalog: Catalog,
    /// Store handle for the healthcheck probe
    pub store: Arc<dyn CredentialStore>,
    /// Whether cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

/// Shared handler state
pub type SharedState = Arc<AppState>;

/// Build the front-end router
pub fn router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/credentials", get(handlers::credentials))
        .route("/services", get(handlers::services))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            session::require_identity,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/oauth/login", get(handlers::login))
        .route("/oauth/callback", get(handlers::callback))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The gateway web server
pub struct Gateway {
    state: SharedState,
    host: String,
    port: u16,
}

impl Gateway {
    /// Wire up the store, broker, and OIDC client from validated
    /// configuration.
    pub async fn new(config: ValidatedConfig) -> Result<Self> {
        let store: Arc<dyn CredentialStore> = match config.store.backend {
            StoreBackend::Redis => Arc::new(RedisStore::connect(&config.store.url).await?),
            StoreBackend::Memory => {
                info!("using in-process credential store; credentials do not survive restarts");
                Arc::new(MemoryStore::new())
            }
        };

        let broker = CredentialBroker::new(
            Arc::clone(&store),
            config.store.credential_mode,
            config.store.namespace.clone(),
            Duration::from_secs(config.store.credential_ttl_secs),
        );

        let oidc = OidcClient::new(config.oidc)?;

        let state = Arc::new(AppState {
            broker,
            oidc,
            catalog: config.catalog,
            store,
            secure_cookies: !config.server.insecure,
        });

        Ok(Self {
            state,
            host: config.server.host,
            port: config.server.port,
        })
    }

    /// Run the server until ctrl-c or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.port,
        );

        let listener = TcpListener::bind(addr).await?;
        info!(host = %self.host, port = self.port, "starting web server");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
