//! Error types for the identity-aware proxy gateway

use std::io;

use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The secure randomness source could not supply entropy
    #[error("Secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// Credential store failure (network, timeout). Distinct from a missing
    /// key, which is an expected non-error outcome.
    #[error("Credential store error: {0}")]
    Store(String),

    /// The identity-to-username and username-to-password keys disagree
    #[error("Credential keys out of sync for identity: {0}")]
    CredentialDesync(String),

    /// OAuth callback state parameter did not match the login cookie
    #[error("State parameter does not match login cookie")]
    CsrfMismatch,

    /// Authorization code could not be exchanged for an access token
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
