//! Credential broker
//!
//! Orchestrates generation, identity binding, lookup, and validation of
//! ephemeral proxy credential pairs against the credential store. All state
//! lives in the store; concurrent requests coordinate only through it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::secrets::{self, DIGITS, LOWER, SYMBOLS, UPPER};
use crate::store::CredentialStore;
use crate::{Error, Result};

/// Username length: 16 alphanumeric characters acting as a capability token
const USERNAME_LENGTH: usize = 16;

/// Password length: 32 characters drawn from the full alphabet
const PASSWORD_LENGTH: usize = 32;

/// Credential issuance mode. Pick one per deployment; the two modes make
/// different idempotence guarantees and must not be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// Every generation call mints a fresh pair
    Anonymous,
    /// Repeated generation for the same identity returns the same live pair
    /// until its store entry expires
    IdentityBound,
}

/// An ephemeral username/password pair issued for proxy authentication
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    /// Capability-token username
    pub username: String,
    /// High-entropy secret
    pub password: String,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Passwords stay out of debug output and logs
        f.debug_struct("CredentialPair")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Generates, stores, and validates proxy credential pairs
pub struct CredentialBroker {
    store: Arc<dyn CredentialStore>,
    mode: CredentialMode,
    namespace: String,
    ttl: Duration,
}

impl CredentialBroker {
    /// Create a broker over `store`, namespacing its keys with `namespace`
    /// and issuing credentials that live for `ttl`.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        mode: CredentialMode,
        namespace: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            mode,
            namespace: namespace.into(),
            ttl,
        }
    }

    fn password_key(&self, username: &str) -> String {
        format!("{}:auth:socks5:{username}:password", self.namespace)
    }

    fn username_key(&self, identity: &str) -> String {
        format!("{}:auth:socks5:{identity}:username", self.namespace)
    }

    /// Issue a credential pair for an authenticated identity.
    ///
    /// In anonymous mode the identity is ignored and every call mints a fresh
    /// pair. In identity-bound mode the same live pair is returned until its
    /// store entries expire.
    pub async fn generate(&self, identity: &str) -> Result<CredentialPair> {
        match self.mode {
            CredentialMode::Anonymous => self.mint_anonymous().await,
            CredentialMode::IdentityBound => self.resolve_or_mint(identity).await,
        }
    }

    /// Validate a presented pair against the store.
    ///
    /// A wrong password or expired/missing entry is `Ok(false)`, never an
    /// error. Store failures surface as [`Error::Store`].
    pub async fn valid(&self, username: &str, password: &str) -> Result<bool> {
        match self.store.get(&self.password_key(username)).await? {
            Some(stored) => Ok(stored == password),
            None => {
                debug!(username, "credential not found");
                Ok(false)
            }
        }
    }

    fn mint_pair(&self) -> Result<CredentialPair> {
        let username = secrets::random_string(USERNAME_LENGTH, &[UPPER, LOWER, DIGITS])?;
        let password = secrets::random_string(PASSWORD_LENGTH, &[UPPER, LOWER, DIGITS, SYMBOLS])?;
        Ok(CredentialPair { username, password })
    }

    async fn mint_anonymous(&self) -> Result<CredentialPair> {
        let pair = self.mint_pair()?;
        self.store
            .set(&self.password_key(&pair.username), &pair.password, self.ttl)
            .await?;
        debug!(username = %pair.username, "issued anonymous credential pair");
        Ok(pair)
    }

    async fn resolve_or_mint(&self, identity: &str) -> Result<CredentialPair> {
        let username_key = self.username_key(identity);

        match self.store.get(&username_key).await? {
            Some(username) => {
                // The two keys carry independent TTL clocks started at
                // slightly different instants. When they disagree the pair is
                // surfaced as desynced, never silently re-minted: silent
                // re-issuance would let multiple valid passwords coexist for
                // one identity.
                match self.store.get(&self.password_key(&username)).await? {
                    Some(password) => Ok(CredentialPair { username, password }),
                    None => Err(Error::CredentialDesync(identity.to_string())),
                }
            }
            None => {
                let pair = self.mint_pair()?;
                // Username mapping first. If the password write fails, the
                // stale mapping expires on its own TTL.
                self.store
                    .set(&username_key, &pair.username, self.ttl)
                    .await?;
                self.store
                    .set(&self.password_key(&pair.username), &pair.password, self.ttl)
                    .await?;
                debug!(identity, username = %pair.username, "issued identity-bound credential pair");
                Ok(pair)
            }
        }
    }
}

/// Capability interface consumed by the HTTP-proxy and SOCKS5-proxy
/// front-ends on every new connection to accept or reject it.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Whether the presented pair authorizes the connection
    async fn validate(&self, username: &str, password: &str) -> bool;
}

#[async_trait]
impl CredentialValidator for CredentialBroker {
    /// Fails closed: a store outage rejects the connection rather than
    /// accepting unverified credentials.
    async fn validate(&self, username: &str, password: &str) -> bool {
        match self.valid(username, password).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(username, error = %e, "credential validation failed closed");
                false
            }
        }
    }
}
