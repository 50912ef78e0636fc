//! Credential store adapter
//!
//! Thin contract over a remote keyed store with per-key TTL. Expiry is
//! enforced store-side and the store is the single source of truth: nothing
//! is cached in-process, so a TTL lapse is visible on the very next lookup.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

use crate::{Error, Result};

/// Connect timeout for the remote store
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-command response timeout
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Keyed store with per-key TTL backing credential and session state.
///
/// `get` distinguishes a missing key (`Ok(None)`) from an infrastructure
/// failure (`Err`). Store failures are non-retryable within the request:
/// callers fail the request rather than silently minting fresh credentials,
/// which would mask an outage as credential churn.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a key. `Ok(None)` is the expected not-found outcome.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a key with a time-to-live. The TTL clock starts store-side at
    /// write time.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Liveness probe for the healthcheck route
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed credential store
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to a Redis server, e.g. `redis://127.0.0.1:6379`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the URL is invalid or the initial
    /// connection cannot be established within the timeout.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Store(e.to_string()))?;

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(CONNECT_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);

        let conn = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }
}

/// In-process store with real TTL semantics.
///
/// Backs local development without a Redis instance and the test suite.
/// Expired entries are dropped lazily on lookup.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an entry immediately, as if its TTL had elapsed
    pub fn evict(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let live = self
            .entries
            .get(key)
            .and_then(|entry| (Instant::now() < entry.expires_at).then(|| entry.value.clone()));

        if live.is_none() {
            self.entries
                .remove_if(key, |_, entry| Instant::now() >= entry.expires_at);
        }

        Ok(live)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
