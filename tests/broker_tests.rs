//! Credential broker behavior against an in-process store
//!
//! Covers both issuance modes, fail-closed validation, TTL expiry, and the
//! desync edge where the two identity-bound keys disagree.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use iap_gateway::Error;
use iap_gateway::broker::{CredentialBroker, CredentialMode, CredentialValidator};
use iap_gateway::store::{CredentialStore, MemoryStore};

fn broker_over(store: Arc<MemoryStore>, mode: CredentialMode, ttl: Duration) -> CredentialBroker {
    CredentialBroker::new(store, mode, "iap", ttl)
}

fn anonymous() -> (CredentialBroker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (
        broker_over(Arc::clone(&store), CredentialMode::Anonymous, Duration::from_secs(600)),
        store,
    )
}

fn identity_bound() -> (CredentialBroker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (
        broker_over(
            Arc::clone(&store),
            CredentialMode::IdentityBound,
            Duration::from_secs(600),
        ),
        store,
    )
}

#[tokio::test]
async fn anonymous_generation_is_unique_per_call() {
    let (broker, _store) = anonymous();

    let first = broker.generate("anyone").await.unwrap();
    let second = broker.generate("anyone").await.unwrap();

    assert_ne!(first.username, second.username);
    assert!(broker.valid(&first.username, &first.password).await.unwrap());
    assert!(broker.valid(&second.username, &second.password).await.unwrap());
}

#[tokio::test]
async fn issued_pair_validates_and_tampered_password_does_not() {
    let (broker, _store) = anonymous();
    let pair = broker.generate("anyone").await.unwrap();

    assert!(broker.valid(&pair.username, &pair.password).await.unwrap());

    // Flip a single character of the password
    let mut tampered: Vec<char> = pair.password.chars().collect();
    tampered[0] = if tampered[0] == 'x' { 'y' } else { 'x' };
    let tampered: String = tampered.into_iter().collect();
    assert!(!broker.valid(&pair.username, &tampered).await.unwrap());
}

#[tokio::test]
async fn unknown_username_never_validates() {
    let (broker, _store) = anonymous();
    assert!(!broker.valid("neverissued000000", "whatever").await.unwrap());
}

#[tokio::test]
async fn identity_bound_issuance_is_idempotent() {
    let (broker, _store) = identity_bound();

    let first = broker.generate("alice@example.com").await.unwrap();
    let second = broker.generate("alice@example.com").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn distinct_identities_get_distinct_pairs() {
    let (broker, _store) = identity_bound();

    let alice = broker.generate("alice@example.com").await.unwrap();
    let bob = broker.generate("bob@example.com").await.unwrap();
    assert_ne!(alice.username, bob.username);
}

#[tokio::test]
async fn expired_credentials_stop_validating() {
    let store = Arc::new(MemoryStore::new());
    let broker = broker_over(
        Arc::clone(&store),
        CredentialMode::Anonymous,
        Duration::from_millis(20),
    );

    let pair = broker.generate("anyone").await.unwrap();
    assert!(broker.valid(&pair.username, &pair.password).await.unwrap());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(!broker.valid(&pair.username, &pair.password).await.unwrap());
}

#[tokio::test]
async fn expired_identity_binding_mints_a_fresh_pair() {
    let store = Arc::new(MemoryStore::new());
    let broker = broker_over(
        Arc::clone(&store),
        CredentialMode::IdentityBound,
        Duration::from_millis(20),
    );

    let first = broker.generate("alice@example.com").await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    let second = broker.generate("alice@example.com").await.unwrap();

    assert_ne!(first.username, second.username);
}

#[tokio::test]
async fn desynced_keys_fail_rather_than_remint() {
    let (broker, store) = identity_bound();

    let pair = broker.generate("alice@example.com").await.unwrap();

    // The password key outlived by the username key: drop it as if its
    // independent TTL clock had elapsed first.
    store.evict(&format!("iap:auth:socks5:{}:password", pair.username));

    let err = broker.generate("alice@example.com").await.unwrap_err();
    assert!(matches!(err, Error::CredentialDesync(identity) if identity == "alice@example.com"));
}

/// Store stub whose every operation fails, simulating an outage
struct FailingStore;

#[async_trait]
impl CredentialStore for FailingStore {
    async fn get(&self, _key: &str) -> iap_gateway::Result<Option<String>> {
        Err(Error::Store("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> iap_gateway::Result<()> {
        Err(Error::Store("connection refused".to_string()))
    }

    async fn ping(&self) -> iap_gateway::Result<()> {
        Err(Error::Store("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_outage_surfaces_as_an_error_not_a_mint() {
    let broker = CredentialBroker::new(
        Arc::new(FailingStore),
        CredentialMode::IdentityBound,
        "iap",
        Duration::from_secs(600),
    );

    assert!(matches!(
        broker.generate("alice@example.com").await.unwrap_err(),
        Error::Store(_)
    ));
    assert!(matches!(
        broker.valid("someuser", "somepass").await.unwrap_err(),
        Error::Store(_)
    ));
}

#[tokio::test]
async fn validator_callback_fails_closed_on_store_outage() {
    let broker = CredentialBroker::new(
        Arc::new(FailingStore),
        CredentialMode::Anonymous,
        "iap",
        Duration::from_secs(600),
    );

    assert!(!broker.validate("someuser", "somepass").await);
}

#[tokio::test]
async fn validator_callback_accepts_issued_pairs() {
    let (broker, _store) = anonymous();
    let pair = broker.generate("anyone").await.unwrap();

    assert!(broker.validate(&pair.username, &pair.password).await);
    assert!(!broker.validate(&pair.username, "wrong").await);
}
