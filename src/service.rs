//! Access-control model
//!
//! Immutable [`Service`], [`Matcher`], and [`User`] values produced by config
//! validation, plus the [`Catalog`] that routes request hosts to services and
//! maps identities to their role sets. The catalog is built once at startup
//! and read-only for the process lifetime.

use std::collections::HashMap;

use url::Url;

/// Host-based routing predicate attached to a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    /// Request host this matcher applies to
    pub host: String,
}

impl Matcher {
    /// Exact string equality against the request's host header. No
    /// wildcarding, no path matching.
    pub fn matches(&self, host: &str) -> bool {
        self.host == host
    }
}

/// A validated upstream service
#[derive(Debug, Clone)]
pub struct Service {
    /// Unique service identifier from configuration
    pub identifier: String,
    /// Upstream the proxy front-end forwards matched traffic to
    pub upstream_uri: Url,
    /// Host matchers routing inbound requests to this service
    pub matchers: Vec<Matcher>,
    /// Extra headers injected on proxied requests
    pub headers: HashMap<String, String>,
    /// Roles permitted to reach this service; empty means unrestricted
    pub roles: Vec<String>,
}

impl Service {
    /// Whether a caller holding `user_roles` may access this service.
    ///
    /// A service declaring no roles is unrestricted. Otherwise any single
    /// matching role grants access (OR across roles, not AND).
    pub fn is_accessible(&self, user_roles: &[String]) -> bool {
        self.roles.is_empty() || self.roles.iter().any(|role| user_roles.contains(role))
    }

    /// Whether any of this service's matchers match the request host
    pub fn matches(&self, host: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(host))
    }
}

/// A validated user mapping an identity to its role set
#[derive(Debug, Clone)]
pub struct User {
    /// Stable identity resolved from the identity provider (e.g. email claim)
    pub identifier: String,
    /// Roles held by this user
    pub roles: Vec<String>,
}

/// The validated service and user catalog
#[derive(Debug, Default)]
pub struct Catalog {
    services: Vec<Service>,
    users: HashMap<String, User>,
}

impl Catalog {
    /// Build a catalog from validated services and users
    pub fn new(services: Vec<Service>, users: HashMap<String, User>) -> Self {
        Self { services, users }
    }

    /// All configured services
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Route a request host to a service. First match wins; validation
    /// rejects overlapping hosts so at most one service can match.
    pub fn route(&self, host: &str) -> Option<&Service> {
        self.services.iter().find(|svc| svc.matches(host))
    }

    /// Role set for an identity. Unknown identities resolve to an empty set.
    pub fn roles_for(&self, identity: &str) -> &[String] {
        self.users
            .get(identity)
            .map_or(&[], |user| user.roles.as_slice())
    }

    /// Whether `identity` may reach the service matched by `host`. A host
    /// with no matching service denies.
    pub fn authorize(&self, host: &str, identity: &str) -> bool {
        self.route(host)
            .is_some_and(|svc| svc.is_accessible(self.roles_for(identity)))
    }
}
