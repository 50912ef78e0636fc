//! OIDC client
//!
//! Drives the provider side of the login flow: building the authorization
//! redirect, exchanging the authorization code for an access token, and
//! resolving identity claims from the userinfo endpoint. The access token is
//! the only session state and it lives client-side in a cookie.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::OidcConfig;
use crate::{Error, Result};

/// Timeout for token and userinfo requests
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the configured identity provider
pub struct OidcClient {
    http: Client,
    config: OidcConfig,
}

/// Token endpoint response; only the access token is used
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// An authenticated principal resolved from identity-provider claims
#[derive(Debug, Clone)]
pub struct Identity {
    /// Stable identifier taken from the configured claim (e.g. `email`)
    pub identifier: String,
}

impl OidcClient {
    /// Create a client for the validated OIDC configuration
    pub fn new(config: OidcConfig) -> Result<Self> {
        let http = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    /// Authorization endpoint redirect target carrying the CSRF nonce as the
    /// `state` parameter
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.config.auth_uri.clone();
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.config.client_id);
            params.append_pair("redirect_uri", self.config.redirect_uri.as_str());
            params.append_pair("scope", &self.config.scopes.join(" "));
            params.append_pair("state", state);
        }
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Any failure, transport or non-2xx response alike, surfaces as
    /// [`Error::TokenExchange`] and aborts the login.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let redirect_uri = self.config.redirect_uri.to_string();
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", &redirect_uri);
        params.insert("client_id", &self.config.client_id);
        params.insert("client_secret", &self.config.client_secret);

        let response = self
            .http
            .post(self.config.token_uri.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenExchange(format!("HTTP {status} - {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::TokenExchange(format!("malformed token response: {e}")))?;

        Ok(token.access_token)
    }

    /// Resolve the caller's identity from the userinfo endpoint using the
    /// bearer token. Called on every protected request; nothing is cached.
    pub async fn identity(&self, access_token: &str) -> Result<Identity> {
        let response = self
            .http
            .get(self.config.userinfo_uri.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "userinfo endpoint returned HTTP {}",
                response.status()
            )));
        }

        let claims: serde_json::Value = response.json().await?;
        let claim = &self.config.identifier_claim;
        let identifier = claims
            .get(claim)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::Internal(format!("userinfo response missing claim '{claim}'")))?;

        Ok(Identity {
            identifier: identifier.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::OidcRawConfig;

    fn client() -> OidcClient {
        let raw = OidcRawConfig {
            redirect_uri: "https://iap.example.com/oauth/callback".to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            ..OidcRawConfig::default()
        };
        OidcClient::new(raw.validate().unwrap()).unwrap()
    }

    #[test]
    fn authorization_url_carries_state_and_client() {
        let url = client().authorization_url("nonce123");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(query.contains(&("response_type".to_string(), "code".to_string())));
        assert!(query.contains(&("client_id".to_string(), "client-id".to_string())));
        assert!(query.contains(&("state".to_string(), "nonce123".to_string())));
        assert!(query.contains(&("scope".to_string(), "openid email".to_string())));
        assert!(query.contains(&(
            "redirect_uri".to_string(),
            "https://iap.example.com/oauth/callback".to_string()
        )));
    }

    #[test]
    fn authorization_url_preserves_endpoint() {
        let url = client().authorization_url("s");
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(url.path(), "/o/oauth2/v2/auth");
    }
}
