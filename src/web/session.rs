//! Login session plumbing
//!
//! Cookie handling for the CSRF nonce and access token, plus the middleware
//! that resolves an identity on every protected request.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::SharedState;

/// CSRF nonce cookie set at login and checked at the callback
pub const STATE_COOKIE: &str = "iap-oauth-state";

/// Access token cookie set after a successful code exchange
pub const TOKEN_COOKIE: &str = "iap-access-token";

/// Lifetime of the CSRF nonce cookie in seconds
pub const STATE_COOKIE_MAX_AGE: u64 = 60;

/// Lifetime of the access token cookie in seconds
pub const TOKEN_COOKIE_MAX_AGE: u64 = 60 * 60;

/// Extract a cookie value from the request's `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Build a `Set-Cookie` header value. Cookies are always `HttpOnly`; the
/// `Secure` attribute mirrors the deployment's TLS posture.
pub fn set_cookie(name: &str, value: &str, path: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path={path}; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Resolve the caller's identity before a protected handler runs.
///
/// Reads the access token cookie and asks the identity provider's userinfo
/// endpoint who the caller is. Any failure, missing cookie, network error,
/// or malformed response alike, sends the caller back to the login entry
/// point; no error reaches the protected handler.
pub async fn require_identity(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = cookie_value(request.headers(), TOKEN_COOKIE) else {
        debug!("request without access token cookie");
        return Redirect::temporary("/").into_response();
    };

    match state.oidc.identity(&token).await {
        Ok(identity) => {
            debug!(identity = %identity.identifier, "authenticated request");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "identity resolution failed");
            Redirect::temporary("/").into_response()
        }
    }
}
