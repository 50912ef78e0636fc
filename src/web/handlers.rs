//! HTTP handlers for the web front-end
//!
//! Failure responses carry a correlation code and a generic message; the
//! specific reason only appears in the operator-facing log.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::SharedState;
use super::session::{
    STATE_COOKIE, STATE_COOKIE_MAX_AGE, TOKEN_COOKIE, TOKEN_COOKIE_MAX_AGE, cookie_value,
    set_cookie,
};
use crate::oidc::Identity;
use crate::secrets;

/// CSRF nonce length
const NONCE_LENGTH: usize = 32;

fn correlation_code() -> String {
    format!("iap-{}", Uuid::new_v4().simple())
}

fn failure(code: &str, message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message, "code": code })),
    )
        .into_response()
}

/// Login entry page
pub async fn index() -> Html<&'static str> {
    Html(r#"<a href="/oauth/login">Sign in</a>"#)
}

#[derive(Serialize)]
struct HealthcheckResponse {
    store: bool,
}

/// Probe the credential store and report liveness
pub async fn healthcheck(State(state): State<SharedState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthcheckResponse { store: true })).into_response(),
        Err(e) => {
            warn!(error = %e, "credential store unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthcheckResponse { store: false }),
            )
                .into_response()
        }
    }
}

/// Start a login attempt: mint the CSRF nonce, park it in a short-lived
/// cookie, and redirect to the provider's authorization endpoint.
pub async fn login(State(state): State<SharedState>) -> Response {
    let code = correlation_code();

    let nonce = match secrets::nonce(NONCE_LENGTH) {
        Ok(nonce) => nonce,
        Err(e) => {
            error!(error = %e, code = %code, "unable to mint login nonce");
            return failure(&code, "issues with the system");
        }
    };

    let url = state.oidc.authorization_url(&nonce);
    debug!(dialog = %url, "redirecting for auth dialog");

    let cookie = set_cookie(
        STATE_COOKIE,
        &nonce,
        "/oauth/callback",
        STATE_COOKIE_MAX_AGE,
        state.secure_cookies,
    );

    (
        [(header::SET_COOKIE, cookie)],
        Redirect::temporary(url.as_str()),
    )
        .into_response()
}

/// Callback query parameters returned by the identity provider
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// CSRF state echoed back by the provider
    pub state: Option<String>,
}

/// Finish a login attempt: verify the CSRF nonce against the `state`
/// parameter, exchange the code for an access token, and hand the token to
/// the user-agent as a session cookie.
///
/// Every failure sends the caller back to the login entry point with no
/// detail beyond the operator log.
pub async fn callback(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let code = correlation_code();

    let nonce = cookie_value(&headers, STATE_COOKIE);
    if nonce.is_none() || nonce != params.state {
        error!(code = %code, "state parameter does not match login cookie");
        return Redirect::temporary("/").into_response();
    }

    let Some(auth_code) = params.code else {
        error!(code = %code, "callback without authorization code");
        return Redirect::temporary("/").into_response();
    };

    match state.oidc.exchange_code(&auth_code).await {
        Ok(token) => {
            debug!("got access token");
            let cookie = set_cookie(
                TOKEN_COOKIE,
                &token,
                "/",
                TOKEN_COOKIE_MAX_AGE,
                state.secure_cookies,
            );
            (
                [(header::SET_COOKIE, cookie)],
                Redirect::temporary("/credentials"),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, code = %code, "unable to obtain access token");
            Redirect::temporary("/").into_response()
        }
    }
}

#[derive(Serialize)]
struct CredentialResponse {
    username: String,
    password: String,
}

/// Issue (or re-issue) the caller's proxy credential pair
pub async fn credentials(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Response {
    let code = correlation_code();

    match state.broker.generate(&identity.identifier).await {
        Ok(pair) => {
            debug!(identity = %identity.identifier, username = %pair.username, "generated proxy credentials");
            Json(CredentialResponse {
                username: pair.username,
                password: pair.password,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, code = %code, "failed to generate credentials");
            failure(&code, "unable to generate credentials")
        }
    }
}

/// Service reachable by the caller, as returned by the `/services` endpoint
#[derive(Serialize)]
pub struct ServiceSummary {
    identifier: String,
    hosts: Vec<String>,
}

/// List the services the caller's role set can reach
pub async fn services(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Json<Vec<ServiceSummary>> {
    let roles = state.catalog.roles_for(&identity.identifier);

    let accessible = state
        .catalog
        .services()
        .iter()
        .filter(|service| service.is_accessible(roles))
        .map(|service| ServiceSummary {
            identifier: service.identifier.clone(),
            hosts: service.matchers.iter().map(|m| m.host.clone()).collect(),
        })
        .collect();

    Json(accessible)
}
