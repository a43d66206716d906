//! HTTP Basic authentication gate.
//!
//! Active only when both a username and a password are configured. Every
//! request must pass the challenge/response check before reaching any
//! route; unauthenticated requests get a challenge response and are never
//! forwarded to application logic.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;

/// Fixed realm presented in the challenge.
pub const REALM: &str = "sharing";

/// Configured credentials, shared with the middleware as state.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check an `Authorization` header value against the configured pair.
    pub fn verify(&self, header_value: &str) -> bool {
        match credentials_from_header(header_value) {
            Some((user, pass)) => user == self.username && pass == self.password,
            None => false,
        }
    }
}

/// Parse `Basic <base64(user:pass)>` into its parts.
fn credentials_from_header(value: &str) -> Option<(String, String)> {
    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let encoded = parts.next()?.trim();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Middleware applied to the whole router when auth is configured.
pub async fn basic_auth_middleware(
    State(auth): State<BasicAuth>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| auth.verify(value))
        .unwrap_or(false);

    if !authorized {
        return challenge();
    }
    next.run(req).await
}

/// 401 with a challenge that forces the browser prompt.
fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            format!("Basic realm=\"{REALM}\""),
        )],
        "Unauthorized",
    )
        .into_response()
}
