//! Session token extractor.
//!
//! Reads the token from:
//! - the session cookie (`grapl_jwt` by default)
//! - `Authorization: Bearer <token>`
//!
//! and hands it to the configured [`AuthGate`](plugdeploy_core::repository::auth::AuthGate).

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker. Extracting this validates the credential.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &state.config.auth.cookie_name);
        state.auth.verify(token.as_deref())?;
        Ok(Authenticated)
    }
}

/// Session token from the cookie, falling back to a bearer header.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string());
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}
