//! HS256 session token verification.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, base64url
//! without padding). Only `alg: HS256` is accepted; `exp`, when present,
//! must lie in the future.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use plugdeploy_core::repository::auth::AuthGate;
use plugdeploy_types::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<u64>,
}

/// [`AuthGate`] accepting tokens signed with the shared HS256 key.
pub struct JwtAuthGate {
    secret: Vec<u8>,
}

impl JwtAuthGate {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Malformed(e.to_string()))
    }

    fn verify_at(&self, token: &str, now_secs: u64) -> Result<(), AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed("expected three segments".to_string()));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthError::Malformed(format!("unsupported alg '{}'", header.alg)));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let claims: Claims = decode_segment(payload_b64)?;
        if claims.exp.is_some_and(|exp| exp <= now_secs) {
            return Err(AuthError::Expired);
        }
        Ok(())
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Malformed(e.to_string()))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl AuthGate for JwtAuthGate {
    fn verify(&self, credential: Option<&str>) -> Result<(), AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        self.verify_at(token, now_secs())
    }
}

/// Sign `claims` as an HS256 token.
pub fn sign_token(secret: &[u8], claims: &serde_json::Value) -> Result<String, AuthError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{header}.{payload}");

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| AuthError::Malformed(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{signing_input}.{signature}"))
}
