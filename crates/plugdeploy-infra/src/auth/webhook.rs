//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body using the
//! shared secret and sends it as `X-Hub-Signature-256: sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("HMAC signature verification failed")]
    HmacVerificationFailed,

    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("missing X-Hub-Signature-256 header")]
    MissingSignature,
}

/// Verify a hex HMAC-SHA256 `signature_hex` of `body`.
///
/// Comparison is constant-time (`Mac::verify_slice`).
pub fn verify_hmac_sha256(secret: &[u8], body: &[u8], signature_hex: &str) -> Result<(), WebhookError> {
    let expected_bytes = hex_decode(signature_hex)
        .ok_or(WebhookError::HmacVerificationFailed)?;

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(body);

    mac.verify_slice(&expected_bytes)
        .map_err(|_| WebhookError::HmacVerificationFailed)
}

/// Verify the signature header of a delivery. Requires the `sha256=` prefix.
pub fn verify_signature(
    secret: &[u8],
    body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), WebhookError> {
    let header = signature_header.ok_or(WebhookError::MissingSignature)?;
    let hex_sig = header
        .trim()
        .strip_prefix("sha256=")
        .ok_or(WebhookError::HmacVerificationFailed)?;
    verify_hmac_sha256(secret, body, hex_sig)
}

/// Compute the `sha256=<hex>` header value for `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(body);
    Ok(format!("sha256={}", hex_encode(&mac.finalize().into_bytes())))
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
