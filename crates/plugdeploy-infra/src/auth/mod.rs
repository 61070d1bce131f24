//! Request authentication.
//!
//! - `jwt`: HS256 session tokens for the user-facing operations
//! - `webhook`: HMAC-SHA256 signatures on push events

pub mod jwt;
pub mod webhook;
