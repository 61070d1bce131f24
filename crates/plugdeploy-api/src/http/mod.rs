//! HTTP layer for the deployer.
//!
//! Axum router with `{"success": ..}` / `{"error": ..}` envelopes, session
//! token authentication and CORS.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
