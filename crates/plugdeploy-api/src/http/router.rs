//! Axum router configuration with middleware.
//!
//! Routes keep the deployer's historical names (`/deploy`,
//! `/listModelPlugins`, `/deleteModelPlugin`, `/gitWebhook`); all are `POST`.
//! Middleware: CORS (credentials allowed for the session cookie), tracing.
//! Unknown paths answer with the error envelope.

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use plugdeploy_types::config::DeployerConfig;

use crate::http::error::AppError;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/deploy", post(handlers::plugin::deploy))
        .route("/listModelPlugins", post(handlers::plugin::list_plugins))
        .route("/deleteModelPlugin", post(handlers::plugin::delete_plugins))
        .route("/gitWebhook", post(handlers::webhook::receive_push))
        .route("/health", get(handlers::health::health))
        .fallback(invalid_path)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn invalid_path(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "no route for path");
    AppError::BadRequest("InvalidPath".to_string())
}

/// Local mode mirrors the request origin. Otherwise only the configured
/// origin is allowed, and no cross-origin caller at all when none is set.
fn cors_layer(config: &DeployerConfig) -> CorsLayer {
    let origin = if config.local {
        AllowOrigin::mirror_request()
    } else {
        match config.server.allowed_origin.as_deref() {
            Some(origin) => match HeaderValue::from_str(origin) {
                Ok(value) => AllowOrigin::exact(value),
                Err(e) => {
                    tracing::error!(origin, error = %e, "invalid allowed_origin, refusing cross-origin requests");
                    AllowOrigin::list(Vec::<HeaderValue>::new())
                }
            },
            None => {
                tracing::warn!("no allowed_origin configured, refusing cross-origin requests");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
