//! Success envelope: `{"success": payload}` with status 200.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub struct Success<T: Serialize>(pub T);

#[derive(Serialize)]
struct Envelope<T> {
    success: T,
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(Envelope { success: self.0 }).into_response()
    }
}
