//! Error type for the inbound HTTP surface (§4.15, §6.2).
//!
//! Handlers map this down to the status codes the webhook contract
//! promises: 400 for malformed payloads, 401 for bad signatures, 500 for
//! anything that escaped an inner `Result`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("malformed webhook payload: {0}")]
    Malformed(String),

    #[error("invalid webhook signature")]
    BadSignature,

    #[error("forge error: {0}")]
    Forge(#[from] scm::ForgeError),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    fn status(&self) -> StatusCode {
        match self {
            IntakeError::Malformed(_) => StatusCode::BAD_REQUEST,
            IntakeError::BadSignature => StatusCode::UNAUTHORIZED,
            IntakeError::Forge(_) | IntakeError::Store(_) | IntakeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
