//! Handler error type. Detail goes to the server log; clients only ever see a
//! generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

pub const GENERIC_ERROR: &str = "quiz server error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid submission body: {0}")]
    BadSubmission(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "quiz request failed");
        let body = Json(json!({ "error": GENERIC_ERROR }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
