use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg, fields) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into(), None),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone(), None),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".into(),
                Some(fields.clone()),
            ),
            AppError::EmptyCart => (StatusCode::BAD_REQUEST, "Cart is empty".into(), None),
            AppError::InsufficientStock(name) => (
                StatusCode::BAD_REQUEST,
                format!("Insufficient stock for {name}"),
                None,
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone(), None),
            // Storage internals are never leaked verbatim to callers.
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into(), None),
        };

        let body = serde_json::to_string(&ErrorBody { error: msg, fields })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
