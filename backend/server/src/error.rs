use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::database::StoreError;

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid protest ID format")]
    InvalidId,

    #[error("Protest not found")]
    NotFound,

    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        source: StoreError,
    },
}

impl AppError {
    pub fn upstream(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Upstream { context, source }
    }

    /// Text safe to show the caller. Upstream detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Upstream { context, .. } => context.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Panics inside a handler become a plain 500. The payload is logged, never returned.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    error!("Handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": UNEXPECTED_ERROR })),
    )
        .into_response()
}
