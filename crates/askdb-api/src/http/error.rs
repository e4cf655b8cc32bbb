//! Application error type mapping pipeline failures to HTTP responses.
//!
//! Every failure body has the shape `{"error": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use askdb_types::error::PipelineError;

#[derive(Debug)]
pub enum AppError {
    /// The question could not be answered.
    Pipeline(PipelineError),
    /// The request body was missing, malformed or blank.
    BadRequest(String),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(PipelineError::EmptyQuestion) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(PipelineError::Llm(_)) => StatusCode::BAD_GATEWAY,
            AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Pipeline(e) => e.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "query failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
