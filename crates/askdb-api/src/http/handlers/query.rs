//! Question answering endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use askdb_core::database::SqlDatabase;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub user_query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

/// POST /query - Answer one natural-language question about the database.
pub async fn query<D: SqlDatabase + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(request) = body?;
    if request.user_query.trim().is_empty() {
        return Err(AppError::BadRequest("user_query must not be empty".to_string()));
    }

    let answer = state.pipeline.run(&request.user_query).await?;
    tracing::info!(sql = %answer.sql, repaired = answer.was_repaired(), "query answered");

    Ok(Json(QueryResponse {
        response: answer.answer,
    }))
}
