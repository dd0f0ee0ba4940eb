use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

use crate::{
    error::AppError,
    protests::{FormOptions, load_form_options, load_protest},
    search::{SearchParams, SearchResponse, search_protests},
    state::State as AppState,
    submit::{SubmissionOutcome, process_submission},
};

pub async fn form_handler(State(state): State<Arc<AppState>>, body: Bytes) -> SubmissionOutcome {
    process_submission(&state, &body).await
}

pub async fn form_options_handler(State(state): State<Arc<AppState>>) -> Json<FormOptions> {
    Json(load_form_options(state.store.as_ref()).await)
}

pub async fn protest_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let protest = load_protest(state.store.as_ref(), &id).await?;

    Ok(Json(json!({ "protest": protest })))
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = SearchParams::from_query(&params);

    Ok(Json(search_protests(state.store.as_ref(), params).await?))
}

pub async fn validate_turnstile_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Validation endpoint error: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Internal error" })),
            )
                .into_response();
        }
    };

    let Some(token) = payload
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "No token provided" })),
        )
            .into_response();
    };

    Json(state.bot_check.verify(token).await).into_response()
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
