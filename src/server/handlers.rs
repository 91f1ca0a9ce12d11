use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::errors::ApiError;
use crate::post::GenerationRequest;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "corpus_size": state.index.len(),
        "started_at": state.started_at,
    }))
}

pub async fn generate_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.service.generate_post(&request).await?;
    Ok(Json(json!({
        "status": "success",
        "post": post,
    })))
}
