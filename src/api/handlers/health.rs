/*
 * Responsibility
 * - GET /health (control plane 自身の疎通用、認証なし)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let instances = state.registry.len();
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "instances": instances})),
    )
}
