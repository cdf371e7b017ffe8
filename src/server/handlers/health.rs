use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the Medical Chatbot API" }))
}

/// Liveness only; downstream services are not contacted.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "Status": "ok",
        "version": state.settings.version,
        "message": "Medical Chatbot API is Running Successfully"
    }))
}
