use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "templates": state.template_service.count().await,
    });
    (StatusCode::OK, Json(body))
}
