use crate::{error::Result, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn class_analytics(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let analytics = state
        .correction_service
        .class_analytics(template_id)
        .await?;
    Ok(Json(analytics))
}

pub async fn summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.correction_service.summary().await)
}
