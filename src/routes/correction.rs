use crate::{
    dto::correction_dto::{CorrectBatchPayload, CorrectSinglePayload, ListResultsQuery},
    error::Result,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

#[axum::debug_handler]
pub async fn correct_single(
    State(state): State<AppState>,
    Json(payload): Json<CorrectSinglePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .correction_service
        .correct_single(payload.into())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn correct_batch(
    State(state): State<AppState>,
    Json(payload): Json<CorrectBatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .correction_service
        .correct_batch(payload.submissions)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_results(
    State(state): State<AppState>,
    Query(query): Query<ListResultsQuery>,
) -> Result<impl IntoResponse> {
    let results = state.correction_service.list_results(query.template_id).await;
    Ok(Json(results))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let report = state.correction_service.detailed_report(id).await?;
    Ok(Json(report))
}
