use crate::{
    dto::template_dto::{
        ListTemplatesQuery, QuestionTypeInfo, SaveTemplateResponse, ValidateTemplateResponse,
    },
    error::{Error, Result},
    models::{question::QuestionType, template::Template},
    services::{
        example_templates::{example_template, ExampleKind},
        template_service::TemplateFilter,
    },
    utils::validation::{validate_template as run_validation, ValidationReport},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn list_question_types() -> impl IntoResponse {
    let types: Vec<QuestionTypeInfo> = QuestionType::ALL
        .iter()
        .copied()
        .map(QuestionTypeInfo::from)
        .collect();
    Json(types)
}

pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    let filter = TemplateFilter {
        search: query.search,
        created_by: query.created_by,
    };

    let result = state
        .template_service
        .list_templates(page, per_page, Some(filter))
        .await;
    Ok(Json(result))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let template = state.template_service.get_template(id).await?;
    Ok(Json(template))
}

#[axum::debug_handler]
pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<Template>,
) -> Result<impl IntoResponse> {
    let templates = state.template_service.create_template(payload).await?;
    Ok((StatusCode::CREATED, Json(SaveTemplateResponse { templates })))
}

pub async fn validate_template(Json(mut payload): Json<Template>) -> impl IntoResponse {
    payload.renumber();
    let errors = match run_validation(&payload) {
        Ok(()) => ValidationReport(Vec::new()),
        Err(report) => report,
    };
    Json(ValidateTemplateResponse {
        valid: errors.errors().is_empty(),
        errors,
    })
}

pub async fn import_template(
    State(state): State<AppState>,
    Json(payload): Json<Template>,
) -> Result<impl IntoResponse> {
    let template = state.template_service.import_template(payload).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn duplicate_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let template = state.template_service.duplicate_template(id).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn create_example_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse> {
    let kind: ExampleKind = kind.parse().map_err(Error::NotFound)?;
    let template = example_template(kind)
        .map_err(|e| Error::Internal(format!("Example template is broken: {}", e)))?;
    let templates = state.template_service.create_template(template).await?;
    Ok((StatusCode::CREATED, Json(SaveTemplateResponse { templates })))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.template_service.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_question(
    State(state): State<AppState>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let template = state
        .template_service
        .delete_question(id, question_id)
        .await?;
    Ok(Json(template))
}
