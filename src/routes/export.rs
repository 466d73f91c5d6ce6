use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;

use crate::services::export_service::ExportService;
use crate::{
    error::{Error, Result},
    AppState,
};

/// Export every stored result as `json` or `xlsx`.
pub async fn export_results(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response> {
    let results = state.correction_service.list_results(None).await;

    match format.as_str() {
        "json" => Ok(Json(ExportService::results_json(&results)).into_response()),
        "xlsx" => {
            let mut template_names = HashMap::new();
            for result in &results {
                if template_names.contains_key(&result.template_id) {
                    continue;
                }
                if let Ok(t) = state.template_service.get_template(result.template_id).await {
                    template_names.insert(result.template_id, t.name);
                }
            }

            let buffer = ExportService::results_xlsx(&results, &template_names)?;
            let filename = format!(
                "results_export_{}.xlsx",
                chrono::Utc::now().format("%Y%m%d_%H%M")
            );
            let disposition = format!("attachment; filename=\"{}\"", filename);
            tracing::info!("Exported {} results to {}", results.len(), filename);

            Ok((
                StatusCode::OK,
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                            .to_string(),
                    ),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                buffer,
            )
                .into_response())
        }
        other => Err(Error::BadRequest(format!(
            "Unsupported export format '{}', expected json or xlsx",
            other
        ))),
    }
}
