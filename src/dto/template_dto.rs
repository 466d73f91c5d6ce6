use crate::models::question::QuestionType;
use crate::models::template::Template;
use crate::utils::validation::ValidationReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListTemplatesQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub search: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveTemplateResponse {
    pub templates: Vec<Template>,
}

#[derive(Debug, Serialize)]
pub struct ValidateTemplateResponse {
    pub valid: bool,
    pub errors: ValidationReport,
}

#[derive(Debug, Serialize)]
pub struct QuestionTypeInfo {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub label: &'static str,
    pub default_options: Vec<String>,
}

impl From<QuestionType> for QuestionTypeInfo {
    fn from(question_type: QuestionType) -> Self {
        Self {
            question_type,
            label: question_type.label(),
            default_options: question_type.default_options(),
        }
    }
}
