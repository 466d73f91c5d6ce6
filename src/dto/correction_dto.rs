use crate::models::correction::AnswerSheet;
use crate::services::correction_service::Submission;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CorrectSinglePayload {
    pub template_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub student_id: String,
    #[serde(default)]
    pub answers: AnswerSheet,
}

impl From<CorrectSinglePayload> for Submission {
    fn from(p: CorrectSinglePayload) -> Self {
        Submission {
            template_id: p.template_id,
            student_id: p.student_id,
            answers: p.answers,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CorrectBatchPayload {
    #[validate(length(min = 1))]
    pub submissions: Vec<Submission>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListResultsQuery {
    pub template_id: Option<Uuid>,
}
