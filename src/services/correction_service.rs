use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::correction::{
    AnswerSheet, ClassAnalytics, CorrectionReport, CorrectionResult, Difficulty, LetterGrade,
    QuestionAnalysis, QuestionScore, ResultsSummary,
};
use crate::models::template::Template;
use crate::services::grading_service::GradingService;
use crate::services::template_service::TemplateService;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Submission {
    pub template_id: Uuid,
    pub student_id: String,
    #[serde(default)]
    pub answers: AnswerSheet,
}

#[derive(Debug, serde::Serialize)]
pub struct CorrectionOutcome {
    pub result: CorrectionResult,
    pub report: CorrectionReport,
}

#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    Corrected { result: CorrectionResult },
    Failed { student_id: String, error: String },
}

#[derive(Debug, serde::Serialize)]
pub struct BatchOutcome {
    pub corrected: usize,
    pub failed: usize,
    pub entries: Vec<BatchEntry>,
}

#[derive(Clone)]
pub struct CorrectionService {
    results: Arc<RwLock<Vec<CorrectionResult>>>,
    templates: TemplateService,
    max_batch_size: usize,
}

impl CorrectionService {
    pub fn new(templates: TemplateService, max_batch_size: usize) -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            templates,
            max_batch_size,
        }
    }

    /// Scores one submission against a stored template and keeps the result.
    pub async fn correct_single(&self, submission: Submission) -> Result<CorrectionOutcome> {
        let student_id = submission.student_id.trim().to_string();
        if student_id.is_empty() {
            return Err(Error::BadRequest("student_id must not be empty".into()));
        }

        let template = self.templates.get_template(submission.template_id).await?;
        let score = GradingService::score_template(&template, &submission.answers);
        let result = CorrectionResult::from_score(
            student_id,
            submission.template_id,
            template.version.clone(),
            score,
        );
        let report = build_report(&template, &result);

        tracing::info!(
            "Corrected test for student {} on '{}': {}/{} correct, {:.1}% ({})",
            result.student_id,
            template.name,
            result.correct_answers,
            result.total_questions,
            result.percentage,
            result.letter_grade
        );
        if !result.malformed.is_empty() {
            tracing::warn!(
                "Student {} submitted {} malformed answer(s)",
                result.student_id,
                result.malformed.len()
            );
        }

        self.results.write().await.push(result.clone());
        Ok(CorrectionOutcome { result, report })
    }

    /// A failing submission is reported in place and does not stop the rest.
    pub async fn correct_batch(&self, submissions: Vec<Submission>) -> Result<BatchOutcome> {
        if submissions.is_empty() {
            return Err(Error::BadRequest("Batch must contain at least one submission".into()));
        }
        if submissions.len() > self.max_batch_size {
            return Err(Error::BadRequest(format!(
                "Batch of {} submissions exceeds the limit of {}",
                submissions.len(),
                self.max_batch_size
            )));
        }

        let mut entries = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let student_id = submission.student_id.clone();
            match self.correct_single(submission).await {
                Ok(outcome) => entries.push(BatchEntry::Corrected {
                    result: outcome.result,
                }),
                Err(e) => {
                    tracing::warn!("Batch entry for student {} failed: {}", student_id, e);
                    entries.push(BatchEntry::Failed {
                        student_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let corrected = entries
            .iter()
            .filter(|e| matches!(e, BatchEntry::Corrected { .. }))
            .count();
        let failed = entries.len() - corrected;
        tracing::info!("Batch correction finished: {} corrected, {} failed", corrected, failed);

        Ok(BatchOutcome {
            corrected,
            failed,
            entries,
        })
    }

    pub async fn list_results(&self, template_id: Option<Uuid>) -> Vec<CorrectionResult> {
        self.results
            .read()
            .await
            .iter()
            .filter(|r| template_id.map_or(true, |id| r.template_id == id))
            .cloned()
            .collect()
    }

    pub async fn get_result(&self, result_id: Uuid) -> Result<CorrectionResult> {
        self.results
            .read()
            .await
            .iter()
            .find(|r| r.id == result_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Result {} not found", result_id)))
    }

    pub async fn detailed_report(&self, result_id: Uuid) -> Result<CorrectionReport> {
        let result = self.get_result(result_id).await?;
        let template = self.templates.get_template(result.template_id).await?;
        Ok(build_report(&template, &result))
    }

    pub async fn class_analytics(&self, template_id: Uuid) -> Result<ClassAnalytics> {
        let template = self.templates.get_template(template_id).await?;
        let results = self.list_results(Some(template_id)).await;
        if results.is_empty() {
            return Err(Error::NotFound(format!(
                "No results found for template {}",
                template_id
            )));
        }
        Ok(build_analytics(&template, &results))
    }

    pub async fn summary(&self) -> ResultsSummary {
        let templates = self.templates.count().await;
        let results = self.results.read().await;
        let count = results.len();

        let (average_percentage, passing_rate) = if count == 0 {
            (0.0, 0.0)
        } else {
            let total: f64 = results.iter().map(|r| r.percentage).sum();
            let passed = results.iter().filter(|r| r.passed).count();
            (
                total / count as f64,
                passed as f64 / count as f64 * 100.0,
            )
        };

        ResultsSummary {
            templates,
            tests_corrected: count,
            average_percentage,
            passing_rate,
            grade_distribution: grade_distribution(&results),
        }
    }
}

fn grade_distribution(results: &[CorrectionResult]) -> BTreeMap<LetterGrade, usize> {
    let mut distribution: BTreeMap<LetterGrade, usize> =
        LetterGrade::ALL.iter().map(|g| (*g, 0)).collect();
    for r in results {
        *distribution.entry(r.letter_grade).or_insert(0) += 1;
    }
    distribution
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_report(template: &Template, result: &CorrectionResult) -> CorrectionReport {
    let wrong_questions: Vec<u32> = result
        .questions
        .iter()
        .filter(|q| !q.is_correct)
        .map(|q| q.number)
        .collect();

    let mut recommendations = Vec::new();
    if !result.passed {
        recommendations.push("Review the fundamental concepts".to_string());
        if wrong_questions.len() as f64 > f64::from(result.total_questions) * 0.5 {
            recommendations.push("Additional study is needed in every area".to_string());
        } else if !wrong_questions.is_empty() {
            recommendations.push(format!(
                "Focus on questions: {}",
                join_numbers(&wrong_questions)
            ));
        }
    }

    if result.percentage >= 90.0 {
        recommendations.push("Excellent performance, keep it up".to_string());
    } else if result.percentage >= 80.0 {
        recommendations.push("Good performance, small adjustments lead to excellence".to_string());
    } else if result.percentage >= 70.0 {
        recommendations.push("Satisfactory performance with room for improvement".to_string());
    }

    CorrectionReport {
        result_id: result.id,
        student_id: result.student_id.clone(),
        template_name: template.name.clone(),
        template_version: result.template_version.clone(),
        total_weight: result.total_weight,
        percentage: result.percentage,
        score: result.score,
        letter_grade: result.letter_grade,
        passed: result.passed,
        wrong_questions,
        recommendations,
    }
}

fn build_analytics(template: &Template, results: &[CorrectionResult]) -> ClassAnalytics {
    let percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
    let total_students = results.len();
    let average_percentage = percentages.iter().sum::<f64>() / total_students as f64;
    let highest_percentage = percentages.iter().copied().fold(f64::MIN, f64::max);
    let lowest_percentage = percentages.iter().copied().fold(f64::MAX, f64::min);
    let passing_rate =
        results.iter().filter(|r| r.passed).count() as f64 / total_students as f64 * 100.0;

    let mut questions = Vec::new();
    for question in &template.questions {
        let answered: Vec<&QuestionScore> = results
            .iter()
            .filter_map(|r| r.questions.iter().find(|s| s.number == question.number))
            .filter(|s| !s.submitted.is_empty())
            .collect();
        if answered.is_empty() {
            continue;
        }
        let correct = answered.iter().filter(|s| s.is_correct).count();
        let ratio = correct as f64 / answered.len() as f64;
        let confidences: Vec<f64> = answered.iter().filter_map(|s| s.confidence).collect();
        let average_confidence = (!confidences.is_empty())
            .then(|| confidences.iter().sum::<f64>() / confidences.len() as f64);
        questions.push(QuestionAnalysis {
            number: question.number,
            question_type: question.question_type,
            responses: answered.len() as u32,
            correct_percentage: ratio * 100.0,
            difficulty: Difficulty::from_correct_ratio(ratio),
            average_confidence,
        });
    }

    let mut recommendations = Vec::new();
    if passing_rate < 50.0 {
        recommendations.push("Low passing rate, review the teaching approach".to_string());
    } else if passing_rate < 70.0 {
        recommendations.push("Moderate passing rate, reinforce the key concepts".to_string());
    } else {
        recommendations.push("Good passing rate, keep the current teaching quality".to_string());
    }

    let difficult: Vec<u32> = questions
        .iter()
        .filter(|q| q.correct_percentage < 50.0)
        .map(|q| q.number)
        .collect();
    if !difficult.is_empty() {
        recommendations.push(format!(
            "Questions with a low success rate: {}. Consider reviewing the content or rewording them",
            join_numbers(&difficult)
        ));
    }

    ClassAnalytics {
        template_id: template.id.unwrap_or_default(),
        template_name: template.name.clone(),
        total_students,
        average_percentage,
        highest_percentage,
        lowest_percentage,
        passing_rate,
        grade_distribution: grade_distribution(results),
        questions,
        recommendations,
    }
}
