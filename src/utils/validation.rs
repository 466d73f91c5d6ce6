use serde::Serialize;
use std::fmt;

use crate::models::question::{canonical_true_false, AnswerShape, Question};
use crate::models::template::Template;
use crate::utils::text::parse_decimal;

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 100.0;
pub const MAX_VERSIONS: u32 = 26;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    MissingName,
    NoQuestions,
    MissingAnswers { questions: Vec<u32> },
    InvalidWeight { question: u32, weight: f64 },
    NegativeErrorMargin { question: u32, error_margin: f64 },
    InvalidAnswerKey { question: u32, answer: String },
    InvalidVersionCount { count: u32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingName => write!(
                f,
                "template name must have at least {} characters",
                MIN_NAME_LEN
            ),
            ValidationError::NoQuestions => write!(f, "template has no questions"),
            ValidationError::MissingAnswers { questions } => {
                let numbers: Vec<String> = questions.iter().map(u32::to_string).collect();
                write!(f, "questions {} have no correct answers", numbers.join(", "))
            }
            ValidationError::InvalidWeight { question, weight } => write!(
                f,
                "question {} has weight {} outside [{}, {}]",
                question, weight, MIN_WEIGHT, MAX_WEIGHT
            ),
            ValidationError::NegativeErrorMargin {
                question,
                error_margin,
            } => write!(
                f,
                "question {} has negative error margin {}",
                question, error_margin
            ),
            ValidationError::InvalidAnswerKey { question, answer } => write!(
                f,
                "question {} has an answer key '{}' that does not fit its type",
                question, answer
            ),
            ValidationError::InvalidVersionCount { count } => write!(
                f,
                "version count {} must be between 1 and {}",
                count, MAX_VERSIONS
            ),
        }
    }
}

/// Every rule a template breaks, in check order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport(pub Vec<ValidationError>);

impl ValidationReport {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

/// The gate every template passes before it is stored.
pub fn validate_template(template: &Template) -> Result<(), ValidationReport> {
    let mut errors = Vec::new();

    if template.name.trim().chars().count() < MIN_NAME_LEN {
        errors.push(ValidationError::MissingName);
    }

    if template.questions.is_empty() {
        errors.push(ValidationError::NoQuestions);
    }

    let missing: Vec<u32> = template
        .questions
        .iter()
        .filter(|q| q.correct_answers.is_empty())
        .map(|q| q.number)
        .collect();
    if !missing.is_empty() {
        errors.push(ValidationError::MissingAnswers { questions: missing });
    }

    for q in &template.questions {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&q.weight) {
            errors.push(ValidationError::InvalidWeight {
                question: q.number,
                weight: q.weight,
            });
        }
    }

    for q in &template.questions {
        match q.shape() {
            AnswerShape::Number => {
                let margin = q.error_margin.unwrap_or(0.0);
                if margin < 0.0 {
                    errors.push(ValidationError::NegativeErrorMargin {
                        question: q.number,
                        error_margin: margin,
                    });
                }
            }
            AnswerShape::OptionSet | AnswerShape::Binary | AnswerShape::Text => {}
        }
    }

    for q in &template.questions {
        if let Some(answer) = invalid_key(q) {
            errors.push(ValidationError::InvalidAnswerKey {
                question: q.number,
                answer,
            });
        }
    }

    if template.multiple_versions && !(1..=MAX_VERSIONS).contains(&template.version_count) {
        errors.push(ValidationError::InvalidVersionCount {
            count: template.version_count,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport(errors))
    }
}

fn invalid_key(q: &Question) -> Option<String> {
    if q.correct_answers.is_empty() {
        return None;
    }
    match q.shape() {
        AnswerShape::OptionSet => q
            .correct_answers
            .iter()
            .find(|a| q.match_option(a).is_none())
            .cloned(),
        AnswerShape::Binary => {
            if q.correct_answers.len() > 1 {
                return Some(q.correct_answers.join(","));
            }
            q.correct_answers
                .iter()
                .find(|a| canonical_true_false(a).is_none())
                .cloned()
        }
        AnswerShape::Number => {
            if q.correct_answers.len() > 1 {
                return Some(q.correct_answers.join(","));
            }
            q.correct_answers
                .iter()
                .find(|a| parse_decimal(a).is_none())
                .cloned()
        }
        AnswerShape::Text => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn answered(question_type: QuestionType, key: &[&str]) -> Question {
        let mut q = Question::new(question_type);
        q.correct_answers = key.iter().map(|k| k.to_string()).collect();
        q
    }

    fn valid_template() -> Template {
        let mut template = Template::new("Quiz");
        template.add_question(answered(QuestionType::TrueFalse, &["V"]));
        template.add_question(answered(QuestionType::MultipleChoice, &["B"]));
        template
    }

    #[test]
    fn valid_template_passes() {
        assert_eq!(validate_template(&valid_template()), Ok(()));
    }

    #[test]
    fn empty_template_reports_no_questions() {
        let report = validate_template(&Template::new("Quiz")).unwrap_err();
        assert_eq!(report.errors(), &[ValidationError::NoQuestions]);

        let report = validate_template(&Template::new("Q")).unwrap_err();
        assert!(report.contains(&ValidationError::NoQuestions));
        assert!(report.contains(&ValidationError::MissingName));
    }

    #[test]
    fn short_or_blank_names_are_rejected() {
        for name in ["", "   ", "ab", "  ab  "] {
            let mut template = valid_template();
            template.name = name.to_string();
            let report = validate_template(&template).unwrap_err();
            assert_eq!(report.errors(), &[ValidationError::MissingName]);
        }
    }

    #[test]
    fn lists_every_question_without_answers() {
        let mut template = valid_template();
        template.add_question(Question::new(QuestionType::ShortText));
        template.add_question(Question::new(QuestionType::Numeric));
        let report = validate_template(&template).unwrap_err();
        assert_eq!(
            report.errors(),
            &[ValidationError::MissingAnswers {
                questions: vec![3, 4]
            }]
        );
    }

    #[test]
    fn weight_bounds_are_inclusive() {
        let mut template = valid_template();
        template.questions[0].weight = 0.1;
        template.questions[1].weight = 100.0;
        assert!(validate_template(&template).is_ok());

        template.questions[0].weight = 0.05;
        template.questions[1].weight = 100.5;
        let report = validate_template(&template).unwrap_err();
        assert_eq!(
            report.errors(),
            &[
                ValidationError::InvalidWeight {
                    question: 1,
                    weight: 0.05
                },
                ValidationError::InvalidWeight {
                    question: 2,
                    weight: 100.5
                },
            ]
        );
    }

    #[test]
    fn negative_margin_on_numeric_is_rejected() {
        let mut template = valid_template();
        let mut q = answered(QuestionType::Numeric, &["10"]);
        q.error_margin = Some(-0.5);
        template.add_question(q);
        let report = validate_template(&template).unwrap_err();
        assert_eq!(
            report.errors(),
            &[ValidationError::NegativeErrorMargin {
                question: 3,
                error_margin: -0.5
            }]
        );
    }

    #[test]
    fn keys_that_do_not_fit_their_type_are_rejected() {
        let mut template = valid_template();
        template.add_question(answered(QuestionType::Numeric, &["ten"]));
        template.add_question(answered(QuestionType::MultipleChoice, &["Z"]));
        template.add_question(answered(QuestionType::TrueFalse, &["V", "F"]));
        let report = validate_template(&template).unwrap_err();
        assert_eq!(report.errors().len(), 3);
        assert!(report.contains(&ValidationError::InvalidAnswerKey {
            question: 3,
            answer: "ten".into()
        }));
    }

    #[test]
    fn version_count_is_checked_only_with_multiple_versions() {
        let mut template = valid_template();
        template.version_count = 0;
        assert!(validate_template(&template).is_ok());

        template.multiple_versions = true;
        let report = validate_template(&template).unwrap_err();
        assert_eq!(
            report.errors(),
            &[ValidationError::InvalidVersionCount { count: 0 }]
        );
    }

    #[test]
    fn report_serializes_as_tagged_list() {
        let report = validate_template(&Template::new("Q")).unwrap_err();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[0]["kind"], "missing_name");
        assert_eq!(json[1]["kind"], "no_questions");
    }
}
