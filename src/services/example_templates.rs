use crate::models::question::{AnswerKeyInput, AnswerKeyError, Question, QuestionType};
use crate::models::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleKind {
    Basic,
    Mixed,
    Advanced,
}

impl std::str::FromStr for ExampleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ExampleKind::Basic),
            "mixed" => Ok(ExampleKind::Mixed),
            "advanced" => Ok(ExampleKind::Advanced),
            other => Err(format!("Unknown example template '{}'", other)),
        }
    }
}

/// Builds one of the bundled example templates through the same editor
/// operations an exam author would use.
pub fn example_template(kind: ExampleKind) -> Result<Template, AnswerKeyError> {
    match kind {
        ExampleKind::Basic => basic(),
        ExampleKind::Mixed => mixed(),
        ExampleKind::Advanced => advanced(),
    }
}

fn selected(question_type: QuestionType, tokens: &[&str]) -> Result<Question, AnswerKeyError> {
    let mut q = Question::new(question_type);
    q.set_correct_answers(AnswerKeyInput::Selected {
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
    })?;
    Ok(q)
}

fn true_false(value: &str) -> Result<Question, AnswerKeyError> {
    let mut q = Question::new(QuestionType::TrueFalse);
    q.set_correct_answers(AnswerKeyInput::Choice {
        value: Some(value.to_string()),
    })?;
    Ok(q)
}

fn numeric(value: &str, error_margin: f64) -> Result<Question, AnswerKeyError> {
    let mut q = Question::new(QuestionType::Numeric);
    q.set_correct_answers(AnswerKeyInput::Numeric {
        value: value.to_string(),
        error_margin,
    })?;
    Ok(q)
}

fn short_text(lines: &str) -> Result<Question, AnswerKeyError> {
    let mut q = Question::new(QuestionType::ShortText);
    q.set_correct_answers(AnswerKeyInput::Text {
        lines: lines.to_string(),
    })?;
    Ok(q)
}

fn basic() -> Result<Template, AnswerKeyError> {
    let mut template = Template::new("Basic exam - multiple choice");
    template.created_by = Some("System".into());
    template.instructions = Some("Mark only one option per question".into());

    for answer in ["A", "B", "C", "A", "D", "B", "C", "A", "B", "D"] {
        template.add_question(selected(QuestionType::MultipleChoice, &[answer])?);
    }
    Ok(template)
}

fn mixed() -> Result<Template, AnswerKeyError> {
    let mut template = Template::new("Mixed exam - several question types");
    template.created_by = Some("System".into());
    template.instructions = Some("Answer every question in the form its type asks for".into());
    template.passing_grade = 65.0;

    for answer in ["A", "B", "C", "D", "A"] {
        template.add_question(selected(QuestionType::MultipleChoice, &[answer])?);
    }
    for answer in ["V", "F", "V"] {
        template.add_question(true_false(answer)?);
    }
    template.add_question(numeric("42.5", 0.5)?.with_weight(2.0));
    template.add_question(numeric("100", 1.0)?.with_weight(2.0));
    Ok(template)
}

fn advanced() -> Result<Template, AnswerKeyError> {
    let mut template = Template::new("Advanced exam - every feature");
    template.created_by = Some("System".into());
    template.instructions =
        Some("Weighted questions of every type, some with partial credit".into());
    template.passing_grade = 70.0;

    template.add_question(selected(QuestionType::MultipleChoice, &["A"])?.with_weight(1.5));

    let mut several = selected(QuestionType::MultipleChoice, &["B", "C"])?
        .with_weight(2.0)
        .with_partial_credit(true);
    several.allow_multiple = Some(true);
    template.add_question(several);

    template.add_question(true_false("V")?);
    template.add_question(numeric("3.14159", 0.01)?.with_weight(3.0));
    template.add_question(numeric("25", 2.0)?.with_weight(1.5));
    template.add_question(short_text("Python")?.with_weight(2.0));
    template.add_question(
        short_text("Machine Learning\nML\nAprendizado de Máquina")?.with_weight(2.5),
    );
    template.add_question(selected(QuestionType::CustomSymbols, &["✓", "●"])?);
    template.add_question(
        selected(QuestionType::Associative, &["I-A", "II-B", "III-C"])?
            .with_weight(1.5)
            .with_partial_credit(true),
    );
    template.add_question(selected(QuestionType::GreekAlphabet, &["γ"])?);
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::grading_service::GradingService;
    use crate::utils::validation::validate_template;

    #[test]
    fn every_example_is_valid_and_scores_full_marks_on_its_key() {
        for kind in [ExampleKind::Basic, ExampleKind::Mixed, ExampleKind::Advanced] {
            let template = example_template(kind).unwrap();
            assert_eq!(validate_template(&template), Ok(()), "{kind:?}");

            let score =
                GradingService::score_template(&template, &GradingService::answer_key(&template));
            assert_eq!(score.score, template.grading_scale.max(), "{kind:?}");
        }
    }

    #[test]
    fn kinds_parse_from_path_segments() {
        assert_eq!("mixed".parse::<ExampleKind>(), Ok(ExampleKind::Mixed));
        assert!("expert".parse::<ExampleKind>().is_err());
    }

    #[test]
    fn mixed_example_has_expected_shape() {
        let template = example_template(ExampleKind::Mixed).unwrap();
        assert_eq!(template.questions.len(), 10);
        assert_eq!(template.total_weight(), 12.0);
        assert_eq!(template.questions[8].correct_answers, vec!["42.5"]);
    }
}
