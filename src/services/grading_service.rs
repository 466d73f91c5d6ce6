use std::collections::BTreeSet;

use crate::models::correction::{
    AnswerSheet, LetterGrade, MalformedAnswer, MalformedReason, QuestionScore, SubmittedAnswer,
    TemplateScore,
};
use crate::models::question::{canonical_true_false, AnswerShape, Question};
use crate::models::template::Template;
use crate::utils::text::{normalize_answer, parse_decimal};

/// Slack for floating point noise in tolerance and equality checks.
const EPSILON: f64 = 1e-9;

pub struct GradingService;

impl GradingService {
    /// Scores one question. An empty submission earns nothing; a submission
    /// that cannot be read for the question's type is reported as malformed.
    pub fn score_answer(
        question: &Question,
        submitted: &[String],
    ) -> Result<QuestionScore, MalformedAnswer> {
        let tokens: Vec<String> = submitted
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let malformed = |reason| MalformedAnswer {
            question: question.number,
            answer: tokens.clone(),
            reason,
        };

        let credit = if tokens.is_empty() {
            0.0
        } else {
            match question.shape() {
                AnswerShape::OptionSet => Self::option_set_credit(question, &tokens)
                    .map_err(malformed)?,
                AnswerShape::Binary => {
                    let [token] = tokens.as_slice() else {
                        return Err(malformed(MalformedReason::SeveralValues));
                    };
                    let given = canonical_true_false(token)
                        .ok_or_else(|| malformed(MalformedReason::NotTrueFalse))?;
                    let expected = match question.correct_answers.as_slice() {
                        [key] => canonical_true_false(key),
                        _ => None,
                    }
                    .ok_or_else(|| malformed(MalformedReason::InvalidKey))?;
                    if given == expected {
                        question.weight
                    } else {
                        0.0
                    }
                }
                AnswerShape::Number => {
                    let [token] = tokens.as_slice() else {
                        return Err(malformed(MalformedReason::SeveralValues));
                    };
                    let given =
                        parse_decimal(token).ok_or_else(|| malformed(MalformedReason::NotANumber))?;
                    let expected = match question.correct_answers.as_slice() {
                        [key] => parse_decimal(key),
                        _ => None,
                    }
                    .ok_or_else(|| malformed(MalformedReason::InvalidKey))?;
                    let margin = question.error_margin.unwrap_or(0.0).max(0.0);
                    if (given - expected).abs() <= margin + EPSILON {
                        question.weight
                    } else {
                        0.0
                    }
                }
                AnswerShape::Text => {
                    let [token] = tokens.as_slice() else {
                        return Err(malformed(MalformedReason::SeveralValues));
                    };
                    let given = normalize_answer(token);
                    let matched = question
                        .correct_answers
                        .iter()
                        .any(|accepted| normalize_answer(accepted) == given);
                    if matched {
                        question.weight
                    } else {
                        0.0
                    }
                }
            }
        };

        Ok(QuestionScore {
            number: question.number,
            question_type: question.question_type,
            submitted: tokens,
            correct_answers: question.correct_answers.clone(),
            credit,
            weight: question.weight,
            is_correct: question.weight > 0.0 && (credit - question.weight).abs() < EPSILON,
            confidence: None,
        })
    }

    /// Without partial credit the marked set must equal the key. With partial
    /// credit every hit earns `weight / |key|` and every wrong mark cancels one hit.
    fn option_set_credit(question: &Question, tokens: &[String]) -> Result<f64, MalformedReason> {
        let mut given = BTreeSet::new();
        for token in tokens {
            let option = question
                .match_option(token)
                .ok_or(MalformedReason::UnknownOption)?;
            given.insert(option);
        }

        let mut key = BTreeSet::new();
        for answer in &question.correct_answers {
            let option = question
                .match_option(answer)
                .ok_or(MalformedReason::InvalidKey)?;
            key.insert(option);
        }
        if key.is_empty() {
            return Err(MalformedReason::InvalidKey);
        }

        if !question.partial_credit {
            return Ok(if given == key { question.weight } else { 0.0 });
        }

        let hits = given.intersection(&key).count() as f64;
        let wrong = given.difference(&key).count() as f64;
        let ratio = ((hits - wrong) / key.len() as f64).clamp(0.0, 1.0);
        Ok(question.weight * ratio)
    }

    /// Scores a whole answer sheet against a template. Missing answers earn
    /// nothing, malformed ones are listed and earn nothing, and answers to
    /// numbers the template does not have are ignored.
    pub fn score_template(template: &Template, answers: &AnswerSheet) -> TemplateScore {
        let mut questions = Vec::with_capacity(template.questions.len());
        let mut malformed = Vec::new();
        let mut earned = 0.0;
        let mut correct_answers = 0;

        for question in &template.questions {
            let answer = answers.get(&question.number);
            let submitted = answer.map(SubmittedAnswer::tokens).unwrap_or_default();
            let confidence = answer.and_then(SubmittedAnswer::confidence);

            match Self::score_answer(question, &submitted) {
                Ok(mut score) => {
                    score.confidence = confidence;
                    earned += score.credit;
                    if score.is_correct {
                        correct_answers += 1;
                    }
                    questions.push(score);
                }
                Err(err) => {
                    questions.push(QuestionScore {
                        number: question.number,
                        question_type: question.question_type,
                        submitted: err.answer.clone(),
                        correct_answers: question.correct_answers.clone(),
                        credit: 0.0,
                        weight: question.weight,
                        is_correct: false,
                        confidence,
                    });
                    malformed.push(err);
                }
            }
        }

        let total_weight = template.total_weight();
        let fraction = if total_weight > 0.0 {
            (earned / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let percentage = fraction * 100.0;

        TemplateScore {
            questions,
            malformed,
            earned,
            total_weight,
            percentage,
            score: template.grading_scale.rescale(fraction),
            letter_grade: LetterGrade::from_fraction(fraction),
            passed: percentage + EPSILON >= template.passing_grade,
            correct_answers,
            total_questions: template.questions.len() as u32,
        }
    }

    /// The answer sheet that reproduces every question's key.
    pub fn answer_key(template: &Template) -> AnswerSheet {
        template
            .questions
            .iter()
            .map(|q| {
                let answer = match q.shape() {
                    AnswerShape::OptionSet => SubmittedAnswer::Many(q.correct_answers.clone()),
                    AnswerShape::Binary | AnswerShape::Number | AnswerShape::Text => {
                        let key = q.correct_answers.first().cloned().unwrap_or_default();
                        SubmittedAnswer::Single(key)
                    }
                };
                (q.number, answer)
            })
            .collect()
    }
}
