use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::question::QuestionType;

/// One submitted answer as it arrives from the detection step: a single token,
/// several marked tokens, or either of those with the reader's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Single(String),
    Many(Vec<String>),
    Detected {
        answer: Box<SubmittedAnswer>,
        confidence: f64,
    },
}

impl SubmittedAnswer {
    /// Tokens with surrounding whitespace removed and blanks dropped.
    pub fn tokens(&self) -> Vec<String> {
        let raw: Vec<&String> = match self {
            SubmittedAnswer::Single(token) => vec![token],
            SubmittedAnswer::Many(tokens) => tokens.iter().collect(),
            SubmittedAnswer::Detected { answer, .. } => return answer.tokens(),
        };
        raw.into_iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Detection confidence clamped to [0, 1], when the reader reported one.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            SubmittedAnswer::Detected { confidence, .. } if confidence.is_finite() => {
                Some(confidence.clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

impl From<&str> for SubmittedAnswer {
    fn from(value: &str) -> Self {
        SubmittedAnswer::Single(value.to_string())
    }
}

impl From<Vec<&str>> for SubmittedAnswer {
    fn from(values: Vec<&str>) -> Self {
        SubmittedAnswer::Many(values.into_iter().map(str::to_string).collect())
    }
}

pub type AnswerSheet = BTreeMap<u32, SubmittedAnswer>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub number: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub submitted: Vec<String>,
    pub correct_answers: Vec<String>,
    pub credit: f64,
    pub weight: f64,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    NotANumber,
    SeveralValues,
    UnknownOption,
    NotTrueFalse,
    /// The stored key itself cannot be interpreted.
    InvalidKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("answer {answer:?} to question {question} is malformed: {reason:?}")]
pub struct MalformedAnswer {
    pub question: u32,
    pub answer: Vec<String>,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 5] = [
        LetterGrade::A,
        LetterGrade::B,
        LetterGrade::C,
        LetterGrade::D,
        LetterGrade::F,
    ];

    /// Bands on a 0-10 basis: A >= 9, B >= 8, C >= 7, D >= 6.
    pub fn from_fraction(fraction: f64) -> Self {
        let on_ten = fraction * 10.0 + 1e-9;
        if on_ten >= 9.0 {
            LetterGrade::A
        } else if on_ten >= 8.0 {
            LetterGrade::B
        } else if on_ten >= 7.0 {
            LetterGrade::C
        } else if on_ten >= 6.0 {
            LetterGrade::D
        } else {
            LetterGrade::F
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateScore {
    pub questions: Vec<QuestionScore>,
    pub malformed: Vec<MalformedAnswer>,
    pub earned: f64,
    pub total_weight: f64,
    pub percentage: f64,
    pub score: f64,
    pub letter_grade: LetterGrade,
    pub passed: bool,
    pub correct_answers: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub id: Uuid,
    pub student_id: String,
    pub template_id: Uuid,
    pub template_version: String,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub earned: f64,
    pub total_weight: f64,
    pub percentage: f64,
    pub score: f64,
    pub letter_grade: LetterGrade,
    pub passed: bool,
    pub questions: Vec<QuestionScore>,
    pub malformed: Vec<MalformedAnswer>,
    pub corrected_at: DateTime<Utc>,
}

impl CorrectionResult {
    pub fn from_score(
        student_id: String,
        template_id: Uuid,
        template_version: String,
        score: TemplateScore,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            template_id,
            template_version,
            correct_answers: score.correct_answers,
            total_questions: score.total_questions,
            earned: score.earned,
            total_weight: score.total_weight,
            percentage: score.percentage,
            score: score.score,
            letter_grade: score.letter_grade,
            passed: score.passed,
            questions: score.questions,
            malformed: score.malformed,
            corrected_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub result_id: Uuid,
    pub student_id: String,
    pub template_name: String,
    pub template_version: String,
    pub total_weight: f64,
    pub percentage: f64,
    pub score: f64,
    pub letter_grade: LetterGrade,
    pub passed: bool,
    pub wrong_questions: Vec<u32>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub fn from_correct_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            Difficulty::Easy
        } else if ratio >= 0.6 {
            Difficulty::Moderate
        } else if ratio >= 0.4 {
            Difficulty::Hard
        } else {
            Difficulty::VeryHard
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub number: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub responses: u32,
    pub correct_percentage: f64,
    pub difficulty: Difficulty,
    /// Mean detection confidence over the responses that reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassAnalytics {
    pub template_id: Uuid,
    pub template_name: String,
    pub total_students: usize,
    pub average_percentage: f64,
    pub highest_percentage: f64,
    pub lowest_percentage: f64,
    pub passing_rate: f64,
    pub grade_distribution: BTreeMap<LetterGrade, usize>,
    pub questions: Vec<QuestionAnalysis>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub templates: usize,
    pub tests_corrected: usize,
    pub average_percentage: f64,
    pub passing_rate: f64,
    pub grade_distribution: BTreeMap<LetterGrade, usize>,
}
