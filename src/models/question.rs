use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::utils::text::parse_decimal;

pub const TRUE_TOKEN: &str = "V";
pub const FALSE_TOKEN: &str = "F";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub number: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_margin: Option<f64>,
    #[serde(default)]
    pub partial_credit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_multiple: Option<bool>,
    /// Extra spellings accepted for an option, keyed by that option.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub acceptable_variations: BTreeMap<String, Vec<String>>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    Numeric,
    ShortText,
    CustomSymbols,
    GreekAlphabet,
    Combinations,
    Associative,
}

/// How a question captures its answer, which decides both key input and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    /// Any subset of the options.
    OptionSet,
    /// Exactly one of V/F.
    Binary,
    /// One number with a tolerance.
    Number,
    /// One free-text string matched against accepted literals.
    Text,
}

impl QuestionType {
    pub const ALL: [QuestionType; 8] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::Numeric,
        QuestionType::ShortText,
        QuestionType::CustomSymbols,
        QuestionType::GreekAlphabet,
        QuestionType::Combinations,
        QuestionType::Associative,
    ];

    pub fn shape(self) -> AnswerShape {
        match self {
            QuestionType::MultipleChoice
            | QuestionType::CustomSymbols
            | QuestionType::GreekAlphabet
            | QuestionType::Combinations
            | QuestionType::Associative => AnswerShape::OptionSet,
            QuestionType::TrueFalse => AnswerShape::Binary,
            QuestionType::Numeric => AnswerShape::Number,
            QuestionType::ShortText => AnswerShape::Text,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Numeric => "numeric",
            QuestionType::ShortText => "short_text",
            QuestionType::CustomSymbols => "custom_symbols",
            QuestionType::GreekAlphabet => "greek_alphabet",
            QuestionType::Combinations => "combinations",
            QuestionType::Associative => "associative",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple choice",
            QuestionType::TrueFalse => "True/False",
            QuestionType::Numeric => "Numeric",
            QuestionType::ShortText => "Short text",
            QuestionType::CustomSymbols => "Custom symbols",
            QuestionType::GreekAlphabet => "Greek alphabet",
            QuestionType::Combinations => "Combinations",
            QuestionType::Associative => "Associative",
        }
    }

    pub fn default_options(self) -> Vec<String> {
        let options: &[&str] = match self {
            QuestionType::MultipleChoice => &["A", "B", "C", "D", "E"],
            QuestionType::TrueFalse => &[TRUE_TOKEN, FALSE_TOKEN],
            QuestionType::CustomSymbols => &["✓", "✗", "○", "●"],
            QuestionType::GreekAlphabet => &["α", "β", "γ", "δ", "ε"],
            QuestionType::Combinations => &["A1", "A2", "B1", "B2", "C1"],
            QuestionType::Associative => &["I-A", "II-B", "III-C", "IV-D"],
            QuestionType::Numeric | QuestionType::ShortText => &[],
        };
        options.iter().map(|o| o.to_string()).collect()
    }

    /// Spellings a reader may produce for a standard option of this type.
    pub fn default_variations(self, option: &str) -> &'static [&'static str] {
        match (self, option) {
            (QuestionType::MultipleChoice, "A") => &["1"],
            (QuestionType::MultipleChoice, "B") => &["2"],
            (QuestionType::MultipleChoice, "C") => &["3"],
            (QuestionType::MultipleChoice, "D") => &["4"],
            (QuestionType::MultipleChoice, "E") => &["5"],
            (QuestionType::GreekAlphabet, "α") => &["alpha", "a"],
            (QuestionType::GreekAlphabet, "β") => &["beta", "b"],
            (QuestionType::GreekAlphabet, "γ") => &["gamma", "g"],
            (QuestionType::GreekAlphabet, "δ") => &["delta", "d"],
            (QuestionType::GreekAlphabet, "ε") => &["epsilon", "e"],
            (QuestionType::CustomSymbols, "■") => &["□", "quadrado", "square"],
            (QuestionType::CustomSymbols, "●") => &["○", "circulo", "circle"],
            (QuestionType::CustomSymbols, "▲") => &["△", "triangulo", "triangle"],
            (QuestionType::CustomSymbols, "♦") => &["◊", "diamante", "diamond"],
            (QuestionType::CustomSymbols, "✓") => &["check"],
            (QuestionType::CustomSymbols, "✗") => &["cross"],
            _ => &[],
        }
    }
}

/// Raw editor input for a question's answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerKeyInput {
    /// Checked option tokens of a set-based question.
    Selected { tokens: Vec<String> },
    /// The selected radio value of a true/false question, if any.
    Choice { value: Option<String> },
    /// A numeric key with its tolerance field.
    Numeric { value: String, error_margin: f64 },
    /// Accepted short-text answers, one per line.
    Text { lines: String },
}

impl AnswerKeyInput {
    fn shape(&self) -> AnswerShape {
        match self {
            AnswerKeyInput::Selected { .. } => AnswerShape::OptionSet,
            AnswerKeyInput::Choice { .. } => AnswerShape::Binary,
            AnswerKeyInput::Numeric { .. } => AnswerShape::Number,
            AnswerKeyInput::Text { .. } => AnswerShape::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnswerKeyError {
    #[error("a {question_type:?} question does not accept {input:?} input")]
    InputMismatch {
        question_type: QuestionType,
        input: AnswerShape,
    },
    #[error("no answer selected")]
    NoSelection,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' is not one of the question options")]
    UnknownOption(String),
}

impl Question {
    /// Creates a question of the given type with its default options and weight 1.
    /// The number is assigned when the question is added to a template.
    pub fn new(question_type: QuestionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: 0,
            question_type,
            weight: default_weight(),
            options: question_type.default_options(),
            correct_answers: Vec::new(),
            error_margin: (question_type == QuestionType::Numeric).then_some(0.0),
            partial_credit: false,
            allow_multiple: (question_type == QuestionType::MultipleChoice).then_some(false),
            acceptable_variations: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_partial_credit(mut self, partial_credit: bool) -> Self {
        self.partial_credit = partial_credit;
        self
    }

    pub fn shape(&self) -> AnswerShape {
        self.question_type.shape()
    }

    /// Replaces the answer key from editor input.
    ///
    /// An empty key is accepted here; `validate_template` refuses to persist it.
    pub fn set_correct_answers(&mut self, input: AnswerKeyInput) -> Result<(), AnswerKeyError> {
        if input.shape() != self.shape() {
            return Err(AnswerKeyError::InputMismatch {
                question_type: self.question_type,
                input: input.shape(),
            });
        }

        match input {
            AnswerKeyInput::Selected { tokens } => {
                let mut seen = BTreeSet::new();
                let mut key = Vec::with_capacity(tokens.len());
                for token in tokens {
                    let canonical = self
                        .match_option(&token)
                        .ok_or_else(|| AnswerKeyError::UnknownOption(token.clone()))?;
                    if seen.insert(canonical.clone()) {
                        key.push(canonical);
                    }
                }
                self.correct_answers = key;
            }
            AnswerKeyInput::Choice { value } => {
                let Some(value) = value else {
                    self.correct_answers.clear();
                    return Err(AnswerKeyError::NoSelection);
                };
                let canonical = canonical_true_false(&value)
                    .ok_or_else(|| AnswerKeyError::UnknownOption(value.clone()))?;
                self.correct_answers = vec![canonical.to_string()];
            }
            AnswerKeyInput::Numeric { value, error_margin } => {
                let trimmed = value.trim();
                if parse_decimal(trimmed).is_none() {
                    return Err(AnswerKeyError::NotANumber(value));
                }
                self.correct_answers = vec![trimmed.to_string()];
                self.error_margin = Some(error_margin);
            }
            AnswerKeyInput::Text { lines } => {
                self.correct_answers = lines
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }

        Ok(())
    }

    /// Resolves a token to the matching option, ignoring case and surrounding
    /// whitespace. An option's own spelling wins over any variation, so a
    /// variation never shadows another option. Questions without options
    /// accept any non-empty token as-is.
    pub fn match_option(&self, token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if self.options.is_empty() {
            return Some(token.to_string());
        }

        let wanted = token.to_lowercase();
        let same = |candidate: &str| candidate.trim().to_lowercase() == wanted;
        if let Some(option) = self.options.iter().find(|o| same(o)) {
            return Some(option.clone());
        }
        self.options
            .iter()
            .find(|option| {
                let custom = self
                    .acceptable_variations
                    .get(option.as_str())
                    .is_some_and(|v| v.iter().any(|v| same(v)));
                custom
                    || self
                        .question_type
                        .default_variations(option.trim())
                        .iter()
                        .any(|v| same(v))
            })
            .cloned()
    }
}

/// Maps the accepted spellings of true and false onto "V" and "F".
pub fn canonical_true_false(token: &str) -> Option<&'static str> {
    match token.trim().to_lowercase().as_str() {
        "v" | "t" | "true" | "verdadeiro" | "✓" => Some(TRUE_TOKEN),
        "f" | "x" | "false" | "falso" | "✗" | "×" => Some(FALSE_TOKEN),
        _ => None,
    }
}
