use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::question::Question;

pub const DEFAULT_PASSING_GRADE: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub grading_scale: GradingScale,
    #[serde(default = "default_passing_grade")]
    pub passing_grade: f64,
    #[serde(default)]
    pub multiple_versions: bool,
    #[serde(default = "default_version_count")]
    pub version_count: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_version() -> String {
    "A".to_string()
}

fn default_passing_grade() -> f64 {
    DEFAULT_PASSING_GRADE
}

fn default_version_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("question {0} not found")]
pub struct QuestionNotFound(pub Uuid);

impl Template {
    /// An empty draft with default grading policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            version: default_version(),
            created_by: None,
            instructions: None,
            grading_scale: GradingScale::default(),
            passing_grade: default_passing_grade(),
            multiple_versions: false,
            version_count: default_version_count(),
            questions: Vec::new(),
            created_at: None,
        }
    }

    /// Appends a question as the last one, numbering it `len + 1`.
    pub fn add_question(&mut self, mut question: Question) -> &Question {
        question.number = self.questions.len() as u32 + 1;
        self.questions.push(question);
        &self.questions[self.questions.len() - 1]
    }

    /// Removes a question and renumbers the remaining ones from 1.
    pub fn delete_question(&mut self, question_id: Uuid) -> Result<Question, QuestionNotFound> {
        let idx = self
            .questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or(QuestionNotFound(question_id))?;
        let removed = self.questions.remove(idx);
        self.renumber();
        Ok(removed)
    }

    /// Gives a fresh id to every question whose id an earlier question already uses.
    pub fn dedupe_question_ids(&mut self) {
        let mut seen = HashSet::new();
        for question in &mut self.questions {
            if !seen.insert(question.id) {
                question.id = Uuid::new_v4();
                seen.insert(question.id);
            }
        }
    }

    pub fn renumber(&mut self) {
        for (idx, question) in self.questions.iter_mut().enumerate() {
            question.number = idx as u32 + 1;
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.questions.iter().map(|q| q.weight).sum()
    }
}

/// A closed numeric range scores are reported on, written as `"<min>-<max>"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GradingScale {
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid grading scale '{0}', expected '<min>-<max>' with min < max")]
pub struct InvalidGradingScale(pub String);

impl GradingScale {
    pub fn new(min: f64, max: f64) -> Result<Self, InvalidGradingScale> {
        if min.is_finite() && max.is_finite() && min < max {
            Ok(Self { min, max })
        } else {
            Err(InvalidGradingScale(format!("{}-{}", min, max)))
        }
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Maps a fraction of the full credit (0..=1) onto the scale.
    pub fn rescale(&self, fraction: f64) -> f64 {
        self.min + fraction.clamp(0.0, 1.0) * (self.max - self.min)
    }
}

impl Default for GradingScale {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0 }
    }
}

impl fmt::Display for GradingScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for GradingScale {
    type Err = InvalidGradingScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidGradingScale(s.to_string());
        let (min, max) = s.trim().split_once('-').ok_or_else(invalid)?;
        let min: f64 = min.trim().parse().map_err(|_| invalid())?;
        let max: f64 = max.trim().parse().map_err(|_| invalid())?;
        Self::new(min, max).map_err(|_| invalid())
    }
}

impl TryFrom<String> for GradingScale {
    type Error = InvalidGradingScale;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GradingScale> for String {
    fn from(scale: GradingScale) -> Self {
        scale.to_string()
    }
}
