// src/models/attempt.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{quiz::AnswerOption, timestamp};

/// Response of `POST /quizzes/{id}/start`.
/// A resumed in-progress attempt comes back with the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedAttempt {
    pub attempt_id: i64,
    pub quiz_id: i64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub max_score: Option<f64>,
}

fn default_status() -> String {
    "in_progress".to_string()
}

/// One entry of a submitted answer batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub chosen_option: AnswerOption,
}

/// Body of `POST /quizzes/attempts/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub quiz_id: i64,
    pub answers: Vec<AnswerSubmission>,
    pub time_spent_seconds: u64,
}

impl SubmissionRequest {
    /// Builds the batch from the answer map. Questions without a selection
    /// have no entry in the map and therefore none in the batch.
    pub fn from_answers(
        quiz_id: i64,
        answers: &BTreeMap<i64, AnswerOption>,
        time_spent_seconds: u64,
    ) -> Self {
        Self {
            quiz_id,
            answers: answers
                .iter()
                .map(|(&question_id, &chosen_option)| AnswerSubmission {
                    question_id,
                    chosen_option,
                })
                .collect(),
            time_spent_seconds,
        }
    }
}

/// Server-computed grading returned on submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    #[serde(default)]
    pub attempt_id: Option<i64>,
    #[serde(default)]
    pub quiz_id: Option<i64>,
    pub total_score: f64,
    pub max_score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub percentage: f64,
    #[serde(default)]
    pub status: Option<String>,
}

/// Per-question breakdown shown on the review page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    pub chosen_option: AnswerOption,
    pub correct_option: AnswerOption,
    pub is_correct: bool,
    pub points: f64,
}

impl AnswerDetail {
    pub fn option_text(&self, option: AnswerOption) -> Option<&str> {
        match option {
            AnswerOption::A => Some(self.option_a.as_str()),
            AnswerOption::B => Some(self.option_b.as_str()),
            AnswerOption::C => self.option_c.as_deref(),
            AnswerOption::D => self.option_d.as_deref(),
        }
    }
}

/// Response of `GET /quizzes/attempts/{id}/detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub status: String,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: Vec<AnswerDetail>,
}

/// Attempt history row (`GET /quizzes/student/{id}/attempts`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_score: Option<f64>,
    pub status: String,
}

/// Formats `score / max (pct%)` with one decimal, as on the result pages.
pub fn score_line(total_score: f64, max_score: f64, percentage: f64) -> String {
    format!("{total_score:.1} / {max_score:.1} ({percentage:.1}%)")
}
