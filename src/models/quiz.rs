// src/models/quiz.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::timestamp};

/// One of the four answer letters. Upper-case on the wire, case-insensitive on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
}

impl AnswerOption {
    pub const ALL: [AnswerOption; 4] = [
        AnswerOption::A,
        AnswerOption::B,
        AnswerOption::C,
        AnswerOption::D,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOption::A => "A",
            AnswerOption::B => "B",
            AnswerOption::C => "C",
            AnswerOption::D => "D",
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerOption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(AnswerOption::A),
            "B" => Ok(AnswerOption::B),
            "C" => Ok(AnswerOption::C),
            "D" => Ok(AnswerOption::D),
            other => Err(AppError::BadRequest(format!(
                "'{other}' is not an answer option (expected A, B, C or D)"
            ))),
        }
    }
}

impl TryFrom<String> for AnswerOption {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnswerOption> for String {
    fn from(option: AnswerOption) -> Self {
        option.as_str().to_string()
    }
}

/// Quiz listing row (`GET /quizzes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub question_count: Option<u32>,
}

fn default_duration_minutes() -> u32 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

/// A question as shown to a student. The correct option is withheld by the
/// server until review, so `correct_option` is normally absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default = "default_points")]
    pub points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<AnswerOption>,
}

fn default_points() -> f64 {
    1.0
}

impl QuizQuestion {
    /// Offered options in letter order, skipping missing C/D.
    pub fn options(&self) -> Vec<(AnswerOption, &str)> {
        let mut options = vec![
            (AnswerOption::A, self.option_a.as_str()),
            (AnswerOption::B, self.option_b.as_str()),
        ];
        if let Some(text) = self.option_c.as_deref() {
            options.push((AnswerOption::C, text));
        }
        if let Some(text) = self.option_d.as_deref() {
            options.push((AnswerOption::D, text));
        }
        options
    }

    pub fn offers(&self, option: AnswerOption) -> bool {
        match option {
            AnswerOption::A | AnswerOption::B => true,
            AnswerOption::C => self.option_c.is_some(),
            AnswerOption::D => self.option_d.is_some(),
        }
    }
}

/// Quiz metadata plus its question list (`GET /quizzes/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub summary: QuizSummary,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl QuizDetail {
    pub fn id(&self) -> i64 {
        self.summary.id
    }

    pub fn duration_seconds(&self) -> u64 {
        u64::from(self.summary.duration_minutes) * 60
    }

    pub fn question(&self, question_id: i64) -> Option<&QuizQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn max_score(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "course_id": 3,
            "title": "Comparison Based Algorithms",
            "duration_minutes": 5,
            "max_attempts": 2,
            "questions": [
                {"id": 1, "question_text": "1 + 1 = ?", "option_a": "1", "option_b": "2",
                 "option_c": "3", "option_d": "4", "points": 2.0},
                {"id": 2, "question_text": "True or false?", "option_a": "True", "option_b": "False"}
            ]
        })
    }

    #[test]
    fn answer_option_is_case_insensitive() {
        assert_eq!("c".parse::<AnswerOption>().unwrap(), AnswerOption::C);
        assert_eq!(" D ".parse::<AnswerOption>().unwrap(), AnswerOption::D);
        assert!("E".parse::<AnswerOption>().is_err());

        let parsed: AnswerOption = serde_json::from_str("\"b\"").unwrap();
        assert_eq!(parsed, AnswerOption::B);
        assert_eq!(serde_json::to_string(&AnswerOption::B).unwrap(), "\"B\"");
    }

    #[test]
    fn detail_flattens_summary_and_defaults_points() {
        let quiz: QuizDetail = serde_json::from_value(detail_json()).unwrap();
        assert_eq!(quiz.id(), 7);
        assert_eq!(quiz.duration_seconds(), 300);
        assert_eq!(quiz.questions[1].points, 1.0);
        assert_eq!(quiz.max_score(), 3.0);
        assert!(quiz.questions[0].correct_option.is_none());
    }

    #[test]
    fn schedule_accepts_offset_less_timestamps() {
        let raw = r#"{"id": 7, "course_id": 3, "title": "Scheduled",
            "start_time": "2025-03-01T09:00:00", "end_time": "2025-03-08T09:00:00.250000",
            "questions": []}"#;

        let quiz: QuizDetail = serde_json::from_str(raw).unwrap();

        let start = quiz.summary.start_time.unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-01T09:00:00+00:00");
        assert!(quiz.summary.end_time.unwrap() > start);
    }

    #[test]
    fn two_option_question_only_offers_a_and_b() {
        let quiz: QuizDetail = serde_json::from_value(detail_json()).unwrap();
        let question = quiz.question(2).unwrap();
        assert!(question.offers(AnswerOption::B));
        assert!(!question.offers(AnswerOption::C));
        assert_eq!(question.options().len(), 2);
        assert_eq!(quiz.question(1).unwrap().options()[3], (AnswerOption::D, "4"));
    }
}
