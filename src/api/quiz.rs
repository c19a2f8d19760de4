// src/api/quiz.rs

use tracing::instrument;

use super::ApiClient;
use crate::{
    error::AppError,
    models::{
        attempt::{AttemptDetail, AttemptResult, AttemptSummary, StartedAttempt, SubmissionRequest},
        quiz::{QuizDetail, QuizSummary},
    },
};

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn list_quizzes(&self, course_id: Option<i64>) -> Result<Vec<QuizSummary>, AppError> {
        let path = match course_id {
            Some(course_id) => format!("quizzes?course_id={course_id}"),
            None => "quizzes".to_string(),
        };
        self.get_json(&path).await
    }

    /// Quiz metadata and questions. Correct options are withheld for students.
    #[instrument(skip(self))]
    pub async fn get_quiz(&self, quiz_id: i64) -> Result<QuizDetail, AppError> {
        self.get_json(&format!("quizzes/{quiz_id}")).await
    }

    /// Starts (or resumes) an attempt. `None` means no attempt is available,
    /// typically because all attempts have been used.
    #[instrument(skip(self))]
    pub async fn start_attempt(&self, quiz_id: i64) -> Result<Option<StartedAttempt>, AppError> {
        self.post_optional_json(&format!("quizzes/{quiz_id}/start")).await
    }

    #[instrument(skip(self, submission), fields(answers = submission.answers.len()))]
    pub async fn submit_attempt(
        &self,
        attempt_id: i64,
        submission: &SubmissionRequest,
    ) -> Result<AttemptResult, AppError> {
        self.post_json(&format!("quizzes/attempts/{attempt_id}/submit"), submission)
            .await
    }

    #[instrument(skip(self))]
    pub async fn attempt_detail(&self, attempt_id: i64) -> Result<AttemptDetail, AppError> {
        self.get_json(&format!("quizzes/attempts/{attempt_id}/detail"))
            .await
    }

    #[instrument(skip(self))]
    pub async fn student_attempts(
        &self,
        student_id: i64,
        quiz_id: Option<i64>,
    ) -> Result<Vec<AttemptSummary>, AppError> {
        let path = match quiz_id {
            Some(quiz_id) => format!("quizzes/student/{student_id}/attempts?quiz_id={quiz_id}"),
            None => format!("quizzes/student/{student_id}/attempts"),
        };
        self.get_json(&path).await
    }
}
