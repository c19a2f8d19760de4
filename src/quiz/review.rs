// src/quiz/review.rs

use tracing::instrument;

use crate::{
    api::ApiClient,
    error::AppError,
    models::attempt::{AnswerDetail, AttemptDetail, score_line},
};

/// Read-only walk through a submitted attempt, one question at a time.
#[derive(Debug, Clone)]
pub struct AttemptReview {
    detail: AttemptDetail,
    cursor: usize,
}

impl AttemptReview {
    #[instrument(skip(api))]
    pub async fn load(api: &ApiClient, attempt_id: i64) -> Result<Self, AppError> {
        let detail = api.attempt_detail(attempt_id).await?;
        Ok(Self::new(detail))
    }

    pub fn new(detail: AttemptDetail) -> Self {
        Self { detail, cursor: 0 }
    }

    pub fn detail(&self) -> &AttemptDetail {
        &self.detail
    }

    pub fn summary_line(&self) -> String {
        score_line(
            self.detail.total_score,
            self.detail.max_score,
            self.detail.percentage,
        )
    }

    pub fn len(&self) -> usize {
        self.detail.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detail.answers.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&AnswerDetail> {
        self.detail.answers.get(self.cursor)
    }

    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_to(&mut self, index: usize) -> Option<&AnswerDetail> {
        if index < self.len() {
            self.cursor = index;
        }
        self.detail.answers.get(index)
    }

    /// Number of questions answered incorrectly.
    pub fn mistakes(&self) -> usize {
        self.detail.answers.iter().filter(|a| !a.is_correct).count()
    }
}
