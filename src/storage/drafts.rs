// src/storage/drafts.rs

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::SharedStore;
use crate::{error::AppError, models::quiz::AnswerOption};

/// Unsubmitted answers for one quiz, keyed by question id.
pub type Answers = BTreeMap<i64, AnswerOption>;

/// Per-quiz answer drafts on top of a [`SharedStore`].
///
/// Each quiz has its own key, so at most one draft exists per quiz id and
/// touching one quiz never disturbs another quiz's draft.
#[derive(Clone)]
pub struct DraftStore {
    store: SharedStore,
}

impl DraftStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn key(quiz_id: i64) -> String {
        format!("quiz_answers_{quiz_id}")
    }

    /// Returns the saved draft, or an empty map when none exists.
    /// An unreadable draft is dropped rather than blocking the quiz.
    pub async fn load(&self, quiz_id: i64) -> Result<Answers, AppError> {
        let Some(raw) = self.store.get(&Self::key(quiz_id)).await? else {
            return Ok(Answers::new());
        };

        match serde_json::from_str::<Answers>(&raw) {
            Ok(answers) => {
                debug!(quiz_id, restored = answers.len(), "draft loaded");
                Ok(answers)
            }
            Err(e) => {
                warn!(quiz_id, "discarding unreadable draft: {}", e);
                self.clear(quiz_id).await?;
                Ok(Answers::new())
            }
        }
    }

    pub async fn save(&self, quiz_id: i64, answers: &Answers) -> Result<(), AppError> {
        if answers.is_empty() {
            return self.clear(quiz_id).await;
        }
        let raw = serde_json::to_string(answers).map_err(|e| AppError::Storage(e.to_string()))?;
        self.store.set(&Self::key(quiz_id), &raw).await
    }

    pub async fn clear(&self, quiz_id: i64) -> Result<(), AppError> {
        self.store.remove(&Self::key(quiz_id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    #[tokio::test]
    async fn round_trip_restores_exact_selection() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()));
        let mut answers = Answers::new();
        answers.insert(1, AnswerOption::A);
        answers.insert(3, AnswerOption::C);

        drafts.save(7, &answers).await.unwrap();

        assert_eq!(drafts.load(7).await.unwrap(), answers);
        assert!(drafts.load(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clearing_one_quiz_keeps_the_other() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()));
        let mut answers = Answers::new();
        answers.insert(1, AnswerOption::B);

        drafts.save(7, &answers).await.unwrap();
        drafts.save(9, &answers).await.unwrap();
        drafts.clear(7).await.unwrap();

        assert!(drafts.load(7).await.unwrap().is_empty());
        assert_eq!(drafts.load(9).await.unwrap(), answers);
    }

    #[tokio::test]
    async fn empty_save_removes_key() {
        let store = Arc::new(MemoryStore::new());
        let drafts = DraftStore::new(store.clone());
        let mut answers = Answers::new();
        answers.insert(2, AnswerOption::D);
        drafts.save(4, &answers).await.unwrap();

        drafts.save(4, &Answers::new()).await.unwrap();
        assert_eq!(store.get("quiz_answers_4").await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_draft_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        store.set("quiz_answers_5", "{oops").await.unwrap();

        let drafts = DraftStore::new(store.clone());
        assert!(drafts.load(5).await.unwrap().is_empty());
        assert_eq!(store.get("quiz_answers_5").await.unwrap(), None);
    }
}
