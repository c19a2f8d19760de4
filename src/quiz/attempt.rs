// src/quiz/attempt.rs

//! The quiz-taking flow as an explicit state machine.
//!
//! ```text
//! Loading ──► Ready ──► InProgress ──► Submitting ──► Finished
//!    │                                   │    ▲
//!    └──────────► Error ◄────────────────┘    │ manual retry
//!                   └─────────────────────────┘
//! ```
//!
//! Answers are local until submission: every change is mirrored into the
//! [`DraftStore`] so a restart restores them, and the draft is cleared only
//! once the server has accepted the batch. Manual and timeout submissions go
//! through the same guard, so one attempt produces at most one accepted
//! submission request.

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tracing::{debug, info, instrument, warn};

use super::timer::{Countdown, TimerEvent, format_clock};
use crate::{
    api::ApiClient,
    error::AppError,
    models::{
        attempt::{AttemptResult, SubmissionRequest},
        quiz::{AnswerOption, QuizDetail, QuizQuestion},
    },
    storage::{DraftStore, drafts::Answers},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Submitting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub stage: Stage,
    pub error: AppError,
}

impl AttemptFailure {
    /// A failed submission can be re-submitted by hand; a failed load cannot.
    pub fn can_retry_submit(&self) -> bool {
        self.stage == Stage::Submitting
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    Loading,
    Ready,
    InProgress,
    Submitting,
    Finished(AttemptResult),
    Error(AttemptFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

/// What happened while waiting on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Tick { remaining: u64 },
    /// The automatic submission, or one nobody was waiting on anymore,
    /// succeeded.
    Submitted(AttemptResult),
    /// The automatic submission, or one nobody was waiting on anymore, failed.
    SubmitFailed(AppError),
    /// The countdown ran out after the attempt was already submitted.
    Expired,
}

/// Client-side view of the attempt being taken.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub course_id: i64,
    pub duration_seconds: u64,
    pub started_at: DateTime<Utc>,
    pub answers: Answers,
}

pub struct QuizSession {
    api: ApiClient,
    drafts: DraftStore,
    state: AttemptState,
    quiz: Option<QuizDetail>,
    attempt: Option<QuizAttempt>,
    current: usize,
    countdown: Option<Countdown>,
    timer_events: Option<mpsc::UnboundedReceiver<TimerEvent>>,
    started: Option<Instant>,
    in_flight: Option<JoinHandle<Result<AttemptResult, AppError>>>,
    auto_submitted: bool,
}

impl QuizSession {
    pub fn new(api: ApiClient, drafts: DraftStore) -> Self {
        Self {
            api,
            drafts,
            state: AttemptState::Loading,
            quiz: None,
            attempt: None,
            current: 0,
            countdown: None,
            timer_events: None,
            started: None,
            in_flight: None,
            auto_submitted: false,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn quiz(&self) -> Option<&QuizDetail> {
        self.quiz.as_ref()
    }

    pub fn attempt(&self) -> Option<&QuizAttempt> {
        self.attempt.as_ref()
    }

    pub fn result(&self) -> Option<&AttemptResult> {
        match &self.state {
            AttemptState::Finished(result) => Some(result),
            _ => None,
        }
    }

    /// Fetches the quiz, starts (or resumes) an attempt and restores any draft.
    #[instrument(skip(self))]
    pub async fn load(&mut self, quiz_id: i64) -> Result<(), AppError> {
        if self.state != AttemptState::Loading {
            return Err(AppError::BadRequest("This quiz session is already loaded.".into()));
        }

        match self.fetch(quiz_id).await {
            Ok((quiz, attempt)) => {
                info!(
                    quiz_id,
                    attempt_id = attempt.attempt_id,
                    restored = attempt.answers.len(),
                    "attempt ready"
                );
                self.quiz = Some(quiz);
                self.attempt = Some(attempt);
                self.state = AttemptState::Ready;
                Ok(())
            }
            Err(error) => {
                warn!(quiz_id, "failed to open quiz: {}", error);
                self.state = AttemptState::Error(AttemptFailure {
                    stage: Stage::Loading,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn fetch(&self, quiz_id: i64) -> Result<(QuizDetail, QuizAttempt), AppError> {
        let quiz = self.api.get_quiz(quiz_id).await?;

        let started = self.api.start_attempt(quiz_id).await?.ok_or_else(|| {
            AppError::BadRequest(
                "No attempts remaining for this quiz. You cannot start another attempt.".into(),
            )
        })?;

        // Keep only entries that still match a question and one of its options.
        let answers: Answers = self
            .drafts
            .load(quiz_id)
            .await?
            .into_iter()
            .filter(|(question_id, option)| {
                quiz.question(*question_id)
                    .is_some_and(|question| question.offers(*option))
            })
            .collect();

        let attempt = QuizAttempt {
            attempt_id: started.attempt_id,
            quiz_id,
            course_id: quiz.summary.course_id,
            duration_seconds: quiz.duration_seconds(),
            started_at: Utc::now(),
            answers,
        };

        Ok((quiz, attempt))
    }

    /// Starts the countdown. Any previous countdown is dropped first so only
    /// one interval is ever active.
    pub fn begin(&mut self) -> Result<(), AppError> {
        if self.state != AttemptState::Ready {
            return Err(AppError::BadRequest("The quiz is not ready to start.".into()));
        }
        let attempt = self
            .attempt
            .as_mut()
            .ok_or_else(|| AppError::BadRequest("No attempt has been started.".into()))?;

        self.countdown.take();
        let (tx, rx) = mpsc::unbounded_channel();
        self.countdown = Some(Countdown::start(attempt.duration_seconds, tx));
        self.timer_events = Some(rx);

        attempt.started_at = Utc::now();
        self.started = Some(Instant::now());
        self.state = AttemptState::InProgress;

        debug!(
            attempt_id = attempt.attempt_id,
            duration = attempt.duration_seconds,
            "countdown started"
        );
        Ok(())
    }

    fn accepts_answers(&self) -> bool {
        match &self.state {
            AttemptState::InProgress => true,
            AttemptState::Error(failure) => failure.can_retry_submit(),
            _ => false,
        }
    }

    /// Records a selection locally and mirrors it into the draft store.
    pub async fn select_answer(
        &mut self,
        question_id: i64,
        option: AnswerOption,
    ) -> Result<(), AppError> {
        if !self.accepts_answers() {
            return Err(AppError::BadRequest("Answers can no longer be changed.".into()));
        }
        let question = self
            .question(question_id)
            .ok_or_else(|| AppError::NotFound(format!("question {question_id} is not in this quiz")))?;
        if !question.offers(option) {
            return Err(AppError::BadRequest(format!(
                "Option {option} is not available for this question."
            )));
        }

        let attempt = self.attempt_mut()?;
        attempt.answers.insert(question_id, option);
        let (quiz_id, answers) = (attempt.quiz_id, attempt.answers.clone());
        self.drafts.save(quiz_id, &answers).await
    }

    /// Removes a selection; the question becomes unanswered again.
    pub async fn clear_answer(&mut self, question_id: i64) -> Result<(), AppError> {
        if !self.accepts_answers() {
            return Err(AppError::BadRequest("Answers can no longer be changed.".into()));
        }
        let attempt = self.attempt_mut()?;
        if attempt.answers.remove(&question_id).is_none() {
            return Ok(());
        }
        let (quiz_id, answers) = (attempt.quiz_id, attempt.answers.clone());
        self.drafts.save(quiz_id, &answers).await
    }

    fn attempt_mut(&mut self) -> Result<&mut QuizAttempt, AppError> {
        self.attempt
            .as_mut()
            .ok_or_else(|| AppError::BadRequest("No attempt has been started.".into()))
    }

    pub fn answers(&self) -> Option<&Answers> {
        self.attempt.as_ref().map(|a| &a.answers)
    }

    pub fn answer_for(&self, question_id: i64) -> Option<AnswerOption> {
        self.answers()?.get(&question_id).copied()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        self.quiz.as_ref().map_or(&[], |q| q.questions.as_slice())
    }

    fn question(&self, question_id: i64) -> Option<&QuizQuestion> {
        self.quiz.as_ref()?.question(question_id)
    }

    /// Question ids without a selection, in quiz order.
    pub fn unanswered(&self) -> Vec<i64> {
        self.questions()
            .iter()
            .filter(|q| self.answer_for(q.id).is_none())
            .map(|q| q.id)
            .collect()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions().get(self.current)
    }

    /// Moves to a question by position. Navigation never changes the state.
    pub fn go_to(&mut self, index: usize) -> Result<&QuizQuestion, AppError> {
        let count = self.questions().len();
        if index >= count {
            return Err(AppError::BadRequest(format!(
                "There is no question {} (the quiz has {count}).",
                index + 1
            )));
        }
        self.current = index;
        Ok(&self.questions()[index])
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.questions().len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        match (&self.countdown, &self.attempt) {
            (Some(countdown), _) => countdown.remaining(),
            (None, Some(attempt)) => attempt.duration_seconds,
            (None, None) => 0,
        }
    }

    /// Countdown as `MM:SS`.
    pub fn remaining_display(&self) -> String {
        format_clock(self.remaining_seconds())
    }

    pub fn timer_running(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_running)
    }

    /// Waits for the next timer event. When the countdown runs out the
    /// automatic submission is performed here, at most once per attempt.
    ///
    /// Once the countdown has stopped, a submission still in flight is
    /// awaited and reported; after that `None` is returned.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = match self.timer_events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        };
        match event {
            Some(TimerEvent::Tick { remaining }) => Some(SessionEvent::Tick { remaining }),
            Some(TimerEvent::Expired) => Some(self.on_expired().await),
            None => {
                self.timer_events = None;
                self.settle_pending().await.map(outcome_event)
            }
        }
    }

    /// Waits for a submission whose caller stopped waiting, if any.
    pub async fn settle_pending(&mut self) -> Option<Result<AttemptResult, AppError>> {
        if self.in_flight.is_none() {
            return None;
        }
        Some(self.settle().await)
    }

    pub fn has_pending_submission(&self) -> bool {
        self.in_flight.is_some()
    }

    async fn on_expired(&mut self) -> SessionEvent {
        if self.auto_submitted {
            return SessionEvent::Expired;
        }
        let outcome = if self.in_flight.is_some() {
            self.settle().await
        } else if self.accepts_answers() {
            info!("time is up, submitting automatically");
            self.submit_with(SubmitTrigger::Timeout).await
        } else {
            return SessionEvent::Expired;
        };
        outcome_event(outcome)
    }

    /// Submits the answers now.
    pub async fn submit(&mut self) -> Result<AttemptResult, AppError> {
        self.submit_with(SubmitTrigger::Manual).await
    }

    /// Sends the whole answer batch with the elapsed time since the attempt
    /// began, then waits for the server's verdict.
    ///
    /// The request runs on its own task and its handle stays on the session
    /// until it settles, so only one request is ever in flight. A caller that
    /// stops waiting (a dropped future) leaves the request running and the
    /// next call picks up its outcome instead of sending a new one.
    #[instrument(skip(self))]
    pub async fn submit_with(&mut self, trigger: SubmitTrigger) -> Result<AttemptResult, AppError> {
        if self.in_flight.is_none() {
            self.dispatch(trigger)?;
        }
        self.settle().await
    }

    fn dispatch(&mut self, trigger: SubmitTrigger) -> Result<(), AppError> {
        if !self.accepts_answers() {
            return Err(AppError::BadRequest("This attempt cannot be submitted now.".into()));
        }
        let attempt = self
            .attempt
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("No attempt has been started.".into()))?;

        let elapsed = self.started.map_or(0, |started| started.elapsed().as_secs());
        let request = SubmissionRequest::from_answers(attempt.quiz_id, &attempt.answers, elapsed);
        let (attempt_id, quiz_id) = (attempt.attempt_id, attempt.quiz_id);
        debug!(attempt_id, ?trigger, elapsed, answers = request.answers.len(), "submitting");

        let api = self.api.clone();
        let drafts = self.drafts.clone();
        // The draft is only cleared once the server has accepted the batch.
        self.in_flight = Some(tokio::spawn(async move {
            let result = api.submit_attempt(attempt_id, &request).await?;
            if let Err(e) = drafts.clear(quiz_id).await {
                warn!(quiz_id, "submitted but failed to clear draft: {}", e);
            }
            Ok::<_, AppError>(result)
        }));

        if trigger == SubmitTrigger::Timeout {
            self.auto_submitted = true;
        }
        self.state = AttemptState::Submitting;
        Ok(())
    }

    async fn settle(&mut self) -> Result<AttemptResult, AppError> {
        let Some(handle) = self.in_flight.as_mut() else {
            return Err(AppError::BadRequest("No submission is in progress.".into()));
        };
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join) => Err(AppError::Network(format!("submission task failed: {join}"))),
        };
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                info!(
                    score = result.total_score,
                    percentage = result.percentage,
                    "attempt submitted"
                );
                if let Some(countdown) = self.countdown.as_mut() {
                    countdown.stop();
                }
                self.state = AttemptState::Finished(result.clone());
                Ok(result)
            }
            Err(error) => {
                warn!("submission failed: {}", error);
                self.state = AttemptState::Error(AttemptFailure {
                    stage: Stage::Submitting,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Stops the countdown, as when the quiz view is closed. An in-flight
    /// submission task is not cancelled.
    pub fn close(&mut self) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.stop();
        }
    }
}

fn outcome_event(outcome: Result<AttemptResult, AppError>) -> SessionEvent {
    match outcome {
        Ok(result) => SessionEvent::Submitted(result),
        Err(error) => SessionEvent::SubmitFailed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_submit_failures_are_retryable() {
        let failure = AttemptFailure {
            stage: Stage::Submitting,
            error: AppError::Network("down".into()),
        };
        assert!(failure.can_retry_submit());

        let failure = AttemptFailure {
            stage: Stage::Loading,
            error: AppError::NotFound("quiz".into()),
        };
        assert!(!failure.can_retry_submit());
    }
}
