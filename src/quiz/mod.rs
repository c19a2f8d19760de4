// src/quiz/mod.rs

pub mod attempt;
pub mod review;
pub mod timer;

pub use attempt::{
    AttemptFailure, AttemptState, QuizAttempt, QuizSession, SessionEvent, Stage, SubmitTrigger,
};
pub use review::AttemptReview;
pub use timer::{Countdown, TimerEvent, format_clock};
