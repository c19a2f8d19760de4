// src/cli/actions.rs

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use elearn_client::{
    api::ApiClient,
    config::Config,
    error::AppError,
    models::{attempt::score_line, quiz::AnswerOption},
    quiz::{AttemptReview, AttemptState, QuizSession, SessionEvent},
    routes::{Navigator, Route, nav_links},
    session::SessionContext,
    storage::{DraftStore, FileStore, SharedStore},
};

/// Everything a command needs, built once per process.
pub struct App {
    api: ApiClient,
    navigator: Navigator,
    drafts: DraftStore,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let store: SharedStore = Arc::new(FileStore::new(config.storage_path.clone()));
        let session = SessionContext::init(store.clone()).await?;
        let api = ApiClient::new(config, session.clone())?;
        debug!(base_url = %api.base_url(), "client ready");

        Ok(Self {
            api,
            navigator: Navigator::new(session),
            drafts: DraftStore::new(store),
        })
    }

    /// Runs the guard for the view a command belongs to.
    fn enter(&mut self, route: Route) -> Result<(), AppError> {
        let landed = self.navigator.navigate(route);
        if landed == route {
            return Ok(());
        }
        if landed == Route::Login {
            return Err(AppError::AuthError(
                "You are not signed in. Run `elearn login` first.".into(),
            ));
        }
        Err(AppError::Forbidden(format!(
            "Your role cannot open {route}; your dashboard is {landed}."
        )))
    }

    /// Converts a forced logout seen during a command into a sign-in hint.
    fn check_expired(&mut self, error: AppError) -> AppError {
        if self.navigator.sync() {
            return AppError::AuthError("Your session has expired. Please sign in again.".into());
        }
        error
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let session = self.api.login(username, password).await?;
        let landing = self.navigator.after_login();

        println!("Signed in as {} ({})", session.display_name(), session.role());
        println!("Home: {landing}");
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.api.logout().await?;
        self.navigator.sync();
        println!("Signed out.");
        Ok(())
    }

    pub async fn whoami(&mut self) -> Result<(), AppError> {
        let Some(session) = self.api.session().current() else {
            println!("Not signed in.");
            return Ok(());
        };

        let user = match self.api.current_user().await {
            Ok(user) => user,
            Err(e) => return Err(self.check_expired(e)),
        };
        println!("{} <{}>", session.display_name(), user.email);
        println!("role: {}", user.role);
        let links: Vec<_> = nav_links(user.role).iter().map(|l| l.label).collect();
        println!("menu: {}", links.join(" | "));
        Ok(())
    }

    pub async fn quizzes(&mut self, course_id: Option<i64>) -> Result<(), AppError> {
        self.enter(Route::MyCourses)?;

        let quizzes = match self.api.list_quizzes(course_id).await {
            Ok(quizzes) => quizzes,
            Err(e) => return Err(self.check_expired(e)),
        };
        if quizzes.is_empty() {
            println!("No quizzes.");
        }
        for quiz in quizzes {
            println!(
                "#{:<5} {:<40} {:>3} min  {} attempt(s)",
                quiz.id, quiz.title, quiz.duration_minutes, quiz.max_attempts
            );
        }
        Ok(())
    }

    pub async fn review(&mut self, attempt_id: i64) -> Result<(), AppError> {
        self.enter(Route::QuizReview { attempt_id })?;

        let review = match AttemptReview::load(&self.api, attempt_id).await {
            Ok(review) => review,
            Err(e) => return Err(self.check_expired(e)),
        };
        let detail = review.detail();
        println!("{}", detail.quiz_title);
        println!("Score: {}", review.summary_line());
        println!(
            "Correct: {} of {}",
            detail.correct_answers, detail.total_questions
        );
        for (index, answer) in detail.answers.iter().enumerate() {
            let mark = if answer.is_correct { "✓" } else { "✗" };
            println!("\n{mark} {}. {}", index + 1, answer.question_text);
            println!(
                "   your answer: {} {}",
                answer.chosen_option,
                answer.option_text(answer.chosen_option).unwrap_or_default()
            );
            if !answer.is_correct {
                println!(
                    "   correct:     {} {}",
                    answer.correct_option,
                    answer.option_text(answer.correct_option).unwrap_or_default()
                );
            }
        }
        Ok(())
    }

    /// Interactive quiz: one line per command while the countdown runs.
    pub async fn take(&mut self, quiz_id: i64) -> Result<(), AppError> {
        self.enter(Route::QuizTaking { quiz_id })?;

        let mut session = QuizSession::new(self.api.clone(), self.drafts.clone());
        if let Err(e) = session.load(quiz_id).await {
            return Err(self.check_expired(e));
        }
        if let Some(quiz) = session.quiz() {
            println!("{} ({} questions)", quiz.summary.title, quiz.questions.len());
        }
        let restored = session.answers().map_or(0, |a| a.len());
        if restored > 0 {
            println!("Restored {restored} saved answer(s).");
        }
        session.begin()?;
        println!("Time remaining: {}", session.remaining_display());
        print_help();
        show_question(&session);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                Some(event) = session.next_event() => match event {
                    SessionEvent::Tick { remaining } if remaining > 0 && remaining % 60 == 0 => {
                        println!("[{} left]", session.remaining_display());
                    }
                    SessionEvent::Tick { .. } | SessionEvent::Expired => {}
                    SessionEvent::Submitted(result) => {
                        println!("Time is up. Your answers were submitted.");
                        print_result(result.total_score, result.max_score, result.percentage,
                            result.correct_answers, result.total_questions);
                        break;
                    }
                    SessionEvent::SubmitFailed(e) => {
                        println!("Time is up but submitting failed: {e}");
                        if self.navigator.sync() {
                            break;
                        }
                        println!("Your answers are saved. Type `s` to try again.");
                    }
                },
                line = lines.next_line() => {
                    let Some(line) = line.map_err(AppError::from)? else {
                        break;
                    };
                    if !self.handle_line(&mut session, line.trim()).await? {
                        break;
                    }
                }
            }
        }

        // Leaving must not abandon a submission that is still running.
        match session.settle_pending().await {
            Some(Ok(result)) => {
                println!("Your answers were submitted.");
                print_result(result.total_score, result.max_score, result.percentage,
                    result.correct_answers, result.total_questions);
            }
            Some(Err(e)) => println!("Submitting failed: {e}. Your answers are saved."),
            None => {}
        }

        session.close();
        if self.navigator.sync() {
            return Err(AppError::AuthError(
                "Your session has expired. Please sign in again.".into(),
            ));
        }
        if let AttemptState::Finished(result) = session.state() {
            info!(quiz_id, percentage = result.percentage, "quiz finished");
        }
        Ok(())
    }

    /// Applies one typed command. Returns false when the loop should end.
    async fn handle_line(&mut self, session: &mut QuizSession, line: &str) -> Result<bool, AppError> {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();

        match command.as_str() {
            "" => show_question(session),
            "h" | "help" => print_help(),
            "n" => {
                if !session.next() {
                    println!("This is the last question.");
                }
                show_question(session);
            }
            "p" => {
                if !session.previous() {
                    println!("This is the first question.");
                }
                show_question(session);
            }
            "g" => {
                let index = parts.next().and_then(|raw| raw.parse::<usize>().ok());
                match index.map(|i| session.go_to(i.saturating_sub(1)).map(|_| ())) {
                    Some(Ok(())) => show_question(session),
                    Some(Err(e)) => println!("{e}"),
                    None => println!("Usage: g <question number>"),
                }
            }
            "u" => {
                let positions: Vec<String> = session
                    .questions()
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| session.answer_for(q.id).is_none())
                    .map(|(i, _)| (i + 1).to_string())
                    .collect();
                if positions.is_empty() {
                    println!("All questions answered.");
                } else {
                    println!("Unanswered: {}", positions.join(", "));
                }
            }
            "t" => println!("Time remaining: {}", session.remaining_display()),
            "x" => {
                if let Some(id) = session.current_question().map(|q| q.id) {
                    session.clear_answer(id).await?;
                    show_question(session);
                }
            }
            "s" => {
                let unanswered = session.unanswered().len();
                if unanswered > 0 {
                    println!("Submitting with {unanswered} unanswered question(s).");
                }
                match session.submit().await {
                    Ok(result) => {
                        print_result(result.total_score, result.max_score, result.percentage,
                            result.correct_answers, result.total_questions);
                        return Ok(false);
                    }
                    Err(e) => {
                        println!("Submitting failed: {e}");
                        if self.navigator.sync() {
                            return Ok(false);
                        }
                        println!("Your answers are saved. Type `s` to try again.");
                    }
                }
            }
            "q" => {
                println!("Leaving the quiz. Your answers are saved for later.");
                return Ok(false);
            }
            other => match other.parse::<AnswerOption>() {
                Ok(option) => {
                    let Some(id) = session.current_question().map(|q| q.id) else {
                        return Ok(true);
                    };
                    match session.select_answer(id, option).await {
                        Ok(()) => {
                            if session.next() {
                                show_question(session);
                            } else {
                                println!("Answered {option}. Type `s` to submit.");
                            }
                        }
                        Err(e) => println!("{e}"),
                    }
                }
                Err(_) => println!("Unknown command `{other}`. Type `h` for help."),
            },
        }
        Ok(true)
    }
}

fn print_help() {
    println!("a/b/c/d answer   n next   p previous   g <n> go to   x clear answer");
    println!("u unanswered     t time   s submit     q leave");
}

fn show_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let total = session.questions().len();
    println!(
        "\n[{}] Question {} of {} ({} pt)",
        session.remaining_display(),
        session.current_index() + 1,
        total,
        question.points
    );
    println!("{}", question.question_text);
    let chosen = session.answer_for(question.id);
    for (option, text) in question.options() {
        let marker = if chosen == Some(option) { "*" } else { " " };
        println!(" {marker} {option}) {text}");
    }
}

fn print_result(total: f64, max: f64, percentage: f64, correct: u32, questions: u32) {
    println!("Score: {}", score_line(total, max, percentage));
    println!("Correct answers: {correct} of {questions}");
}
