// tests/support/mod.rs

//! Stub backend for integration tests: a small axum app on a random port that
//! speaks the same routes and JSON shapes as the real API.

#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use elearn_client::{
    api::ApiClient,
    config::Config,
    session::SessionContext,
    storage::{DraftStore, MemoryStore, SharedStore},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub const QUIZ_ID: i64 = 7;
pub const ATTEMPT_ID: i64 = 100;
pub const QUESTION_COUNT: i64 = 5;

#[derive(Default)]
pub struct Backend {
    pub submissions: AtomicUsize,
    pub last_submission: Mutex<Option<Value>>,
    /// Number of upcoming submissions answered with a 500.
    pub failing_submissions: AtomicUsize,
    /// Delay before a submission is answered.
    pub submit_delay_ms: AtomicU64,
    pub attempts_exhausted: AtomicBool,
    /// When set, every authenticated route answers 401.
    pub tokens_revoked: AtomicBool,
    issued: Mutex<Vec<String>>,
}

impl Backend {
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<Value> {
        self.last_submission.lock().unwrap().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.tokens_revoked.load(Ordering::SeqCst) {
            return false;
        }
        let Some(token) = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return false;
        };
        self.issued.lock().unwrap().iter().any(|t| t == token)
    }
}

type Shared = Arc<Backend>;

pub struct TestApp {
    pub address: String,
    pub backend: Shared,
    pub store: SharedStore,
    pub session: SessionContext,
    pub api: ApiClient,
}

impl TestApp {
    pub fn drafts(&self) -> DraftStore {
        DraftStore::new(self.store.clone())
    }

    /// Signs in as the student account.
    pub async fn login_student(&self) {
        self.api.login("student", "secret").await.expect("student login failed");
    }
}

/// Spawns the stub backend on a random port and a client pointed at it,
/// backed by an in-memory store.
pub async fn spawn_app() -> TestApp {
    let store: SharedStore = Arc::new(MemoryStore::new());
    spawn_app_with_store(store).await
}

pub async fn spawn_app_with_store(store: SharedStore) -> TestApp {
    let backend = Shared::default();
    let address = spawn_backend(backend.clone()).await;

    let config = Config::for_base_url(&address, temp_storage_path()).expect("invalid test config");
    let session = SessionContext::init(store.clone()).await.expect("session init failed");
    let api = ApiClient::new(&config, session.clone()).expect("client build failed");

    TestApp {
        address,
        backend,
        store,
        session,
        api,
    }
}

pub fn temp_storage_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("elearn-test-{}", uuid::Uuid::new_v4()))
        .join("storage.json")
}

async fn spawn_backend(backend: Shared) -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/quizzes", get(list_quizzes))
        .route("/quizzes/{id}", get(get_quiz))
        .route("/quizzes/{id}/start", post(start_attempt))
        .route("/quizzes/attempts/{id}/submit", post(submit_attempt))
        .route("/quizzes/attempts/{id}/detail", get(attempt_detail))
        .route("/quizzes/student/{id}/attempts", get(student_attempts))
        .layer(TraceLayer::new_for_http())
        .with_state(backend);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: i64,
}

pub fn mint_token(subject: &str, exp: i64) -> String {
    encode(
        &Header::default(),
        &Claims { sub: subject.to_string(), exp },
        &EncodingKey::from_secret(b"stub-backend-secret"),
    )
    .unwrap()
}

fn user_json(username: &str) -> Option<Value> {
    match username {
        "student" => Some(json!({
            "user_id": 1,
            "username": "student",
            "email": "student@uni.edu",
            "role": "student",
            "full_name": "Sam Student",
            "student_id": 1,
            "major": "Computer Science"
        })),
        "lecturer" => Some(json!({
            "user_id": 2,
            "username": "lecturer",
            "email": "lecturer@uni.edu",
            "role": "lecturer",
            "full_name": "Lee Lecturer",
            "title": "Dr."
        })),
        "manager" => Some(json!({
            "user_id": 3,
            "email": "manager@uni.edu",
            "role": "manager",
            "full_name": "Max Manager"
        })),
        _ => None,
    }
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(backend): State<Shared>, Form(form): Form<LoginForm>) -> Response {
    let user = match user_json(&form.username) {
        Some(user) if form.password == "secret" => user,
        _ => return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password"),
    };

    let exp = chrono::Utc::now().timestamp() + 3600;
    let token = mint_token(&form.username, exp);
    backend.issued.lock().unwrap().push(token.clone());

    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": user
    }))
    .into_response()
}

async fn me(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    Json(user_json("student")).into_response()
}

fn quiz_json() -> Value {
    let questions: Vec<Value> = (1..=QUESTION_COUNT)
        .map(|id| {
            let option_d = if id == 5 { Value::Null } else { json!("fourth") };
            json!({
                "id": id,
                "question_text": format!("Question {id}"),
                "option_a": "first",
                "option_b": "second",
                "option_c": "third",
                "option_d": option_d,
                "points": 1.0
            })
        })
        .collect();

    json!({
        "id": QUIZ_ID,
        "course_id": 3,
        "title": "Ownership and Borrowing",
        "description": "Week 4 check",
        "duration_minutes": 5,
        "max_attempts": 2,
        "start_time": "2025-03-01T08:00:00",
        "end_time": "2025-03-31T23:59:59",
        "question_count": QUESTION_COUNT,
        "questions": questions
    })
}

#[derive(Deserialize)]
struct CourseFilter {
    course_id: Option<i64>,
}

async fn list_quizzes(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(filter): Query<CourseFilter>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let mut quiz = quiz_json();
    if let Some(object) = quiz.as_object_mut() {
        object.remove("questions");
    }
    let quizzes = match filter.course_id {
        Some(course_id) if course_id != 3 => vec![],
        _ => vec![quiz],
    };
    Json(quizzes).into_response()
}

async fn get_quiz(State(backend): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    if id != QUIZ_ID {
        return detail(StatusCode::NOT_FOUND, "Quiz not found");
    }
    Json(quiz_json()).into_response()
}

async fn start_attempt(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    if backend.attempts_exhausted.load(Ordering::SeqCst) {
        return Json(Value::Null).into_response();
    }
    Json(json!({
        "attempt_id": ATTEMPT_ID,
        "quiz_id": id,
        "status": "in_progress",
        "total_questions": QUESTION_COUNT,
        "max_score": 5.0
    }))
    .into_response()
}

async fn submit_attempt(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let delay = backend.submit_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
    backend.submissions.fetch_add(1, Ordering::SeqCst);
    *backend.last_submission.lock().unwrap() = Some(body.clone());

    let failing = backend.failing_submissions.load(Ordering::SeqCst);
    if failing > 0 {
        backend.failing_submissions.store(failing - 1, Ordering::SeqCst);
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }

    // Option A is correct for every question.
    let correct = body["answers"]
        .as_array()
        .map(|answers| {
            answers
                .iter()
                .filter(|a| a["chosen_option"] == "A")
                .count()
        })
        .unwrap_or(0);
    let total = QUESTION_COUNT as f64;

    Json(json!({
        "attempt_id": id,
        "quiz_id": body["quiz_id"],
        "total_score": correct as f64,
        "max_score": total,
        "total_questions": QUESTION_COUNT,
        "correct_answers": correct,
        "percentage": correct as f64 / total * 100.0,
        "status": "completed"
    }))
    .into_response()
}

async fn attempt_detail(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    if id != ATTEMPT_ID {
        return detail(StatusCode::NOT_FOUND, "Attempt not found");
    }
    Json(json!({
        "attempt_id": id,
        "quiz_id": QUIZ_ID,
        "quiz_title": "Ownership and Borrowing",
        "total_questions": 2,
        "correct_answers": 1,
        "total_score": 1.0,
        "max_score": 2.0,
        "percentage": 50.0,
        "status": "completed",
        "started_at": "2025-03-01T09:00:00.482913",
        "finished_at": "2025-03-01T09:04:10.120004",
        "answers": [
            {
                "question_id": 1, "question_text": "Question 1",
                "option_a": "first", "option_b": "second", "option_c": "third", "option_d": null,
                "chosen_option": "A", "correct_option": "A", "is_correct": true, "points": 1.0
            },
            {
                "question_id": 2, "question_text": "Question 2",
                "option_a": "first", "option_b": "second", "option_c": null, "option_d": null,
                "chosen_option": "B", "correct_option": "A", "is_correct": false, "points": 1.0
            }
        ]
    }))
    .into_response()
}

#[derive(Deserialize)]
struct QuizFilter {
    quiz_id: Option<i64>,
}

async fn student_attempts(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(_student_id): Path<i64>,
    Query(filter): Query<QuizFilter>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let attempts = match filter.quiz_id {
        Some(quiz_id) if quiz_id != QUIZ_ID => vec![],
        _ => vec![json!({
            "attempt_id": ATTEMPT_ID,
            "quiz_id": QUIZ_ID,
            "quiz_title": "Ownership and Borrowing",
            "started_at": "2025-03-01T09:00:00",
            "finished_at": "2025-03-01T09:04:10",
            "total_score": 1.0,
            "status": "completed"
        })],
    };
    Json(attempts).into_response()
}
