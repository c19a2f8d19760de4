// src/main.rs

use std::process::ExitCode;

use elearn_client::{config::Config, error::AppError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{actions::App, commands};

#[tokio::main]
async fn main() -> ExitCode {
    let matches = commands::new().get_matches();

    // Load configuration from environment (.env included)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let verbosity = matches.get_count("verbosity");
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "elearn.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(commands::log_filter(verbosity, &config.rust_log));
    // Terminal output belongs to the quiz; logs go to stderr.
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    match run(&config, &matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "command failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, matches: &clap::ArgMatches) -> Result<(), AppError> {
    let mut app = App::new(config).await?;

    match matches.subcommand() {
        Some(("login", sub)) => {
            let username = sub.get_one::<String>("username").map_or("", String::as_str);
            let password = sub.get_one::<String>("password").map_or("", String::as_str);
            app.login(username, password).await
        }
        Some(("logout", _)) => app.logout().await,
        Some(("whoami", _)) => app.whoami().await,
        Some(("quizzes", sub)) => app.quizzes(sub.get_one::<i64>("course").copied()).await,
        Some(("take", sub)) => match sub.get_one::<i64>("quiz-id") {
            Some(quiz_id) => app.take(*quiz_id).await,
            None => Err(AppError::BadRequest("a quiz id is required".into())),
        },
        Some(("review", sub)) => match sub.get_one::<i64>("attempt-id") {
            Some(attempt_id) => app.review(*attempt_id).await,
            None => Err(AppError::BadRequest("an attempt id is required".into())),
        },
        _ => Err(AppError::BadRequest("unknown command".into())),
    }
}
