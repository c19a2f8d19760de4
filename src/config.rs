// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_STORAGE_PATH: &str = ".elearn/storage.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub storage_path: PathBuf,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let api_base_url = env::var("ELEARN_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_base_url = parse_base_url(&api_base_url)?;

        let storage_path = env::var("ELEARN_STORAGE_PATH")
            .unwrap_or_else(|_| DEFAULT_STORAGE_PATH.to_string());

        let request_timeout = match env::var("ELEARN_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("ELEARN_REQUEST_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let log_dir = env::var("ELEARN_LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            api_base_url,
            storage_path: PathBuf::from(storage_path),
            request_timeout: Duration::from_secs(request_timeout),
            log_dir: PathBuf::from(log_dir),
            rust_log,
        })
    }

    /// Configuration pointing at an explicit backend, used by tests and embedders.
    pub fn for_base_url(base_url: &str, storage_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            storage_path: storage_path.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_dir: PathBuf::from("logs"),
            rust_log: "info".to_string(),
        })
    }
}

/// Parses the API base URL and guarantees a trailing slash so that
/// `Url::join` keeps any path prefix (e.g. `https://host/api/`).
fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash)
        .map_err(|e| AppError::Config(format!("invalid API base URL '{trimmed}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "unsupported API URL scheme '{other}'"
        ))),
    }
}
