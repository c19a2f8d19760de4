// src/api/mod.rs

//! HTTP client for the platform's REST API.
//!
//! Every authenticated request carries the session's bearer token. Any `401`
//! from an authenticated call clears the session globally (see
//! [`SessionContext::expire`]), whichever caller issued it. Error bodies are
//! reduced to a short human-readable message, preferring the server's
//! `detail` field.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{config::Config, error::AppError, session::SessionContext};

pub mod auth;
pub mod quiz;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionContext) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::Config(format!("invalid endpoint '{path}': {e}")))
    }

    /// Sends with the session's bearer token, if any, and checks the status.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let token = self.session.token();
        let builder = match &token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await?;
        self.check(response, token.is_some()).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.send(self.http.get(url)).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.send(self.http.post(url).json(body)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Posts without a body. An empty, `null` or `false` response body
    /// decodes to `None`.
    pub(crate) async fn post_optional_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, AppError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.send(self.http.post(url)).await?;
        let body = response.text().await?;

        match body.trim() {
            "" | "null" | "false" => Ok(None),
            raw => Ok(Some(serde_json::from_str(raw)?)),
        }
    }

    /// Passes successful responses through. Failures become an `AppError`;
    /// a `401` on a request that carried a token also expires the session.
    async fn check(&self, response: Response, sent_token: bool) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| default_message(status));

        if status == StatusCode::UNAUTHORIZED && sent_token {
            warn!("server rejected credentials, forcing logout");
            self.session.expire().await;
        }

        Err(AppError::from_status(status.as_u16(), message))
    }
}

/// Extracts a readable message from an error body: the `detail` string, the
/// first `msg` of a validation list, an `error` string, or the trimmed body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let message = match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => match (&json["detail"], &json["error"]) {
            (Value::String(detail), _) => detail.clone(),
            (Value::Array(items), _) => items
                .first()
                .and_then(|item| item["msg"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| trimmed.to_string()),
            (_, Value::String(error)) => error.clone(),
            _ => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    };

    Some(message.chars().take(MAX_ERROR_CHARS).collect())
}

fn default_message(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "The requested resource was not found.".to_string(),
        _ => "Request failed.".to_string(),
    }
}
