// src/api/auth.rs

use tracing::{info, instrument, warn};
use validator::Validate;

use super::{ApiClient, error_message};
use crate::{
    error::AppError,
    models::user::{LoginRequest, LoginResponse, Session, UserProfile},
};

impl ApiClient {
    /// Authenticates against `POST /auth/login` (form-encoded) and stores the
    /// session.
    ///
    /// On failure the session is left untouched and the error carries the
    /// server's message. Network failures surface the raw transport message.
    /// A `401` here means bad credentials and does not trigger the global
    /// logout.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let request = LoginRequest::new(username, password);
        request.validate()?;

        let url = self.endpoint("auth/login")?;
        let response = self.http.post(url).form(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| "Login failed".to_string());
            warn!(%status, "login rejected");
            return Err(AppError::from_status(status.as_u16(), message));
        }

        let login: LoginResponse = response.json().await?;
        let session = self.session.establish(login).await?;
        info!(user_id = session.user_id(), "logged in");

        Ok(session)
    }

    /// Clears the session locally. There is no server-side logout endpoint.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.logout().await
    }

    /// Fetches the profile behind the current token (`GET /auth/me`).
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<UserProfile, AppError> {
        self.get_json("auth/me").await
    }
}
