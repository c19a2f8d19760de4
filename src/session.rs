// src/session.rs

//! Session context: the current user and bearer token, held in memory and
//! mirrored to the persistent store under fixed keys.
//!
//! The context is created once at start-up with [`SessionContext::init`],
//! mutated only through login ([`SessionContext::establish`]), logout, and
//! expiry, and shared by cloning (all clones see the same state). Changes are
//! published on a watch channel so navigation can react to a forced logout.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::user::{LoginResponse, Role, Session, UserProfile},
    storage::{SharedStore, TOKEN_KEY, USER_KEY},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated(Role),
    /// The server rejected the token; the session has already been cleared.
    Expired,
}

#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    current: RwLock<Option<Session>>,
    status: watch::Sender<SessionStatus>,
}

impl SessionContext {
    /// Restores a persisted session, if any.
    ///
    /// A half-present session, an unreadable user record, or a JWT whose `exp`
    /// has passed is discarded and its keys removed.
    pub async fn init(store: SharedStore) -> Result<Self, AppError> {
        let context = Self::anonymous(store);

        let token = context.inner.store.get(TOKEN_KEY).await?;
        let user = context.inner.store.get(USER_KEY).await?;

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            (None, None) => return Ok(context),
            _ => {
                warn!("incomplete persisted session, clearing");
                context.clear_persisted().await?;
                return Ok(context);
            }
        };

        let user: UserProfile = match serde_json::from_str(&user) {
            Ok(user) => user,
            Err(e) => {
                warn!("unreadable persisted user, clearing session: {}", e);
                context.clear_persisted().await?;
                return Ok(context);
            }
        };

        if token_expired(&token, chrono::Utc::now().timestamp()) {
            info!(user_id = user.user_id, "persisted token expired, clearing session");
            context.clear_persisted().await?;
            return Ok(context);
        }

        let role = user.role;
        *context.write() = Some(Session { token, user });
        context.inner.status.send_replace(SessionStatus::Authenticated(role));

        Ok(context)
    }

    /// A context with no session and nothing read from the store.
    pub fn anonymous(store: SharedStore) -> Self {
        let (status, _) = watch::channel(SessionStatus::Anonymous);
        Self {
            inner: Arc::new(Inner {
                store,
                current: RwLock::new(None),
                status,
            }),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|s| s.user.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.read().as_ref().map(Session::role)
    }

    /// True iff both a token and a user are present.
    pub fn is_authenticated(&self) -> bool {
        self.read()
            .as_ref()
            .is_some_and(|s| !s.token.is_empty())
    }

    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Stores a successful login in memory and in the persistent store.
    pub async fn establish(&self, response: LoginResponse) -> Result<Session, AppError> {
        let user_json = serde_json::to_string(&response.user)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.inner.store.set(TOKEN_KEY, &response.access_token).await?;
        self.inner.store.set(USER_KEY, &user_json).await?;

        let session = Session {
            token: response.access_token,
            user: response.user,
        };
        let role = session.role();
        *self.write() = Some(session.clone());
        self.inner.status.send_replace(SessionStatus::Authenticated(role));

        info!(user_id = session.user_id(), role = %role, "session established");
        Ok(session)
    }

    /// Clears the session unconditionally. The in-memory state is always
    /// cleared, even if the store fails.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.write().take();
        self.inner.status.send_replace(SessionStatus::Anonymous);
        self.clear_persisted().await
    }

    /// Reaction to a `401` from the server: drop everything and signal the
    /// forced logout.
    pub async fn expire(&self) {
        let had_session = self.write().take().is_some();
        self.inner.status.send_replace(SessionStatus::Expired);
        if let Err(e) = self.clear_persisted().await {
            warn!("failed to clear persisted session: {}", e);
        }
        if had_session {
            info!("session expired by server");
        }
    }

    async fn clear_persisted(&self) -> Result<(), AppError> {
        let token = self.inner.store.remove(TOKEN_KEY).await;
        let user = self.inner.store.remove(USER_KEY).await;
        token.and(user)
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.inner.current.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.inner.current.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Reads the `exp` claim without verifying the signature; the client never
/// holds the signing key. Tokens that are not JWTs are treated as opaque and
/// never expire locally.
fn token_expired(token: &str, now: i64) -> bool {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp.is_some_and(|exp| exp <= now),
        Err(_) => false,
    }
}
