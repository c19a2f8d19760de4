// src/storage/mod.rs

//! Persistent key-value storage, the client-side equivalent of browser local
//! storage. Session credentials and per-quiz answer drafts live here. Stores
//! are injected as [`SharedStore`] so tests can swap in [`MemoryStore`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;

pub mod drafts;
pub mod file;
pub mod memory;

pub use drafts::DraftStore;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Fixed key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Fixed key holding the JSON-encoded user profile.
pub const USER_KEY: &str = "user";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;
