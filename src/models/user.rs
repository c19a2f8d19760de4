// src/models/user.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Platform role. Decides which views and API calls are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile as returned by the login endpoint and persisted under the `user` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    pub role: Role,
    pub full_name: String,

    // Student-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_gpa: Option<f64>,

    // Lecturer-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    // Manager-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl UserProfile {
    /// Name shown in headers: full name, then username, then email.
    pub fn display_name(&self) -> &str {
        if !self.full_name.trim().is_empty() {
            return &self.full_name;
        }
        match self.username.as_deref() {
            Some(username) if !username.trim().is_empty() => username,
            _ => &self.email,
        }
    }
}

/// Response body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: UserProfile,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Form body for user login.
#[derive(Debug, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Password is required."))]
    pub password: String,
}

impl LoginRequest {
    /// Builds the request with a trimmed username. Passwords are kept verbatim
    /// but a whitespace-only password is treated as empty.
    pub fn new(username: &str, password: &str) -> Self {
        let password = if password.trim().is_empty() {
            String::new()
        } else {
            password.to_string()
        };
        Self {
            username: username.trim().to_string(),
            password,
        }
    }
}

/// The authenticated session: who is logged in and with which token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn user_id(&self) -> i64 {
        self.user.user_id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn display_name(&self) -> &str {
        self.user.display_name()
    }
}
