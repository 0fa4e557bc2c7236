use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user record, keyed by the lower-cased email.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub email: String,
    pub username: String,
    /// Argon2 PHC string, never the plain password
    pub password: String,
    #[serde(default)]
    pub confirmed: bool,
    /// Last refresh token handed out; `None` forces a fresh login
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, username: String, password: String) -> Self {
        Self {
            email,
            username,
            password,
            confirmed: false,
            refresh_token: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

// Convert User to UserProfile (hiding sensitive data)
impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            username: user.username,
            confirmed: user.confirmed,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant form: `username` carries the email.
#[derive(Debug, Deserialize, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RequestEmailInput {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user: UserProfile,
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
