pub mod extract;
pub mod macros;
pub mod middleware_handling;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    ConfigError(anyhow::Error),
    DatabaseError(anyhow::Error),
    ServerError(anyhow::Error),
    ValidationError(String),
    InputError(String),
    NotFoundError(String),
    AuthenticationError(String),
    ResourceExistsError(String),
}

impl AppError {
    pub fn token_invalid() -> Self {
        Self::AuthenticationError("Could not validate credentials".to_string())
    }

    pub fn token_expired() -> Self {
        Self::AuthenticationError(
            "Your session has expired. Please log in again to continue.".to_string(),
        )
    }

    // Resource errors
    pub fn resource_not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFoundError(format!(
            "{} with identifier '{}' was not found.",
            resource_type, identifier
        ))
    }

    pub fn resource_exists(resource_type: &str, identifier: &str) -> Self {
        Self::ResourceExistsError(format!(
            "{} with identifier '{}' already exists.",
            resource_type, identifier
        ))
    }

    pub fn validation(field: &str, message: &str) -> Self {
        Self::ValidationError(format!("Validation failed for '{}': {}", field, message))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::InputError(_) => StatusCode::BAD_REQUEST,
            Self::NotFoundError(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::ResourceExistsError(_) => StatusCode::CONFLICT,
            Self::ConfigError(_) | Self::DatabaseError(_) | Self::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::ServerError(error)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Self::DatabaseError(e) => write!(f, "Database error: {}", e),
            Self::ServerError(e) => write!(f, "Server error: {}", e),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::InputError(msg) => write!(f, "Bad request: {}", msg),
            Self::NotFoundError(msg) => write!(f, "Not found: {}", msg),
            Self::AuthenticationError(msg) => write!(f, "Authentication error: {}", msg),
            Self::ResourceExistsError(msg) => write!(f, "Conflict: {}", msg),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_message, error_code, help_text) = match &self {
            Self::ConfigError(_) => ("System configuration error", "CONFIG_ERROR", None),
            Self::DatabaseError(_) => ("Database operation failed", "DB_ERROR", None),
            Self::ServerError(_) => ("Internal server error", "SERVER_ERROR", None),
            Self::ValidationError(msg) => (
                msg.as_str(),
                "VALIDATION_ERROR",
                Some("Please review your input and try again."),
            ),
            Self::InputError(msg) => (msg.as_str(), "BAD_REQUEST", None),
            Self::NotFoundError(msg) => (
                msg.as_str(),
                "NOT_FOUND",
                Some("The requested resource was not found."),
            ),
            Self::AuthenticationError(msg) => (
                msg.as_str(),
                "AUTH_ERROR",
                Some("Please log in to access this resource."),
            ),
            Self::ResourceExistsError(msg) => (msg.as_str(), "CONFLICT", None),
        };

        let log_message = format!("[{}] {}: {}", error_code, status, self);
        if status.is_server_error() {
            tracing::error!(error_code = error_code, status_code = %status.as_u16(), %error_message, "{}", log_message);
        } else {
            tracing::warn!(error_code = error_code, status_code = %status.as_u16(), %error_message, "{}", log_message);
        }

        let body = Json(ErrorResponse {
            status: status.to_string(),
            message: error_message.to_string(),
            code: error_code.to_string(),
            details: if status.is_server_error() {
                None // internal details stay in the logs
            } else {
                Some(self.to_string())
            },
            help: help_text.map(String::from),
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap foreign errors with a specific category
pub trait AppErrorExt<T> {
    fn config_err(self) -> AppResult<T>;
    fn db_err(self) -> AppResult<T>;
    fn server_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn config_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ConfigError(e.into()))
    }

    fn db_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::DatabaseError(e.into()))
    }

    fn server_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ServerError(e.into()))
    }
}
