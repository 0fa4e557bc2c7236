use app_config::JwtConfig;
use app_error::{AppError, AppResult};
use app_models::TokenScope;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // user email
    pub scope: TokenScope,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Issues and checks the HS256 tokens of every scope
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    refresh_ttl: Duration,
    email_ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &[u8], refresh_ttl: Duration, email_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            refresh_ttl,
            email_ttl,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret.as_bytes(),
            config.refresh_token_ttl(),
            config.email_token_ttl(),
        )
    }

    pub fn issue_access_token(&self, subject: &str, ttl: Duration) -> AppResult<String> {
        self.issue(subject, TokenScope::AccessToken, ttl)
    }

    pub fn issue_refresh_token(&self, subject: &str) -> AppResult<String> {
        self.issue(subject, TokenScope::RefreshToken, self.refresh_ttl)
    }

    pub fn issue_confirmation_token(&self, subject: &str) -> AppResult<String> {
        self.issue(subject, TokenScope::EmailToken, self.email_ttl)
    }

    fn issue(&self, subject: &str, scope: TokenScope, ttl: Duration) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            scope,
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::ServerError(anyhow::anyhow!("Failed to sign {} token: {}", scope, e))
        })
    }

    /// Verify signature and expiry, then require `expected` as the scope
    pub fn decode(&self, token: &str, expected: TokenScope) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => {
                warn!("Token validation failed: {}", e);
                AppError::token_invalid()
            }
        })?;

        if token_data.claims.scope != expected {
            warn!(
                "Token scope mismatch: expected {}, got {}",
                expected, token_data.claims.scope
            );
            return Err(AppError::token_invalid());
        }

        debug!("Token validated for {}", token_data.claims.sub);
        Ok(token_data.claims)
    }
}
