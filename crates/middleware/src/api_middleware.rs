use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, info, warn};

use app_error::AppError;
use app_models::TokenScope;

use crate::{Claims, JwtService};

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Attaches access-token claims to the request when the bearer validates.
/// Requests without valid credentials pass through; `AuthUser` rejects them.
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match jwt_service.decode(token, TokenScope::AccessToken) {
            Ok(claims) => {
                debug!("Access token validated for {}", claims.sub);
                req.extensions_mut().insert(claims);
            }
            Err(e) => {
                debug!("Access token rejected: {}", e);
            }
        }
    }

    next.run(req).await
}

/// Claims of the caller's access token
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn email(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(AppError::token_invalid)
    }
}

/// Raw bearer token, unverified. For routes that check a non-access scope.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(AppError::token_invalid)
    }
}

pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}

pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if status < 400 {
        info!(%method, %path, status, duration_ms, "Request completed");
    } else if status < 500 {
        warn!(%method, %path, status, duration_ms, "Request completed with client error");
    } else {
        error!(%method, %path, status, duration_ms, "Request completed with server error");
    }

    response
}
