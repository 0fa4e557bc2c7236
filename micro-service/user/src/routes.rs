use crate::{
    handlers::{auth, contacts, health::health_check, users},
    state::AppState,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use axum::{
    Router,
    routing::{get, post},
};

use app_config::CorsConfig;
use app_error::middleware_handling::error_handling_middleware;
use app_middleware::api_middleware::{
    jwt_auth_middleware, logging_middleware, security_headers_middleware,
};

fn cors_layer(cors_config: &CorsConfig) -> CorsLayer {
    let origins = if cors_config.allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(
            cors_config
                .allowed_methods
                .iter()
                .filter_map(|method| method.parse().ok())
                .collect::<Vec<_>>(),
        )
        .allow_headers(
            cors_config
                .allowed_headers
                .iter()
                .filter_map(|header| header.parse().ok())
                .collect::<Vec<_>>(),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh_token", get(auth::refresh_token))
        .route("/confirmed_email/{token}", get(auth::confirmed_email))
        .route("/request_email", post(auth::request_email))
        .route("/logout", post(auth::logout))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::list).post(contacts::create))
        .route("/search", get(contacts::search))
        .route("/birthdays", get(contacts::birthdays))
        .route(
            "/{id}",
            get(contacts::get)
                .put(contacts::update)
                .delete(contacts::remove),
        )
}

pub fn create_routes(state: AppState) -> Router {
    let server = &state.config.server;

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout)))
        .layer(cors_layer(&state.config.security.cors));

    let api = Router::new()
        .nest("/auth", auth_routes())
        .route("/users/me", get(users::me))
        .nest("/contacts", contact_routes());

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api);

    // Innermost first: claims are attached before any handler runs, and
    // caught panics still pass through the error envelope
    let app = app
        .layer(axum::middleware::from_fn_with_state(
            state.jwt.clone(),
            jwt_auth_middleware,
        ))
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn(error_handling_middleware))
        .layer(RequestBodyLimitLayer::new(server.body_limit));

    let app = app
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    app.layer(middleware_stack).with_state(state)
}
