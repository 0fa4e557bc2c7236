use app_config::AppConfig;
use app_database::db_connect::initialize_memory_db;
use app_error::AppResult;
use app_utils::{MailError, Mailer};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use micro_user::{AppState, create_routes};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, sleep};
use tower::ServiceExt;

#[derive(Default)]
struct Outbox {
    links: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send_confirmation(&self, _: &str, _: &str, url: &str) -> Result<(), MailError> {
        self.links.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

impl Outbox {
    /// The mail goes out on a spawned task, so wait for it briefly
    async fn latest_link(&self) -> String {
        for _ in 0..100 {
            if let Some(link) = self.links.lock().unwrap().last().cloned() {
                return link;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("no confirmation link was sent");
    }
}

async fn setup_test_app() -> AppResult<(axum::Router, Arc<Outbox>)> {
    let db = initialize_memory_db().await?;
    let outbox = Arc::new(Outbox::default());
    let state = AppState::new(AppConfig::default(), &db, outbox.clone());
    Ok((create_routes(state), outbox))
}

async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn signup_request(email: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": "deadpool", "email": email, "password": "567234" }).to_string(),
        ))
        .unwrap()
}

fn login_request(email: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password=567234", email)))
        .unwrap()
}

fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn confirmation_path(link: &str) -> String {
    let path_start = link.find("/api/").expect("link should contain the api path");
    link[path_start..].to_string()
}

#[tokio::test]
async fn test_health_check_endpoint() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let (status, _) = call(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_signup_to_authenticated_request() -> AppResult<()> {
    let (app, outbox) = setup_test_app().await?;

    let (status, _) = call(&app, signup_request("deadpool@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(&app, login_request("deadpool@example.com")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let link = outbox.latest_link().await;
    assert!(link.starts_with("http://localhost:8000/api/auth/confirmed_email/"));

    let (status, body) = call(&app, get_request(&confirmation_path(&link), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email confirmed");

    let (status, tokens) = call(&app, login_request("deadpool@example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens["token_type"], "bearer");

    let access = tokens["access_token"].as_str().unwrap();
    let (status, me) = call(&app, get_request("/api/users/me", Some(access))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "deadpool@example.com");

    let refresh = tokens["refresh_token"].as_str().unwrap();
    let (status, rotated) = call(&app, get_request("/api/auth/refresh_token", Some(refresh))).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], tokens["refresh_token"]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_signup() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;

    assert_eq!(call(&app, signup_request("twin@example.com")).await.0, StatusCode::CREATED);
    let (status, body) = call(&app, signup_request("twin@example.com")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn test_security_headers_present() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> AppResult<()> {
    let (app, _) = setup_test_app().await?;
    let (status, _) = call(&app, get_request("/api/nothing-here", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
