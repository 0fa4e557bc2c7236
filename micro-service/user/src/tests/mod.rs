use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::sync::{Mutex, mpsc};
use tower::ServiceExt;

use app_config::AppConfig;
use app_database::db_connect::initialize_memory_db;
use app_utils::{MailError, Mailer};

use crate::{AppState, create_routes, messages};

/// Hands every confirmation link to the test instead of mailing it
struct RecordingMailer {
    sent: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_confirmation(&self, _: &str, _: &str, url: &str) -> Result<(), MailError> {
        let _ = self.sent.send(url.to_string());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    outbox: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl TestApp {
    async fn new() -> Self {
        let db = initialize_memory_db().await.expect("memory db");
        let (sent, outbox) = mpsc::unbounded_channel();
        let state = AppState::new(AppConfig::default(), &db, Arc::new(RecordingMailer { sent }));

        Self {
            router: create_routes(state),
            outbox: Mutex::new(outbox),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, token, Body::empty(), None)).await
    }

    async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(
            method,
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ))
        .await
    }

    async fn signup(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.json(
            "POST",
            "/api/auth/signup",
            None,
            json!({ "username": "deadpool", "email": email, "password": password }),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let form = format!("username={}&password={}", email, password);
        self.send(request(
            "POST",
            "/api/auth/login",
            None,
            Body::from(form),
            Some("application/x-www-form-urlencoded"),
        ))
        .await
    }

    /// Path of the next confirmation link handed to the mailer
    async fn next_confirmation_path(&self) -> String {
        let url = tokio::time::timeout(Duration::from_secs(5), self.outbox.lock().await.recv())
            .await
            .expect("confirmation mail was not dispatched")
            .expect("mailer channel closed");

        let token = url
            .split("/confirmed_email/")
            .nth(1)
            .expect("link should carry a token");
        format!("/api/auth/confirmed_email/{}", token)
    }

    /// Signed up, confirmed and logged in; returns the token pair body
    async fn confirmed_user(&self, email: &str) -> Value {
        assert_eq!(self.signup(email, "567234").await.0, StatusCode::CREATED);
        let path = self.next_confirmation_path().await;
        assert_eq!(self.get(&path, None).await.0, StatusCode::OK);

        let (status, tokens) = self.login(email, "567234").await;
        assert_eq!(status, StatusCode::OK);
        tokens
    }
}

fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

fn token<'a>(pair: &'a Value, name: &str) -> &'a str {
    pair[name].as_str().expect("token present")
}

fn contact(first: &str, last: &str, birthday: NaiveDate) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "email": format!("{}@contacts.test", first.to_lowercase()),
        "phone": "+380 00 000 0000",
        "birthday": birthday.to_string(),
        "additional_data": "met at a conference",
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_signup_confirm_login_flow() {
    let app = TestApp::new().await;

    let (status, body) = app.signup("deadpool@example.com", "567234").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"], messages::SUCCESS_CREATE_USER);
    assert_eq!(body["user"]["email"], "deadpool@example.com");
    assert_eq!(body["user"]["confirmed"], false);
    assert!(body["user"].get("password").is_none());

    let (status, body) = app.login("deadpool@example.com", "567234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains(messages::EMAIL_NOT_CONFIRMED));

    let path = app.next_confirmation_path().await;
    let (status, body) = app.get(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], messages::EMAIL_CONFIRMED);

    let (status, body) = app.get(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], messages::EMAIL_ALREADY_CONFIRMED);

    let (status, body) = app.login("deadpool@example.com", "567234").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    let (status, me) = app.get("/api/users/me", Some(token(&body, "access_token"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["confirmed"], true);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new().await;
    assert_eq!(app.signup("dup@example.com", "567234").await.0, StatusCode::CREATED);

    let (status, body) = app.signup("DUP@example.com", "other-password").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains(messages::ALREADY_EXISTS));
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new().await;

    assert_eq!(app.signup("not-an-email", "567234").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(app.signup("short@example.com", "123").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/signup",
            None,
            json!({ "email": "a@x.com", "username": "a" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"].as_str().unwrap().contains("password"));

    let (status, body) = app
        .send(request(
            "POST",
            "/api/auth/login",
            None,
            Body::from("username=a@x.com"),
            Some("application/x-www-form-urlencoded"),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let pair = app.confirmed_user("shape@example.com").await;
    let (status, body) = app
        .get("/api/contacts/birthdays?days=-1", Some(token(&pair, "access_token")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await;
    app.confirmed_user("user@example.com").await;

    let (status, body) = app.login("user@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains(messages::INVALID_PASSWORD));

    let (status, body) = app.login("nobody@example.com", "567234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains(messages::INVALID_EMAIL));
}

#[tokio::test]
async fn test_refresh_rotation_revokes_old_tokens() {
    let app = TestApp::new().await;
    let pair = app.confirmed_user("rotate@example.com").await;
    let first = token(&pair, "refresh_token").to_string();

    let (status, rotated) = app.get("/api/auth/refresh_token", Some(&first)).await;
    assert_eq!(status, StatusCode::OK);
    let second = token(&rotated, "refresh_token").to_string();
    assert_ne!(first, second);

    // replaying the old token fails and revokes the current one too
    assert_eq!(
        app.get("/api/auth/refresh_token", Some(&first)).await.0,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/api/auth/refresh_token", Some(&second)).await.0,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_token_scopes_are_not_interchangeable() {
    let app = TestApp::new().await;
    let pair = app.confirmed_user("scope@example.com").await;

    let (status, _) = app
        .get("/api/auth/refresh_token", Some(token(&pair, "access_token")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .get("/api/users/me", Some(token(&pair, "refresh_token")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.get("/api/users/me", None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get("/api/auth/refresh_token", None).await.0,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_invalid_confirmation_token() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/auth/confirmed_email/not-a-token", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains(messages::INVALID_EMAIL_TOKEN));
}

#[tokio::test]
async fn test_request_email() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json("POST", "/api/auth/request_email", None, json!({ "email": "ghost@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], messages::CHECK_EMAIL);

    app.signup("late@example.com", "567234").await;
    app.next_confirmation_path().await;

    let (_, body) = app
        .json("POST", "/api/auth/request_email", None, json!({ "email": "late@example.com" }))
        .await;
    assert_eq!(body["message"], messages::CHECK_EMAIL);

    let resent = app.next_confirmation_path().await;
    assert_eq!(app.get(&resent, None).await.1["message"], messages::EMAIL_CONFIRMED);

    let (_, body) = app
        .json("POST", "/api/auth/request_email", None, json!({ "email": "late@example.com" }))
        .await;
    assert_eq!(body["message"], messages::EMAIL_ALREADY_CONFIRMED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::new().await;
    let pair = app.confirmed_user("bye@example.com").await;

    let (status, body) = app
        .json("POST", "/api/auth/logout", Some(token(&pair, "access_token")), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], messages::LOGGED_OUT);

    assert_eq!(
        app.get("/api/auth/refresh_token", Some(token(&pair, "refresh_token")))
            .await
            .0,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_contact_crud() {
    let app = TestApp::new().await;
    let pair = app.confirmed_user("owner@example.com").await;
    let access = token(&pair, "access_token");
    let birthday = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();

    let (status, created) = app
        .json("POST", "/api/contacts", Some(access), contact("Ada", "Lovelace", birthday))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    let path = format!("/api/contacts/{}", id);

    let (status, fetched) = app.get(&path, Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["first_name"], "Ada");
    assert_eq!(fetched["birthday"], "1990-05-17");

    let (status, updated) = app
        .json("PUT", &path, Some(access), contact("Ada", "King", birthday))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["last_name"], "King");
    assert_eq!(updated["id"], id.as_str());

    let (status, list) = app.get("/api/contacts?skip=0&limit=10", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, hits) = app.get("/api/contacts/search?q=kin", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (status, removed) = app
        .send(request("DELETE", &path, Some(access), Body::empty(), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["id"], id.as_str());

    assert_eq!(app.get(&path, Some(access)).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_validation_and_auth() {
    let app = TestApp::new().await;
    let pair = app.confirmed_user("strict@example.com").await;
    let birthday = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();

    let too_long = contact(&"A".repeat(51), "Lovelace", birthday);
    let (status, _) = app
        .json("POST", "/api/contacts", Some(token(&pair, "access_token")), too_long)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json("POST", "/api/contacts", None, contact("Ada", "Lovelace", birthday))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contacts_are_isolated_between_users() {
    let app = TestApp::new().await;
    let alice = app.confirmed_user("alice@example.com").await;
    let bob = app.confirmed_user("bob@example.com").await;
    let birthday = NaiveDate::from_ymd_opt(1985, 1, 1).unwrap();

    let (_, created) = app
        .json(
            "POST",
            "/api/contacts",
            Some(token(&alice, "access_token")),
            contact("Grace", "Hopper", birthday),
        )
        .await;
    let path = format!("/api/contacts/{}", created["id"].as_str().unwrap());
    let bob_access = token(&bob, "access_token");

    assert_eq!(app.get(&path, Some(bob_access)).await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        app.json("PUT", &path, Some(bob_access), contact("Evil", "Edit", birthday))
            .await
            .0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.send(request("DELETE", &path, Some(bob_access), Body::empty(), None))
            .await
            .0,
        StatusCode::NOT_FOUND
    );

    let (_, bobs) = app.get("/api/contacts", Some(bob_access)).await;
    assert!(bobs.as_array().unwrap().is_empty());
    let (_, found) = app.get("/api/contacts/search?q=grace", Some(bob_access)).await;
    assert!(found.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upcoming_birthdays() {
    let app = TestApp::new().await;
    let pair = app.confirmed_user("party@example.com").await;
    let access = token(&pair, "access_token");

    // 2000 is a leap year, so today's month and day always exist
    let today = Utc::now().date_naive();
    let born_today = NaiveDate::from_ymd_opt(2000, today.month(), today.day()).unwrap();
    app.json("POST", "/api/contacts", Some(access), contact("Today", "Cake", born_today))
        .await;

    let (status, upcoming) = app.get("/api/contacts/birthdays", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming.as_array().unwrap().len(), 1);
    assert_eq!(upcoming[0]["first_name"], "Today");

    let (status, _) = app.get("/api/contacts/birthdays?days=1000", Some(access)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
