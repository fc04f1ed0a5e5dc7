use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::{AppState, build_router};
use crate::auth::{AuthConfig, TokenAuthority};
use crate::config::Config;

const TEST_SIGNING_KEY: &str = "taskdeck-test-signing-key";

fn test_config() -> Config {
    Config {
        service_name: "taskdeck-test".to_string(),
        bind_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
        build_sha: "test".to_string(),
        token_signing_key: TEST_SIGNING_KEY.to_string(),
        token_issuer: "taskdeck-test".to_string(),
        token_ttl_seconds: 3600,
    }
}

fn build_test_router() -> Router {
    build_router(AppState::new(test_config()))
}

async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// Signs up a fresh user and returns their bearer token and user id.
async fn signup(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"name": name, "email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    let token = body["token"].as_str().expect("token").to_string();
    let user_id = body["user"]["id"].as_str().expect("user id").to_string();
    (token, user_id)
}

async fn create_task(app: &Router, token: &str, title: &str, description: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/tasks",
        Some(token),
        Some(json!({"title": title, "description": description})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

#[tokio::test]
async fn health_reports_service_identity() {
    let app = build_test_router();
    let (status, body) = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "taskdeck-test");
    assert_eq!(body["build_sha"], "test");
}

#[tokio::test]
async fn signup_then_login_returns_the_same_user() {
    let app = build_test_router();
    let (_, user_id) = signup(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "Ada@Example.com", "password": "password123"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let app = build_test_router();
    signup(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"name": "Imposter", "email": "ADA@example.com", "password": "password123"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "email already registered");
}

#[tokio::test]
async fn signup_validates_its_fields() {
    let app = build_test_router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"name": "  ", "email": "ada@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "name is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"name": "Ada", "email": "ada@example.com", "password": "tiny"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "password must be at least 6 characters");
}

#[tokio::test]
async fn login_never_reveals_which_credential_failed() {
    let app = build_test_router();
    signup(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid email or password");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid email or password");
}

#[tokio::test]
async fn task_routes_require_a_valid_bearer_token() {
    let app = build_test_router();

    let (status, _) = send(&app, Method::GET, "/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/tasks", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed with a key the service does not trust.
    let foreign = TokenAuthority::from_config(&AuthConfig {
        signing_key: "some-other-key".to_string(),
        issuer: "taskdeck-test".to_string(),
        token_ttl_seconds: 3600,
    });
    let forged = foreign.issue(uuid::Uuid::new_v4()).expect("forge token");
    let (status, body) = send(&app, Method::GET, "/tasks", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid session token");
}

#[tokio::test]
async fn tokens_for_unknown_users_are_rejected() {
    let app = build_test_router();
    // Valid signature, but no such user in the store.
    let authority = TokenAuthority::from_config(&AuthConfig {
        signing_key: TEST_SIGNING_KEY.to_string(),
        issuer: "taskdeck-test".to_string(),
        token_ttl_seconds: 3600,
    });
    let token = authority.issue(uuid::Uuid::new_v4()).expect("issue");

    let (status, body) = send(&app, Method::GET, "/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unknown user");
}

#[tokio::test]
async fn create_then_get_round_trips_the_task() {
    let app = build_test_router();
    let (token, user_id) = signup(&app, "Ada", "ada@example.com").await;

    let created = create_task(&app, &token, "buy milk", "2 liters").await;
    assert_eq!(created["title"], "buy milk");
    assert_eq!(created["description"], "2 liters");
    assert_eq!(created["completed"], false);
    assert_eq!(created["owner"], user_id.as_str());

    let task_id = created["id"].as_str().expect("task id");
    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/tasks/{task_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_requires_a_non_empty_title() {
    let app = build_test_router();
    let (token, _) = signup(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/tasks",
        Some(&token),
        Some(json!({"title": "   ", "description": "whitespace only"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "title is required");

    let (_, listed) = send(&app, Method::GET, "/tasks", Some(&token), None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn listing_is_scoped_to_the_authenticated_owner() {
    let app = build_test_router();
    let (ada_token, _) = signup(&app, "Ada", "ada@example.com").await;
    let (bob_token, _) = signup(&app, "Bob", "bob@example.com").await;

    create_task(&app, &ada_token, "ada's task", "").await;
    create_task(&app, &bob_token, "bob's task", "").await;

    let (status, listed) = send(&app, Method::GET, "/tasks", Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|task| task["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["ada's task"]);
}

#[tokio::test]
async fn another_owners_task_is_invisible_across_every_verb() {
    let app = build_test_router();
    let (ada_token, _) = signup(&app, "Ada", "ada@example.com").await;
    let (bob_token, _) = signup(&app, "Bob", "bob@example.com").await;

    let created = create_task(&app, &ada_token, "ada's secret", "").await;
    let task_id = created["id"].as_str().expect("task id");
    let path = format!("/tasks/{task_id}");

    let (status, body) = send(&app, Method::GET, &path, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (status, _) = send(
        &app,
        Method::PUT,
        &path,
        Some(&bob_token),
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &path, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Ada still sees her task, untouched.
    let (status, fetched) = send(&app, Method::GET, &path, Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["completed"], false);
}

#[tokio::test]
async fn update_applies_only_the_provided_fields() {
    let app = build_test_router();
    let (token, _) = signup(&app, "Ada", "ada@example.com").await;
    let created = create_task(&app, &token, "original title", "original description").await;
    let task_id = created["id"].as_str().expect("task id");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/tasks/{task_id}"),
        Some(&token),
        Some(json!({"completed": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "original title");
    assert_eq!(updated["description"], "original description");
    assert_eq!(updated["completed"], true);
}

#[tokio::test]
async fn update_rejects_fields_outside_the_allow_list() {
    let app = build_test_router();
    let (token, _) = signup(&app, "Ada", "ada@example.com").await;
    let created = create_task(&app, &token, "keep me intact", "").await;
    let task_id = created["id"].as_str().expect("task id");
    let path = format!("/tasks/{task_id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &path,
        Some(&token),
        Some(json!({"completed": true, "owner": uuid::Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid updates");

    // The rejected request performed no mutation.
    let (_, fetched) = send(&app, Method::GET, &path, Some(&token), None).await;
    assert_eq!(fetched["completed"], false);
}

#[tokio::test]
async fn update_rejects_an_emptied_title() {
    let app = build_test_router();
    let (token, _) = signup(&app, "Ada", "ada@example.com").await;
    let created = create_task(&app, &token, "has a title", "").await;
    let task_id = created["id"].as_str().expect("task id");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/tasks/{task_id}"),
        Some(&token),
        Some(json!({"title": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "title is required");
}

#[tokio::test]
async fn delete_returns_the_removed_task_and_then_goes_not_found() {
    let app = build_test_router();
    let (token, _) = signup(&app, "Ada", "ada@example.com").await;
    let created = create_task(&app, &token, "short-lived", "").await;
    let task_id = created["id"].as_str().expect("task id");
    let path = format!("/tasks/{task_id}");

    let (status, removed) = send(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed, created);

    let (status, body) = send(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn malformed_task_ids_are_client_errors() {
    let app = build_test_router();
    let (token, _) = signup(&app, "Ada", "ada@example.com").await;

    let (status, _) = send(&app, Method::GET, "/tasks/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
