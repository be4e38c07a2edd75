use std::sync::Arc;

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use shared_utils::state::AppState;
use shared_utils::test_utils::{MockSupabaseResponses, SessionTestUtils, TestConfig, TestUser};

async fn create_test_app(mock_server: &MockServer) -> (Router, Arc<AppState>) {
    let state = TestConfig::with_supabase_url(mock_server.uri()).to_state();
    (auth_routes(state.clone()), state)
}

async fn mount_directory(mock_server: &MockServer, document: &str, rows: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("document", format!("eq.{}", document)))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer_request(verb: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(verb)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_login_with_name_ignores_case() {
    let mock_server = MockServer::start().await;
    let (app, state) = create_test_app(&mock_server).await;

    let juan = TestUser::new("12345", "Juan Perez");
    let mateo = TestUser::new("12345", "Mateo Valencia");
    mount_directory(&mock_server, "12345", json!([
        MockSupabaseResponses::user_response(&juan),
        MockSupabaseResponses::user_response(&mateo),
    ])).await;

    let response = app
        .oneshot(login_request(json!({ "documento": "12345", "nombre": "mateo valencia" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["id"], mateo.id.to_string());
    assert!(body["user"].get("password_hash").is_none());
    assert!(!body["session"]["token"].as_str().unwrap().is_empty());
    assert!(body["session"]["expiresAt"].is_string());

    assert_eq!(state.sessions.active_count(chrono::Utc::now()).await, 1);
}

#[tokio::test]
async fn test_login_with_password() {
    let mock_server = MockServer::start().await;
    let (app, _state) = create_test_app(&mock_server).await;

    let user = TestUser::new("54321", "Ana Garcia");
    let salt = SaltString::from_b64("c2FsdHNhbHRzYWx0c2FsdA").unwrap();
    let hash = Argon2::default()
        .hash_password(b"clave-segura", &salt)
        .unwrap()
        .to_string();

    let mut row = MockSupabaseResponses::user_response(&user);
    row["password_hash"] = json!(hash);
    mount_directory(&mock_server, "54321", json!([row])).await;

    let response = app.clone()
        .oneshot(login_request(json!({ "documento": "54321", "password": "clave-segura" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(login_request(json!({ "documento": "54321", "password": "incorrecta" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_mismatch_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let (app, state) = create_test_app(&mock_server).await;

    mount_directory(&mock_server, "12345", json!([
        MockSupabaseResponses::user_response(&TestUser::default())
    ])).await;

    let response = app
        .oneshot(login_request(json!({ "documento": "12345", "nombre": "Ana Garcia" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Documento o nombre incorrectos");
    assert_eq!(state.sessions.active_count(chrono::Utc::now()).await, 0);
}

#[tokio::test]
async fn test_login_unknown_document_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let (app, _state) = create_test_app(&mock_server).await;
    mount_directory(&mock_server, "00000", json!([])).await;

    let response = app
        .oneshot(login_request(json!({ "documento": "00000", "nombre": "Nadie" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_missing_fields_is_bad_request() {
    let mock_server = MockServer::start().await;
    let (app, _state) = create_test_app(&mock_server).await;

    for body in [json!({ "nombre": "Juan Perez" }), json!({ "documento": "12345" })] {
        let response = app.clone().oneshot(login_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_login_directory_failure_is_internal_error() {
    let mock_server = MockServer::start().await;
    let (app, _state) = create_test_app(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(login_request(json!({ "documento": "12345", "nombre": "Juan Perez" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_session_info_reports_remaining_time() {
    let mock_server = MockServer::start().await;
    let (app, state) = create_test_app(&mock_server).await;
    let user = TestUser::default();
    let token = SessionTestUtils::login(&state, &user).await;

    let response = app
        .oneshot(bearer_request("GET", "/session", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["userId"], user.id.to_string());
    assert_eq!(body["name"], "Juan Perez");
    let remaining = body["remainingSeconds"].as_i64().unwrap();
    assert!(remaining > 0 && remaining <= 900);
}

#[tokio::test]
async fn test_logout_tears_down_session() {
    let mock_server = MockServer::start().await;
    let (app, state) = create_test_app(&mock_server).await;
    let token = SessionTestUtils::login(&state, &TestUser::default()).await;

    let response = app.clone()
        .oneshot(bearer_request("POST", "/logout", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = app
        .oneshot(bearer_request("GET", "/session", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let mock_server = MockServer::start().await;
    let (app, state) = create_test_app(&mock_server).await;
    let token = SessionTestUtils::create_expired_token(&TestUser::default(), &state.config.session_secret);

    let response = app
        .oneshot(bearer_request("GET", "/session", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
