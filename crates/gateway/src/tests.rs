//! Router-level tests against an in-memory database and key-value store

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use copyvault_common::{
    cache::MemoryStore,
    config::AppConfig,
    db::{schema, DbPool},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{create_router, AppState};

async fn test_app(configure: impl FnOnce(&mut AppConfig)) -> Router {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.database.min_connections = 1;
    config.auth.jwt_secret = Some("test-secret".to_string());
    config.rate_limit.enabled = false;
    configure(&mut config);

    let db = DbPool::new(&config.database).await.unwrap();
    schema::create_schema(db.write()).await.unwrap();

    create_router(AppState::new(config, db, Arc::new(MemoryStore::new())))
}

async fn app() -> Router {
    test_app(|_| {}).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn sign_in(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/v1/auth/anonymous", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

async fn create_copy(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/copies",
        Some(token),
        Some(json!({ "title": title, "content": "Hello and welcome aboard." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["store"]["status"], "up");
}

#[tokio::test]
async fn test_anonymous_sign_in_resolves_viewer() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let token = sign_in(&app).await;
    let (status, body) = send(&app, Method::GET, "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_anonymous"], true);

    let (status, _) = send(&app, Method::GET, "/v1/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_copy_lifecycle() {
    let app = app().await;
    let token = sign_in(&app).await;

    let id = create_copy(&app, &token, "Welcome Email").await;

    let (status, copy) = send(&app, Method::GET, &format!("/v1/copies/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["category"], "general");
    assert_eq!(copy["is_public"], false);
    assert_eq!(copy["likes"], 0);

    let (status, copy) = send(
        &app,
        Method::PATCH,
        &format!("/v1/copies/{}", id),
        Some(&token),
        Some(json!({ "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["is_public"], true);
    assert_eq!(copy["title"], "Welcome Email");

    let (_, public) = send(&app, Method::GET, "/v1/copies?is_public=true", None, None).await;
    assert_eq!(public.as_array().unwrap().len(), 1);

    let (status, body) =
        send(&app, Method::POST, &format!("/v1/copies/{}/views", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counted"], true);

    let (status, _) =
        send(&app, Method::DELETE, &format!("/v1/copies/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/v1/copies/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_writes_require_owner() {
    let app = app().await;
    let owner = sign_in(&app).await;
    let stranger = sign_in(&app).await;
    let id = create_copy(&app, &owner, "Launch Post").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/copies",
        None,
        Some(json!({ "title": "x", "content": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/copies/{}", id),
        Some(&stranger),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/copies",
        Some(&owner),
        Some(json!({ "title": "", "content": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_toggle_like() {
    let app = app().await;
    let token = sign_in(&app).await;
    let id = create_copy(&app, &token, "Tagline").await;
    let uri = format!("/v1/copies/{}/like", id);

    let (status, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    let (_, copy) = send(&app, Method::GET, &format!("/v1/copies/{}", id), None, None).await;
    assert_eq!(copy["likes"], 1);

    let (_, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(body["liked"], false);

    let (_, copy) = send(&app, Method::GET, &format!("/v1/copies/{}", id), None, None).await;
    assert_eq!(copy["likes"], 0);

    let missing = format!("/v1/copies/{}/like", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::POST, &missing, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories() {
    let app = app().await;
    let token = sign_in(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/categories",
        Some(&token),
        Some(json!({ "name": "Newsletters" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (_, categories) = send(&app, Method::GET, "/v1/categories", Some(&token), None).await;
    assert_eq!(categories[0]["color"], "#3b82f6");

    let (_, categories) = send(&app, Method::GET, "/v1/categories", None, None).await;
    assert_eq!(categories, json!([]));

    let (status, _) =
        send(&app, Method::DELETE, &format!("/v1/categories/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_challenge_submission_flow() {
    let app = app().await;
    let token = sign_in(&app).await;

    let (_, outcome) = send(&app, Method::POST, "/v1/challenges/seed", None, None).await;
    assert_eq!(outcome, json!({ "seeded": true, "count": 3 }));
    let (_, outcome) = send(&app, Method::POST, "/v1/challenges/seed", None, None).await;
    assert_eq!(outcome, json!({ "seeded": false, "count": 3 }));

    let (_, challenges) = send(&app, Method::GET, "/v1/challenges", None, None).await;
    let challenge_id = challenges[0]["id"].as_str().unwrap().to_string();

    let (status, before) =
        send(&app, Method::POST, "/v1/storage/upload-url", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, after) = send(&app, Method::POST, "/v1/storage/upload-url", Some(&token), None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/challenges/{}/submissions", challenge_id),
        Some(&token),
        Some(json!({
            "before_file_id": before["storage_id"],
            "after_file_id": after["storage_id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, mine) =
        send(&app, Method::GET, "/v1/challenges/submissions/mine", Some(&token), None).await;
    assert_eq!(mine[0]["status"], "pending");

    let (_, mine) = send(&app, Method::GET, "/v1/challenges/submissions/mine", None, None).await;
    assert_eq!(mine, json!([]));

    let resolve = format!("/v1/storage/{}/url", before["storage_id"].as_str().unwrap());
    let (_, body) = send(&app, Method::GET, &resolve, None, None).await;
    assert!(body["url"].as_str().is_some());
}

#[tokio::test]
async fn test_eco_quiz_locks_after_submit() {
    let app = app().await;
    let token = sign_in(&app).await;

    let (status, _) = send(&app, Method::GET, "/v1/eco/state", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, quiz) = send(&app, Method::GET, "/v1/eco/quizzes/q1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let count = quiz["questions"].as_array().unwrap().len();

    let (status, result) = send(
        &app,
        Method::POST,
        "/v1/eco/quizzes/q1/submit",
        Some(&token),
        Some(json!({ "answers": vec![0; count] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["total"], count);

    let (status, _) = send(&app, Method::GET, "/v1/eco/quizzes/q1", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, dashboard) = send(&app, Method::GET, "/v1/eco/state", Some(&token), None).await;
    let q1 = dashboard["quizzes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["id"] == "q1")
        .unwrap();
    assert_eq!(q1["locked"], true);
}

#[tokio::test]
async fn test_eco_actions_and_catalogs() {
    let app = app().await;
    let token = sign_in(&app).await;

    let (status, outcome) =
        send(&app, Method::POST, "/v1/eco/actions/quick", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "applied");
    assert_eq!(outcome["personal_monster_hp"], 90);

    let (_, outcome) = send(&app, Method::POST, "/v1/eco/actions/quick", Some(&token), None).await;
    assert_eq!(outcome["status"], "already_completed");

    let (_, lessons) = send(&app, Method::GET, "/v1/eco/lessons", None, None).await;
    assert_eq!(lessons.as_array().unwrap().len(), 6);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/eco/lessons/l1/sections/0",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"], 33);

    let (status, _) =
        send(&app, Method::POST, "/v1/eco/rewards/r2/redeem", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rate_limit_rejects_burst_overflow() {
    let app = test_app(|config| {
        config.rate_limit.enabled = true;
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
    })
    .await;

    let (status, _) = send(&app, Method::GET, "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_shutdown_deadline_drops_stuck_requests() {
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route(
        "/stuck",
        axum::routing::get(|| async { std::future::pending::<&'static str>().await }),
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(crate::serve(
        listener,
        app,
        async move {
            let _ = stop_rx.await;
        },
        std::time::Duration::from_millis(100),
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /stuck HTTP/1.1\r\nhost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    stop_tx.send(()).unwrap();
    let finished = tokio::time::timeout(std::time::Duration::from_secs(5), server).await;
    assert!(finished.unwrap().unwrap().is_ok());
}
