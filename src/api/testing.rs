//! Router test helpers

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use super::{build_router, AppState, IdentityFactory, SessionRegistry};
use crate::config::Config;
use crate::content::{sample_store, Catalog, MemoryStore};
use crate::identity::testing::FakeIdentity;
use crate::identity::IdentityProvider;

/// Port nothing listens on
const CLOSED_BACKEND: &str = "http://127.0.0.1:9";

fn app(catalog: Catalog, backend_url: &str) -> Router {
    let mut config = Config::default();
    config.server.site_url = "http://localhost:3000".to_string();
    config.backend.base_url = backend_url.to_string();
    config.backend.timeout_seconds = 5;

    let identity: IdentityFactory =
        Arc::new(|| Arc::new(FakeIdentity::configured()) as Arc<dyn IdentityProvider>);
    let http = reqwest::Client::new();
    let state = AppState {
        sessions: Arc::new(SessionRegistry::new(&config, http, identity)),
        catalog,
        config: Arc::new(config),
    };
    build_router(state, "http://localhost:3000")
}

fn sample_catalog() -> Catalog {
    Catalog::new(Arc::new(sample_store().unwrap()))
}

/// Router over the sample catalog with an unreachable backend
pub fn sample_app() -> Router {
    app(sample_catalog(), CLOSED_BACKEND)
}

/// Router whose content source is not configured
pub fn unconfigured_app() -> Router {
    app(Catalog::new(Arc::new(MemoryStore::unconfigured())), CLOSED_BACKEND)
}

pub fn app_with_backend(backend_url: &str) -> Router {
    app(sample_catalog(), backend_url)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(request.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(app, Method::GET, uri, None, None).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// `name=value` of the session cookie set by `response`
pub fn session_cookie_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("autostack_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Sign in as user@example.com; returns the session cookie
pub async fn sign_in(app: &Router) -> String {
    let response = send(
        app,
        Method::GET,
        "/auth/callback?oobCode=abc&mode=signIn&email=user%40example.com",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie_of(&response).unwrap()
}

type Calls = Arc<Mutex<Vec<Value>>>;

fn envelope(data: Value) -> Json<Value> {
    Json(json!({"success": true, "data": data, "error": null}))
}

async fn profile() -> Json<Value> {
    envelope(json!({"uid": "backend-user", "email": "user@example.com"}))
}

async fn update_profile(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    calls.lock().unwrap().push(body.clone());
    envelope(json!({
        "uid": "backend-user",
        "email": "user@example.com",
        "name": body["name"],
        "city": body["city"],
    }))
}

async fn interests() -> Json<Value> {
    envelope(json!([{"id": "i1", "userId": "backend-user", "carId": "car-1", "carOwner": "autostack"}]))
}

async fn create_interest(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    calls.lock().unwrap().push(body.clone());
    envelope(json!({"id": "i2", "carId": body["carId"], "carOwner": body["carOwner"]}))
}

async fn test_drives() -> Json<Value> {
    envelope(json!([]))
}

async fn create_test_drive(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    calls.lock().unwrap().push(body.clone());
    envelope(json!({"id": "t1", "carId": body["carId"], "preferredDate": body["preferredDate"], "status": "requested"}))
}

async fn verify() -> Json<Value> {
    envelope(json!({"uid": "backend-user", "email": "user@example.com"}))
}

/// Backend REST API on an ephemeral port
///
/// Records the JSON bodies of profile updates, interests and test drives.
pub async fn spawn_backend() -> (String, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/v1/api/user/me", get(profile).put(update_profile))
        .route("/v1/api/interests", get(interests).post(create_interest))
        .route("/v1/api/test-drives", get(test_drives).post(create_test_drive))
        .route("/v1/api/auth/verify", post(verify))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), calls)
}
