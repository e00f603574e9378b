//! Authenticated API client
//!
//! Every call needs a bearer token from the session. Without one the call
//! fails fast and the visitor is sent to the login page; a 401 from the
//! backend does the same. Responses are wrapped in a uniform envelope:
//!
//! ```json
//! { "success": true, "data": { ... }, "error": null }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::ApiError;
use super::navigator::{login_location, Navigator};
use crate::config::BackendConfig;

/// Supplies the bearer token for backend calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current token, `None` when nobody is signed in
    async fn bearer_token(&self) -> Option<String>;
}

/// Error part of the envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeError {
    pub message: Option<String>,
    pub code: Option<String>,
}

/// Uniform response wrapper of the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
}

/// Backend client bound to one visitor's session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    tokens: Arc<dyn TokenSource>,
    navigator: Arc<dyn Navigator>,
    return_to: Option<String>,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        config: &BackendConfig,
        tokens: Arc<dyn TokenSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_seconds),
            tokens,
            navigator,
            return_to: None,
        }
    }

    /// Page the visitor should come back to after logging in
    pub fn with_return_to(mut self, path: impl Into<String>) -> Self {
        self.return_to = Some(path.into());
        self
    }

    fn redirect_to_login(&self) {
        self.navigator.assign(&login_location(self.return_to.as_deref()));
    }

    /// Send one authenticated request and unwrap the envelope
    ///
    /// The call is made at most once: no retries, no caching.
    pub async fn request<T, B>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let Some(token) = self.tokens.bearer_token().await else {
            debug!("{} {} without a token, redirecting to login", method, endpoint);
            self.redirect_to_login();
            return Err(ApiError::unauthenticated());
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::unauthenticated())?;
        headers.insert(AUTHORIZATION, bearer);
        if let Some(extra) = extra_headers {
            for (name, value) in extra.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .headers(headers);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|e| ApiError::invalid_response(format!("Failed to encode request: {}", e), 0))?;
            builder = builder.body(payload);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", method, endpoint, e);
            ApiError::from(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("{} {} -> {}", method, endpoint, status.as_u16());

        if status == StatusCode::UNAUTHORIZED {
            self.redirect_to_login();
            return Err(ApiError::session_expired());
        }

        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::invalid_response(format!("Invalid response from server: {}", e), status.as_u16())
        })?;

        if !envelope.success || envelope.error.is_some() {
            let error = envelope.error.unwrap_or_default();
            return Err(ApiError::from_envelope(
                error.message.as_deref(),
                error.code.as_deref(),
                status.as_u16(),
            ));
        }

        let data = envelope.data.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(data).map_err(|e| {
            ApiError::invalid_response(format!("Unexpected response data: {}", e), status.as_u16())
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(endpoint, Method::GET, None, None).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(endpoint, Method::POST, body, None).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(endpoint, Method::PUT, Some(body), None).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("return_to", &self.return_to)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::StaticToken;
    use super::*;
    use crate::backend::codes;
    use crate::backend::RecordingNavigator;
    use axum::{
        extract::State,
        http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Hits(AtomicUsize);

    async fn ok(State(hits): State<Arc<Hits>>, headers: AxumHeaders) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let trace = headers
            .get("x-trace")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(serde_json::json!({
            "success": true,
            "data": {"auth": auth, "trace": trace, "nested": {"n": [1, 2, 3]}},
            "error": null
        }))
    }

    async fn echo(State(hits): State<Arc<Hits>>, Json(body): Json<serde_json::Value>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        Json(serde_json::json!({"success": true, "data": body}))
    }

    async fn expired_with_success(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        (
            AxumStatus::UNAUTHORIZED,
            Json(serde_json::json!({"success": true, "data": {"x": 1}})),
        )
    }

    async fn expired_plain(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        (AxumStatus::UNAUTHORIZED, "Unauthorized")
    }

    async fn not_found(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        (
            AxumStatus::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "data": null,
                "error": {"message": "Car not found", "code": "NOT_FOUND"}
            })),
        )
    }

    async fn bare_failure(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        (AxumStatus::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"success": false})))
    }

    async fn success_with_error(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        Json(serde_json::json!({"success": true, "data": 1, "error": {"message": "Partial"}}))
    }

    async fn garbage(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        "<html>oops</html>"
    }

    async fn spawn_backend(hits: Arc<Hits>) -> String {
        let app = Router::new()
            .route("/ok", get(ok))
            .route("/echo", post(echo))
            .route("/expired", get(expired_with_success))
            .route("/expired-plain", get(expired_plain))
            .route("/missing", get(not_found))
            .route("/bare-failure", get(bare_failure))
            .route("/success-with-error", get(success_with_error))
            .route("/garbage", get(garbage))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str, token: Option<&str>, nav: Arc<RecordingNavigator>) -> ApiClient {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
        };
        ApiClient::new(
            reqwest::Client::new(),
            &config,
            Arc::new(StaticToken(token.map(str::to_string))),
            nav,
        )
    }

    #[tokio::test]
    async fn test_no_token_never_touches_network() {
        let hits = Arc::new(Hits::default());
        let base = spawn_backend(hits.clone()).await;
        let nav = Arc::new(RecordingNavigator::new());
        let api = client(&base, None, nav.clone()).with_return_to("/dashboard");

        let err = api.get::<serde_json::Value>("/ok").await.unwrap_err();
        assert_eq!(err.code, codes::UNAUTHENTICATED);
        assert_eq!(err.status, 401);
        assert_eq!(hits.0.load(Ordering::SeqCst), 0);
        assert_eq!(nav.location().as_deref(), Some("/auth/login?redirect=%2Fdashboard"));
    }

    #[tokio::test]
    async fn test_success_returns_data_unchanged() {
        let hits = Arc::new(Hits::default());
        let base = spawn_backend(hits.clone()).await;
        let nav = Arc::new(RecordingNavigator::new());
        let api = client(&base, Some("tok-1"), nav.clone());

        let mut extra = HeaderMap::new();
        extra.insert("x-trace", HeaderValue::from_static("abc"));
        let data: serde_json::Value = api
            .request::<_, ()>("/ok", Method::GET, None, Some(extra))
            .await
            .unwrap();

        assert_eq!(
            data,
            serde_json::json!({"auth": "Bearer tok-1", "trace": "abc", "nested": {"n": [1, 2, 3]}})
        );
        assert_eq!(hits.0.load(Ordering::SeqCst), 1);
        assert_eq!(nav.location(), None);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let hits = Arc::new(Hits::default());
        let base = spawn_backend(hits).await;
        let api = client(&base, Some("tok"), Arc::new(RecordingNavigator::new()));

        let body = serde_json::json!({"carId": "blt1", "carOwner": "autostack"});
        let echoed: serde_json::Value = api.post("/echo", Some(&body)).await.unwrap();
        assert_eq!(echoed, body);
    }

    #[tokio::test]
    async fn test_401_is_session_expired_regardless_of_body() {
        let hits = Arc::new(Hits::default());
        let base = spawn_backend(hits.clone()).await;

        for endpoint in ["/expired", "/expired-plain"] {
            let nav = Arc::new(RecordingNavigator::new());
            let api = client(&base, Some("tok"), nav.clone());
            let err = api.get::<serde_json::Value>(endpoint).await.unwrap_err();
            assert_eq!(err.code, codes::SESSION_EXPIRED);
            assert_eq!(err.status, 401);
            assert_eq!(nav.location().as_deref(), Some("/auth/login"));
        }
        assert_eq!(hits.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_envelope_error_surfaces_server_text() {
        let hits = Arc::new(Hits::default());
        let base = spawn_backend(hits).await;
        let nav = Arc::new(RecordingNavigator::new());
        let api = client(&base, Some("tok"), nav.clone());

        let err = api.get::<serde_json::Value>("/missing").await.unwrap_err();
        assert_eq!(err, ApiError::new("Car not found", "NOT_FOUND", 404));

        let err = api.get::<serde_json::Value>("/bare-failure").await.unwrap_err();
        assert_eq!(err, ApiError::new("An error occurred", "UNKNOWN_ERROR", 500));

        let err = api.get::<serde_json::Value>("/success-with-error").await.unwrap_err();
        assert_eq!(err, ApiError::new("Partial", "UNKNOWN_ERROR", 200));

        assert_eq!(nav.location(), None);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_invalid_response() {
        let hits = Arc::new(Hits::default());
        let base = spawn_backend(hits).await;
        let api = client(&base, Some("tok"), Arc::new(RecordingNavigator::new()));

        let err = api.get::<serde_json::Value>("/garbage").await.unwrap_err();
        assert_eq!(err.code, codes::INVALID_RESPONSE);
        assert_eq!(err.status, 200);
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}", addr), Some("tok"), Arc::new(RecordingNavigator::new()));
        let err = api.get::<serde_json::Value>("/ok").await.unwrap_err();
        assert_eq!(err.code, codes::NETWORK_ERROR);
        assert_eq!(err.status, 0);
    }
}
