//! Per-visitor sessions
//!
//! Every visitor gets a `SessionContext` holding their own identity provider
//! and `SessionBridge`. Contexts live in a moka cache keyed by the session
//! cookie and are dropped after `session.idle_seconds` without a request.

use axum::response::{IntoResponse, Redirect, Response};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::backend::{ApiClient, RecordingNavigator};
use crate::config::{BackendConfig, Config};
use crate::identity::{IdentityProvider, IdentityToolkit, SessionBridge};
use crate::models::{CarEntry, NewsEntry, ReviewEntry};
use crate::storefront::Listing;

/// Creates the identity provider of a new visitor
pub type IdentityFactory = Arc<dyn Fn() -> Arc<dyn IdentityProvider> + Send + Sync>;

/// Identity factory over the REST identity service
pub fn toolkit_factory(http: reqwest::Client, config: &Config) -> IdentityFactory {
    let identity = config.identity.clone();
    Arc::new(move || Arc::new(IdentityToolkit::new(http.clone(), identity.clone())) as Arc<dyn IdentityProvider>)
}

/// One visitor's session
pub struct SessionContext {
    id: String,
    bridge: Arc<SessionBridge>,
    http: reqwest::Client,
    backend: BackendConfig,
    cars: Listing<CarEntry>,
    reviews: Listing<ReviewEntry>,
    news: Listing<NewsEntry>,
}

impl SessionContext {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bridge(&self) -> &SessionBridge {
        &self.bridge
    }

    /// Listings of this visitor; a newer load supersedes an older one
    pub fn car_listing(&self) -> &Listing<CarEntry> {
        &self.cars
    }

    pub fn review_listing(&self) -> &Listing<ReviewEntry> {
        &self.reviews
    }

    pub fn news_listing(&self) -> &Listing<NewsEntry> {
        &self.news
    }

    /// Backend client authenticated as this visitor
    ///
    /// `return_to` is where a login required by the call should lead back.
    pub fn backend(&self, return_to: &str) -> VisitorBackend {
        let navigator = Arc::new(RecordingNavigator::new());
        let client = ApiClient::new(self.http.clone(), &self.backend, self.bridge.clone(), navigator.clone())
            .with_return_to(return_to);
        VisitorBackend { client, navigator }
    }
}

/// Backend client of one request and the navigation its calls asked for
pub struct VisitorBackend {
    client: ApiClient,
    navigator: Arc<RecordingNavigator>,
}

impl VisitorBackend {
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Login location recorded by a call that found the visitor signed out
    pub fn take_navigation(&self) -> Option<String> {
        self.navigator.take()
    }

    /// `response`, or a 303 to the recorded location when a call navigated
    pub fn respond(&self, response: Response) -> Response {
        match self.take_navigation() {
            Some(location) => Redirect::to(&location).into_response(),
            None => response,
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("bridge", &self.bridge)
            .finish()
    }
}

/// Live visitor sessions
pub struct SessionRegistry {
    sessions: Cache<String, Arc<SessionContext>>,
    identity: IdentityFactory,
    http: reqwest::Client,
    backend: BackendConfig,
    site_url: String,
    cookie_name: String,
    idle: Duration,
}

impl SessionRegistry {
    pub fn new(config: &Config, http: reqwest::Client, identity: IdentityFactory) -> Self {
        let idle = Duration::from_secs(config.session.idle_seconds.max(1));
        let sessions = Cache::builder()
            .max_capacity(config.session.max_sessions)
            .time_to_idle(idle)
            .build();

        Self {
            sessions,
            identity,
            http,
            backend: config.backend.clone(),
            site_url: config.server.site_url.clone(),
            cookie_name: config.session.cookie_name.clone(),
            idle,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session for the cookie value `id`, or a fresh one
    ///
    /// The flag tells whether a new session was started.
    pub async fn resolve(&self, id: Option<&str>) -> (Arc<SessionContext>, bool) {
        if let Some(id) = id {
            if let Some(session) = self.sessions.get(id).await {
                return (session, false);
            }
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let bridge = Arc::new(SessionBridge::new((self.identity)(), &self.site_url));
        let session = Arc::new(SessionContext {
            id: id.clone(),
            bridge,
            http: self.http.clone(),
            backend: self.backend.clone(),
            cars: Listing::new(),
            reviews: Listing::new(),
            news: Listing::new(),
        });
        self.sessions.insert(id, session.clone()).await;
        (session, true)
    }

    /// Drop a session, e.g. after logout
    pub async fn end(&self, id: &str) {
        if self.sessions.remove(id).await.is_some() {
            info!("Visitor session ended");
        }
    }

    /// `Set-Cookie` value carrying the session id
    pub fn set_cookie(&self, id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            id,
            self.idle.as_secs()
        )
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.entry_count())
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendApi;
    use crate::identity::testing::FakeIdentity;

    fn registry() -> SessionRegistry {
        let factory: IdentityFactory = Arc::new(|| Arc::new(FakeIdentity::configured()) as Arc<dyn IdentityProvider>);
        SessionRegistry::new(&Config::default(), reqwest::Client::new(), factory)
    }

    #[tokio::test]
    async fn test_resolve_reuses_known_sessions() {
        let registry = registry();
        let (first, created) = registry.resolve(None).await;
        assert!(created);

        let (again, created) = registry.resolve(Some(first.id())).await;
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &again));

        let (other, created) = registry.resolve(Some("unknown")).await;
        assert!(created);
        assert_ne!(other.id(), first.id());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_identity() {
        let registry = registry();
        let (a, _) = registry.resolve(None).await;
        let (b, _) = registry.resolve(None).await;

        a.bridge()
            .complete_login(
                "http://localhost:3000/auth/callback?oobCode=abc&mode=signIn",
                Some("a@example.com"),
            )
            .await
            .unwrap();
        assert!(a.bridge().is_authenticated());
        assert!(!b.bridge().is_authenticated());
    }

    #[tokio::test]
    async fn test_signed_out_backend_call_navigates_to_login() {
        let registry = registry();
        let (session, _) = registry.resolve(None).await;
        let backend = session.backend("/cars/tata-nexon");

        let err = backend.client().get_user_profile().await.unwrap_err();
        assert!(err.is_auth_error());

        let response = backend.respond(axum::http::StatusCode::OK.into_response());
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[axum::http::header::LOCATION],
            "/auth/login?redirect=%2Fcars%2Ftata-nexon"
        );
        assert_eq!(backend.take_navigation(), None);

        let untouched = backend.respond(axum::http::StatusCode::OK.into_response());
        assert_eq!(untouched.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_end_and_cookie() {
        let registry = registry();
        let (session, _) = registry.resolve(None).await;
        registry.end(session.id()).await;
        let (_, created) = registry.resolve(Some(session.id())).await;
        assert!(created);

        assert_eq!(
            registry.set_cookie("abc"),
            "autostack_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );
    }
}
