use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use quote_board::auth::StaticCredentials;
use quote_board::config::{Config, StorageBackend};
use quote_board::db::{NewQuote, Quote, QuoteId, QuoteStore, UNKNOWN};
use quote_board::router::cookie_key;
use quote_board::session::{MemorySessionStore, Session, SessionStore};
use quote_board::{AppState, SessionError, StorageError, app_router};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

/// A router over real backends in a temp dir, plus a one-cookie browser.
struct TestApp {
    dir: TempDir,
    app: Router,
    quotes: Arc<dyn QuoteStore>,
    cookie: Option<String>,
}

impl TestApp {
    async fn with_storage(storage: StorageBackend) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let cfg = Config {
            storage,
            database_url: format!("sqlite:{}", dir.path().join("quotes.db").display()),
            document_path: dir.path().join("quotes.redb"),
            session_secret: Some("integration test secret".to_string()),
            static_dir: dir.path().join("public"),
            ..Config::default()
        };
        let state = AppState::from_config(&cfg)
            .await
            .expect("failed to build app state");
        Self::from_state(dir, state)
    }

    async fn sqlite() -> Self {
        Self::with_storage(StorageBackend::Sqlite).await
    }

    async fn document() -> Self {
        Self::with_storage(StorageBackend::Document).await
    }

    fn from_state(dir: TempDir, state: AppState) -> Self {
        let quotes = state.quotes.clone();
        Self {
            dir,
            app: app_router(state),
            quotes,
            cookie: None,
        }
    }

    async fn send(&mut self, method: &str, uri: &str, form: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                req = req.header(header::CONTENT_TYPE, FORM);
                Body::from(form.to_owned())
            }
            None => Body::empty(),
        };

        let resp = self
            .app
            .clone()
            .oneshot(req.body(body).expect("failed to build request"))
            .await
            .expect("request failed");

        for value in resp.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().expect("set-cookie was not ascii");
            let pair = value.split(';').next().unwrap_or_default();
            if let Some(v) = pair.strip_prefix("quotes_session=") {
                self.cookie = (!v.is_empty()).then(|| pair.to_string());
            }
        }
        resp
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send("GET", uri, None).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response<Body> {
        self.send("POST", uri, Some(form)).await
    }

    async fn login(&mut self) {
        let resp = self.post("/login", "username=admin&password=admin123").await;
        assert_redirect(&resp, "/");
    }

    async fn stored(&self) -> Vec<Quote> {
        self.quotes.list_all().await.expect("failed to list quotes")
    }
}

fn assert_redirect(resp: &Response<Body>, location: &str) {
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some(location)
    );
}

async fn body_text(resp: Response<Body>) -> String {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(body.to_vec()).expect("response body was not utf-8")
}

#[tokio::test]
async fn valid_login_sets_session_and_redirects_home() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    assert!(t.cookie.is_some());

    // Already logged in: the login page bounces home.
    let resp = t.get("/login").await;
    assert_redirect(&resp, "/");

    let resp = t.get("/new-quote").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("action=\"/save-quote\""));
}

#[tokio::test]
async fn invalid_login_rerenders_form_with_error() {
    let mut t = TestApp::sqlite().await;

    for form in [
        "username=admin&password=wrong",
        "username=root&password=admin123",
        "username=admin",
        "",
    ] {
        let resp = t.post("/login", form).await;
        assert_eq!(resp.status(), StatusCode::OK, "form: {form}");
        assert!(body_text(resp).await.contains("Invalid username or password"));
    }

    let resp = t.get("/new-quote").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn login_page_renders_for_anonymous_visitor() {
    let mut t = TestApp::sqlite().await;
    let resp = t.get("/login").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("name=\"username\""));
    assert!(!body.contains("Invalid username or password"));
}

#[tokio::test]
async fn quote_list_is_public() {
    let mut t = TestApp::sqlite().await;

    let resp = t.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(t.cookie.is_some(), "first visit should start a session");
    assert!(body_text(resp).await.contains("/login"));

    t.login().await;
    let resp = t.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Logged in as admin"));
}

#[tokio::test]
async fn save_without_login_redirects_and_inserts_nothing() {
    let mut t = TestApp::sqlite().await;

    let resp = t.post("/save-quote", "text=Hello&author=Alice").await;
    assert_redirect(&resp, "/login");
    assert!(t.stored().await.is_empty());

    let resp = t.post("/delete-quote/1", "").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn created_quote_appears_in_list() {
    let mut t = TestApp::sqlite().await;
    t.login().await;

    let resp = t
        .post(
            "/save-quote",
            "text=Hello&author=Alice&date=2024-03-01&unknownDate=on&time=08%3A15",
        )
        .await;
    assert_redirect(&resp, "/");

    let stored = t.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "Hello");
    assert_eq!(stored[0].author, "Alice");
    assert_eq!(stored[0].date, UNKNOWN);
    assert_eq!(stored[0].time, "08:15");

    let body = body_text(t.get("/").await).await;
    assert!(body.contains("Hello"));
    assert!(body.contains("Alice"));
    assert!(body.contains(&format!("/delete-quote/{}", stored[0].id)));
}

#[tokio::test]
async fn quote_text_is_html_escaped() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    t.post("/save-quote", "text=%3Cscript%3Ex%3C%2Fscript%3E&author=Eve")
        .await;

    let body = body_text(t.get("/").await).await;
    assert!(!body.contains("<script>x</script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn deleting_missing_id_leaves_records_unchanged() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    t.post("/save-quote", "text=Keep&author=Bob").await;
    let before = t.stored().await;

    let resp = t.post("/delete-quote/4242", "").await;
    assert_redirect(&resp, "/");
    let resp = t.post("/delete-quote/not-an-id", "").await;
    assert_redirect(&resp, "/");

    assert_eq!(t.stored().await, before);
}

#[tokio::test]
async fn deleting_existing_id_removes_only_that_quote() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    t.post("/save-quote", "text=First&author=A").await;
    t.post("/save-quote", "text=Second&author=B").await;
    let stored = t.stored().await;
    let (gone, kept) = (&stored[0], &stored[1]);

    let resp = t.post(&format!("/delete-quote/{}", gone.id), "").await;
    assert_redirect(&resp, "/");

    assert_eq!(t.stored().await, vec![kept.clone()]);
    let body = body_text(t.get("/").await).await;
    assert!(!body.contains("First"));
    assert!(body.contains("Second"));
}

#[tokio::test]
async fn logout_revokes_access() {
    let mut t = TestApp::sqlite().await;
    t.login().await;

    let resp = t.get("/logout").await;
    assert_redirect(&resp, "/");

    let resp = t.get("/new-quote").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn replayed_cookie_is_anonymous_after_logout() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    let old_cookie = t.cookie.clone();

    t.get("/logout").await;
    t.cookie = old_cookie;

    let resp = t.get("/new-quote").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn repeated_listing_is_stable() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    t.post("/save-quote", "text=Stable&author=C").await;

    let first = body_text(t.get("/").await).await;
    let second = body_text(t.get("/").await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn tampered_cookie_starts_fresh_session() {
    let mut t = TestApp::sqlite().await;
    t.login().await;
    t.cookie = Some("quotes_session=forged".to_string());

    let resp = t.get("/new-quote").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn document_backend_serves_the_same_flow() {
    let mut t = TestApp::document().await;

    let resp = t.post("/save-quote", "text=Nope&author=X").await;
    assert_redirect(&resp, "/login");

    t.login().await;
    t.post("/save-quote", "text=Hello&author=Alice&unknownTime=on&date=2024-01-01")
        .await;
    t.post("/save-quote", "text=Other&author=Bob").await;

    let stored = t.stored().await;
    assert_eq!(stored.len(), 2);
    let hello = stored
        .iter()
        .find(|q| q.text == "Hello")
        .expect("saved quote missing");
    assert_eq!(hello.date, "2024-01-01");
    assert_eq!(hello.time, UNKNOWN);

    let resp = t.post(&format!("/delete-quote/{}", hello.id), "").await;
    assert_redirect(&resp, "/");
    let resp = t.post("/delete-quote/no-such-document", "").await;
    assert_redirect(&resp, "/");

    let remaining = t.stored().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].text, "Other");

    t.get("/logout").await;
    let resp = t.get("/new-quote").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn static_files_are_served_from_configured_dir() {
    let mut t = TestApp::sqlite().await;
    let public = t.dir.path().join("public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("hello.txt"), "static hello").unwrap();

    let resp = t.get("/hello.txt").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "static hello");

    let resp = t.get("/missing.css").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

/// Backend that is always down.
struct UnavailableStore;

#[async_trait]
impl QuoteStore for UnavailableStore {
    async fn list_all(&self) -> Result<Vec<Quote>, StorageError> {
        Err(StorageError::Document("connection refused".to_string()))
    }

    async fn insert(&self, _quote: NewQuote) -> Result<Quote, StorageError> {
        Err(StorageError::Document("connection refused".to_string()))
    }

    async fn delete_by_id(&self, _id: &QuoteId) -> Result<(), StorageError> {
        Err(StorageError::Document("connection refused".to_string()))
    }
}

/// Quote store that accepts everything and keeps nothing.
struct EmptyQuotes;

#[async_trait]
impl QuoteStore for EmptyQuotes {
    async fn list_all(&self) -> Result<Vec<Quote>, StorageError> {
        Ok(Vec::new())
    }

    async fn insert(&self, quote: NewQuote) -> Result<Quote, StorageError> {
        Ok(Quote {
            id: QuoteId::new("1"),
            text: quote.text,
            author: quote.author,
            date: quote.date,
            time: quote.time,
        })
    }

    async fn delete_by_id(&self, _id: &QuoteId) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-memory sessions whose operations can be switched to fail.
#[derive(Default)]
struct FlakySessions {
    inner: MemorySessionStore,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
    fail_destroy: AtomicBool,
}

impl FlakySessions {
    fn check(flag: &AtomicBool) -> Result<(), SessionError> {
        if flag.load(Ordering::SeqCst) {
            Err(SessionError::Document("session backend offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for FlakySessions {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        Self::check(&self.fail_load)?;
        self.inner.load(id).await
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        Self::check(&self.fail_save)?;
        self.inner.save(session).await
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        Self::check(&self.fail_destroy)?;
        self.inner.destroy(id).await
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        self.inner.purge_expired().await
    }
}

fn app_with(quotes: Arc<dyn QuoteStore>, sessions: Arc<dyn SessionStore>) -> TestApp {
    let dir = TempDir::new().expect("failed to create temp dir");
    let cfg = Config::default();
    let state = AppState {
        quotes,
        sessions,
        credentials: Arc::new(StaticCredentials::new(cfg.users.clone())),
        cookie_key: cookie_key(Some("integration test secret")),
        session_ttl: cfg.session_ttl(),
        secure_cookie: false,
        static_dir: dir.path().join("public"),
    };
    TestApp::from_state(dir, state)
}

fn unavailable_app() -> TestApp {
    app_with(Arc::new(UnavailableStore), Arc::new(MemorySessionStore::new()))
}

fn flaky_session_app() -> (TestApp, Arc<FlakySessions>) {
    let sessions = Arc::new(FlakySessions::default());
    let quotes = Arc::new(EmptyQuotes);
    (app_with(quotes, sessions.clone()), sessions)
}

#[tokio::test]
async fn storage_failures_surface_as_plain_500() {
    let mut t = unavailable_app();

    let resp = t.get("/").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "Error fetching quotes");

    t.login().await;

    let resp = t.post("/save-quote", "text=Hello&author=Alice").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "Error saving quote");

    let resp = t.post("/delete-quote/1", "").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "Error deleting quote");
}

#[tokio::test]
async fn secure_cookie_flag_is_opt_in() {
    let mut t = TestApp::sqlite().await;
    let resp = t.get("/").await;
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("first visit should set a cookie")
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
    assert!(!set_cookie.contains("Secure"));
}

#[tokio::test]
async fn failing_session_save_is_a_plain_500() {
    let (mut t, sessions) = flaky_session_app();
    sessions.fail_save.store(true, Ordering::SeqCst);

    let resp = t.get("/").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "Error loading session");
    assert!(t.cookie.is_none());
}

#[tokio::test]
async fn failing_session_load_is_a_plain_500() {
    let (mut t, sessions) = flaky_session_app();

    // No cookie yet, so nothing is loaded.
    let resp = t.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(t.cookie.is_some());

    sessions.fail_load.store(true, Ordering::SeqCst);
    let resp = t.get("/").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "Error loading session");
}

#[tokio::test]
async fn failing_logout_is_a_plain_500() {
    let (mut t, sessions) = flaky_session_app();
    t.login().await;

    sessions.fail_destroy.store(true, Ordering::SeqCst);
    let resp = t.get("/logout").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "Error logging out");

    // Still logged in.
    sessions.fail_destroy.store(false, Ordering::SeqCst);
    let resp = t.get("/new-quote").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_switches_to_a_new_session_id() {
    let mut t = TestApp::sqlite().await;
    t.get("/").await;
    let anonymous = t.cookie.clone().expect("first visit should start a session");

    let resp = t.post("/login", "username=admin&password=admin123").await;
    assert_redirect(&resp, "/");
    let session_cookies = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter(|v| v.to_str().is_ok_and(|v| v.starts_with("quotes_session=")))
        .count();
    assert_eq!(session_cookies, 1);
    let authenticated = t.cookie.clone().expect("login should set a cookie");
    assert_ne!(anonymous, authenticated);

    let resp = t.get("/new-quote").await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The pre-login id was destroyed, so replaying it grants nothing.
    t.cookie = Some(anonymous);
    let resp = t.get("/new-quote").await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn first_request_login_sets_exactly_one_session_cookie() {
    let mut t = TestApp::document().await;
    let resp = t.post("/login", "username=admin&password=admin123").await;
    assert_redirect(&resp, "/");
    let session_cookies = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter(|v| v.to_str().is_ok_and(|v| v.starts_with("quotes_session=")))
        .count();
    assert_eq!(session_cookies, 1);

    let resp = t.get("/new-quote").await;
    assert_eq!(resp.status(), StatusCode::OK);
}
