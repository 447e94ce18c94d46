//! Shared setup for HTTP tests: a fresh database in a temp dir and an
//! in-memory session store behind the real router.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use serde_json::json;
use tempfile::TempDir;

use user_auth::auth::{AuthenticationBackend, CookieTransport, MemoryStore, RedisStrategy};
use user_auth::config::AppConfig;
use user_auth::db::{Database, UserChanges};
use user_auth::domain::{User, UserRead};
use user_auth::handlers;
use user_auth::manager::{ManagerSettings, UserHooks};
use user_auth::state::{AppState, BACKEND_NAME};

pub const COOKIE_NAME: &str = "auth_session";
pub const LOGIN_PATH: &str = "/auth/redis/login";
pub const LOGOUT_PATH: &str = "/auth/redis/logout";

/// Captures the tokens handed to hooks so tests can act on them.
#[derive(Default)]
pub struct RecordingHooks {
    pub reset_tokens: Mutex<Vec<String>>,
    pub logins: Mutex<Vec<String>>,
}

impl RecordingHooks {
    pub fn last_reset_token(&self) -> Option<String> {
        self.reset_tokens.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl UserHooks for RecordingHooks {
    async fn on_after_login(&self, user: &User) {
        self.logins.lock().unwrap().push(user.email.clone());
    }

    async fn on_after_forgot_password(&self, _user: &User, token: &str) {
        self.reset_tokens.lock().unwrap().push(token.to_string());
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub store: MemoryStore,
    pub hooks: Arc<RecordingHooks>,
    _temp: TempDir,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with_session_lifetime(Duration::from_secs(3600))
}

pub fn spawn_app_with_session_lifetime(lifetime: Duration) -> TestApp {
    let temp = TempDir::new().unwrap();
    let db = Database::init(&temp.path().join("users.db")).unwrap();
    let config = AppConfig::default();

    let store = MemoryStore::new();
    let strategy = RedisStrategy::new(Arc::new(store.clone()), lifetime)
        .with_key_prefix(config.session.key_prefix.clone());
    let backend = AuthenticationBackend::new(
        BACKEND_NAME,
        CookieTransport::new(&config.cookie),
        strategy,
    );
    let hooks = Arc::new(RecordingHooks::default());
    let state = AppState::new(
        db.clone(),
        backend,
        hooks.clone(),
        ManagerSettings::from_config(&config),
    );

    let server = TestServer::new(handlers::app(state)).unwrap();
    TestApp {
        server,
        db,
        store,
        hooks,
        _temp: temp,
    }
}

impl TestApp {
    pub async fn register(&self, email: &str, password: &str) -> UserRead {
        let res = self
            .server
            .post("/auth/register")
            .json(&json!({ "email": email, "password": password }))
            .await;
        res.assert_status(StatusCode::CREATED);
        res.json::<UserRead>()
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post(LOGIN_PATH)
            .form(&[("username", email), ("password", password)])
            .await
    }

    /// Log in and return the session cookie set by the response.
    pub async fn session_cookie(&self, email: &str, password: &str) -> Cookie<'static> {
        let res = self.login(email, password).await;
        res.assert_status(StatusCode::NO_CONTENT);
        res.cookie(COOKIE_NAME)
    }

    /// Register a user and promote it straight in the database.
    pub async fn superuser(&self, email: &str, password: &str) -> UserRead {
        let created = self.register(email, password).await;
        let users = self.db.users().unwrap();
        let user = users.get(created.id).unwrap().unwrap();
        let changes = UserChanges {
            is_superuser: Some(true),
            ..Default::default()
        };
        UserRead::from(users.update(&user, changes).unwrap())
    }

    pub fn stored_user(&self, email: &str) -> User {
        self.db.users().unwrap().get_by_email(email).unwrap().unwrap()
    }
}
