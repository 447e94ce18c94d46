//! Application state shared by all handlers.

use std::sync::Arc;

use crate::auth::backend::AuthenticationBackend;
use crate::auth::store::SessionStore;
use crate::auth::strategy::RedisStrategy;
use crate::auth::transport::CookieTransport;
use crate::config::AppConfig;
use crate::db::Database;
use crate::manager::{LoggingHooks, ManagerSettings, UserHooks};

/// Name of the single mounted authentication backend
pub const BACKEND_NAME: &str = "redis";

#[derive(Clone)]
pub struct AppState {
    /// Users database (one connection opened per request)
    pub db: Database,

    /// Cookie transport + session-store strategy
    pub backend: Arc<AuthenticationBackend>,

    pub hooks: Arc<dyn UserHooks>,

    pub settings: Arc<ManagerSettings>,
}

impl AppState {
    pub fn new(
        db: Database,
        backend: AuthenticationBackend,
        hooks: Arc<dyn UserHooks>,
        settings: ManagerSettings,
    ) -> Self {
        Self {
            db,
            backend: Arc::new(backend),
            hooks,
            settings: Arc::new(settings),
        }
    }

    /// Wire the state from configuration, using the logging hooks.
    pub fn from_config(config: &AppConfig, db: Database, store: Arc<dyn SessionStore>) -> Self {
        let strategy = RedisStrategy::new(store, config.session.lifetime())
            .with_key_prefix(config.session.key_prefix.clone());
        let backend = AuthenticationBackend::new(
            BACKEND_NAME,
            CookieTransport::new(&config.cookie),
            strategy,
        );
        Self::new(
            db,
            backend,
            Arc::new(LoggingHooks),
            ManagerSettings::from_config(config),
        )
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn UserHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}
