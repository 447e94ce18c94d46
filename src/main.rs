use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_auth::auth::{MemoryStore, RedisStore, SessionStore};
use user_auth::config::{self, SessionBackend};
use user_auth::db::Database;
use user_auth::handlers;
use user_auth::state::AppState;

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "user_auth=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = config::load().expect("Failed to load configuration");
  if config.secrets.uses_placeholder() {
    tracing::warn!("Token secrets are still the placeholder value; set RESET_PASSWORD_SECRET and VERIFICATION_SECRET");
  }

  let db = Database::init(&config.database.path).expect("Failed to initialize database");

  let store: Arc<dyn SessionStore> = match config.session.backend {
    SessionBackend::Redis => {
      let store = RedisStore::connect(&config.session.redis_url)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to {}: {}", config.session.redis_url, e));
      tracing::info!("Session store: {}", config.session.redis_url);
      Arc::new(store)
    }
    SessionBackend::Memory => {
      tracing::warn!("Using in-memory session store; sessions are lost on restart");
      Arc::new(MemoryStore::new())
    }
  };

  let state = AppState::from_config(&config, db, store);
  let app = handlers::app(state);

  let bind_addr = config.server.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
