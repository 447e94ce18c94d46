//! Authentication: cookie transport, session-store strategy, and extractors.

pub mod backend;
pub mod middleware;
pub mod password;
pub mod store;
pub mod strategy;
pub mod tokens;
pub mod transport;

pub use backend::AuthenticationBackend;
pub use middleware::{CurrentUser, Superuser};
pub use store::{MemoryStore, RedisStore, SessionStore, StoreError};
pub use strategy::RedisStrategy;
pub use transport::CookieTransport;
