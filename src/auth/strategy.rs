//! Token strategy backed by a key-value session store.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::store::{SessionStore, StoreError};

/// Issues opaque tokens and resolves them to user ids through a [`SessionStore`].
///
/// Each token is stored as `<key_prefix><token> -> <user id>` with a fixed
/// lifetime. Lookups do not extend the lifetime.
#[derive(Clone)]
pub struct RedisStrategy {
    store: Arc<dyn SessionStore>,
    lifetime: Duration,
    key_prefix: String,
}

impl RedisStrategy {
    pub fn new(store: Arc<dyn SessionStore>, lifetime: Duration) -> Self {
        Self {
            store,
            lifetime,
            key_prefix: "user_auth_token:".to_string(),
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    fn key(&self, token: &str) -> String {
        format!("{}{}", self.key_prefix, token)
    }

    /// Issue a new token for `user_id` and store it.
    pub async fn write_token(&self, user_id: Uuid) -> Result<String, StoreError> {
        let token = generate_token();
        self.store
            .set_ex(&self.key(&token), &user_id.to_string(), self.lifetime)
            .await?;
        Ok(token)
    }

    /// Resolve a token to the user id it was issued for.
    /// Unknown, expired, or corrupt entries resolve to `None`.
    pub async fn read_token(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        if token.is_empty() {
            return Ok(None);
        }
        let value = self.store.get(&self.key(token)).await?;
        Ok(value.and_then(|id| match Uuid::parse_str(&id) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Session store holds a non-UUID user id");
                None
            }
        }))
    }

    pub async fn destroy_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.del(&self.key(token)).await
    }
}

/// 32 random bytes, base64url without padding
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;

    fn strategy(store: &MemoryStore, lifetime: Duration) -> RedisStrategy {
        RedisStrategy::new(Arc::new(store.clone()), lifetime)
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        let strategy = strategy(&store, Duration::from_secs(3600));
        let user_id = Uuid::new_v4();

        let token = strategy.write_token(user_id).await.unwrap();
        assert_eq!(token.len(), 43);
        assert_eq!(strategy.read_token(&token).await.unwrap(), Some(user_id));

        let stored = store.get(&format!("user_auth_token:{token}")).await.unwrap();
        assert_eq!(stored, Some(user_id.to_string()));
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = MemoryStore::new();
        let strategy = strategy(&store, Duration::from_secs(3600));
        let user_id = Uuid::new_v4();
        let a = strategy.write_token(user_id).await.unwrap();
        let b = strategy.write_token(user_id).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_and_empty_tokens() {
        let store = MemoryStore::new();
        let strategy = strategy(&store, Duration::from_secs(3600));
        assert_eq!(strategy.read_token("nope").await.unwrap(), None);
        assert_eq!(strategy.read_token("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = MemoryStore::new();
        let strategy = strategy(&store, Duration::from_secs(3600));
        let token = strategy.write_token(Uuid::new_v4()).await.unwrap();
        strategy.destroy_token(&token).await.unwrap();
        assert_eq!(strategy.read_token(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiry() {
        let store = MemoryStore::new();
        let strategy = strategy(&store, Duration::from_millis(20));
        let token = strategy.write_token(Uuid::new_v4()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(strategy.read_token(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let store = MemoryStore::new();
        let strategy = strategy(&store, Duration::from_secs(60)).with_key_prefix("s:");
        let token = strategy.write_token(Uuid::new_v4()).await.unwrap();
        assert!(store.get(&format!("s:{token}")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_value() {
        let store = MemoryStore::new();
        store
            .set_ex("user_auth_token:bad", "not-a-uuid", Duration::from_secs(60))
            .await
            .unwrap();
        let strategy = strategy(&store, Duration::from_secs(60));
        assert_eq!(strategy.read_token("bad").await.unwrap(), None);
    }
}
