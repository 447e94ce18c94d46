//! Authentication backend: a transport paired with a strategy.

use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::store::StoreError;
use super::strategy::RedisStrategy;
use super::transport::CookieTransport;

pub struct AuthenticationBackend {
    pub name: String,
    pub transport: CookieTransport,
    pub strategy: RedisStrategy,
}

impl AuthenticationBackend {
    pub fn new(name: impl Into<String>, transport: CookieTransport, strategy: RedisStrategy) -> Self {
        Self {
            name: name.into(),
            transport,
            strategy,
        }
    }

    /// Issue a session for `user_id` and attach it to the response cookies.
    pub async fn login(
        &self,
        jar: CookieJar,
        user_id: Uuid,
    ) -> Result<(CookieJar, StatusCode), StoreError> {
        let token = self.strategy.write_token(user_id).await?;
        Ok((self.transport.login(jar, token), StatusCode::NO_CONTENT))
    }

    /// Destroy `token` and clear the cookie.
    pub async fn logout(
        &self,
        jar: CookieJar,
        token: &str,
    ) -> Result<(CookieJar, StatusCode), StoreError> {
        self.strategy.destroy_token(token).await?;
        Ok((self.transport.logout(jar), StatusCode::NO_CONTENT))
    }

    /// Resolve the request's cookie to a user id, if it carries a live session.
    pub async fn authenticate(&self, jar: &CookieJar) -> Result<Option<(Uuid, String)>, StoreError> {
        let Some(token) = self.transport.read(jar) else {
            return Ok(None);
        };
        let user_id = self.strategy.read_token(&token).await?;
        Ok(user_id.map(|id| (id, token)))
    }
}
