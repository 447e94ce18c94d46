//! Request extractors: per-request user access and authentication.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::db::UserRepository;
use crate::domain::User;
use crate::error::AuthError;
use crate::manager::UserManager;
use crate::state::AppState;

/// Opens a database session for the request and binds a repository to it.
impl FromRequestParts<AppState> for UserRepository {
    type Rejection = AuthError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.db.users()?)
    }
}

/// User manager bound to this request's database session.
impl FromRequestParts<AppState> for UserManager {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let users = UserRepository::from_request_parts(parts, state).await?;
        Ok(UserManager::new(
            users,
            state.hooks.clone(),
            state.settings.clone(),
        ))
    }
}

/// Authenticated, active user.
/// Add this as a handler parameter to require authentication (401 otherwise).
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    /// Session token the request authenticated with
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let (user_id, token) = state
            .backend
            .authenticate(&jar)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let user = state
            .db
            .users()?
            .get(user_id)?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthorized)?;

        Ok(CurrentUser { user, token })
    }
}

/// Authenticated, active superuser (403 for other users).
#[derive(Clone, Debug)]
pub struct Superuser(pub User);

impl FromRequestParts<AppState> for Superuser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            return Err(AuthError::Forbidden);
        }
        Ok(Superuser(user))
    }
}
