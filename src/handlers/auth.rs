//! Cookie login and logout for the session-store backend.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AuthError;
use crate::handlers::extract::FormBody;
use crate::manager::UserManager;
use crate::state::AppState;

/// OAuth2 password-flow form. `username` holds the email.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// POST /login - Check credentials and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    manager: UserManager,
    jar: CookieJar,
    FormBody(form): FormBody<LoginForm>,
) -> Result<(CookieJar, StatusCode), AuthError> {
    let user = manager
        .authenticate(&form.username, &form.password)?
        .filter(|u| u.is_active)
        .ok_or(AuthError::LoginBadCredentials)?;

    let response = state.backend.login(jar, user.id).await?;
    manager.hooks().on_after_login(&user).await;

    tracing::debug!("User {} logged in via {}", user.id, state.backend.name);
    Ok(response)
}

/// POST /logout - Destroy the session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AuthError> {
    let response = state.backend.logout(jar, &current.token).await?;
    tracing::debug!("User {} logged out", current.user.id);
    Ok(response)
}
