//! Profile routes for the current user and superuser administration.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{CurrentUser, Superuser};
use crate::domain::{User, UserRead, UserUpdate};
use crate::error::AuthError;
use crate::handlers::extract::JsonBody;
use crate::manager::UserManager;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
}

/// GET /me
pub async fn me(current: CurrentUser) -> Json<UserRead> {
    Json(UserRead::from(current.user))
}

/// PATCH /me - Only email and password can be changed here
pub async fn update_me(
    current: CurrentUser,
    manager: UserManager,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserRead>, AuthError> {
    let user = manager.update(update, &current.user, true).await?;
    Ok(Json(UserRead::from(user)))
}

/// Malformed ids are reported the same as unknown ones.
fn find_user(manager: &UserManager, id: &str) -> Result<User, AuthError> {
    let id = Uuid::parse_str(id).map_err(|_| AuthError::NotFound)?;
    manager.get(id)
}

/// GET /{id}
pub async fn get_user(
    _admin: Superuser,
    manager: UserManager,
    Path(id): Path<String>,
) -> Result<Json<UserRead>, AuthError> {
    let user = find_user(&manager, &id)?;
    Ok(Json(UserRead::from(user)))
}

/// PATCH /{id} - Superusers may change every field, including flags
pub async fn update_user(
    _admin: Superuser,
    manager: UserManager,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserRead>, AuthError> {
    let user = find_user(&manager, &id)?;
    let user = manager.update(update, &user, false).await?;
    Ok(Json(UserRead::from(user)))
}

/// DELETE /{id}
pub async fn delete_user(
    Superuser(admin): Superuser,
    manager: UserManager,
    Path(id): Path<String>,
) -> Result<StatusCode, AuthError> {
    let user = find_user(&manager, &id)?;
    manager.delete(&user).await?;
    tracing::info!("User {} deleted by {}", user.id, admin.id);
    Ok(StatusCode::NO_CONTENT)
}
