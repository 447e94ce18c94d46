use axum::{http::StatusCode, routing::post, Json, Router};

use crate::domain::{UserCreate, UserRead};
use crate::error::AuthError;
use crate::handlers::extract::JsonBody;
use crate::manager::UserManager;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

/// POST /register - Create an account. Privilege flags in the body are ignored.
pub async fn register(
    manager: UserManager,
    JsonBody(input): JsonBody<UserCreate>,
) -> Result<(StatusCode, Json<UserRead>), AuthError> {
    let user = manager.create(input, true).await?;
    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}
