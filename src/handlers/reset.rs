//! Forgot-password and reset-password flow.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::is_valid_email;
use crate::error::AuthError;
use crate::handlers::extract::JsonBody;
use crate::manager::UserManager;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// POST /forgot-password - Always 202, whether or not the address is known
pub async fn forgot_password(
    manager: UserManager,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    if !is_valid_email(&req.email) {
        return Err(AuthError::InvalidEmail);
    }

    if let Some(user) = manager.get_by_email(&req.email)? {
        match manager.forgot_password(&user).await {
            Ok(()) | Err(AuthError::UserInactive) => {}
            Err(e) => return Err(e),
        }
    }

    Ok((StatusCode::ACCEPTED, Json(Value::Null)))
}

/// POST /reset-password - Set a new password using a reset token
pub async fn reset_password(
    manager: UserManager,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<Value>, AuthError> {
    match manager.reset_password(&req.token, &req.password).await {
        Ok(_) => Ok(Json(Value::Null)),
        Err(AuthError::UserInactive) => Err(AuthError::ResetPasswordBadToken),
        Err(e) => Err(e),
    }
}
