//! Request error type and its HTTP mapping.
//!
//! Every failure a handler can produce becomes a status code plus a JSON
//! body of the form `{"detail": ...}`. Client errors carry a stable
//! upper-case code; password-policy failures carry `{code, reason}`.

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not Found")]
    NotFound,

    #[error("value is not a valid email address")]
    InvalidEmail,

    #[error("LOGIN_BAD_CREDENTIALS")]
    LoginBadCredentials,

    #[error("REGISTER_USER_ALREADY_EXISTS")]
    UserAlreadyExists,

    #[error("REGISTER_INVALID_PASSWORD: {0}")]
    RegisterInvalidPassword(String),

    #[error("RESET_PASSWORD_BAD_TOKEN")]
    ResetPasswordBadToken,

    #[error("RESET_PASSWORD_INVALID_PASSWORD: {0}")]
    ResetPasswordInvalidPassword(String),

    #[error("UPDATE_USER_EMAIL_ALREADY_EXISTS")]
    UpdateEmailAlreadyExists,

    #[error("UPDATE_USER_INVALID_PASSWORD: {0}")]
    UpdateInvalidPassword(String),

    #[error("USER_INACTIVE")]
    UserInactive,

    #[error("VERIFY_USER_ALREADY_VERIFIED")]
    UserAlreadyVerified,

    #[error("VERIFY_USER_BAD_TOKEN")]
    VerifyBadToken,

    #[error("{0}")]
    JsonBody(#[from] JsonRejection),

    #[error("{0}")]
    FormBody(#[from] FormRejection),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("session store error: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidEmail => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::LoginBadCredentials
            | AuthError::UserAlreadyExists
            | AuthError::RegisterInvalidPassword(_)
            | AuthError::ResetPasswordBadToken
            | AuthError::ResetPasswordInvalidPassword(_)
            | AuthError::UpdateEmailAlreadyExists
            | AuthError::UpdateInvalidPassword(_)
            | AuthError::UserInactive
            | AuthError::UserAlreadyVerified
            | AuthError::VerifyBadToken => StatusCode::BAD_REQUEST,
            AuthError::JsonBody(rejection) => rejection.status(),
            AuthError::FormBody(rejection) => rejection.status(),
            AuthError::Database(_)
            | AuthError::Store(_)
            | AuthError::PasswordHash(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `detail` value sent to the client.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            AuthError::RegisterInvalidPassword(reason) => {
                json!({ "code": "REGISTER_INVALID_PASSWORD", "reason": reason })
            }
            AuthError::ResetPasswordInvalidPassword(reason) => {
                json!({ "code": "RESET_PASSWORD_INVALID_PASSWORD", "reason": reason })
            }
            AuthError::UpdateInvalidPassword(reason) => {
                json!({ "code": "UPDATE_USER_INVALID_PASSWORD", "reason": reason })
            }
            AuthError::JsonBody(rejection) => json!(rejection.body_text()),
            AuthError::FormBody(rejection) => json!(rejection.body_text()),
            AuthError::Database(_)
            | AuthError::Store(_)
            | AuthError::PasswordHash(_)
            | AuthError::Internal(_) => json!("Internal Server Error"),
            other => json!(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
