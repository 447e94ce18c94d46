//! Body extractors whose rejections use the `{"detail": ...}` error shape.

use axum::extract::FromRequest;

use crate::error::AuthError;

/// JSON request body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AuthError))]
pub struct JsonBody<T>(pub T);

/// URL-encoded form body.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AuthError))]
pub struct FormBody<T>(pub T);
