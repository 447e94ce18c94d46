pub mod auth;
pub mod extract;
pub mod register;
pub mod reset;
pub mod users;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::{AppState, BACKEND_NAME};

/// Build the full application router.
///
/// ```text
/// /auth/redis/login    POST
/// /auth/redis/logout   POST
/// /auth/register       POST
/// /auth/forgot-password POST
/// /auth/reset-password POST
/// /users/me            GET, PATCH
/// /users/{id}          GET, PATCH, DELETE (superuser)
/// ```
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(&format!("/auth/{}", BACKEND_NAME), auth::router())
        .nest("/auth", register::router().merge(reset::router()))
        .nest("/users", users::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
