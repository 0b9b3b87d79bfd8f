//! HTTP route handlers.

pub mod frontend;
pub mod health;
pub mod login;
pub mod logout;
pub mod me;
pub mod proxy;
pub mod recaptcha;
pub mod registry;

use crate::error::AppError;

/// Unknown `/api` paths never fall through to the frontend.
pub async fn api_not_found() -> AppError {
    AppError::NotFound
}
