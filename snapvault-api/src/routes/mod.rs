/// Route handlers
///
/// - `health`: Health check endpoint
/// - `users`: Sign up, sign in/out, password reset
/// - `galleries`: Gallery management and images

pub mod galleries;
pub mod health;
pub mod users;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// `302 Found` redirect to `location`
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
