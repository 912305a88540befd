pub mod login;
pub mod quotes;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// `302 Found` redirect.
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
