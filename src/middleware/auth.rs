use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;
use tracing::debug;

use crate::handlers::found;
use crate::middleware::session::CurrentSession;
use crate::session::SessionUser;

/// Gate for mutating routes: yields the logged-in user or redirects to `/login`.
#[derive(Debug, Clone)]
pub struct RequireLogin(pub SessionUser);

impl<S> FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        match session.user {
            Some(user) => Ok(Self(user)),
            None => {
                debug!(path = %parts.uri.path(), "anonymous request to protected route");
                Err(found("/login"))
            }
        }
    }
}
