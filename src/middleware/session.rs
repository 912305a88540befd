//! Per-request session resolution.
//!
//! `resolve_session` runs in front of every route: it reads the private session
//! cookie, loads the session (or starts a fresh one), and hands it to handlers
//! as a request extension. Handlers pick it up with [`CurrentSession`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use tracing::{debug, error};

use crate::router::AppState;
use crate::session::Session;

/// Cookie name for the session id
pub const SESSION_COOKIE: &str = "quotes_session";

/// Build the session cookie for `id`.
pub fn session_cookie(state: &AppState, id: String) -> Cookie<'static> {
    let max_age = time::Duration::try_from(state.session_ttl).unwrap_or(time::Duration::MAX);
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookie)
        .max_age(max_age)
        .build()
}

/// A removal cookie matching the attributes of [`session_cookie`].
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

pub async fn resolve_session(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.load(cookie.value()).await,
        None => Ok(None),
    };

    let (session, fresh) = match existing {
        Ok(Some(session)) => (session, false),
        Ok(None) => {
            let session = Session::new(state.session_ttl);
            if let Err(e) = state.sessions.save(&session).await {
                error!(error = %e, "Error creating session");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading session").into_response();
            }
            debug!("started new session");
            (session, true)
        }
        Err(e) => {
            error!(error = %e, "Error loading session");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading session").into_response();
        }
    };

    let id = session.id.clone();
    req.extensions_mut().insert(session);
    let response = next.run(req).await;

    // Handlers that rotate or clear the session set the cookie themselves.
    if fresh && !sets_session_cookie(&response) {
        (jar.add(session_cookie(&state, id)), response).into_response()
    } else {
        response
    }
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.strip_prefix(SESSION_COOKIE)
                .is_some_and(|rest| rest.starts_with('='))
        })
}

/// The session resolved for this request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(Self(session.clone())),
            None => {
                error!("session middleware is not installed on this route");
                Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
            }
        }
    }
}
