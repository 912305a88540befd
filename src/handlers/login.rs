//! Login and logout.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::info;

use crate::error::{OrPage, PageFailure};
use crate::handlers::found;
use crate::middleware::CurrentSession;
use crate::middleware::session::{expired_session_cookie, session_cookie};
use crate::router::AppState;
use crate::session::Session;
use crate::views::{LoginTemplate, render};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Login form data. Missing fields fail verification like wrong ones.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// GET /login
pub async fn login_page(CurrentSession(session): CurrentSession) -> Result<Response, PageFailure> {
    // If already logged in, go home
    if session.is_authenticated() {
        return Ok(found("/"));
    }

    let page = render(&LoginTemplate { error: None }).or_page("Error rendering login page")?;
    Ok(page.into_response())
}

/// POST /login
///
/// A successful login moves the user to a new session id; the pre-login id is
/// destroyed.
pub async fn login_submit(
    State(state): State<AppState>,
    CurrentSession(previous): CurrentSession,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageFailure> {
    let Some(user) = state.credentials.verify(&form.username, &form.password) else {
        info!(username = %form.username, "login failed");
        let page = render(&LoginTemplate {
            error: Some(INVALID_CREDENTIALS.to_string()),
        })
        .or_page("Error rendering login page")?;
        return Ok(page.into_response());
    };

    info!(username = %user.username, "login successful");
    let mut session = Session::new(state.session_ttl);
    session.user = Some(user);
    state
        .sessions
        .save(&session)
        .await
        .or_page("Error logging in")?;
    state
        .sessions
        .destroy(&previous.id)
        .await
        .or_page("Error logging in")?;

    let cookie = session_cookie(&state, session.id);
    Ok((jar.add(cookie), found("/")).into_response())
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: PrivateCookieJar,
) -> Result<Response, PageFailure> {
    state
        .sessions
        .destroy(&session.id)
        .await
        .or_page("Error logging out")?;
    info!(username = session.username().unwrap_or("<anonymous>"), "logged out");
    Ok((jar.remove(expired_session_cookie()), found("/")).into_response())
}
