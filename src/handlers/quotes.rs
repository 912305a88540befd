//! Quote list and the authenticated create/delete routes.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::{NewQuote, QuoteId, UNKNOWN};
use crate::error::{OrPage, PageFailure};
use crate::handlers::found;
use crate::middleware::{CurrentSession, RequireLogin};
use crate::router::AppState;
use crate::views::{IndexTemplate, NewQuoteTemplate, render};

/// Body of `POST /save-quote`. The unknown flags are checkboxes: present means set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuoteForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub unknown_date: Option<String>,
    pub unknown_time: Option<String>,
}

impl SaveQuoteForm {
    pub fn into_new_quote(self) -> NewQuote {
        NewQuote {
            text: self.text,
            author: self.author,
            date: resolve(self.date, self.unknown_date.is_some()),
            time: resolve(self.time, self.unknown_time.is_some()),
        }
    }
}

fn resolve(value: Option<String>, unknown: bool) -> String {
    match value {
        Some(v) if !unknown => v,
        _ => UNKNOWN.to_string(),
    }
}

/// GET / -> every quote, readable without logging in.
pub async fn list_quotes(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, PageFailure> {
    const FAILURE: &str = "Error fetching quotes";

    let quotes = state.quotes.list_all().await.or_page(FAILURE)?;
    debug!(count = quotes.len(), "fetched quotes");

    let page = render(&IndexTemplate {
        quotes,
        username: session.username().map(str::to_owned),
    })
    .or_page(FAILURE)?;
    Ok(page.into_response())
}

/// GET /new-quote
pub async fn new_quote_form(RequireLogin(_user): RequireLogin) -> Result<Response, PageFailure> {
    let page = render(&NewQuoteTemplate).or_page("Error rendering form")?;
    Ok(page.into_response())
}

/// POST /save-quote
pub async fn save_quote(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Form(form): Form<SaveQuoteForm>,
) -> Result<Response, PageFailure> {
    let quote = state
        .quotes
        .insert(form.into_new_quote())
        .await
        .or_page("Error saving quote")?;
    info!(id = %quote.id, user = %user.username, "quote saved");
    Ok(found("/"))
}

/// POST /delete-quote/{id}
pub async fn delete_quote(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, PageFailure> {
    let id = QuoteId::new(id);
    state
        .quotes
        .delete_by_id(&id)
        .await
        .or_page("Error deleting quote")?;
    info!(id = %id, user = %user.username, "quote deleted");
    Ok(found("/"))
}
