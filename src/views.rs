//! Askama views.

use askama::Template;
use axum::response::Html;

use crate::db::Quote;
use crate::error::AppError;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub quotes: Vec<Quote>,
    pub username: Option<String>,
}

#[derive(Template)]
#[template(path = "new_quote.html")]
pub struct NewQuoteTemplate;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Render a template into an HTML response body.
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
