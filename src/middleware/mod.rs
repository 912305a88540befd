pub mod auth;
pub mod session;

pub use auth::RequireLogin;
pub use session::{CurrentSession, SESSION_COOKIE, resolve_session};
