//! Credential verification for the login form.

use subtle::ConstantTimeEq;

use crate::config::UserCredential;
use crate::session::SessionUser;

/// Something that can check a username/password pair.
pub trait CredentialProvider: Send + Sync {
    /// The identity to store in the session, or `None` when the pair is rejected.
    fn verify(&self, username: &str, password: &str) -> Option<SessionUser>;
}

/// A fixed table of plaintext pairs, compared by exact string equality.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    users: Vec<UserCredential>,
}

impl StaticCredentials {
    pub fn new(users: Vec<UserCredential>) -> Self {
        Self { users }
    }
}

impl CredentialProvider for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> Option<SessionUser> {
        self.users
            .iter()
            .find(|u| {
                let name_ok = u.username.as_bytes().ct_eq(username.as_bytes());
                let pass_ok = u.password.as_bytes().ct_eq(password.as_bytes());
                bool::from(name_ok & pass_ok)
            })
            .map(|u| SessionUser {
                username: u.username.clone(),
            })
    }
}
