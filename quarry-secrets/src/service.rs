use std::fmt;

use quarry_core::err::Result;
use secrecy::{ExposeSecret, SecretString};

use crate::SecretLocator;

/// A username and password pair fetched from a secret store
#[derive(Clone)]
pub struct UsernamePassword {
    pub username: String,
    pub password: SecretString,
}

impl UsernamePassword {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl PartialEq for UsernamePassword {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl fmt::Debug for UsernamePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePassword")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Resolves secret locators into credentials.
///
/// Lookups may block on network I/O. Implementations do not retry or
/// impose their own deadline beyond what their client is configured with.
pub trait CredentialService: Send + Sync {
    fn fetch(&self, locator: &SecretLocator) -> Result<UsernamePassword>;
}
