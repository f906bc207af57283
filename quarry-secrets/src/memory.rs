use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use quarry_core::err::{Context, Result};
use quarry_logging::trace;

use crate::{CredentialService, SecretLocator, UsernamePassword};

/// Credential service backed by an in-memory map keyed by locator.
///
/// Used for embedding and tests, where secrets are provisioned up-front.
#[derive(Debug, Default)]
pub struct StaticCredentialService {
    secrets: HashMap<String, UsernamePassword>,
    lookups: AtomicUsize,
}

impl StaticCredentialService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, locator: &str, creds: UsernamePassword) -> Result<Self> {
        let locator = SecretLocator::parse(locator)?;
        self.secrets.insert(locator.to_string(), creds);
        Ok(self)
    }

    /// Number of lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CredentialService for StaticCredentialService {
    fn fetch(&self, locator: &SecretLocator) -> Result<UsernamePassword> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        trace!("Looking up static secret {}", locator);

        self.secrets
            .get(locator.as_str())
            .cloned()
            .with_context(|| format!("Secret '{}' not found", locator))
    }
}
