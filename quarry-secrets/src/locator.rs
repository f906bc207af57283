use std::{fmt, str::FromStr};

use quarry_core::err::{bail, ensure, Context, Error, Result};
use url::Url;

/// Identifies a credential pair held by an external secret store.
///
/// Locators are URLs: the scheme selects the store and the remainder is
/// interpreted by that store, eg `vault://kv/snowflake/prod`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretLocator {
    url: Url,
}

impl SecretLocator {
    pub fn parse(locator: &str) -> Result<Self> {
        let locator = locator.trim();
        ensure!(!locator.is_empty(), "Secret locator must not be empty");

        let url = Url::parse(locator)
            .with_context(|| format!("Failed to parse secret locator '{locator}'"))?;

        if url.cannot_be_a_base() {
            bail!("Secret locator '{locator}' must be of the form <store>://<path>");
        }

        Ok(Self { url })
    }

    /// The secret store this locator refers to
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// The first segment after the scheme
    pub fn authority(&self) -> Option<&str> {
        self.url.host_str().filter(|h| !h.is_empty())
    }

    /// The remaining path, without the leading slash
    pub fn path(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }

    /// Gets a query parameter from the locator, eg `?password_key=pw`
    pub fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl FromStr for SecretLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SecretLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for SecretLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretLocator").field(&self.as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_locator_parse_vault() {
        let locator = SecretLocator::parse("vault://kv/snowflake/prod").unwrap();

        assert_eq!(locator.scheme(), "vault");
        assert_eq!(locator.authority(), Some("kv"));
        assert_eq!(locator.path(), "snowflake/prod");
        assert_eq!(locator.param("password_key"), None);
        assert_eq!(locator.to_string(), "vault://kv/snowflake/prod");
    }

    #[test]
    fn test_secret_locator_parse_with_params() {
        let locator: SecretLocator = " vault://kv/app?username_key=user&password_key=pw "
            .parse()
            .unwrap();

        assert_eq!(locator.path(), "app");
        assert_eq!(locator.param("username_key"), Some("user".into()));
        assert_eq!(locator.param("password_key"), Some("pw".into()));
    }

    #[test]
    fn test_secret_locator_parse_invalid() {
        SecretLocator::parse("").unwrap_err();
        SecretLocator::parse("   ").unwrap_err();
        SecretLocator::parse("not a locator").unwrap_err();
        SecretLocator::parse("mailto:someone").unwrap_err();
    }
}
