use std::fmt;

use quarry_core::config::{is_blank, SensitiveString};
use quarry_logging::debug;
use quarry_secrets::{CredentialService, SecretLocator, UsernamePassword};
use secrecy::SecretString;

use crate::{SnowflakeError, SnowflakeJdbcConnectionConfig};

/// Where the credentials for a connection come from
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Entered directly in the source options
    Inline {
        username: Option<String>,
        password: Option<SensitiveString>,
    },
    /// Held by a secret store, referenced by locator
    Indirect(String),
}

impl CredentialSource {
    /// A non-blank secret locator takes precedence over inline credentials.
    /// Validation rejects configs which set both.
    pub fn from_config(conf: &SnowflakeJdbcConnectionConfig) -> Self {
        match conf.secret_resource_url.as_deref().map(str::trim) {
            Some(locator) if !locator.is_empty() => Self::Indirect(locator.to_string()),
            _ => Self::Inline {
                username: if is_blank(&conf.username) {
                    None
                } else {
                    conf.username.as_ref().map(|u| u.trim().to_string())
                },
                password: conf.password.clone().filter(|p| !p.is_empty()),
            },
        }
    }

    /// Produces the credentials for a new data source.
    ///
    /// Secrets are looked up on every call so rotated credentials are
    /// picked up when the data source is rebuilt. The lookup may block.
    pub fn resolve(
        &self,
        secrets: &dyn CredentialService,
    ) -> Result<ResolvedCredentials, SnowflakeError> {
        match self {
            CredentialSource::Inline { username, password } => {
                let username = username
                    .clone()
                    .ok_or(SnowflakeError::MissingCredential("username"))?;
                let password = password
                    .as_ref()
                    .ok_or(SnowflakeError::MissingCredential("password"))?;

                Ok(ResolvedCredentials {
                    username,
                    password: password.to_secret(),
                })
            }
            CredentialSource::Indirect(locator) => {
                let resolution_error = |err: quarry_core::err::Error| {
                    SnowflakeError::CredentialResolution {
                        locator: locator.clone(),
                        source: err.into(),
                    }
                };

                let parsed = SecretLocator::parse(locator).map_err(resolution_error)?;
                let creds = secrets.fetch(&parsed).map_err(resolution_error)?;
                debug!("Resolved credentials from secret {}", parsed);

                Ok(creds.into())
            }
        }
    }
}

/// Resolves the credentials for the supplied options.
///
/// When a secret locator is set the secret store's credentials are used,
/// even if inline credentials are also present.
pub fn resolve_credentials(
    conf: &SnowflakeJdbcConnectionConfig,
    secrets: &dyn CredentialService,
) -> Result<ResolvedCredentials, SnowflakeError> {
    CredentialSource::from_config(conf).resolve(secrets)
}

/// Credentials used to open connections. Never stored or logged.
#[derive(Clone)]
pub struct ResolvedCredentials {
    pub username: String,
    pub password: SecretString,
}

impl From<UsernamePassword> for ResolvedCredentials {
    fn from(creds: UsernamePassword) -> Self {
        Self {
            username: creds.username,
            password: creds.password,
        }
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials").finish_non_exhaustive()
    }
}
