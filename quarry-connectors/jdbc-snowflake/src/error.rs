use std::fmt;

use itertools::Itertools;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by the Snowflake connector.
///
/// None of these are retried internally; the operation which raised
/// them is aborted and the cause chain is preserved.
#[derive(Debug, thiserror::Error)]
pub enum SnowflakeError {
    /// Every problem found while validating the source options
    #[error("Invalid Snowflake configuration: {}", .0.iter().join("; "))]
    Configuration(Vec<FieldViolation>),
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("No usable credentials: '{0}' is not set")]
    MissingCredential(&'static str),
    #[error("Failed to resolve credentials from secret '{locator}'")]
    CredentialResolution {
        locator: String,
        #[source]
        source: BoxError,
    },
    #[error("Failed to construct Snowflake data source")]
    DataSourceConstruction(#[source] BoxError),
    #[error("Snowflake connector has been closed")]
    Closed,
}

impl SnowflakeError {
    /// The violations of a configuration error, empty for other errors
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            SnowflakeError::Configuration(v) => v,
            _ => &[],
        }
    }
}

/// A single problem with a configuration field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    Missing(&'static str),
    Invalid { field: &'static str, reason: String },
}

impl FieldViolation {
    pub fn field(&self) -> &'static str {
        match self {
            FieldViolation::Missing(f) => f,
            FieldViolation::Invalid { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldViolation::Missing(field) => write!(f, "'{field}' is required"),
            FieldViolation::Invalid { field, reason } => write!(f, "'{field}' {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use quarry_core::err::{anyhow, Context};

    use super::*;

    #[test]
    fn test_configuration_error_lists_all_violations() {
        let err = SnowflakeError::Configuration(vec![
            FieldViolation::Missing("hostname"),
            FieldViolation::Invalid {
                field: "fetch_size",
                reason: "must be greater than 0".into(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Invalid Snowflake configuration: 'hostname' is required; 'fetch_size' must be greater than 0"
        );
        assert_eq!(
            err.violations().iter().map(|v| v.field()).collect::<Vec<_>>(),
            vec!["hostname", "fetch_size"]
        );
    }

    #[test]
    fn test_credential_resolution_error_keeps_cause() {
        let cause = Err::<(), _>(anyhow!("connection reset"))
            .context("Failed to retrieve vault secret 'app'")
            .unwrap_err();

        let err = SnowflakeError::CredentialResolution {
            locator: "vault://kv/app".into(),
            source: cause.into(),
        };

        assert_eq!(
            err.to_string(),
            "Failed to resolve credentials from secret 'vault://kv/app'"
        );
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Failed to retrieve vault secret 'app'");
        assert_eq!(source.source().unwrap().to_string(), "connection reset");
        assert!(err.violations().is_empty());
    }
}
