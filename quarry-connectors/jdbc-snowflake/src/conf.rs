use std::time::Duration;

use quarry_connectors_jdbc_base::JdbcConnectionPoolConfig;
use quarry_core::config::{self, is_blank, SensitiveString};
use quarry_secrets::SecretLocator;
use serde::{Deserialize, Serialize};

use crate::{CredentialSource, FieldViolation, SnowflakeError};

pub const DEFAULT_FETCH_SIZE: i32 = 2000;
pub const DEFAULT_MAX_IDLE_CONNS: i32 = 8;
pub const DEFAULT_IDLE_TIME_SEC: i64 = 60;

/// Selects how the connection string is addressed.
///
/// This is always chosen explicitly by the stored config, it is never
/// inferred from which fields happen to be populated. Rows stored before
/// the tag existed only carried a url and so default to [`AddressingScheme::DirectUrl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingScheme {
    /// A complete driver url supplied by the user
    #[default]
    DirectUrl,
    /// An explicit hostname plus the account, warehouse as a url parameter
    HostQualified,
    /// Only the account, the host is derived from it
    AccountSuffix,
}

/// The stored connection options of a Snowflake data source.
///
/// Fields are serialized in declaration order which must stay stable.
/// Fields not used by the selected scheme are kept but ignored, unknown
/// fields are ignored so rows written by other revisions still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowflakeJdbcConnectionConfig {
    #[serde(default)]
    pub addressing: AddressingScheme,
    /// eg jdbc:snowflake://<account_name>.snowflakecomputing.com/?param1=value&param2=value
    /// @see https://docs.snowflake.com/en/developer-guide/jdbc/jdbc-configure
    #[serde(default, alias = "jdbcURL")]
    pub jdbc_url: Option<String>,
    #[serde(default, alias = "accountName")]
    pub account_name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SensitiveString>,
    /// Locator of a secret holding the username and password,
    /// used instead of the inline credentials
    #[serde(default, alias = "secretResourceUrl")]
    pub secret_resource_url: Option<String>,
    /// Number of records fetched per round trip
    #[serde(default = "default_fetch_size", alias = "fetchSize")]
    pub fetch_size: i32,
    #[serde(default = "default_max_idle_conns", alias = "maxIdleConns")]
    pub max_idle_conns: i32,
    #[serde(default = "default_idle_time_sec", alias = "idleTimeSec")]
    pub idle_time_sec: i64,
    /// Whether users may submit queries directly to Snowflake
    #[serde(default, alias = "enableExternalQuery")]
    pub enable_external_query: bool,
}

fn default_fetch_size() -> i32 {
    DEFAULT_FETCH_SIZE
}

fn default_max_idle_conns() -> i32 {
    DEFAULT_MAX_IDLE_CONNS
}

fn default_idle_time_sec() -> i64 {
    DEFAULT_IDLE_TIME_SEC
}

impl Default for SnowflakeJdbcConnectionConfig {
    fn default() -> Self {
        Self {
            addressing: AddressingScheme::default(),
            jdbc_url: None,
            account_name: None,
            hostname: None,
            warehouse: None,
            role: None,
            username: None,
            password: None,
            secret_resource_url: None,
            fetch_size: DEFAULT_FETCH_SIZE,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            idle_time_sec: DEFAULT_IDLE_TIME_SEC,
            enable_external_query: false,
        }
    }
}

impl SnowflakeJdbcConnectionConfig {
    pub fn parse(options: config::Value) -> Result<Self, SnowflakeError> {
        config::from_value::<Self>(options).map_err(|e| {
            SnowflakeError::Configuration(vec![FieldViolation::Invalid {
                field: "options",
                reason: format!("could not be parsed: {e}"),
            }])
        })
    }

    /// Checks the options, reporting every problem found rather than
    /// stopping at the first one.
    pub fn validate(&self) -> Result<SnowflakeValidatedConfig, SnowflakeError> {
        let mut violations = vec![];

        let addressing = Addressing::from_config(self, &mut violations);

        if self.fetch_size <= 0 {
            violations.push(FieldViolation::Invalid {
                field: "fetch_size",
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_idle_conns <= 0 {
            violations.push(FieldViolation::Invalid {
                field: "max_idle_conns",
                reason: "must be greater than 0".into(),
            });
        }

        if self.idle_time_sec <= 0 {
            violations.push(FieldViolation::Invalid {
                field: "idle_time_sec",
                reason: "must be greater than 0".into(),
            });
        }

        let credentials = CredentialSource::from_config(self);

        if let CredentialSource::Indirect(locator) = &credentials {
            if let Err(err) = SecretLocator::parse(locator) {
                violations.push(FieldViolation::Invalid {
                    field: "secret_resource_url",
                    reason: format!("is not a valid secret locator: {err:#}"),
                });
            }

            if !is_blank(&self.username) {
                violations.push(FieldViolation::Invalid {
                    field: "username",
                    reason: "cannot be combined with 'secret_resource_url'".into(),
                });
            }

            if self.password.as_ref().map(|p| !p.is_empty()).unwrap_or(false) {
                violations.push(FieldViolation::Invalid {
                    field: "password",
                    reason: "cannot be combined with 'secret_resource_url'".into(),
                });
            }
        }

        match addressing {
            Some(addressing) if violations.is_empty() => Ok(SnowflakeValidatedConfig {
                addressing,
                credentials,
                fetch_size: self.fetch_size as u32,
                pool: JdbcConnectionPoolConfig {
                    max_idle_cons: self.max_idle_conns as u32,
                    idle_timeout: Some(Duration::from_secs(self.idle_time_sec as u64)),
                    connect_timeout: None,
                },
                allow_external_query: self.enable_external_query,
            }),
            _ => Err(SnowflakeError::Configuration(violations)),
        }
    }
}

/// The addressing fields required by each scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    DirectUrl {
        jdbc_url: String,
    },
    HostQualified {
        hostname: String,
        account_name: String,
        warehouse: Option<String>,
    },
    AccountSuffix {
        account_name: String,
        warehouse: Option<String>,
        role: Option<String>,
    },
}

impl Addressing {
    /// Extracts the fields of the configured scheme, recording a violation
    /// for each required field which is missing.
    pub fn from_config(
        conf: &SnowflakeJdbcConnectionConfig,
        violations: &mut Vec<FieldViolation>,
    ) -> Option<Self> {
        match conf.addressing {
            AddressingScheme::DirectUrl => {
                // The url is handed to the driver exactly as entered
                match conf.jdbc_url.as_ref().filter(|u| !u.trim().is_empty()) {
                    Some(jdbc_url) => Some(Self::DirectUrl {
                        jdbc_url: jdbc_url.clone(),
                    }),
                    None => {
                        violations.push(FieldViolation::Missing("jdbc_url"));
                        None
                    }
                }
            }
            AddressingScheme::HostQualified => {
                let hostname = required("hostname", &conf.hostname, violations);
                let account_name = required("account_name", &conf.account_name, violations);

                Some(Self::HostQualified {
                    hostname: hostname?,
                    account_name: account_name?,
                    warehouse: optional(&conf.warehouse),
                })
            }
            AddressingScheme::AccountSuffix => {
                let account_name = required("account_name", &conf.account_name, violations)?;

                Some(Self::AccountSuffix {
                    account_name,
                    warehouse: optional(&conf.warehouse),
                    role: optional(&conf.role),
                })
            }
        }
    }

    pub fn scheme(&self) -> AddressingScheme {
        match self {
            Addressing::DirectUrl { .. } => AddressingScheme::DirectUrl,
            Addressing::HostQualified { .. } => AddressingScheme::HostQualified,
            Addressing::AccountSuffix { .. } => AddressingScheme::AccountSuffix,
        }
    }
}

fn required(
    field: &'static str,
    val: &Option<String>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let val = optional(val);
    if val.is_none() {
        violations.push(FieldViolation::Missing(field));
    }
    val
}

fn optional(val: &Option<String>) -> Option<String> {
    if is_blank(val) {
        None
    } else {
        val.as_ref().map(|v| v.trim().to_string())
    }
}

/// Connection options which passed validation.
///
/// Immutable, a reconfiguration replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowflakeValidatedConfig {
    pub addressing: Addressing,
    pub credentials: CredentialSource,
    pub fetch_size: u32,
    pub pool: JdbcConnectionPoolConfig,
    pub allow_external_query: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn violated_fields(err: SnowflakeError) -> Vec<&'static str> {
        err.violations().iter().map(|v| v.field()).collect()
    }

    #[test]
    fn test_snowflake_parse_connection_options_defaults() {
        let conf = config::parse_config(
            r#"
addressing: account_suffix
account_name: ab12345
username: svc
password: pw
"#,
        )
        .unwrap();

        let parsed = SnowflakeJdbcConnectionConfig::parse(conf).unwrap();

        assert_eq!(
            parsed,
            SnowflakeJdbcConnectionConfig {
                addressing: AddressingScheme::AccountSuffix,
                account_name: Some("ab12345".into()),
                username: Some("svc".into()),
                password: Some("pw".into()),
                ..Default::default()
            }
        );
        assert_eq!(parsed.fetch_size, 2000);
        assert_eq!(parsed.max_idle_conns, 8);
        assert_eq!(parsed.idle_time_sec, 60);
        assert!(!parsed.enable_external_query);
    }

    #[test]
    fn test_snowflake_parse_legacy_url_row() {
        // Written before the addressing tag existed
        let conf = config::parse_config(
            r#"
jdbcURL: "jdbc:snowflake://ab12345.snowflakecomputing.com/?db=DEMO"
username: svc
password: pw
fetchSize: 500
"#,
        )
        .unwrap();

        let parsed = SnowflakeJdbcConnectionConfig::parse(conf).unwrap();

        assert_eq!(parsed.addressing, AddressingScheme::DirectUrl);
        assert_eq!(
            parsed.jdbc_url.as_deref(),
            Some("jdbc:snowflake://ab12345.snowflakecomputing.com/?db=DEMO")
        );
        assert_eq!(parsed.fetch_size, 500);
    }

    #[test]
    fn test_snowflake_parse_ignores_unused_and_unknown_fields() {
        let conf = config::parse_config(
            r#"
addressing: host_qualified
account_name: ab12345
hostname: ab12345.region.example.com
jdbc_url: "jdbc:snowflake://old.snowflakecomputing.com/"
role: ANALYST
someFutureField: 1
"#,
        )
        .unwrap();

        let parsed = SnowflakeJdbcConnectionConfig::parse(conf).unwrap();
        let validated = parsed.validate().unwrap();

        assert_eq!(
            validated.addressing,
            Addressing::HostQualified {
                hostname: "ab12345.region.example.com".into(),
                account_name: "ab12345".into(),
                warehouse: None,
            }
        );
    }

    #[test]
    fn test_snowflake_parse_invalid_options() {
        let conf = config::parse_config("addressing: carrier_pigeon").unwrap();

        let err = SnowflakeJdbcConnectionConfig::parse(conf).unwrap_err();

        assert_eq!(violated_fields(err), vec!["options"]);
    }

    #[test]
    fn test_snowflake_config_serializes_in_stable_order() {
        let conf = SnowflakeJdbcConnectionConfig {
            addressing: AddressingScheme::HostQualified,
            account_name: Some("ab12345".into()),
            hostname: Some("h".into()),
            ..Default::default()
        };

        let yaml = serde_yaml::to_string(&conf).unwrap();
        let keys = yaml
            .lines()
            .map(|l| l.split(':').next().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            vec![
                "addressing",
                "jdbc_url",
                "account_name",
                "hostname",
                "warehouse",
                "role",
                "username",
                "password",
                "secret_resource_url",
                "fetch_size",
                "max_idle_conns",
                "idle_time_sec",
                "enable_external_query",
            ]
        );
        assert_eq!(
            SnowflakeJdbcConnectionConfig::parse(serde_yaml::from_str(&yaml).unwrap()).unwrap(),
            conf
        );
    }

    #[test]
    fn test_validate_direct_url() {
        let conf = SnowflakeJdbcConnectionConfig {
            jdbc_url: Some("jdbc:snowflake://ab12345.snowflakecomputing.com/".into()),
            ..Default::default()
        };

        let validated = conf.validate().unwrap();

        assert_eq!(
            validated.addressing,
            Addressing::DirectUrl {
                jdbc_url: "jdbc:snowflake://ab12345.snowflakecomputing.com/".into()
            }
        );
        assert_eq!(validated.fetch_size, 2000);
        assert_eq!(
            validated.pool,
            JdbcConnectionPoolConfig {
                max_idle_cons: 8,
                idle_timeout: Some(Duration::from_secs(60)),
                connect_timeout: None,
            }
        );
        assert!(!validated.allow_external_query);
    }

    #[test]
    fn test_validate_blank_direct_url() {
        let conf = SnowflakeJdbcConnectionConfig {
            jdbc_url: Some("   ".into()),
            ..Default::default()
        };

        assert_eq!(violated_fields(conf.validate().unwrap_err()), vec!["jdbc_url"]);
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let conf = SnowflakeJdbcConnectionConfig {
            addressing: AddressingScheme::HostQualified,
            fetch_size: 0,
            ..Default::default()
        };

        assert_eq!(
            violated_fields(conf.validate().unwrap_err()),
            vec!["hostname", "account_name", "fetch_size"]
        );
    }

    #[test]
    fn test_validate_account_suffix_missing_account() {
        let conf = SnowflakeJdbcConnectionConfig {
            addressing: AddressingScheme::AccountSuffix,
            hostname: Some("ignored.example.com".into()),
            ..Default::default()
        };

        assert_eq!(
            violated_fields(conf.validate().unwrap_err()),
            vec!["account_name"]
        );
    }

    #[test]
    fn test_validate_pool_settings() {
        let conf = SnowflakeJdbcConnectionConfig {
            jdbc_url: Some("jdbc:snowflake://a.snowflakecomputing.com/".into()),
            fetch_size: -1,
            max_idle_conns: 0,
            idle_time_sec: 0,
            ..Default::default()
        };

        assert_eq!(
            violated_fields(conf.validate().unwrap_err()),
            vec!["fetch_size", "max_idle_conns", "idle_time_sec"]
        );
    }

    #[test]
    fn test_validate_rejects_secret_with_inline_credentials() {
        let conf = SnowflakeJdbcConnectionConfig {
            jdbc_url: Some("jdbc:snowflake://a.snowflakecomputing.com/".into()),
            username: Some("svc".into()),
            password: Some("pw".into()),
            secret_resource_url: Some("vault://kv/snowflake".into()),
            ..Default::default()
        };

        assert_eq!(
            violated_fields(conf.validate().unwrap_err()),
            vec!["username", "password"]
        );
    }

    #[test]
    fn test_validate_rejects_invalid_secret_locator() {
        let conf = SnowflakeJdbcConnectionConfig {
            jdbc_url: Some("jdbc:snowflake://a.snowflakecomputing.com/".into()),
            secret_resource_url: Some("not a locator".into()),
            ..Default::default()
        };

        assert_eq!(
            violated_fields(conf.validate().unwrap_err()),
            vec!["secret_resource_url"]
        );
    }

    #[test]
    fn test_validate_secret_locator() {
        let conf = SnowflakeJdbcConnectionConfig {
            addressing: AddressingScheme::AccountSuffix,
            account_name: Some(" ab12345 ".into()),
            secret_resource_url: Some("vault://kv/snowflake".into()),
            enable_external_query: true,
            ..Default::default()
        };

        let validated = conf.validate().unwrap();

        assert_eq!(
            validated.addressing,
            Addressing::AccountSuffix {
                account_name: "ab12345".into(),
                warehouse: None,
                role: None,
            }
        );
        assert_eq!(
            validated.credentials,
            CredentialSource::Indirect("vault://kv/snowflake".into())
        );
        assert!(validated.allow_external_query);
    }
}
