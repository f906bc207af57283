use url::form_urlencoded;

use crate::{Addressing, SnowflakeError, SnowflakeJdbcConnectionConfig};

pub const JDBC_URL_PREFIX: &str = "jdbc:snowflake://";
pub const ACCOUNT_DOMAIN_SUFFIX: &str = "snowflakecomputing.com";

impl Addressing {
    /// The connection string understood by the Snowflake JDBC driver
    pub fn connection_string(&self) -> String {
        match self {
            Addressing::DirectUrl { jdbc_url } => jdbc_url.clone(),
            Addressing::HostQualified {
                hostname,
                account_name,
                warehouse,
            } => {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("account", account_name);
                if let Some(warehouse) = warehouse {
                    query.append_pair("warehouse", warehouse);
                }

                format!("{JDBC_URL_PREFIX}{hostname}?{}", query.finish())
            }
            Addressing::AccountSuffix { account_name, .. } => {
                format!("{JDBC_URL_PREFIX}{account_name}.{ACCOUNT_DOMAIN_SUFFIX}/")
            }
        }
    }
}

/// Builds the connection string for the configured addressing scheme,
/// failing on the first required field which is missing.
pub fn build_connection_string(
    conf: &SnowflakeJdbcConnectionConfig,
) -> Result<String, SnowflakeError> {
    let mut violations = vec![];

    match Addressing::from_config(conf, &mut violations) {
        Some(addressing) => Ok(addressing.connection_string()),
        None => Err(match violations.first() {
            Some(violation) => SnowflakeError::MissingField(violation.field()),
            None => SnowflakeError::Configuration(violations),
        }),
    }
}
