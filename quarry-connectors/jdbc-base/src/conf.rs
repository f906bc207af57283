use std::{collections::HashMap, fmt, time::Duration};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Connection properties passed to the driver alongside the url
pub type JdbcProperties = HashMap<String, String>;

/// How the pool treats autocommit on newly opened connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Leave autocommit as the driver defaults it
    #[default]
    DriverSpecified,
    /// Always enable autocommit
    ForceAuto,
    /// Always disable autocommit
    ForceManual,
}

impl CommitMode {
    /// The autocommit value to apply to a new connection, if any
    pub fn auto_commit(&self) -> Option<bool> {
        match self {
            CommitMode::DriverSpecified => None,
            CommitMode::ForceAuto => Some(true),
            CommitMode::ForceManual => Some(false),
        }
    }
}

/// Options for pooling the JDBC connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JdbcConnectionPoolConfig {
    /// Maximum number of connections kept open, idle or not
    pub max_idle_cons: u32,
    /// How long a connection can remain idle before closing
    pub idle_timeout: Option<Duration>,
    /// How long to wait for a connection when acquiring
    pub connect_timeout: Option<Duration>,
}

impl Default for JdbcConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_cons: 8,
            idle_timeout: Some(Duration::from_secs(60)),
            connect_timeout: None,
        }
    }
}

/// Everything required to open connections through a driver
pub struct JdbcDataSourceOptions {
    /// The driver's class name, eg `net.snowflake.client.jdbc.SnowflakeDriver`
    pub driver_class: String,
    pub jdbc_url: String,
    pub username: String,
    pub password: SecretString,
    pub properties: JdbcProperties,
    pub commit_mode: CommitMode,
    pub pool: JdbcConnectionPoolConfig,
}

impl fmt::Debug for JdbcDataSourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JdbcDataSourceOptions")
            .field("driver_class", &self.driver_class)
            .field("jdbc_url", &self.jdbc_url)
            .field("username", &self.username)
            .field("properties", &self.properties)
            .field("commit_mode", &self.commit_mode)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
