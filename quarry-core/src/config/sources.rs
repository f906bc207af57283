use serde::{Deserialize, Serialize};

/// A data source registered with the federation engine
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// The ID of the data source
    pub id: String,
    /// The display name of the data source
    pub name: Option<String>,
    /// The connector type, eg `jdbc.snowflake`
    pub r#type: String,
    /// The connector specific options, parsed by the connector itself
    pub options: serde_yaml::Value,
}
