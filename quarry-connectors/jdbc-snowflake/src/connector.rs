use std::sync::{Arc, Mutex, MutexGuard};

use quarry_connectors_jdbc_base::{
    CommitMode, JdbcDataSourceOptions, JdbcDriver, PooledDataSource,
};
use quarry_core::config;
use quarry_logging::{debug, info};
use quarry_secrets::CredentialService;

use crate::{
    session_properties, DialectOverrides, SnowflakeError, SnowflakeJdbcConnectionConfig,
    SnowflakeValidatedConfig, SNOWFLAKE_DIALECT,
};

pub const SNOWFLAKE_DRIVER_CLASS: &str = "net.snowflake.client.jdbc.SnowflakeDriver";

/// The connector for Snowflake, built on their JDBC driver.
///
/// Owns at most one pooled data source at a time, created on first use
/// and closed when the connector is closed, reconfigured or dropped.
pub struct SnowflakeConnector<D: JdbcDriver> {
    conf: SnowflakeValidatedConfig,
    driver: Arc<D>,
    secrets: Arc<dyn CredentialService>,
    data_source: Mutex<DataSourceSlot<D>>,
}

enum DataSourceSlot<D: JdbcDriver> {
    Empty,
    Open(Arc<PooledDataSource<D>>),
    Closed,
}

/// What the federation engine needs to plan queries against this source
#[derive(Debug, Clone, PartialEq)]
pub struct SnowflakePluginConfig {
    pub dialect: DialectOverrides,
    pub fetch_size: u32,
    pub hidden_schemas: &'static [&'static str],
    pub allow_external_query: bool,
}

impl<D: JdbcDriver> SnowflakeConnector<D> {
    pub const TYPE: &'static str = "jdbc.snowflake";

    pub fn parse_options(
        options: config::Value,
    ) -> Result<SnowflakeJdbcConnectionConfig, SnowflakeError> {
        SnowflakeJdbcConnectionConfig::parse(options)
    }

    /// Validates the options, nothing is connected until [`Self::data_source`] is called
    pub fn new(
        conf: SnowflakeJdbcConnectionConfig,
        driver: Arc<D>,
        secrets: Arc<dyn CredentialService>,
    ) -> Result<Self, SnowflakeError> {
        let conf = conf.validate()?;
        debug!(
            "Configured Snowflake connector using {:?} addressing",
            conf.addressing.scheme()
        );

        Ok(Self {
            conf,
            driver,
            secrets,
            data_source: Mutex::new(DataSourceSlot::Empty),
        })
    }

    pub fn config(&self) -> &SnowflakeValidatedConfig {
        &self.conf
    }

    /// Returns the pooled data source, creating it on the first call.
    ///
    /// Creation resolves the credentials and opens a single validation
    /// connection. A failure leaves no data source behind so the next
    /// call tries again from scratch.
    pub fn data_source(&self) -> Result<Arc<PooledDataSource<D>>, SnowflakeError> {
        let mut slot = self.lock_slot();

        match &*slot {
            DataSourceSlot::Open(ds) => return Ok(Arc::clone(ds)),
            DataSourceSlot::Closed => return Err(SnowflakeError::Closed),
            DataSourceSlot::Empty => {}
        }

        let ds = Arc::new(self.create_data_source()?);
        *slot = DataSourceSlot::Open(Arc::clone(&ds));

        Ok(ds)
    }

    /// Replaces the options of the connector.
    ///
    /// The new options are validated before anything changes. The current
    /// data source is then fully closed and the next call to
    /// [`Self::data_source`] creates one with the new options.
    pub fn reconfigure(
        &mut self,
        conf: SnowflakeJdbcConnectionConfig,
    ) -> Result<(), SnowflakeError> {
        let conf = conf.validate()?;

        let slot = self
            .data_source
            .get_mut()
            .unwrap_or_else(|e| e.into_inner());

        if let DataSourceSlot::Open(ds) = std::mem::replace(slot, DataSourceSlot::Empty) {
            ds.close();
        }

        info!(
            "Reconfigured Snowflake connector using {:?} addressing",
            conf.addressing.scheme()
        );
        self.conf = conf;

        Ok(())
    }

    /// Closes the data source, if one was created. Calling this again is a no-op.
    pub fn close(&self) {
        let prev = std::mem::replace(&mut *self.lock_slot(), DataSourceSlot::Closed);

        if let DataSourceSlot::Open(ds) = prev {
            ds.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.lock_slot(), DataSourceSlot::Closed)
    }

    pub fn dialect(&self) -> &'static DialectOverrides {
        &SNOWFLAKE_DIALECT
    }

    pub fn fetch_size(&self) -> u32 {
        self.conf.fetch_size
    }

    pub fn hidden_schemas(&self) -> &'static [&'static str] {
        self.dialect().hidden_schemas()
    }

    pub fn allow_external_query(&self) -> bool {
        self.conf.allow_external_query
    }

    pub fn plugin_config(&self) -> SnowflakePluginConfig {
        SnowflakePluginConfig {
            dialect: *self.dialect(),
            fetch_size: self.fetch_size(),
            hidden_schemas: self.hidden_schemas(),
            allow_external_query: self.allow_external_query(),
        }
    }

    fn create_data_source(&self) -> Result<PooledDataSource<D>, SnowflakeError> {
        let credentials = self.conf.credentials.resolve(self.secrets.as_ref())?;
        let jdbc_url = self.conf.addressing.connection_string();

        info!("Creating Snowflake data source for {}", jdbc_url);

        PooledDataSource::new(
            Arc::clone(&self.driver),
            JdbcDataSourceOptions {
                driver_class: SNOWFLAKE_DRIVER_CLASS.into(),
                jdbc_url,
                username: credentials.username,
                password: credentials.password,
                properties: session_properties(&self.conf.addressing),
                commit_mode: CommitMode::DriverSpecified,
                pool: self.conf.pool.clone(),
            },
        )
        .map_err(|e| SnowflakeError::DataSourceConstruction(e.into()))
    }

    fn lock_slot(&self) -> MutexGuard<'_, DataSourceSlot<D>> {
        self.data_source.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<D: JdbcDriver> Drop for SnowflakeConnector<D> {
    fn drop(&mut self) {
        self.close();
    }
}
