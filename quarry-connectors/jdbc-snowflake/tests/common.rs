use std::sync::Arc;

use quarry_connectors_jdbc_base::test::MockJdbcDriver;
use quarry_connectors_jdbc_snowflake::{SnowflakeConnector, SnowflakeJdbcConnectionConfig};
use quarry_core::config;
use quarry_secrets::{StaticCredentialService, UsernamePassword};

pub const SECRET_LOCATOR: &str = "vault://kv/data-platform/snowflake";

pub struct TestConnector {
    pub connector: SnowflakeConnector<MockJdbcDriver>,
    pub driver: MockJdbcDriver,
    pub secrets: Arc<StaticCredentialService>,
}

pub fn secrets() -> Arc<StaticCredentialService> {
    Arc::new(
        StaticCredentialService::new()
            .with_secret(
                SECRET_LOCATOR,
                UsernamePassword::new("svc_snowflake", "vault-password"),
            )
            .unwrap(),
    )
}

pub fn parse_options(yaml: &str) -> SnowflakeJdbcConnectionConfig {
    SnowflakeConnector::<MockJdbcDriver>::parse_options(config::parse_config(yaml).unwrap())
        .unwrap()
}

pub fn create_connector(yaml: &str) -> TestConnector {
    quarry_logging::init_for_tests();
    let driver = MockJdbcDriver::new();
    let secrets = secrets();

    let connector = match SnowflakeConnector::new(
        parse_options(yaml),
        Arc::new(driver.clone()),
        secrets.clone(),
    ) {
        Ok(connector) => connector,
        Err(err) => panic!("Failed to create connector: {err}"),
    };

    TestConnector {
        connector,
        driver,
        secrets,
    }
}
