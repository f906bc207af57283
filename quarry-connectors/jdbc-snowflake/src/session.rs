use quarry_connectors_jdbc_base::JdbcProperties;

use crate::Addressing;

/// Keeps the session alive for the lifetime of a pooled connection.
/// Without it the driver lets idle sessions expire while still pooled.
pub const SESSION_KEEP_ALIVE_PROPERTY: &str = "CLIENT_SESSION_KEEP_ALIVE";
pub const ROLE_PROPERTY: &str = "role";
pub const WAREHOUSE_PROPERTY: &str = "warehouse";

/// Builds the driver properties sent along with the connection string.
///
/// Only the account-suffix scheme carries the role and warehouse as
/// properties, an empty value leaves the user's default in place. The
/// host-qualified scheme sends the warehouse in the url instead.
pub fn session_properties(addressing: &Addressing) -> JdbcProperties {
    let mut props = JdbcProperties::new();
    props.insert(SESSION_KEEP_ALIVE_PROPERTY.into(), "true".into());

    if let Addressing::AccountSuffix {
        warehouse, role, ..
    } = addressing
    {
        props.insert(ROLE_PROPERTY.into(), role.clone().unwrap_or_default());
        props.insert(
            WAREHOUSE_PROPERTY.into(),
            warehouse.clone().unwrap_or_default(),
        );
    }

    props
}
