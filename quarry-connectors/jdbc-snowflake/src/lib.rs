//! Connector for Snowflake, reached through the Snowflake JDBC driver.
//!
//! Turns the user supplied source options into a connection string,
//! session properties and credentials, builds a pooled data source on
//! first use and describes the dialect overrides the planner applies
//! when pushing queries down to Snowflake.

mod conf;
pub use conf::*;
mod credentials;
pub use credentials::*;
mod dialect;
pub use dialect::*;
mod error;
pub use error::*;
mod session;
pub use session::*;
mod connection_string;
pub use connection_string::*;
mod connector;
pub use connector::*;
