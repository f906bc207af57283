use quarry_core::err::Result;

use crate::JdbcProperties;

/// Property carrying the username when opening a connection
pub const JDBC_USER_PROPERTY: &str = "user";
/// Property carrying the password when opening a connection
pub const JDBC_PASSWORD_PROPERTY: &str = "password";

/// Entry point into a JDBC driver hosted outside of this process' rust code
pub trait JdbcDriver: Send + Sync + 'static {
    type Connection: JdbcDriverConnection;

    /// Opens a new physical connection.
    ///
    /// `props` include the credentials under [`JDBC_USER_PROPERTY`] and
    /// [`JDBC_PASSWORD_PROPERTY`].
    fn connect(
        &self,
        driver_class: &str,
        jdbc_url: &str,
        props: &JdbcProperties,
    ) -> Result<Self::Connection>;
}

/// A physical connection opened by a [`JdbcDriver`]
pub trait JdbcDriverConnection: Send + 'static {
    /// Performs a round trip to check the connection is usable
    fn is_valid(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
