use std::fmt::{self, Debug};

use quarry_core::err::Result;
use r2d2::ManageConnection;

use crate::err::PoolError;

/// Opens and health-checks connections for an r2d2 pool.
///
/// Mirrors r2d2's `ManageConnection` but reports failures as `anyhow`
/// errors. Use [`ConnectionManager::into_r2d2`] to hand it to a pool builder.
pub trait ConnectionManager: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Opens a new connection.
    fn connect(&self) -> Result<Self::Connection>;

    /// Checks the connection is still usable, typically via a round trip
    /// to the server. Called when a connection is checked out.
    fn is_valid(&self, conn: &mut Self::Connection) -> Result<()>;

    /// Called on every check-in so it must not block. Returning `true`
    /// discards the connection.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool;

    fn into_r2d2(self) -> R2d2Manager<Self>
    where
        Self: Sized,
    {
        R2d2Manager(self)
    }
}

/// Implements r2d2's `ManageConnection` for a [`ConnectionManager`]
pub struct R2d2Manager<T: ConnectionManager>(T);

impl<T: ConnectionManager> R2d2Manager<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }
}

impl<T: ConnectionManager> ManageConnection for R2d2Manager<T> {
    type Connection = T::Connection;
    type Error = PoolError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.0.connect().map_err(PoolError::from)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        self.0.is_valid(conn).map_err(PoolError::from)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        self.0.has_broken(conn)
    }
}

impl<T: ConnectionManager + Debug> Debug for R2d2Manager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("R2d2Manager").field(&self.0).finish()
    }
}
