use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex},
    time::Duration,
};

use quarry_core::err::{ensure, Context, Result};
use quarry_logging::{debug, info, warn};
use quarry_util_r2d2::{ConnectionManager, R2d2Manager};
use r2d2::PooledConnection;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    CommitMode, JdbcDataSourceOptions, JdbcDriver, JdbcDriverConnection, JdbcProperties,
    JDBC_PASSWORD_PROPERTY, JDBC_USER_PROPERTY,
};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

type Pool<D> = r2d2::Pool<R2d2Manager<JdbcConnectionManager<D>>>;

/// A closeable pool of connections opened through a JDBC driver.
///
/// The pool itself is safe to share between threads. Closing drains the
/// idle connections and is idempotent; connections checked out at the time
/// are closed as they are returned.
pub struct PooledDataSource<D: JdbcDriver> {
    jdbc_url: String,
    pool: Mutex<Option<Pool<D>>>,
}

/// Opens driver connections for the pool
pub struct JdbcConnectionManager<D: JdbcDriver> {
    driver: Arc<D>,
    driver_class: String,
    jdbc_url: String,
    properties: JdbcProperties,
    username: String,
    password: SecretString,
    commit_mode: CommitMode,
}

impl<D: JdbcDriver> PooledDataSource<D> {
    /// Builds the pool after opening a single validation connection.
    ///
    /// There is exactly one attempt: if the validation connection cannot be
    /// opened the error is returned and retrying is left to the caller.
    pub fn new(driver: Arc<D>, options: JdbcDataSourceOptions) -> Result<Self> {
        let pool_conf = options.pool;
        ensure!(
            pool_conf.max_idle_cons > 0,
            "Pool must allow at least one connection"
        );
        ensure!(
            pool_conf.idle_timeout != Some(Duration::ZERO),
            "Pool idle timeout must be positive"
        );
        ensure!(
            pool_conf.connect_timeout != Some(Duration::ZERO),
            "Pool connect timeout must be positive"
        );

        let manager = JdbcConnectionManager {
            driver,
            driver_class: options.driver_class,
            jdbc_url: options.jdbc_url,
            properties: options.properties,
            username: options.username,
            password: options.password,
            commit_mode: options.commit_mode,
        };

        debug!(
            "Opening validation connection to {} using {}",
            manager.jdbc_url, manager.driver_class
        );
        let mut con = manager
            .connect()
            .context("Failed to open validation connection")?;
        manager
            .is_valid(&mut con)
            .context("Validation connection is not usable")?;
        drop(con);

        let jdbc_url = manager.jdbc_url.clone();

        // The validation connection proved the config, so connections
        // are opened lazily from here on rather than filled eagerly.
        let pool = r2d2::Builder::new()
            .max_size(pool_conf.max_idle_cons)
            .min_idle(Some(0))
            .idle_timeout(pool_conf.idle_timeout)
            .connection_timeout(pool_conf.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .build_unchecked(manager.into_r2d2());

        info!("Created connection pool for {}", jdbc_url);

        Ok(Self {
            jdbc_url,
            pool: Mutex::new(Some(pool)),
        })
    }

    pub fn jdbc_url(&self) -> &str {
        &self.jdbc_url
    }

    /// Checks out a connection from the pool
    pub fn acquire(&self) -> Result<JdbcConnection<D>> {
        let pool = {
            let pool = self.lock_pool();
            pool.as_ref()
                .cloned()
                .with_context(|| format!("Data source for {} is closed", self.jdbc_url))?
        };

        let con = pool
            .get()
            .context("Failed to get connection from pool")?;

        Ok(JdbcConnection(con))
    }

    /// Number of open connections and how many of those are idle
    pub fn state(&self) -> Option<(u32, u32)> {
        self.lock_pool()
            .as_ref()
            .map(|p| p.state())
            .map(|s| (s.connections, s.idle_connections))
    }

    pub fn is_closed(&self) -> bool {
        self.lock_pool().is_none()
    }

    /// Releases the pool. Calling this again is a no-op.
    pub fn close(&self) {
        match self.lock_pool().take() {
            Some(pool) => {
                info!("Closing connection pool for {}", self.jdbc_url);
                drop(pool);
            }
            None => debug!("Connection pool for {} already closed", self.jdbc_url),
        }
    }

    fn lock_pool(&self) -> std::sync::MutexGuard<'_, Option<Pool<D>>> {
        // Teardown must still succeed if a thread panicked while holding the lock
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<D: JdbcDriver> fmt::Debug for PooledDataSource<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledDataSource")
            .field("jdbc_url", &self.jdbc_url)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<D: JdbcDriver> Drop for PooledDataSource<D> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<D: JdbcDriver> ConnectionManager for JdbcConnectionManager<D> {
    type Connection = ManagedConnection<D::Connection>;

    fn connect(&self) -> Result<Self::Connection> {
        let mut props = self.properties.clone();
        props.insert(JDBC_USER_PROPERTY.into(), self.username.clone());
        props.insert(
            JDBC_PASSWORD_PROPERTY.into(),
            self.password.expose_secret().to_string(),
        );

        let con = self
            .driver
            .connect(&self.driver_class, &self.jdbc_url, &props)
            .with_context(|| format!("Failed to connect to {}", self.jdbc_url))?;
        let mut con = ManagedConnection(con);

        if let Some(auto_commit) = self.commit_mode.auto_commit() {
            con.set_auto_commit(auto_commit)
                .context("Failed to set autocommit mode")?;
        }

        Ok(con)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<()> {
        conn.is_valid()
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

/// Closes the driver connection when dropped, logging any failure
pub struct ManagedConnection<C: JdbcDriverConnection>(C);

impl<C: JdbcDriverConnection> Deref for ManagedConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: JdbcDriverConnection> DerefMut for ManagedConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: JdbcDriverConnection> Drop for ManagedConnection<C> {
    fn drop(&mut self) {
        if self.0.is_closed() {
            return;
        }

        if let Err(err) = self.0.close() {
            warn!("Failed to close JDBC connection: {:?}", err);
        }
    }
}

/// A connection checked out of a [`PooledDataSource`], returned on drop
pub struct JdbcConnection<D: JdbcDriver>(PooledConnection<R2d2Manager<JdbcConnectionManager<D>>>);

impl<D: JdbcDriver> Deref for JdbcConnection<D> {
    type Target = D::Connection;

    fn deref(&self) -> &D::Connection {
        &self.0
    }
}

impl<D: JdbcDriver> DerefMut for JdbcConnection<D> {
    fn deref_mut(&mut self) -> &mut D::Connection {
        &mut self.0
    }
}
