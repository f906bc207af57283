//! Generic pooled data source for connectors which reach their target
//! through a JDBC driver. The driver itself is supplied by the host
//! through the `JdbcDriver` trait.

mod conf;
pub use conf::*;
mod driver;
pub use driver::*;
mod pool;
pub use pool::*;
