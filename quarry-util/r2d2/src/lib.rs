//! Glue between our anyhow-based connection managers and r2d2.

mod err;
pub use err::*;
mod manager;
pub use manager::*;
