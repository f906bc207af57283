//! Error handling shared across the workspace.
//!
//! Crates propagate errors as `anyhow` values and attach context at each
//! boundary. Connectors which expose a typed error surface wrap these as
//! the source of their own variants.

pub use anyhow::{anyhow, bail, ensure, Context, Error, Result};
