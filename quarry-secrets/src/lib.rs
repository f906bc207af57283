//! Resolution of indirect credentials.
//!
//! Data source configs may reference credentials held in an external
//! secret store through a [`SecretLocator`] instead of embedding them.
//! A [`CredentialService`] turns a locator into a username/password pair.

mod locator;
pub use locator::*;
mod service;
pub use service::*;
mod vault;
pub use vault::*;
mod memory;
pub use memory::*;
