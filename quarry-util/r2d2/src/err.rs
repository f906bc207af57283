use std::fmt::{self, Display};

use quarry_core::err::Error;

/// r2d2 requires the manager's error type to implement `std::error::Error`,
/// which `anyhow::Error` does not. This carries the anyhow error through
/// the pool and back out again.
#[derive(Debug)]
pub struct PoolError(Error);

impl PoolError {
    /// Unwraps the original error, keeping its context chain
    pub fn into_inner(self) -> Error {
        self.0
    }
}

impl Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<Error> for PoolError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use quarry_core::err::{anyhow, Context};

    use super::*;

    #[test]
    fn test_pool_error_keeps_context_chain() {
        let err = Err::<(), _>(anyhow!("socket closed"))
            .context("Failed to open connection")
            .unwrap_err();

        let err = PoolError::from(err);

        assert_eq!(err.to_string(), "Failed to open connection");
        assert_eq!(
            std::error::Error::source(&err).map(|s| s.to_string()),
            Some("socket closed".to_string())
        );
        assert_eq!(
            format!("{:#}", err.into_inner()),
            "Failed to open connection: socket closed"
        );
    }
}
