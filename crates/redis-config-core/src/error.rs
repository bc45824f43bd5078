//! Error types shared across the configuration source.
//!
//! Every fallible operation in this crate returns [`SourceResult`]. The
//! variants separate the phases a source moves through: validating its
//! descriptor, establishing the store connection, reading the backing hash,
//! and registering the change subscription. Callers that only care about
//! retry behavior can match on [`SourceError::Connection`], since that is
//! the one phase the provider will attempt again on the next load.

use thiserror::Error;

/// Errors produced by a Redis configuration source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source descriptor is unusable (empty key, empty connection string).
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// The connection factory failed to produce a usable connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Reading the configuration hash from the store failed.
    #[error("read failed: {0}")]
    Read(String),

    /// Registering or servicing the change subscription failed.
    #[error("subscription failed: {0}")]
    Subscription(String),
}

impl SourceError {
    /// Create an invalid-source error.
    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidSource(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    /// Create a subscription error.
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription(message.into())
    }
}

/// Result alias used throughout the crate.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_phase_and_detail() {
        let error = SourceError::connection("refused");
        assert_eq!(error.to_string(), "connection failed: refused");

        let error = SourceError::invalid_source("key must not be empty");
        assert_eq!(error.to_string(), "invalid source: key must not be empty");
    }

    #[test]
    fn test_helpers_build_matching_variants() {
        assert!(matches!(
            SourceError::read("boom"),
            SourceError::Read(message) if message == "boom"
        ));
        assert!(matches!(
            SourceError::subscription("closed"),
            SourceError::Subscription(_)
        ));
    }
}
