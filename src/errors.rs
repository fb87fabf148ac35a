//! Crate-wide error types.
//!
//! Configuration problems are fatal at startup: a missing or invalid
//! section surfaces before any client is built.  Object-store provider
//! errors are translated mechanically into [`Error::ObjectStore`] at the
//! wrapper boundary; not-found conditions on read paths never reach this
//! enum (they degrade to a `found = false` result instead).

use std::time::Duration;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by context construction and the thin client wrappers.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration section is absent.  The process should
    /// not start.
    #[error("{section} is not configured")]
    MissingConfiguration { section: &'static str },

    /// A configuration section is present but failed validation.
    #[error("invalid {section} configuration: {report}")]
    InvalidConfiguration {
        section: &'static str,
        report: String,
    },

    /// A context was resolved before being registered on the
    /// application context.
    #[error("{context} is not registered on this application context")]
    NotRegistered { context: &'static str },

    /// An object-store SDK call failed (other than the not-found
    /// conditions the read paths absorb).
    #[error("object store {operation} failed: {message}")]
    ObjectStore {
        operation: &'static str,
        message: String,
    },

    /// The Cassandra session could not be established.
    #[error("cassandra session could not be established")]
    CassandraConnect(#[source] scylla::errors::NewSessionError),

    /// A Cassandra statement failed.
    #[error("cassandra query failed")]
    CassandraQuery(#[source] scylla::errors::ExecutionError),

    /// The Cassandra health probe did not answer within the configured
    /// deadline.
    #[error("cassandra health check timed out after {0:?}")]
    HealthTimeout(Duration),

    /// Redis client or connection error.
    #[error("redis error")]
    Redis(#[from] redis::RedisError),

    /// Filesystem / socket error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Translate an SDK error into [`Error::ObjectStore`] with the
    /// operation name as context.
    pub(crate) fn object_store(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Error::ObjectStore {
            operation,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configuration_names_the_section() {
        let err = Error::MissingConfiguration { section: "redis" };
        assert_eq!(err.to_string(), "redis is not configured");
    }

    #[test]
    fn test_object_store_translation_keeps_operation_context() {
        let err = Error::object_store("put_object", "connection reset");
        assert_eq!(
            err.to_string(),
            "object store put_object failed: connection reset"
        );
    }

    #[test]
    fn test_not_registered_names_the_context() {
        let err = Error::NotRegistered {
            context: "object store",
        };
        assert!(err.to_string().contains("object store"));
    }
}
