//! infrakit — shared infrastructure contexts.
//!
//! This crate provides thin client wrappers and explicit startup wiring
//! for three external services: a Cassandra-compatible database, an
//! S3-compatible object store (MinIO, AWS S3, ...), and Redis.  All
//! protocol work is delegated to the official client crates; this layer
//! owns configuration reading, fail-fast presence checks, singleton
//! construction, and not-found-to-result translation at the object
//! store boundary.

use std::sync::Arc;

use garde::Validate;
use redis::aio::ConnectionManager;
use scylla::client::session::Session;

pub mod cache;
pub mod config;
pub mod database;
pub mod errors;
pub mod events;
pub mod logging;
pub mod net;
pub mod object_store;

pub use cache::RedisContext;
pub use config::Config;
pub use database::{CassandraContext, CassandraDbContext};
pub use errors::{Error, Result};
pub use events::{Event, EventSource, EventStream};
pub use object_store::{ObjectStoreContext, S3ObjectStore};

/// Application-wide singletons, built once at startup.
///
/// [`AppContext`] is the composition root: each `with_*` method reads
/// its configuration section, fails fast when the section is absent,
/// constructs the client once, and stores it for the life of the
/// process.  Accessors return [`Error::NotRegistered`] for contexts
/// that were never wired.
///
/// ```no_run
/// # async fn wire() -> infrakit::Result<()> {
/// let config = infrakit::config::load_config("infrakit.yaml").unwrap();
/// let app = infrakit::AppContext::new(config)
///     .with_object_store()
///     .await?
///     .with_redis(None, true)
///     .await?;
/// let store = app.object_store()?;
/// # Ok(())
/// # }
/// ```
pub struct AppContext {
    /// Parsed configuration.
    config: Config,
    /// Object store context, when registered.
    object_store: Option<Arc<dyn ObjectStoreContext>>,
    /// Database context, when registered.
    cassandra: Option<Arc<dyn CassandraDbContext>>,
    /// Redis context, when registered.
    redis: Option<Arc<RedisContext>>,
    /// Raw connection multiplexer, when its registration was requested.
    redis_connection: Option<ConnectionManager>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("object_store", &self.object_store.is_some())
            .field("cassandra", &self.cassandra.is_some())
            .field("redis", &self.redis)
            .field("redis_connection", &self.redis_connection.is_some())
            .finish()
    }
}

impl AppContext {
    /// Start an empty context over `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            object_store: None,
            cassandra: None,
            redis: None,
            redis_connection: None,
        }
    }

    /// Register the object store context.
    ///
    /// Requires the `object_store` configuration section; the section
    /// is validated before any client is built.
    pub async fn with_object_store(mut self) -> Result<Self> {
        let section = self
            .config
            .object_store
            .as_ref()
            .ok_or(Error::MissingConfiguration {
                section: "object_store",
            })?;

        section
            .validate()
            .map_err(|report| Error::InvalidConfiguration {
                section: "object_store",
                report: report.to_string(),
            })?;

        let store = S3ObjectStore::connect(section).await;
        self.object_store = Some(Arc::new(store));
        Ok(self)
    }

    /// Register the default Cassandra context.
    ///
    /// Requires the `cassandra` configuration section.
    pub async fn with_cassandra(self) -> Result<Self> {
        self.with_cassandra_context(CassandraContext::new).await
    }

    /// Register an application-defined Cassandra context.
    ///
    /// `make` receives the established session and the configuration
    /// section, and returns the context implementation to store; this
    /// is how applications wire their own [`CassandraDbContext`] types
    /// (prepared statements, keyspace helpers) into the composition
    /// root.
    pub async fn with_cassandra_context<C, F>(mut self, make: F) -> Result<Self>
    where
        C: CassandraDbContext + 'static,
        F: FnOnce(Arc<Session>, config::CassandraConfig) -> C,
    {
        let section = self
            .config
            .cassandra
            .clone()
            .ok_or(Error::MissingConfiguration {
                section: "cassandra",
            })?;

        let session = Arc::new(database::connect_with_retry(&section).await?);
        self.cassandra = Some(Arc::new(make(session, section)));
        Ok(self)
    }

    /// Register the Redis context.
    ///
    /// Requires the `redis` configuration section.  When
    /// `register_connection_multiplexer` is set, the raw connection
    /// handle is also kept for direct resolution via
    /// [`AppContext::redis_connection`].
    pub async fn with_redis(
        mut self,
        name: Option<String>,
        register_connection_multiplexer: bool,
    ) -> Result<Self> {
        let section = self
            .config
            .redis
            .as_ref()
            .ok_or(Error::MissingConfiguration { section: "redis" })?;

        let context = RedisContext::connect(section, name).await?;
        if register_connection_multiplexer {
            self.redis_connection = Some(context.connection());
        }
        self.redis = Some(Arc::new(context));
        Ok(self)
    }

    /// Parsed configuration this context was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the object store context.
    pub fn object_store(&self) -> Result<Arc<dyn ObjectStoreContext>> {
        self.object_store.clone().ok_or(Error::NotRegistered {
            context: "object store",
        })
    }

    /// Resolve the database context.
    pub fn cassandra(&self) -> Result<Arc<dyn CassandraDbContext>> {
        self.cassandra.clone().ok_or(Error::NotRegistered {
            context: "cassandra",
        })
    }

    /// Resolve the Redis context.
    pub fn redis(&self) -> Result<Arc<RedisContext>> {
        self.redis
            .clone()
            .ok_or(Error::NotRegistered { context: "redis" })
    }

    /// Resolve the raw connection multiplexer.
    ///
    /// Only available when [`AppContext::with_redis`] was called with
    /// `register_connection_multiplexer = true`.
    pub fn redis_connection(&self) -> Result<ConnectionManager> {
        self.redis_connection.clone().ok_or(Error::NotRegistered {
            context: "redis connection multiplexer",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_object_store_fails_fast_without_section() {
        let err = AppContext::new(Config::default())
            .with_object_store()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfiguration {
                section: "object_store"
            }
        ));
    }

    #[tokio::test]
    async fn test_with_cassandra_fails_fast_without_section() {
        let err = AppContext::new(Config::default())
            .with_cassandra()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfiguration {
                section: "cassandra"
            }
        ));
    }

    #[tokio::test]
    async fn test_with_redis_fails_fast_without_section() {
        let err = AppContext::new(Config::default())
            .with_redis(None, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfiguration { section: "redis" }
        ));
    }

    #[tokio::test]
    async fn test_with_object_store_rejects_invalid_section() {
        let yaml = r#"
object_store:
  endpoint: "minio:9000"
  access_key: "ak"
  secret_key: "sk"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        let err = AppContext::new(config)
            .with_object_store()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration {
                section: "object_store",
                ..
            }
        ));
    }

    #[test]
    fn test_unregistered_contexts_resolve_to_errors() {
        let app = AppContext::new(Config::default());
        assert!(matches!(
            app.object_store(),
            Err(Error::NotRegistered { .. })
        ));
        assert!(matches!(app.cassandra(), Err(Error::NotRegistered { .. })));
        assert!(matches!(app.redis(), Err(Error::NotRegistered { .. })));
        assert!(matches!(
            app.redis_connection(),
            Err(Error::NotRegistered { .. })
        ));
    }
}
