//! Cassandra database context.
//!
//! Session construction delegates to the scylla driver (CQL-compatible
//! with both Cassandra and ScyllaDB).  The only policy applied here is
//! datacenter-aware load balancing and optional exponential backoff
//! while the session is first established; reconnects after that are
//! the driver's business.

use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::policies::load_balancing::DefaultPolicy;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::CassandraConfig;
use crate::errors::{Error, Result};

/// Capability surface of an application database context.
///
/// Applications implement this on their own context types (prepared
/// statements, keyspace helpers) and register them through
/// [`crate::AppContext::with_cassandra_context`]; [`CassandraContext`]
/// is the default implementation.
pub trait CassandraDbContext: Send + Sync {
    /// The underlying driver session.
    fn session(&self) -> &Arc<Session>;
}

/// Default database context wrapping a shared session.
pub struct CassandraContext {
    session: Arc<Session>,
    options: CassandraConfig,
}

impl CassandraContext {
    /// Wrap an established session.
    pub fn new(session: Arc<Session>, options: CassandraConfig) -> Self {
        Self { session, options }
    }

    /// Probe cluster liveness with a trivial statement, bounded by the
    /// configured health timeout.
    pub async fn health_check(&self) -> Result<()> {
        let deadline = self.options.health_timeout();

        tokio::time::timeout(
            deadline,
            self.session
                .query_unpaged("SELECT release_version FROM system.local", ()),
        )
        .await
        .map_err(|_| Error::HealthTimeout(deadline))?
        .map_err(Error::CassandraQuery)?;

        Ok(())
    }
}

impl CassandraDbContext for CassandraContext {
    fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

/// Establish a session from configuration.
pub async fn connect(config: &CassandraConfig) -> Result<Session> {
    let mut builder = SessionBuilder::new()
        .known_nodes(&config.contact_points)
        .connection_timeout(config.connect_timeout());

    if let Some(local_dc) = &config.local_dc {
        let policy = DefaultPolicy::builder()
            .prefer_datacenter(local_dc.clone())
            .build();
        let profile = ExecutionProfile::builder()
            .load_balancing_policy(policy)
            .build();
        builder = builder.default_execution_profile_handle(profile.into_handle());
    }

    let session = builder.build().await.map_err(Error::CassandraConnect)?;

    info!(
        "cassandra session established: contact_points={:?}",
        config.contact_points
    );

    Ok(session)
}

/// Establish a session, retrying with exponential backoff when the
/// configuration enables it.
pub async fn connect_with_retry(config: &CassandraConfig) -> Result<Session> {
    if !config.exponential_reconnect {
        return connect(config).await;
    }

    let attempts = config.connect_attempts.max(1);
    let max_delay = config.reconnect_max_delay();
    let mut delay = config.reconnect_base_delay();
    let mut attempt = 1;

    loop {
        match connect(config).await {
            Ok(session) => return Ok(session),
            Err(e) => {
                if attempt >= attempts {
                    return Err(e);
                }
                warn!(
                    "cassandra connect attempt {}/{} failed: {}, retrying in {:?}",
                    attempt, attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = next_backoff(delay, max_delay);
                attempt += 1;
            }
        }
    }
}

/// Double `current`, capped at `max`.
fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}
