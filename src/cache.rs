//! Redis connection context.
//!
//! Exposes a ready-to-use connection multiplexer built from validated
//! options at registration time.  No command surface lives here;
//! callers issue operations through the handle, and pooling, pipelining
//! and reconnects are whatever the client library does internally.

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::info;

use crate::config::RedisConfig;
use crate::errors::Result;

/// Redis context owning the client and its shared connection manager.
pub struct RedisContext {
    client: Client,
    connection: ConnectionManager,
    name: Option<String>,
}

impl std::fmt::Debug for RedisContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisContext")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl RedisContext {
    /// Open the client and establish the shared connection manager.
    ///
    /// `name` is a display label for deployments that run several Redis
    /// instances side by side.
    pub async fn connect(config: &RedisConfig, name: Option<String>) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let connection = ConnectionManager::new(client.clone()).await?;

        info!(
            "redis connection established: name={}",
            name.as_deref().unwrap_or("default")
        );

        Ok(Self {
            client,
            connection,
            name,
        })
    }

    /// Hand out the shared connection multiplexer.
    ///
    /// The manager is cheap to clone; every clone multiplexes over the
    /// same underlying connection and reconnects transparently.
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Underlying client, for callers that need a dedicated connection
    /// (pub/sub, blocking commands).
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Display label given at registration time.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
