//! Configuration loading and types.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Each service section is optional at parse time;
//! presence is enforced when the corresponding context is registered on
//! the application context, so an application only pays for the
//! services it actually wires up.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Cassandra-compatible database settings.
    #[serde(default)]
    pub cassandra: Option<CassandraConfig>,

    /// S3-compatible object store settings (MinIO, AWS S3, ...).
    #[serde(default)]
    pub object_store: Option<ObjectStoreConfig>,

    /// Redis settings.
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cassandra connection configuration.
///
/// `contact_points` are seed addresses (`host:port`) used to discover
/// the rest of the cluster.  The reconnect fields drive the exponential
/// backoff applied while establishing the session.
#[derive(Debug, Clone, Deserialize)]
pub struct CassandraConfig {
    /// Seed node addresses, e.g. `["db-1:9042", "db-2:9042"]`.
    pub contact_points: Vec<String>,

    /// Local datacenter name for datacenter-aware load balancing.
    #[serde(default)]
    pub local_dc: Option<String>,

    /// Socket connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retry session establishment with exponential backoff.
    #[serde(default)]
    pub exponential_reconnect: bool,

    /// First backoff delay in milliseconds.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,

    /// Backoff delay ceiling in milliseconds.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,

    /// Maximum connection attempts when `exponential_reconnect` is set.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Deadline for the health probe in seconds.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

impl CassandraConfig {
    /// Socket connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// First backoff delay as a [`Duration`].
    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    /// Backoff ceiling as a [`Duration`].
    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_ms)
    }

    /// Health probe deadline as a [`Duration`].
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

/// S3-compatible object store configuration.
///
/// MinIO and other compatible stores are addressed through a custom
/// endpoint with path-style URLs; credentials are always explicit
/// (there is no ambient credential chain for these deployments).
#[derive(Debug, Clone, Deserialize, garde::Validate)]
pub struct ObjectStoreConfig {
    /// Endpoint URL, e.g. `http://minio:9000`.
    #[garde(pattern(r"^https?://"))]
    pub endpoint: String,

    /// Access key.
    #[garde(length(min = 1))]
    pub access_key: String,

    /// Secret key.
    #[garde(length(min = 1))]
    pub secret_key: String,

    /// Region presented to the SDK (most S3-compatible stores ignore it).
    #[serde(default = "default_region")]
    #[garde(skip)]
    pub region: String,

    /// Force path-style URL addressing (required by MinIO).
    #[serde(default = "default_true")]
    #[garde(skip)]
    pub use_path_style: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Connection URL in the `redis://` scheme, including any
    /// credentials and database index.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_connect_attempts() -> u32 {
    4
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    Ok(config)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use garde::Validate;
    use std::io::Write;

    #[test]
    fn test_empty_config_has_no_service_sections() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.cassandra.is_none());
        assert!(config.object_store.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_cassandra_section_applies_defaults() {
        let yaml = r#"
cassandra:
  contact_points: ["db-1:9042", "db-2:9042"]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let cassandra = config.cassandra.unwrap();
        assert_eq!(cassandra.contact_points.len(), 2);
        assert!(cassandra.local_dc.is_none());
        assert!(!cassandra.exponential_reconnect);
        assert_eq!(cassandra.connect_timeout(), Duration::from_secs(5));
        assert_eq!(cassandra.reconnect_base_delay(), Duration::from_millis(1_000));
        assert_eq!(cassandra.reconnect_max_delay(), Duration::from_millis(30_000));
        assert_eq!(cassandra.connect_attempts, 4);
        assert_eq!(cassandra.health_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_object_store_section_parses_and_validates() {
        let yaml = r#"
object_store:
  endpoint: "http://minio:9000"
  access_key: "minioadmin"
  secret_key: "minioadmin"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let store = config.object_store.unwrap();
        assert_eq!(store.region, "us-east-1");
        assert!(store.use_path_style);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_object_store_rejects_non_http_endpoint() {
        let store = ObjectStoreConfig {
            endpoint: "minio:9000".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            region: default_region(),
            use_path_style: true,
        };
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_object_store_rejects_empty_credentials() {
        let store = ObjectStoreConfig {
            endpoint: "http://minio:9000".to_string(),
            access_key: String::new(),
            secret_key: "sk".to_string(),
            region: default_region(),
            use_path_style: true,
        };
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_load_config_reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "redis:\n  url: \"redis://cache:6379/0\"\nlogging:\n  level: debug"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.redis.unwrap().url, "redis://cache:6379/0");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_config_fails_for_missing_file() {
        assert!(load_config("/nonexistent/infrakit.yaml").is_err());
    }
}
