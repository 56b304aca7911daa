//! Application configuration management

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};

/// Database settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Primary database URL (read-write), e.g. `sqlite:./data/finance.db`
    pub url: String,

    /// Optional replica URL for reads. When absent the primary file is
    /// opened a second time in read-only mode.
    pub read_only_url: Option<String>,

    /// Pool size for each of the two pools
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/finance.db".to_string(),
            read_only_url: None,
            max_connections: 10,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    pub database: DatabaseConfig,

    /// Maximum GraphQL query depth in fields; four admits
    /// `transactions { items { category { name } } }` and nothing deeper
    pub graphql_depth_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = DatabaseConfig::default();

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").unwrap_or(defaults.url),

            read_only_url: lookup("DATABASE_READ_ONLY_URL").filter(|url| !url.is_empty()),

            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),

            connect_timeout: lookup("DATABASE_CONNECT_TIMEOUT_SECS")
                .map(|v| v.parse().map(Duration::from_secs))
                .transpose()
                .context("Invalid DATABASE_CONNECT_TIMEOUT_SECS")?
                .unwrap_or(defaults.connect_timeout),
        };

        Ok(Self {
            host: lookup("HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string())
                .parse()
                .context("Invalid HOST")?,

            port: lookup("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database,

            graphql_depth_limit: lookup("GRAPHQL_DEPTH_LIMIT")
                .unwrap_or_else(|| "4".to_string())
                .parse()
                .context("Invalid GRAPHQL_DEPTH_LIMIT")?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.graphql_depth_limit, 4);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_READ_ONLY_URL", "sqlite:./replica.db"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_CONNECT_TIMEOUT_SECS", "5"),
            ("GRAPHQL_DEPTH_LIMIT", "6"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(
            config.database.read_only_url.as_deref(),
            Some("sqlite:./replica.db")
        );
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.graphql_depth_limit, 6);
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid PORT");

        let err = load(&[("DATABASE_MAX_CONNECTIONS", "-1")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid DATABASE_MAX_CONNECTIONS");
    }

    #[test]
    fn empty_replica_url_is_ignored() {
        let config = load(&[("DATABASE_READ_ONLY_URL", "")]).unwrap();
        assert_eq!(config.database.read_only_url, None);
    }
}
