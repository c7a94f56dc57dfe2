//! Connection pool configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for [`crate::Pool::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// PostgreSQL connection URI.
    pub uri: String,

    /// Connections kept open (default: 1).
    #[serde(default = "default_min_size")]
    pub min_size: u32,

    /// Upper bound on open connections (default: 10).
    #[serde(default = "default_max_size")]
    pub max_size: u32,

    /// Seconds to wait for a free connection (default: 30).
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_min_size() -> u32 {
    1
}

fn default_max_size() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

impl PoolConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }

    /// Reads the URI from `DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        std::env::var("DATABASE_URL")
            .map(Self::new)
            .map_err(|_| Error::Config("DATABASE_URL is not set".into()))
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            return Err(Error::Config("uri is required".into()));
        }
        if !(self.uri.starts_with("postgres://") || self.uri.starts_with("postgresql://")) {
            return Err(Error::Config(
                "uri must start with postgres:// or postgresql://".into(),
            ));
        }
        if self.max_size == 0 {
            return Err(Error::Config("max_size must be at least 1".into()));
        }
        if self.min_size > self.max_size {
            return Err(Error::Config(format!(
                "min_size ({}) cannot exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"uri": "postgres://app@localhost/app"}"#).unwrap();
        assert_eq!(config, PoolConfig::new("postgres://app@localhost/app"));
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(PoolConfig::new("").validate().is_err());
        assert!(PoolConfig::new("mysql://localhost/db").validate().is_err());
        assert!(PoolConfig::new("postgresql://localhost/db").validate().is_ok());

        let mut config = PoolConfig::new("postgres://localhost/db");
        config.max_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.max_size = 2;
        config.min_size = 3;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
