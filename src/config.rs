/// Configuration management for the Aurora identity service
use crate::error::{ResolverError, ResolverResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub identity: IdentityConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// DID resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub did_plc_url: String,
    /// Upstream request budget in milliseconds
    pub timeout_ms: u64,
    pub negative_caching: bool,
    pub user_agent: String,
}

/// Where resolved documents are cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CacheBackend {
    None,
    Memory,
    Sqlite { location: PathBuf },
}

/// DID cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Seconds before an entry is revalidated in the background
    pub did_cache_stale_ttl: u64,
    /// Seconds before an entry must be refetched
    pub did_cache_max_ttl: u64,
    /// Seconds between expired-entry sweeps
    pub cleanup_interval: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub level: String,
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CacheConfig {
    pub fn stale_ttl(&self) -> Duration {
        Duration::from_secs(self.did_cache_stale_ttl)
    }

    pub fn max_ttl(&self) -> Duration {
        Duration::from_secs(self.did_cache_max_ttl)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ResolverResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("PDS_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("PDS_PORT")
            .unwrap_or_else(|_| "2584".to_string())
            .parse()
            .map_err(|_| ResolverError::Validation("Invalid port number".to_string()))?;
        let version = env::var("PDS_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let did_plc_url = env::var("PDS_DID_PLC_URL")
            .unwrap_or_else(|_| "https://plc.directory".to_string());
        let timeout_ms = env::var("PDS_DID_RESOLVER_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ResolverError::Validation("Invalid resolver timeout".to_string()))?;
        let negative_caching = env::var("PDS_DID_NEGATIVE_CACHING")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);
        let user_agent = env::var("PDS_USER_AGENT")
            .unwrap_or_else(|_| format!("Aurora-Identity/{}", env!("CARGO_PKG_VERSION")));

        let data_directory: PathBuf = env::var("PDS_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let backend = match env::var("PDS_DID_CACHE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .as_str()
        {
            "none" => CacheBackend::None,
            "memory" => CacheBackend::Memory,
            "sqlite" => CacheBackend::Sqlite {
                location: env::var("PDS_DID_CACHE_DB_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| data_directory.join("did_cache.sqlite")),
            },
            other => {
                return Err(ResolverError::Validation(format!(
                    "Unknown DID cache backend: {}",
                    other
                )))
            }
        };
        let did_cache_stale_ttl = env::var("PDS_DID_CACHE_STALE_TTL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);
        let did_cache_max_ttl = env::var("PDS_DID_CACHE_MAX_TTL")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);
        let cleanup_interval = env::var("PDS_DID_CACHE_CLEANUP_INTERVAL")
            .unwrap_or_else(|_| "1800".to_string())
            .parse()
            .unwrap_or(1800);

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "aurora_identity=debug,tower_http=debug".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            identity: IdentityConfig {
                did_plc_url,
                timeout_ms,
                negative_caching,
                user_agent,
            },
            cache: CacheConfig {
                backend,
                did_cache_stale_ttl,
                did_cache_max_ttl,
                cleanup_interval,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ResolverResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ResolverError::Validation("Hostname cannot be empty".to_string()));
        }

        if !self.identity.did_plc_url.starts_with("http://")
            && !self.identity.did_plc_url.starts_with("https://")
        {
            return Err(ResolverError::Validation(
                "PLC directory URL must be http(s)".to_string(),
            ));
        }

        if self.identity.timeout_ms == 0 {
            return Err(ResolverError::Validation(
                "Resolver timeout must be greater than zero".to_string(),
            ));
        }

        if self.cache.cleanup_interval == 0 {
            return Err(ResolverError::Validation(
                "DID cache cleanup interval must be greater than zero".to_string(),
            ));
        }

        if self.cache.did_cache_stale_ttl > self.cache.did_cache_max_ttl {
            return Err(ResolverError::Validation(
                "DID cache stale TTL cannot exceed max TTL".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 2584,
                version: "0.1.0".to_string(),
            },
            identity: IdentityConfig {
                did_plc_url: "https://plc.directory".to_string(),
                timeout_ms: 3000,
                negative_caching: false,
                user_agent: "test".to_string(),
            },
            cache: CacheConfig {
                backend: CacheBackend::Memory,
                did_cache_stale_ttl: 3600,
                did_cache_max_ttl: 86400,
                cleanup_interval: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        let config = test_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.identity.timeout(), Duration::from_millis(3000));
        assert_eq!(config.cache.stale_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_ttls() {
        let mut config = test_config();
        config.cache.did_cache_stale_ttl = 90000;
        assert!(matches!(config.validate(), Err(ResolverError::Validation(_))));
    }

    #[test]
    fn test_invalid_plc_url() {
        let mut config = test_config();
        config.identity.did_plc_url = "plc.directory".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cleanup_interval() {
        let mut config = test_config();
        config.cache.cleanup_interval = 0;
        assert!(matches!(config.validate(), Err(ResolverError::Validation(_))));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = test_config();
        config.identity.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
