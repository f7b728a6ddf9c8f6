use std::time::Duration;

use crate::services::cache::CachePolicy;

const DEFAULT_OPENWEATHERMAP_API_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_IPGEOLOCATION_API_URL: &str = "https://api.ipgeolocation.io/ipgeo";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Credentials and base URL for one upstream provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_url: String,
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openweathermap: ProviderConfig,
    pub ipgeolocation: ProviderConfig,
    pub port: u16,
    /// Shared by every cache region.
    pub cache: CachePolicy,
    /// Per-request timeout for upstream calls.
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let or_default = |name: &str, default: &str| {
            lookup(name).unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            openweathermap: ProviderConfig {
                api_key: required("OPENWEATHERMAP_API_KEY")?,
                api_url: or_default("OPENWEATHERMAP_API_URL", DEFAULT_OPENWEATHERMAP_API_URL),
            },
            ipgeolocation: ProviderConfig {
                api_key: required("IPGEOLOCATION_API_KEY")?,
                api_url: or_default("IPGEOLOCATION_API_URL", DEFAULT_IPGEOLOCATION_API_URL),
            },
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            cache: CachePolicy {
                max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES)?,
                ttl: Duration::from_secs(parse_or(
                    &lookup,
                    "CACHE_TTL_SECS",
                    DEFAULT_CACHE_TTL_SECS,
                )?),
            },
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
