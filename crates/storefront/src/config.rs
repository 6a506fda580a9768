//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `NOSCOPE_HOST` - Bind address (default: 127.0.0.1)
//! - `NOSCOPE_PORT` - Listen port (default: 3000)
//! - `NOSCOPE_DATA_DIR` - Directory for the cart and product cache (default: `data`)
//! - `NOSCOPE_CATALOG_POLICY` - `seed-if-empty` (default) or `always-refresh`
//! - `NOSCOPE_FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 500.00)
//! - `NOSCOPE_SHIPPING_FEE` - Flat shipping fee (default: 20.00)
//! - `VIACEP_BASE_URL` - Address lookup service (default: <https://viacep.com.br/ws>)
//! - `VIACEP_TIMEOUT_SECS` - Lookup request timeout (default: 10)
//! - `VIACEP_CACHE_TTL_SECS` - How long successful lookups are memoized (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use noscope_core::Price;

use crate::shipping::ShippingPolicy;
use crate::store::CatalogPolicy;

/// Default address lookup endpoint.
pub const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br/ws";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding `cart.json` and `products.json`
    pub data_dir: PathBuf,
    /// How the product cache is reconciled with the catalog at startup
    pub catalog_policy: CatalogPolicy,
    /// Shipping fee rules
    pub shipping: ShippingPolicy,
    /// Address lookup client settings
    pub address: AddressLookupConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Address (CEP) lookup client configuration.
#[derive(Debug, Clone)]
pub struct AddressLookupConfig {
    /// Base URL; requests go to `{base_url}/{cep}/json/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Lifetime of memoized successful lookups
    pub cache_ttl: Duration,
}

impl Default for AddressLookupConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_VIACEP_BASE_URL)
                .unwrap_or_else(|_| unreachable!("default ViaCEP URL is valid")),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(get);

        let host = env.parse_or("NOSCOPE_HOST", "127.0.0.1", |s| s.parse::<IpAddr>())?;
        let port = env.parse_or("NOSCOPE_PORT", "3000", |s| s.parse::<u16>())?;
        let data_dir = PathBuf::from(env.or_default("NOSCOPE_DATA_DIR", "data"));
        let catalog_policy = env.parse_or("NOSCOPE_CATALOG_POLICY", "seed-if-empty", |s| {
            CatalogPolicy::parse(s).ok_or("expected seed-if-empty or always-refresh")
        })?;

        let shipping = ShippingPolicy {
            free_threshold: env.parse_or("NOSCOPE_FREE_SHIPPING_THRESHOLD", "500.00", Price::parse)?,
            flat_fee: env.parse_or("NOSCOPE_SHIPPING_FEE", "20.00", Price::parse)?,
        };

        let address = AddressLookupConfig {
            base_url: env.parse_or("VIACEP_BASE_URL", DEFAULT_VIACEP_BASE_URL, parse_http_url)?,
            timeout: Duration::from_secs(env.parse_or("VIACEP_TIMEOUT_SECS", "10", |s| {
                s.parse::<u64>()
            })?),
            cache_ttl: Duration::from_secs(env.parse_or("VIACEP_CACHE_TTL_SECS", "300", |s| {
                s.parse::<u64>()
            })?),
        };

        Ok(Self {
            host,
            port,
            data_dir,
            catalog_policy,
            shipping,
            address,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get and parse a variable, falling back to `default` when unset.
    fn parse_or<T, E: std::fmt::Display>(
        &self,
        key: &str,
        default: &str,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> Result<T, ConfigError> {
        let raw = self.or_default(key, default);
        parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Parse a base URL, accepting only http(s).
fn parse_http_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme {other:?}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.catalog_policy, CatalogPolicy::SeedIfEmpty);
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert_eq!(config.address.base_url.as_str(), "https://viacep.com.br/ws");
        assert_eq!(config.address.timeout, Duration::from_secs(10));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("NOSCOPE_HOST", "0.0.0.0"),
            ("NOSCOPE_PORT", "8080"),
            ("NOSCOPE_DATA_DIR", "/var/lib/noscope"),
            ("NOSCOPE_CATALOG_POLICY", "always-refresh"),
            ("NOSCOPE_FREE_SHIPPING_THRESHOLD", "300"),
            ("NOSCOPE_SHIPPING_FEE", "15.50"),
            ("VIACEP_BASE_URL", "http://localhost:9000/ws"),
            ("VIACEP_TIMEOUT_SECS", "2"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/noscope"));
        assert_eq!(config.catalog_policy, CatalogPolicy::AlwaysRefresh);
        assert_eq!(config.shipping.free_threshold, Price::from_cents(30_000));
        assert_eq!(config.shipping.flat_fee, Price::from_cents(1_550));
        assert_eq!(config.address.base_url.as_str(), "http://localhost:9000/ws");
        assert_eq!(config.address.timeout, Duration::from_secs(2));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("NOSCOPE_PORT", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("NOSCOPE_PORT", "http"),
            ("NOSCOPE_HOST", "localhost:3000"),
            ("NOSCOPE_CATALOG_POLICY", "sometimes"),
            ("NOSCOPE_SHIPPING_FEE", "-1"),
            ("VIACEP_BASE_URL", "ftp://viacep.com.br"),
            ("VIACEP_TIMEOUT_SECS", "ten"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidEnvVar(k, _) if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }
}
