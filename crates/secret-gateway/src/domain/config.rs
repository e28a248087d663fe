//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Origins the original browser clients are served from.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = [
    "http://localhost:3000",
    "https://secretmanager-delta.vercel.app",
];

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.enabled {
            if self.rate_limit.max_requests == 0 {
                return Err(ConfigError::InvalidRateLimit(
                    "max_requests cannot be 0".into(),
                ));
            }
            if self.rate_limit.window_secs == 0 {
                return Err(ConfigError::InvalidRateLimit(
                    "window_secs cannot be 0".into(),
                ));
            }
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        if self.cors.enabled && self.cors.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "cors.allowed_origins cannot be empty when CORS is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 3000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

/// Per-IP rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Requests allowed per window per IP
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// Take the client IP from X-Forwarded-For / X-Real-IP
    pub trust_proxy_headers: bool,
    /// Idle time after which a client's bucket is dropped, in seconds
    pub stale_after_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
            trust_proxy_headers: false,
            stale_after_secs: 30 * 60,
        }
    }
}

impl RateLimitConfig {
    /// Window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Idle age after which a bucket may be dropped. Never shorter than the
    /// window: a bucket idle for a full window has refilled completely.
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs.max(self.window_secs))
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 100KB)
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 100 * 1024,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            allowed_methods: vec!["POST".to_string()],
            allowed_headers: vec!["Content-Type".to_string()],
            max_age: 86400, // 24 hours
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid rate limiting configuration
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr().port(), 3000);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(900));
    }

    #[test]
    fn test_zero_rate_limit_invalid() {
        let mut config = GatewayConfig::default();
        config.rate_limit.max_requests = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRateLimit(_))
        ));
    }

    #[test]
    fn test_zero_rate_limit_allowed_when_disabled() {
        let mut config = GatewayConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stale_after_never_shorter_than_window() {
        let mut config = RateLimitConfig::default();
        assert_eq!(config.stale_after(), Duration::from_secs(1800));

        config.window_secs = 3600;
        config.stale_after_secs = 1;
        assert_eq!(config.stale_after(), Duration::from_secs(3600));
    }

    #[test]
    fn test_zero_body_limit_invalid() {
        let mut config = GatewayConfig::default();
        config.limits.max_request_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(_))));
    }

    #[test]
    fn test_empty_origins_invalid() {
        let mut config = GatewayConfig::default();
        config.cors.allowed_origins.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_cors_origins() {
        let cors = CorsConfig::default();
        assert!(cors
            .allowed_origins
            .contains(&"https://secretmanager-delta.vercel.app".to_string()));
        assert_eq!(cors.allowed_methods, vec!["POST".to_string()]);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"http": {"port": 8080}}"#).unwrap();
        assert_eq!(config.http.port, 8080);
        assert!(config.rate_limit.enabled);
    }
}
