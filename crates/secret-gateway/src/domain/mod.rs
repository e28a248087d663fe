//! Domain types for the gateway: configuration, errors and wire bodies.

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig, RateLimitConfig};
pub use error::{ApiError, ApiResult, GatewayError};
pub use types::{GenerateSecretRequest, GenerateSecretResponse};
