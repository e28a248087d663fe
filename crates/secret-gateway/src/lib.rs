// Allow missing docs for internal items
#![allow(missing_docs)]

//! Secret Gateway - HTTP interface for keyed passphrase derivation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     SECRET GATEWAY                          │
//! ├────────────────────────────────────────────────────────────┤
//! │   POST /generate-secret    POST /        GET /health        │
//! │            │                                                │
//! │  ┌─────────┴──────────────────────────────────────┐        │
//! │  │                Middleware Stack                 │        │
//! │  │   CORS → Tracing → RateLimit → BodyLimit        │        │
//! │  └─────────┬──────────────────────────────────────┘        │
//! │            │                                                │
//! │  ┌─────────┴──────────────────────────────────────┐        │
//! │  │   Validation  →  spawn_blocking(derive)         │        │
//! │  └─────────┬──────────────────────────────────────┘        │
//! └────────────┼───────────────────────────────────────────────┘
//!              ▼
//!       secret-derivation
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use secret_gateway::{GatewayConfig, SecretGatewayService};
//!
//! let service = SecretGatewayService::new(GatewayConfig::default(), deriver)?;
//! service.start(shutdown_signal()).await?;
//! ```
//!
//! # Security
//!
//! - Per-IP rate limiting with token bucket algorithm
//! - CORS allow-list for browser callers
//! - Request body size limit
//! - Passphrases and derived secrets are never logged

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod service;

// Re-exports for public API
pub use domain::config::{CorsConfig, GatewayConfig, HttpConfig, LimitsConfig, RateLimitConfig};
pub use domain::error::{ApiError, ApiResult, GatewayError, RATE_LIMIT_MESSAGE};
pub use domain::types::*;
pub use middleware::RateLimitState;
pub use service::SecretGatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
