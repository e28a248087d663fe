//! Middleware stack for the gateway.
//!
//! Layer order: Request → CORS → Tracing → RateLimit → Handler
//!
//! CORS sits outermost: preflight requests never reach the rate limiter.

pub mod cors;
pub mod rate_limit;
pub mod tracing;

pub use cors::create_cors_layer;
pub use rate_limit::{RateLimitLayer, RateLimitState};
pub use self::tracing::TracingLayer;
