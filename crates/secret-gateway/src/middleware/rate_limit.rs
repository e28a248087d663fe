//! Per-IP rate limiting middleware using the GCRA token bucket from `governor`.
//!
//! Each client IP gets `max_requests` of burst that refills evenly over
//! `window_secs`. Over-limit requests get 429 with a `Retry-After` header.

use crate::domain::config::RateLimitConfig;
use crate::domain::error::ApiError;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Token bucket entry for an IP address
struct TokenBucket {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    /// Last access time (for cleanup)
    last_access: Instant,
}

impl TokenBucket {
    fn new(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::direct(quota),
            last_access: Instant::now(),
        }
    }

    fn check(&mut self) -> Result<(), Duration> {
        self.last_access = Instant::now();
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }
}

/// Build the per-IP quota: `max_requests` burst, one token back every
/// `window / max_requests`.
fn quota_for(config: &RateLimitConfig) -> Quota {
    let max = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
    let period = config.window() / max.get();
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(max))
        .allow_burst(max)
}

/// Rate limiter state shared across requests
pub struct RateLimitState {
    /// Per-IP token buckets
    buckets: DashMap<IpAddr, TokenBucket>,
    quota: Quota,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            quota: quota_for(&config),
            config,
        }
    }

    /// Check if a request from `ip` should be allowed.
    /// `Err` carries the time until the next token.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        if !self.config.enabled {
            return Ok(());
        }

        let mut bucket = self.buckets.entry(ip).or_insert_with(|| {
            debug!(ip = %ip, "Creating new rate limit bucket");
            TokenBucket::new(self.quota)
        });

        bucket.check()
    }

    /// Drop buckets idle for longer than `max_age`
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.buckets.retain(|ip, bucket| {
            let age = now.duration_since(bucket.last_access);
            if age > max_age {
                debug!(ip = %ip, age_secs = age.as_secs(), "Removing stale rate limit bucket");
                false
            } else {
                true
            }
        });
    }

    /// Get number of tracked IPs
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn trust_proxy_headers(&self) -> bool {
        self.config.trust_proxy_headers
    }
}

/// Rate limit layer
#[derive(Clone)]
pub struct RateLimitLayer {
    state: Arc<RateLimitState>,
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(RateLimitState::new(config)),
        }
    }

    pub fn state(&self) -> Arc<RateLimitState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Rate limit service
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    state: Arc<RateLimitState>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ip = extract_client_ip(&req, state.trust_proxy_headers());

            match state.check(ip) {
                Ok(()) => inner.call(req).await,
                Err(retry_after) => {
                    let retry_ms = retry_after.as_millis() as u64;
                    warn!(ip = %ip, retry_after_ms = retry_ms, "Rate limit exceeded");
                    Ok(rate_limit_response(retry_ms))
                }
            }
        })
    }
}

/// Extract client IP from request
fn extract_client_ip<B>(req: &Request<B>, trust_proxy_headers: bool) -> IpAddr {
    if trust_proxy_headers {
        // X-Forwarded-For: first entry is the original client
        if let Some(ip) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }

        if let Some(ip) = req
            .headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }
    }

    if let Some(connect_info) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip();
    }

    // No connection info (in-process callers)
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// Create rate limit exceeded response
fn rate_limit_response(retry_after_ms: u64) -> Response {
    let mut response = ApiError::rate_limited().into_response();
    let retry_secs = retry_after_ms.div_ceil(1000).max(1);
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
    response
}

/// Background task to clean up stale rate limit buckets
pub async fn cleanup_task(state: Arc<RateLimitState>, interval: Duration, max_age: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        state.cleanup(max_age);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            max_requests: 5,
            window_secs: 60,
            trust_proxy_headers: false,
            stale_after_secs: 60,
        }
    }

    #[test]
    fn test_rate_limit_allows_within_limit() {
        let state = RateLimitState::new(test_config());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        for _ in 0..5 {
            assert!(state.check(ip).is_ok());
        }
    }

    #[test]
    fn test_rate_limit_blocks_over_limit() {
        let state = RateLimitState::new(test_config());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        for _ in 0..5 {
            let _ = state.check(ip);
        }

        let wait = state.check(ip).unwrap_err();
        // One token per 12s
        assert!(wait <= Duration::from_secs(12));
        assert!(wait > Duration::ZERO);
    }

    #[test]
    fn test_limits_are_per_ip() {
        let state = RateLimitState::new(test_config());
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 4));

        for _ in 0..5 {
            let _ = state.check(a);
        }
        assert!(state.check(a).is_err());
        assert!(state.check(b).is_ok());
    }

    #[test]
    fn test_disabled_rate_limiting() {
        let mut config = test_config();
        config.enabled = false;
        let state = RateLimitState::new(config);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));

        for _ in 0..100 {
            assert!(state.check(ip).is_ok());
        }
    }

    #[test]
    fn test_cleanup_removes_stale_buckets() {
        let state = RateLimitState::new(test_config());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6));

        let _ = state.check(ip);
        assert_eq!(state.bucket_count(), 1);

        state.cleanup(Duration::from_secs(3600));
        assert_eq!(state.bucket_count(), 1);

        // Cleanup with 0 duration should remove all
        state.cleanup(Duration::ZERO);
        assert_eq!(state.bucket_count(), 0);
    }

    #[test]
    fn test_cleanup_keeps_exhausted_bucket_within_window() {
        let config = RateLimitConfig {
            max_requests: 2,
            window_secs: 3600,
            stale_after_secs: 1,
            ..test_config()
        };
        let max_age = config.stale_after();
        let state = RateLimitState::new(config);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

        assert!(state.check(ip).is_ok());
        assert!(state.check(ip).is_ok());
        assert!(state.check(ip).is_err());

        std::thread::sleep(Duration::from_millis(1100));
        state.cleanup(max_age);

        assert_eq!(state.bucket_count(), 1);
        assert!(state.check(ip).is_err());
    }

    #[test]
    fn test_client_ip_ignores_proxy_headers_by_default() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            extract_client_ip(&req, false),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
        assert_eq!(
            extract_client_ip(&req, true),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_client_ip_real_ip_header() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(
            extract_client_ip(&req, true),
            "198.51.100.2".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_client_ip_from_connect_info() {
        let mut req = Request::builder().body(()).unwrap();
        let addr: SocketAddr = "198.51.100.9:4242".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(extract_client_ip(&req, false), addr.ip());
    }

    #[test]
    fn test_rate_limit_response_headers() {
        let response = rate_limit_response(1500);
        assert_eq!(response.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "2");
    }
}
