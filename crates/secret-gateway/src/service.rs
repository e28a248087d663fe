//! Gateway service: router construction, handlers and server lifecycle.

use crate::domain::config::GatewayConfig;
use crate::domain::error::{ApiError, ApiResult, GatewayError};
use crate::domain::types::{GenerateSecretRequest, GenerateSecretResponse};
use crate::middleware::{create_cors_layer, rate_limit, RateLimitLayer, RateLimitState, TracingLayer};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secret_derivation::SecretDeriver;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, error, info};

/// HTTP gateway around a [`SecretDeriver`]
pub struct SecretGatewayService {
    config: GatewayConfig,
    deriver: Arc<SecretDeriver>,
    rate_limit: RateLimitLayer,
}

impl SecretGatewayService {
    /// Create a new gateway service
    pub fn new(config: GatewayConfig, deriver: SecretDeriver) -> Result<Self, GatewayError> {
        config.validate()?;

        let rate_limit = RateLimitLayer::new(config.rate_limit.clone());

        Ok(Self {
            config,
            deriver: Arc::new(deriver),
            rate_limit,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Rate limit state (shared with the cleanup task)
    pub fn rate_limit_state(&self) -> Arc<RateLimitState> {
        self.rate_limit.state()
    }

    /// Build the HTTP router for the configured port
    pub fn router(&self) -> Router {
        self.build_router(self.config.http.port)
    }

    fn build_router(&self, port: u16) -> Router {
        let state = AppState {
            deriver: Arc::clone(&self.deriver),
            port,
        };

        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TracingLayer::new())
            .layer(self.rate_limit.clone());

        Router::new()
            .route("/generate-secret", post(generate_secret))
            .route("/", post(server_status))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(self.config.limits.max_request_size))
            .layer(middleware)
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        let router = self.build_router(addr.port());
        let cleanup = self.start_cleanup_task();

        info!(
            addr = %addr,
            rounds = self.deriver.rounds().get(),
            rate_limit = self.config.rate_limit.enabled,
            "Starting HTTP server"
        );

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        cleanup.abort();

        if let Err(e) = result {
            error!(error = %e, "HTTP server error");
            return Err(GatewayError::Serve(e.to_string()));
        }

        info!("HTTP server stopped");
        Ok(())
    }

    /// Periodically drop idle rate limit buckets
    fn start_cleanup_task(&self) -> JoinHandle<()> {
        let state = self.rate_limit.state();
        let max_age = self.config.rate_limit.stale_after();
        let interval = (max_age / 2).max(Duration::from_secs(1));
        tokio::spawn(rate_limit::cleanup_task(state, interval, max_age))
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    deriver: Arc<SecretDeriver>,
    port: u16,
}

/// `POST /generate-secret`
async fn generate_secret(
    State(state): State<AppState>,
    payload: Result<Json<GenerateSecretRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateSecretResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Malformed request body");
        ApiError::from(rejection)
    })?;

    if let Err(e) = state
        .deriver
        .validate(request.phrase.as_deref(), request.timestamp.as_deref())
    {
        debug!(field = e.field(), "Rejected derivation request");
        return Err(e.into());
    }

    // Both fields are present once validation passed.
    let phrase = request.phrase.unwrap_or_default();
    let timestamp = request.timestamp.unwrap_or_default();

    // Stretching is CPU-bound; keep it off the async workers.
    let started = Instant::now();
    let deriver = Arc::clone(&state.deriver);
    let (seed_phrase, seed_timestamp) = (phrase.clone(), timestamp.clone());
    let secret = tokio::task::spawn_blocking(move || deriver.derive(&seed_phrase, &seed_timestamp))
        .await
        .map_err(|e| {
            error!(error = %e, "Derivation task failed");
            ApiError::internal()
        })?
        .map_err(|e| {
            error!(error = %e, "Derivation failed");
            ApiError::internal()
        })?;

    debug!(
        rounds = state.deriver.rounds().get(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Derived secret"
    );

    Ok(Json(GenerateSecretResponse {
        secret,
        phrase,
        timestamp,
    }))
}

/// `POST /` status line
async fn server_status(State(state): State<AppState>) -> String {
    format!("Server running on port {}", state.port)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "secret-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
