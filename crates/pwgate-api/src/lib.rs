//! pwgate API /v1: REST endpoints for password validation and policy administration
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use metrics::ApiMetrics;
use once_cell::sync::OnceCell;
use pwgate_core::PasswordConfig;
use pwgate_handlers::{BreachChecker, BreachError};
use pwgate_policy::PatchEngine;
use pwgate_store::{PolicyService, PolicyStore};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Upper bound on one validation call, breach lookup included
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PasswordConfig>,
    pub engine: Arc<PatchEngine>,
    breach: Arc<OnceCell<BreachChecker>>,
    pub metrics: Arc<ApiMetrics>,
    pub validation_timeout: Duration,
}

impl AppState {
    pub fn new(config: PasswordConfig, store: Arc<dyn PolicyStore>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(PatchEngine::new(store)),
            breach: Arc::new(OnceCell::new()),
            metrics: Arc::new(ApiMetrics::new()?),
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
        })
    }

    /// Use `checker` instead of building one from the config
    pub fn with_breach_checker(mut self, checker: BreachChecker) -> Self {
        self.breach = Arc::new(OnceCell::with_value(checker));
        self
    }

    /// Shared breach checker, built from the config on first use.
    ///
    /// Builds a blocking HTTP client, so call it from a blocking thread.
    pub fn breach_checker(&self) -> Result<&BreachChecker, BreachError> {
        self.breach
            .get_or_try_init(|| BreachChecker::from_config(&self.config))
    }

    /// Whether the shared breach checker exists yet
    pub fn has_breach_checker(&self) -> bool {
        self.breach.get().is_some()
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn with_prefix_segments(mut self, segments: usize) -> Self {
        let store = self.engine.policies().store().clone();
        self.engine = Arc::new(PatchEngine::new(store).with_prefix_segments(segments));
        self
    }

    pub fn policies(&self) -> &PolicyService {
        self.engine.policies()
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/passwords/validate", post(handlers::validate_password))
        .route(
            "/v1/password-policies",
            get(handlers::list_policies).patch(handlers::patch_policies),
        )
        .route("/v1/password-policies/{key}", get(handlers::get_policy))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("pwgate API listening on {}", addr);
    axum::serve(listener, app).await
}
