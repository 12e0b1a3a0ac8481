//! HTTP routes for the Chaos Service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::providers::Providers;
use crate::services::{FailureInjector, HealthValidator, SystemHealthService, TargetSelector};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Provider clients, used directly by the readiness probe.
    pub providers: Providers,

    pub target_selector: Arc<TargetSelector>,
    pub failure_injector: Arc<FailureInjector>,
    pub health_validator: Arc<HealthValidator>,
    pub system_health: Arc<SystemHealthService>,
}

impl AppState {
    /// Wire every service to the given providers.
    pub fn new(config: Config, providers: Providers) -> Self {
        let target_selector = Arc::new(TargetSelector::new(
            providers.compute.clone(),
            config.chaos_tag_key.clone(),
        ));
        let failure_injector = Arc::new(FailureInjector::new(
            providers.compute.clone(),
            config.chaos_tag_key.clone(),
        ));
        let health_validator = Arc::new(HealthValidator::new(
            providers.load_balancing.clone(),
            providers.metrics.clone(),
            config.thresholds,
        ));
        let system_health = Arc::new(SystemHealthService::new(
            providers.clone(),
            config.target_asg_name.clone(),
            config.target_group_arn.clone(),
            config.load_balancer_arn.clone(),
        ));

        Self {
            config,
            providers,
            target_selector,
            failure_injector,
            health_validator,
            system_health,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK")
/// - `/ready` - Readiness probe (compute API reachable)
/// - `/metrics` - Prometheus metrics endpoint
/// - `/api/v1/targets/select` - Target selection
/// - `/api/v1/failures/inject` - Failure injection
/// - `/api/v1/health/validate` - Health validation
/// - `/api/v1/system/health` - System health snapshot
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/targets/select", post(handlers::select_target))
        .route("/api/v1/failures/inject", post(handlers::inject_failure))
        .route("/api/v1/health/validate", post(handlers::validate_health))
        .route("/api/v1/system/health", get(handlers::system_health))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees framework rejections too)
    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
