use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::models::BlockedApps;
use domain::services::{UsageAggregator, UsageRefresher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{app_usage, blocked_apps, health};
use crate::services::SnapshotSource;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub snapshots: Arc<SnapshotSource>,
    pub refresher: Arc<UsageRefresher>,
    pub blocked: Arc<RwLock<BlockedApps>>,
}

impl AppState {
    pub fn new(config: Config, snapshots: SnapshotSource) -> Self {
        let aggregator = UsageAggregator::new(config.aggregation.aggregator_config());
        Self {
            config: Arc::new(config),
            snapshots: Arc::new(snapshots),
            refresher: Arc::new(UsageRefresher::new(aggregator)),
            blocked: Arc::new(RwLock::new(BlockedApps::new())),
        }
    }
}

pub fn create_app(config: Config, snapshots: SnapshotSource) -> Router {
    router(AppState::new(config, snapshots))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let usage_routes = Router::new()
        .route("/api/v1/app-usage", get(app_usage::get_app_usage))
        .route("/api/v1/app-usage/latest", get(app_usage::get_latest_app_usage))
        .route(
            "/api/v1/app-usage/categories",
            get(app_usage::get_category_breakdown),
        )
        .route("/api/v1/blocked-apps", get(blocked_apps::list_blocked_apps))
        .route(
            "/api/v1/blocked-apps/:package_id/toggle",
            post(blocked_apps::toggle_blocked_app),
        )
        .route(
            "/api/v1/blocked-apps/:package_id",
            delete(blocked_apps::unblock_app),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(usage_routes)
        // Layers added last wrap outermost
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
