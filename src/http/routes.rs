//! Axum router configuration

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;

use super::handlers::{access_check, access_guard, health_check, version_check};
use super::middleware::request_logger;
use super::proxy::video_proxy;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let endpoint = state.config.proxy.endpoint.clone();
    let cors_enabled = state.config.cors_enabled;

    let router = Router::new()
        // Health, version and metrics endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/metrics", get(metrics_handler))
        // Video proxy
        .route(&endpoint, get(video_proxy))
        // Access checks for gated pages
        .route("/api/access/check", post(access_check))
        .route("/api/access/{module}", get(access_guard))
        // Middleware
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    let router = if cors_enabled {
        // Players on another origin need Range and the range response
        // headers; page guards send Authorization.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::HEAD])
            .allow_headers([
                header::ACCEPT,
                header::RANGE,
                header::CONTENT_TYPE,
                header::ORIGIN,
                header::AUTHORIZATION,
            ])
            .expose_headers([
                header::CONTENT_LENGTH,
                header::CONTENT_RANGE,
                header::ACCEPT_RANGES,
            ])
            .allow_private_network(true)
            .max_age(Duration::from_secs(3600));
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}
