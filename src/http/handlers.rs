//! HTTP request handlers
//!
//! Service endpoints and the access endpoints used by page guards.

use academy_gate_lib::{guard, has_access, GuardDecision, User};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("academy-gate v", env!("CARGO_PKG_VERSION"))
}

/// Body of an access check: a user the caller already fetched, and the
/// module or plan to test.
#[derive(Debug, Deserialize)]
pub struct AccessCheckRequest {
    pub user: User,
    pub target: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessCheckResponse {
    pub granted: bool,
}

/// POST /api/access/check
pub async fn access_check(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AccessCheckRequest>,
) -> Json<AccessCheckResponse> {
    state.metrics.record_request("access_check");

    let granted = has_access(&request.user, &request.target, Utc::now());
    state.metrics.record_access(granted);
    tracing::debug!(target_module = %request.target, granted, "Access check");

    Json(AccessCheckResponse { granted })
}

/// GET /api/access/{module}
///
/// Resolves the caller's session and returns what the gated page should do.
pub async fn access_guard(
    State(state): State<Arc<AppState>>,
    Path(module): Path<String>,
    headers: HeaderMap,
) -> Result<Json<GuardDecision>> {
    state.metrics.record_request("access_guard");

    let session = state.session.resolve(&headers).await?;
    let decision = guard(&session, &module, Utc::now(), &state.guard_routes);
    state.metrics.record_guard(&decision);
    tracing::debug!(module = %module, ?decision, "Guard decision");

    Ok(Json(decision))
}
