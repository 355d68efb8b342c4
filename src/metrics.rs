//! Prometheus-compatible metrics endpoint

use academy_gate_lib::GuardDecision;
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Server start time
    start_time: Instant,
    /// Requests by endpoint
    requests_by_endpoint: RwLock<HashMap<String, u64>>,
    /// Playlists rewritten by the proxy
    manifests_rewritten: RwLock<u64>,
    /// References routed through the proxy
    references_rewritten: RwLock<u64>,
    /// References left unmodified because they did not resolve
    references_skipped: RwLock<u64>,
    /// Non-playlist responses streamed through
    passthrough_responses: RwLock<u64>,
    /// Upstream fetch failures
    upstream_errors: RwLock<u64>,
    /// Access and guard outcomes
    access_decisions: RwLock<HashMap<&'static str, u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests_by_endpoint: RwLock::new(HashMap::new()),
            manifests_rewritten: RwLock::new(0),
            references_rewritten: RwLock::new(0),
            references_skipped: RwLock::new(0),
            passthrough_responses: RwLock::new(0),
            upstream_errors: RwLock::new(0),
            access_decisions: RwLock::new(HashMap::new()),
        }
    }

    /// Record a request
    pub fn record_request(&self, endpoint: &str) {
        *self
            .requests_by_endpoint
            .write()
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    /// Record a rewritten playlist
    pub fn record_manifest(&self, rewritten: usize, skipped: usize) {
        *self.manifests_rewritten.write() += 1;
        *self.references_rewritten.write() += rewritten as u64;
        *self.references_skipped.write() += skipped as u64;
    }

    pub fn record_passthrough(&self) {
        *self.passthrough_responses.write() += 1;
    }

    pub fn record_upstream_error(&self) {
        *self.upstream_errors.write() += 1;
    }

    /// Record a plain access check
    pub fn record_access(&self, granted: bool) {
        self.record_decision(if granted { "granted" } else { "denied" });
    }

    /// Record a guard decision
    pub fn record_guard(&self, decision: &GuardDecision) {
        self.record_decision(match decision {
            GuardDecision::Render => "render",
            GuardDecision::Wait => "wait",
            GuardDecision::Redirect { .. } => "redirect",
        });
    }

    fn record_decision(&self, outcome: &'static str) {
        *self.access_decisions.write().entry(outcome).or_insert(0) += 1;
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        write_metric(
            &mut output,
            "academy_gate_uptime_seconds",
            "Server uptime in seconds",
            "counter",
            self.uptime_secs(),
        );

        output.push_str("# HELP academy_gate_requests_total Requests by endpoint\n");
        output.push_str("# TYPE academy_gate_requests_total counter\n");
        let mut endpoints: Vec<_> = self
            .requests_by_endpoint
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        endpoints.sort();
        for (endpoint, count) in endpoints {
            let _ = writeln!(
                output,
                "academy_gate_requests_total{{endpoint=\"{}\"}} {}",
                endpoint, count
            );
        }

        write_metric(
            &mut output,
            "academy_gate_manifests_rewritten_total",
            "Playlists rewritten by the video proxy",
            "counter",
            *self.manifests_rewritten.read(),
        );
        write_metric(
            &mut output,
            "academy_gate_references_rewritten_total",
            "Playlist references routed through the proxy",
            "counter",
            *self.references_rewritten.read(),
        );
        write_metric(
            &mut output,
            "academy_gate_references_skipped_total",
            "Playlist references left unmodified",
            "counter",
            *self.references_skipped.read(),
        );
        write_metric(
            &mut output,
            "academy_gate_passthrough_responses_total",
            "Media responses streamed through unchanged",
            "counter",
            *self.passthrough_responses.read(),
        );
        write_metric(
            &mut output,
            "academy_gate_upstream_errors_total",
            "Failed upstream fetches",
            "counter",
            *self.upstream_errors.read(),
        );

        output.push_str("# HELP academy_gate_access_decisions_total Access decisions by outcome\n");
        output.push_str("# TYPE academy_gate_access_decisions_total counter\n");
        let mut decisions: Vec<_> = self
            .access_decisions
            .read()
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect();
        decisions.sort();
        for (outcome, count) in decisions {
            let _ = writeln!(
                output,
                "academy_gate_access_decisions_total{{outcome=\"{}\"}} {}",
                outcome, count
            );
        }

        output
    }
}

fn write_metric(output: &mut String, name: &str, help: &str, kind: &str, value: u64) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} {}", name, kind);
    let _ = writeln!(output, "{} {}", name, value);
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        state.metrics.export_prometheus(),
    )
        .into_response()
}
