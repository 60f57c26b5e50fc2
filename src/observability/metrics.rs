//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): decisions by outcome, rule
//! - `gateway_decision_duration_seconds` (histogram): pipeline latency
//! - `gateway_auth_rejections_total` (counter): by rejection reason
//! - `gateway_rate_limited_total` (counter): limiter rejections
//! - `gateway_internal_faults_total` (counter): by component, so operators
//!   can tell "attackers are being blocked" from "the gateway is broken"
//!
//! # Design Decisions
//! - Low-overhead updates via the `metrics` facade (atomic operations)
//! - Prometheus exposition on a separate listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            metrics::describe_counter!(
                "gateway_requests_total",
                "Pipeline decisions by outcome and matched rule"
            );
            metrics::describe_histogram!(
                "gateway_decision_duration_seconds",
                "Time from ingress to terminal decision"
            );
            metrics::describe_counter!(
                "gateway_auth_rejections_total",
                "Auth rejections by reason"
            );
            metrics::describe_counter!(
                "gateway_rate_limited_total",
                "Requests rejected by the rate limiter"
            );
            metrics::describe_counter!(
                "gateway_internal_faults_total",
                "Internal faults by component (config, limiter, verifier)"
            );
            tracing::info!(address = %addr, "Metrics exporter started");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Record one terminal pipeline decision.
pub fn record_decision(outcome: &'static str, rule: &str, start: Instant) {
    let labels = [
        ("outcome", outcome.to_string()),
        ("rule", rule.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_decision_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record an auth rejection (policy rejection, not a fault).
pub fn record_auth_rejected(reason: &'static str) {
    metrics::counter!("gateway_auth_rejections_total", "reason" => reason).increment(1);
}

/// Record a rate-limit rejection (policy rejection, not a fault).
pub fn record_rate_limited(rule: &str) {
    metrics::counter!("gateway_rate_limited_total", "rule" => rule.to_string()).increment(1);
}

/// Record a rule excluded at load time (configuration fault).
pub fn record_config_fault(kind: &'static str) {
    metrics::counter!("gateway_internal_faults_total", "component" => "config", "kind" => kind)
        .increment(1);
}

/// Record a limiter internal fault that failed open.
pub fn record_limiter_fault() {
    metrics::counter!("gateway_internal_faults_total", "component" => "limiter").increment(1);
}

/// Record a token-verifier fault that failed closed.
pub fn record_verifier_fault() {
    metrics::counter!("gateway_internal_faults_total", "component" => "verifier").increment(1);
}
