//! Per-request context.
//!
//! Built once at ingress and threaded explicitly through every pipeline
//! stage; never looked up from ambient state and never persisted. Fields
//! resolved mid-flight (identity, matched rule, version) are write-once:
//! the first write wins and later writes are ignored.

use std::net::IpAddr;
use std::time::Instant;

use axum::http::HeaderMap;
use uuid::Uuid;

/// Ephemeral per-request record, discarded once the response is finalized.
#[derive(Debug)]
pub struct RequestContext {
    /// Generated request identifier, echoed as `X-Request-ID`.
    pub request_id: String,

    /// Arrival instant, for the `X-Response-Time` header and metrics.
    pub received_at: Instant,

    /// Caller IP, from forwarding headers or the socket peer.
    pub client_ip: IpAddr,

    /// Caller user agent, if presented.
    pub user_agent: Option<String>,

    subject: Option<String>,
    api_key: Option<String>,
    matched_rule: Option<String>,
    version: Option<String>,
}

impl RequestContext {
    /// Build the context at ingress.
    pub fn new(headers: &HeaderMap, peer_ip: IpAddr) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            received_at: Instant::now(),
            client_ip: client_ip(headers, peer_ip),
            user_agent: headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string()),
            subject: None,
            api_key: None,
            matched_rule: None,
            version: None,
        }
    }

    /// Record the authenticated subject. First write wins.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject.get_or_insert_with(|| subject.into());
    }

    /// Record the presented API key. First write wins.
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key.get_or_insert_with(|| key.into());
    }

    /// Record the id of the rule that won the match. First write wins.
    pub fn set_matched_rule(&mut self, rule_id: impl Into<String>) {
        self.matched_rule.get_or_insert_with(|| rule_id.into());
    }

    /// Record the resolved API version token. First write wins.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version.get_or_insert_with(|| version.into());
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn matched_rule(&self) -> Option<&str> {
        self.matched_rule.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Elapsed milliseconds since ingress.
    pub fn elapsed_ms(&self) -> u128 {
        self.received_at.elapsed().as_millis()
    }
}

/// Resolve the caller IP: `X-Forwarded-For` (first hop), then `X-Real-IP`,
/// then the socket peer.
fn client_ip(headers: &HeaderMap, peer_ip: IpAddr) -> IpAddr {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }
    if let Some(real) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if let Ok(ip) = real.trim().parse() {
            return ip;
        }
    }
    peer_ip
}
