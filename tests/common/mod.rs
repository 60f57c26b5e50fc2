//! Shared utilities for gateway integration tests.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::{routing::any, Json, Router};
use tower::ServiceExt;

use policy_gateway::config::schema::{
    AuthConfig, AuthScheme, GatewayConfig, KeyStrategy, RateLimitConfig, RouteRuleConfig,
};
use policy_gateway::{GatewayServer, GatewayState};

/// A rule config with sensible test defaults.
pub fn rule(id: &str, pattern: &str, methods: &[&str], priority: i32) -> RouteRuleConfig {
    RouteRuleConfig {
        id: id.to_string(),
        name: id.to_string(),
        pattern: pattern.to_string(),
        methods: methods.iter().map(|m| m.to_string()).collect(),
        priority,
        active: true,
        rate_limit: None,
        auth: None,
        cors: None,
        target: None,
    }
}

pub fn bearer_auth(roles: &[&str]) -> AuthConfig {
    AuthConfig {
        required: true,
        scheme: AuthScheme::BearerToken,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn rate_limit(max: u64, window_ms: u64) -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        window_ms,
        max_requests: max,
        key_by: KeyStrategy::ByIp,
    }
}

/// Assemble the gateway router over a trivial upstream that answers 200.
pub fn gateway(config: GatewayConfig) -> Router {
    let state = GatewayState::from_config(&config);
    let upstream = Router::new().route(
        "/{*path}",
        any(|| async { Json(serde_json::json!({ "status": "ok" })) }),
    );
    GatewayServer::new(config, state, upstream).into_router()
}

/// Drive one request through the assembled router.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("gateway service failed")
}

/// Read and parse a JSON response body.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body was not JSON")
}

/// A GET request from the given caller IP.
pub fn get_from(path: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}
