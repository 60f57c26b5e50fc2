//! Integration tests for the admission pipeline.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};

use policy_gateway::config::schema::{GatewayConfig, VersionDescriptor, VersionStatus};

mod common;
use common::{bearer_auth, body_json, gateway, get_from, rule};

fn base_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config
        .auth
        .static_tokens
        .insert("tok-admin".to_string(), "alice:ADMIN".to_string());
    config
        .auth
        .static_tokens
        .insert("tok-user".to_string(), "bob:USER".to_string());
    config
}

#[tokio::test]
async fn unmatched_paths_pass_through_with_diagnostics() {
    let mut config = base_config();
    config.routes.push(rule("narrow", "/api/only/*", &["GET"], 0));
    let router = gateway(config);

    let response = common::send(&router, get_from("/api/other/thing", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let elapsed = response.headers()["x-response-time"].to_str().unwrap();
    assert!(elapsed.ends_with("ms"));
    // No rate-limit check ran.
    assert!(!response.headers().contains_key("x-ratelimit-limit"));
}

#[tokio::test]
async fn paths_outside_watched_prefix_are_policy_free() {
    let mut config = base_config();
    let mut guarded = rule("all", "/*", &["*"], 0);
    guarded.auth = Some(bearer_auth(&[]));
    config.routes.push(guarded);
    let router = gateway(config);

    // The rule would match "/health" too, but the prefix gate keeps the
    // gateway out of non-API paths entirely.
    let response = common::send(&router, get_from("/health", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn preflight_short_circuits_before_auth_and_rate_limit() {
    let mut config = base_config();
    let mut guarded = rule("admin", "/api/admin/*", &["*"], 0);
    guarded.auth = Some(bearer_auth(&["ADMIN"]));
    guarded.rate_limit = Some(common::rate_limit(1, 60_000));
    config.routes.push(guarded);
    let router = gateway(config);

    // No credential, and more requests than the limit allows: preflight
    // must still answer every time.
    for _ in 0..5 {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/admin/users")
            .header("origin", "https://app.example.com")
            .header("x-forwarded-for", "203.0.113.1")
            .body(Body::empty())
            .unwrap();
        let response = common::send(&router, request).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response.headers().contains_key("access-control-max-age"));
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
}

#[tokio::test]
async fn optional_auth_admits_without_credential() {
    let mut config = base_config();
    let mut open = rule("open", "/api/public/*", &["GET"], 0);
    open.auth = Some(policy_gateway::config::schema::AuthConfig {
        required: false,
        ..bearer_auth(&[])
    });
    config.routes.push(open);
    let router = gateway(config);

    let response = common::send(&router, get_from("/api/public/posts", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_credential_is_distinguishable_from_wrong_role() {
    let mut config = base_config();
    let mut guarded = rule("admin", "/api/admin/*", &["*"], 0);
    guarded.auth = Some(bearer_auth(&["ADMIN"]));
    config.routes.push(guarded);
    let router = gateway(config);

    // No credential at all.
    let response = common::send(&router, get_from("/api/admin/users", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");

    // Valid token, wrong role: same status, different payload.
    let request = Request::builder()
        .uri("/api/admin/users")
        .header("authorization", "Bearer tok-user")
        .header("x-forwarded-for", "203.0.113.1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&router, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INSUFFICIENT_PRIVILEGE");

    // The allowed role is admitted.
    let request = Request::builder()
        .uri("/api/admin/users")
        .header("authorization", "Bearer tok-admin")
        .header("x-forwarded-for", "203.0.113.1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_scheme_rejects_explicitly() {
    let mut config = base_config();
    let mut guarded = rule("odd", "/api/odd/*", &["*"], 0);
    guarded.auth = Some(policy_gateway::config::schema::AuthConfig {
        required: true,
        scheme: policy_gateway::config::schema::AuthScheme::Unknown,
        roles: Vec::new(),
    });
    config.routes.push(guarded);
    let router = gateway(config);

    let request = Request::builder()
        .uri("/api/odd/x")
        .header("authorization", "Bearer tok-admin")
        .header("x-forwarded-for", "203.0.113.1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&router, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNSUPPORTED_AUTH");
}

#[tokio::test]
async fn deprecated_version_decorates_admitted_and_rejected_responses() {
    let mut config = base_config();
    config.versions.push(VersionDescriptor {
        version: "v1".to_string(),
        status: VersionStatus::Deprecated,
        sunset: Some("2027-01-01T00:00:00Z".to_string()),
        message: Some("use v2".to_string()),
    });
    let mut guarded = rule("admin", "/api/v1/admin/*", &["*"], 10);
    guarded.auth = Some(bearer_auth(&["ADMIN"]));
    config.routes.push(guarded);
    config.routes.push(rule("open", "/api/v1/*", &["GET"], 0));
    let router = gateway(config);

    // Admitted.
    let response = common::send(&router, get_from("/api/v1/posts", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["deprecation"], "true");
    assert_eq!(response.headers()["sunset"], "2027-01-01T00:00:00Z");
    assert_eq!(response.headers()["x-deprecation-notice"], "use v2");

    // Rejected: the deprecation notice still rides along.
    let response = common::send(&router, get_from("/api/v1/admin/users", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["deprecation"], "true");
    assert_eq!(response.headers()["x-deprecation-notice"], "use v2");

    // Current versions get no deprecation headers.
    let response = common::send(&router, get_from("/api/v2/posts", "203.0.113.1")).await;
    assert!(!response.headers().contains_key("deprecation"));
}

#[tokio::test]
async fn cors_headers_decorate_normal_responses_with_origin() {
    let mut config = base_config();
    config.routes.push(rule("open", "/api/public/*", &["GET"], 0));
    let router = gateway(config);

    let request = Request::builder()
        .uri("/api/public/posts")
        .header("origin", "https://app.example.com")
        .header("x-forwarded-for", "203.0.113.1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    // Without an Origin header, no CORS decoration.
    let response = common::send(&router, get_from("/api/public/posts", "203.0.113.1")).await;
    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn method_gating_applies_before_policy() {
    let mut config = base_config();
    let mut guarded = rule("writes", "/api/items/*", &["POST"], 10);
    guarded.auth = Some(bearer_auth(&[]));
    config.routes.push(guarded);
    let router = gateway(config);

    // GET does not match the POST-only rule, so no auth applies.
    let response = common::send(&router, get_from("/api/items/1", "203.0.113.1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // POST matches and the credential is required.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/items/1")
        .header("x-forwarded-for", "203.0.113.1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(&router, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
