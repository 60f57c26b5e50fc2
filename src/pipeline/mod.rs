//! Gateway pipeline orchestration.
//!
//! # State machine (per request, terminal states produce a response)
//! ```text
//! START → PREFLIGHT_HANDLED (T)   OPTIONS under the watched prefix
//! START → MATCHED | UNMATCHED
//! MATCHED → AUTH_REJECTED (T)     credential invalid
//! MATCHED → RATE_LIMITED (T)      limiter rejects
//! MATCHED → ADMITTED (T)          proceeds to the business handler
//! UNMATCHED → ADMITTED (T)        policy-free pass-through
//! ```
//!
//! # Design Decisions
//! - Check order is fixed (version → auth → rate limit) because by-user
//!   rate-limit keys depend on the identity auth resolves
//! - Every terminal state decorates diagnostic headers and emits exactly
//!   one metrics record
//! - The request context is built once at ingress and passed explicitly;
//!   no stage reads ambient state

pub mod reject;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header::HeaderValue, HeaderMap, Method, Request, Response};
use axum::middleware::Next;

use crate::auth::{AuthValidator, StaticTokenVerifier, TokenVerifier};
use crate::config::schema::{CorsConfig, GatewayConfig, KeyStrategy, RateLimitConfig, VersionStatus};
use crate::context::RequestContext;
use crate::cors;
use crate::observability::metrics;
use crate::ratelimit::{FixedWindowLimiter, RateDecision};
use crate::routing::{RouteRegistry, RouteRule};
use crate::version::VersionResolver;

/// Immutable policy generation swapped atomically on reload.
pub struct PolicySnapshot {
    pub watched_prefix: String,
    pub cors: CorsConfig,
    pub versions: VersionResolver,
}

/// Shared state threaded into the gateway middleware.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<RouteRegistry>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub auth: Arc<AuthValidator>,
    policy: Arc<ArcSwap<PolicySnapshot>>,
}

impl GatewayState {
    /// Build state from config with an explicit token verifier.
    pub fn new(config: &GatewayConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            registry: Arc::new(RouteRegistry::from_config(&config.routes)),
            limiter: Arc::new(FixedWindowLimiter::new()),
            auth: Arc::new(AuthValidator::new(
                verifier,
                config.auth.api_key_header.clone(),
                Duration::from_millis(config.auth.verify_timeout_ms),
            )),
            policy: Arc::new(ArcSwap::from_pointee(snapshot(config))),
        }
    }

    /// Build state with the config-seeded static verifier.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let verifier = Arc::new(StaticTokenVerifier::from_pairs(&config.auth.static_tokens));
        Self::new(config, verifier)
    }

    /// Swap in a new configuration generation.
    ///
    /// Route table and policy snapshot are replaced atomically; live
    /// rate-limit counters persist across the reload. Auth settings
    /// (verifier, key header) require a restart.
    pub fn reload(&self, config: &GatewayConfig) {
        self.registry.reload(&config.routes);
        self.policy.store(Arc::new(snapshot(config)));
    }
}

fn snapshot(config: &GatewayConfig) -> PolicySnapshot {
    PolicySnapshot {
        watched_prefix: config.watched_prefix.clone(),
        cors: config.cors.clone(),
        versions: VersionResolver::from_config(&config.versions),
    }
}

/// The admission middleware: one decision per inbound request.
pub async fn gateway_middleware(
    State(state): State<GatewayState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let peer_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let mut ctx = RequestContext::new(request.headers(), peer_ip);
    let policy = state.policy.load_full();

    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let origin = request
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let under_prefix = path.starts_with(&policy.watched_prefix);

    // Preflight short-circuits before routing, auth, and rate limiting.
    if method == Method::OPTIONS && under_prefix {
        let mut response = cors::preflight_response(&policy.cors, origin.as_deref());
        finalize(
            &mut response,
            &ctx,
            &Decoration {
                cors: None,
                origin: origin.as_deref(),
                decision: None,
                version_headers: true,
                policy: &policy,
                path: &path,
            },
            "preflight",
            "none",
        );
        return response;
    }

    // Outside the watched prefix: policy-free pass-through.
    if !under_prefix {
        let mut response = next.run(request).await;
        finalize(
            &mut response,
            &ctx,
            &Decoration {
                cors: None,
                origin: origin.as_deref(),
                decision: None,
                version_headers: false,
                policy: &policy,
                path: &path,
            },
            "admitted",
            "none",
        );
        return response;
    }

    // Version resolves before auth and rate limiting; the order is fixed.
    if let Some(descriptor) = policy.versions.resolve(&path, &policy.watched_prefix) {
        ctx.set_version(descriptor.version.clone());
    }

    let rule = state.registry.find_match(&path, &method);

    let Some(rule) = rule else {
        // No match is a normal outcome, not a fault.
        let mut response = next.run(request).await;
        finalize(
            &mut response,
            &ctx,
            &Decoration {
                cors: None,
                origin: origin.as_deref(),
                decision: None,
                version_headers: true,
                policy: &policy,
                path: &path,
            },
            "admitted",
            "none",
        );
        return response;
    };

    ctx.set_matched_rule(rule.id.clone());

    // Auth before rate limiting: by-user keys need the resolved subject.
    if let Some(auth_config) = &rule.auth {
        if let Err(rejection) = state
            .auth
            .validate(request.headers(), auth_config, &mut ctx)
            .await
        {
            metrics::record_auth_rejected(rejection.code());
            tracing::info!(
                request_id = %ctx.request_id,
                rule = %rule.name,
                reason = rejection.code(),
                "Auth rejected"
            );
            let mut response = reject::auth_rejected(&rejection);
            finalize(
                &mut response,
                &ctx,
                &Decoration {
                    cors: rule.cors.as_ref(),
                    origin: origin.as_deref(),
                    decision: None,
                    version_headers: true,
                    policy: &policy,
                    path: &path,
                },
                "auth_rejected",
                &rule.name,
            );
            return response;
        }
    }

    let mut decision: Option<RateDecision> = None;
    if let Some(limit_config) = &rule.rate_limit {
        let key = limit_key(limit_config, &ctx, &rule);
        let d = state.limiter.check(&key, limit_config);

        if !d.allowed {
            metrics::record_rate_limited(&rule.name);
            tracing::info!(
                request_id = %ctx.request_id,
                rule = %rule.name,
                key = %key,
                "Rate limit exceeded"
            );
            let mut response = reject::rate_limited(&d);
            finalize(
                &mut response,
                &ctx,
                &Decoration {
                    cors: rule.cors.as_ref(),
                    origin: origin.as_deref(),
                    decision: Some(&d),
                    version_headers: true,
                    policy: &policy,
                    path: &path,
                },
                "rate_limited",
                &rule.name,
            );
            return response;
        }

        decision = Some(d);
    }

    // Admitted: proceed to the business handler.
    let mut response = next.run(request).await;
    finalize(
        &mut response,
        &ctx,
        &Decoration {
            cors: rule.cors.as_ref(),
            origin: origin.as_deref(),
            decision: decision.as_ref(),
            version_headers: true,
            policy: &policy,
            path: &path,
        },
        "admitted",
        &rule.name,
    );
    response
}

/// Everything `finalize` needs to decorate a terminal response.
struct Decoration<'a> {
    /// Per-rule CORS override; falls back to the gateway-wide config.
    cors: Option<&'a CorsConfig>,
    origin: Option<&'a str>,
    decision: Option<&'a RateDecision>,
    /// Whether version deprecation headers apply to this path.
    version_headers: bool,
    policy: &'a PolicySnapshot,
    path: &'a str,
}

/// Decorate the terminal response and emit the decision record.
fn finalize(
    response: &mut Response<Body>,
    ctx: &RequestContext,
    deco: &Decoration<'_>,
    outcome: &'static str,
    rule: &str,
) {
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        headers.insert("x-request-id", value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{}ms", ctx.elapsed_ms())) {
        headers.insert("x-response-time", value);
    }

    if let Some(decision) = deco.decision {
        insert_numeric(headers, "x-ratelimit-limit", decision.limit);
        insert_numeric(headers, "x-ratelimit-remaining", decision.remaining);
        insert_numeric(headers, "x-ratelimit-reset", decision.reset_at_secs());
    }

    if deco.version_headers {
        if let Some(descriptor) = deco
            .policy
            .versions
            .resolve(deco.path, &deco.policy.watched_prefix)
        {
            if descriptor.status == VersionStatus::Deprecated {
                headers.insert("deprecation", HeaderValue::from_static("true"));
                if let Some(sunset) = &descriptor.sunset {
                    if let Ok(value) = HeaderValue::from_str(sunset) {
                        headers.insert("sunset", value);
                    }
                }
                if let Some(message) = &descriptor.message {
                    if let Ok(value) = HeaderValue::from_str(message) {
                        headers.insert("x-deprecation-notice", value);
                    }
                }
            }
        }
    }

    if let Some(origin) = deco.origin {
        let cors_config = deco.cors.unwrap_or(&deco.policy.cors);
        cors::apply(cors_config, origin, headers);
    }

    metrics::record_decision(outcome, rule, ctx.received_at);
    tracing::debug!(
        request_id = %ctx.request_id,
        client_ip = %ctx.client_ip,
        outcome,
        rule,
        elapsed_ms = ctx.elapsed_ms() as u64,
        "Gateway decision"
    );
}

fn insert_numeric(headers: &mut HeaderMap, name: &'static str, value: u64) {
    if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, v);
    }
}

/// Compose the rate-limit counter key:
/// `{scope}:{identity-type}:{identity-value}:{route-pattern}`.
///
/// The route pattern suffix gives the same caller independent budgets per
/// route. Identity strategies without a resolved value fall back to the
/// caller IP rather than sharing one global bucket.
fn limit_key(config: &RateLimitConfig, ctx: &RequestContext, rule: &RouteRule) -> String {
    let ip = ctx.client_ip.to_string();
    let identity = match config.key_by {
        KeyStrategy::ByIp => ip,
        KeyStrategy::ByUser => ctx.subject().map(|s| s.to_string()).unwrap_or(ip),
        KeyStrategy::ByApiKey => ctx.api_key().map(|k| k.to_string()).unwrap_or(ip),
    };
    format!(
        "rl:{}:{}:{}",
        config.key_by.label(),
        identity,
        rule.pattern.as_str()
    )
}
