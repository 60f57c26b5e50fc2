//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the policy gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Path prefix the gateway enforces policy under (e.g. "/api/").
    /// Requests outside this prefix pass through untouched.
    pub watched_prefix: String,

    /// Route rule definitions, loaded from the external rule source.
    pub routes: Vec<RouteRuleConfig>,

    /// Gateway-wide CORS policy. Rules may override it individually.
    pub cors: CorsConfig,

    /// Known API version descriptors.
    pub versions: Vec<VersionDescriptor>,

    /// Credential validation settings.
    pub auth: AuthSettings,

    /// Rate limiter housekeeping.
    pub rate_limit: RateLimitSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            watched_prefix: "/api/".to_string(),
            routes: Vec::new(),
            cors: CorsConfig::default(),
            versions: Vec::new(),
            auth: AuthSettings::default(),
            rate_limit: RateLimitSettings::default(),
            observability: ObservabilityConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single route rule: match criteria plus attached policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteRuleConfig {
    /// Stable rule identifier.
    pub id: String,

    /// Human-readable name for logging/metrics.
    pub name: String,

    /// Path pattern. `*` matches any sequence of characters; the pattern
    /// is anchored at both ends.
    pub pattern: String,

    /// Allowed HTTP methods, uppercase, or `["*"]` for any method.
    pub methods: Vec<String>,

    /// Rule priority (higher = checked first). Ties keep load order.
    #[serde(default)]
    pub priority: i32,

    /// Inactive rules are excluded from matching entirely.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Optional per-rule rate limit.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,

    /// Optional auth requirement.
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// Optional per-rule CORS override.
    #[serde(default)]
    pub cors: Option<CorsConfig>,

    /// Optional target rewrite metadata. Carried for the upstream
    /// dispatcher's benefit; the gateway itself does not forward requests.
    #[serde(default)]
    pub target: Option<TargetConfig>,
}

fn default_true() -> bool {
    true
}

/// Target rewrite metadata attached to a rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Upstream service name.
    pub service: String,

    /// Optional path rewrite applied by the upstream dispatcher.
    #[serde(default)]
    pub rewrite: Option<String>,
}

/// Fixed-window rate limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting for the attached rule.
    pub enabled: bool,

    /// Window duration in milliseconds.
    pub window_ms: u64,

    /// Maximum requests allowed per window.
    pub max_requests: u64,

    /// How the counter key identifies the caller.
    pub key_by: KeyStrategy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_requests: 100,
            key_by: KeyStrategy::ByIp,
        }
    }
}

/// Identity strategy for rate-limit counter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum KeyStrategy {
    #[serde(rename = "by-ip")]
    ByIp,
    #[serde(rename = "by-user")]
    ByUser,
    #[serde(rename = "by-api-key")]
    ByApiKey,
}

impl KeyStrategy {
    /// Key-segment label, used when composing counter keys.
    pub fn label(&self) -> &'static str {
        match self {
            KeyStrategy::ByIp => "ip",
            KeyStrategy::ByUser => "user",
            KeyStrategy::ByApiKey => "api-key",
        }
    }
}

/// Authentication requirement attached to a rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether a credential is required at all.
    pub required: bool,

    /// Credential scheme to enforce.
    pub scheme: AuthScheme,

    /// Optional role allow-list checked against the token's role claim.
    pub roles: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: true,
            scheme: AuthScheme::BearerToken,
            roles: Vec::new(),
        }
    }
}

/// Closed set of supported credential schemes.
///
/// An unrecognized tag deserializes to `Unknown` so one bad rule does not
/// abort the whole config load; the validator rejects requests under it
/// explicitly rather than silently allowing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum AuthScheme {
    #[serde(rename = "bearer-token")]
    BearerToken,
    #[serde(rename = "api-key")]
    ApiKey,
    #[serde(rename = "basic")]
    Basic,
    #[serde(other, rename = "unknown")]
    Unknown,
}

/// Gateway-level credential validation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Header carrying an API key.
    pub api_key_header: String,

    /// Timeout for the external token verification call, in milliseconds.
    /// Expiry fails closed (credential treated as invalid).
    pub verify_timeout_ms: u64,

    /// Static bearer tokens for development: token -> "subject:role".
    /// Production deployments plug in a real `TokenVerifier` instead.
    pub static_tokens: std::collections::HashMap<String, String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            api_key_header: "X-API-Key".to_string(),
            verify_timeout_ms: 2_000,
            static_tokens: std::collections::HashMap::new(),
        }
    }
}

/// CORS policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS decoration.
    pub enabled: bool,

    /// Allowed origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods advertised to the browser.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers advertised to the browser.
    pub allowed_headers: Vec<String>,

    /// Whether credentialed requests are allowed. When set, the concrete
    /// origin is always echoed, never a literal `*`.
    pub allow_credentials: bool,

    /// Preflight cache duration in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "PATCH".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-API-Key".to_string(),
            ],
            allow_credentials: false,
            max_age_secs: 600,
        }
    }
}

/// API version lifecycle descriptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionDescriptor {
    /// Version token as it appears in the path (e.g. "v1").
    pub version: String,

    /// Lifecycle status.
    pub status: VersionStatus,

    /// Optional sunset date, ISO 8601.
    #[serde(default)]
    pub sunset: Option<String>,

    /// Optional human-readable deprecation message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Version lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Current,
    Deprecated,
    Sunset,
}

/// Rate limiter housekeeping settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Interval between garbage-collection sweeps, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}
