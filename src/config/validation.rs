//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check rule identity uniqueness and match criteria shape
//! - Validate value ranges (timeouts > 0, addresses parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; per-rule faults are
//!   additionally tolerated at compile time (the registry excludes the
//!   offending rule with a loud log) so a single bad rule cannot take the
//!   gateway down on reload

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic configuration error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("watched_prefix must start with '/', got '{0}'")]
    WatchedPrefix(String),

    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),

    #[error("rule '{0}': pattern must not be empty")]
    EmptyPattern(String),

    #[error("rule '{0}': methods must not be empty")]
    EmptyMethods(String),

    #[error("rule '{0}': rate limit window must be > 0")]
    ZeroWindow(String),

    #[error("rule '{0}': rate limit max_requests must be > 0")]
    ZeroLimit(String),

    #[error("duplicate version token '{0}'")]
    DuplicateVersion(String),

    #[error("auth verify_timeout_ms must be > 0")]
    ZeroVerifyTimeout,
}

/// Validate the full configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if !config.watched_prefix.starts_with('/') {
        errors.push(ValidationError::WatchedPrefix(config.watched_prefix.clone()));
    }

    let mut seen_ids = std::collections::HashSet::new();
    for rule in &config.routes {
        if !seen_ids.insert(rule.id.as_str()) {
            errors.push(ValidationError::DuplicateRuleId(rule.id.clone()));
        }
        if rule.pattern.is_empty() {
            errors.push(ValidationError::EmptyPattern(rule.id.clone()));
        }
        if rule.methods.is_empty() {
            errors.push(ValidationError::EmptyMethods(rule.id.clone()));
        }
        if let Some(rl) = &rule.rate_limit {
            if rl.enabled && rl.window_ms == 0 {
                errors.push(ValidationError::ZeroWindow(rule.id.clone()));
            }
            if rl.enabled && rl.max_requests == 0 {
                errors.push(ValidationError::ZeroLimit(rule.id.clone()));
            }
        }
    }

    let mut seen_versions = std::collections::HashSet::new();
    for v in &config.versions {
        if !seen_versions.insert(v.version.as_str()) {
            errors.push(ValidationError::DuplicateVersion(v.version.clone()));
        }
    }

    if config.auth.verify_timeout_ms == 0 {
        errors.push(ValidationError::ZeroVerifyTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RateLimitConfig, RouteRuleConfig};

    fn rule(id: &str) -> RouteRuleConfig {
        RouteRuleConfig {
            id: id.to_string(),
            name: id.to_string(),
            pattern: "/api/*".to_string(),
            methods: vec!["GET".to_string()],
            priority: 0,
            active: true,
            rate_limit: None,
            auth: None,
            cors: None,
            target: None,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-addr".to_string();
        config.watched_prefix = "api/".to_string();

        let mut bad = rule("r1");
        bad.pattern = String::new();
        bad.methods = Vec::new();
        config.routes.push(bad);
        config.routes.push(rule("r1"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn rejects_zero_rate_limit_window() {
        let mut config = GatewayConfig::default();
        let mut r = rule("r1");
        r.rate_limit = Some(RateLimitConfig {
            window_ms: 0,
            ..RateLimitConfig::default()
        });
        config.routes.push(r);

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ZeroWindow(_)));
    }
}
