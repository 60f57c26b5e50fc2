//! Credential validation against a rule's auth policy.
//!
//! # Responsibilities
//! - Enforce presence/shape of the credential each scheme expects
//! - Verify bearer tokens through the external `TokenVerifier`
//! - Check role allow-lists
//! - Write the resolved identity into the request context (once)
//!
//! # Design Decisions
//! - Schemes are a closed sum type; adding one is an exhaustive-match
//!   change, not a string comparison
//! - Missing/invalid credential and insufficient privilege are distinct
//!   rejections so callers can tell "who are you" from "you can't do that"
//! - The external verification call runs under a timeout and fails closed

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;

use crate::auth::verifier::TokenVerifier;
use crate::config::schema::{AuthConfig, AuthScheme};
use crate::context::RequestContext;
use crate::observability::metrics;

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No credential presented, or the credential did not verify.
    MissingCredential,
    /// Credential verified but the role claim is not on the allow-list.
    InsufficientPrivilege,
    /// The rule names a scheme this gateway does not implement.
    UnsupportedScheme,
}

impl AuthRejection {
    /// Stable code for the rejection body and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            AuthRejection::MissingCredential => "UNAUTHORIZED",
            AuthRejection::InsufficientPrivilege => "INSUFFICIENT_PRIVILEGE",
            AuthRejection::UnsupportedScheme => "UNSUPPORTED_AUTH",
        }
    }

    /// Human-readable rejection message.
    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::MissingCredential => "missing or invalid credential",
            AuthRejection::InsufficientPrivilege => "insufficient privilege",
            AuthRejection::UnsupportedScheme => "unsupported auth scheme",
        }
    }
}

/// Validates request credentials against rule auth policy.
pub struct AuthValidator {
    verifier: Arc<dyn TokenVerifier>,
    api_key_header: String,
    verify_timeout: Duration,
}

impl AuthValidator {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        api_key_header: String,
        verify_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            api_key_header,
            verify_timeout,
        }
    }

    /// Validate a request against the rule's auth config.
    ///
    /// On success the resolved identity has been written into `ctx`.
    pub async fn validate(
        &self,
        headers: &HeaderMap,
        config: &AuthConfig,
        ctx: &mut RequestContext,
    ) -> Result<(), AuthRejection> {
        if !config.required {
            return Ok(());
        }

        match config.scheme {
            AuthScheme::BearerToken => self.validate_bearer(headers, config, ctx).await,
            AuthScheme::ApiKey => self.validate_api_key(headers, ctx),
            AuthScheme::Basic => validate_basic(headers),
            // Never silently allow a scheme we do not understand.
            AuthScheme::Unknown => Err(AuthRejection::UnsupportedScheme),
        }
    }

    async fn validate_bearer(
        &self,
        headers: &HeaderMap,
        config: &AuthConfig,
        ctx: &mut RequestContext,
    ) -> Result<(), AuthRejection> {
        let token = bearer_token(headers).ok_or(AuthRejection::MissingCredential)?;

        let verified = tokio::time::timeout(self.verify_timeout, self.verifier.verify(token)).await;
        let claims = match verified {
            Ok(Ok(claims)) => claims,
            Ok(Err(e)) => {
                tracing::debug!(request_id = %ctx.request_id, error = %e, "Token verification failed");
                return Err(AuthRejection::MissingCredential);
            }
            Err(_) => {
                // Dependent-service fault: fail closed for auth.
                tracing::warn!(request_id = %ctx.request_id, "Token verification timed out");
                metrics::record_verifier_fault();
                return Err(AuthRejection::MissingCredential);
            }
        };

        if !config.roles.is_empty() {
            let role_ok = claims
                .role
                .as_deref()
                .map(|r| config.roles.iter().any(|allowed| allowed == r))
                .unwrap_or(false);
            if !role_ok {
                return Err(AuthRejection::InsufficientPrivilege);
            }
        }

        ctx.set_subject(claims.subject);
        Ok(())
    }

    /// API keys: presence and shape only; validity is the key store's
    /// concern, outside the gateway.
    fn validate_api_key(
        &self,
        headers: &HeaderMap,
        ctx: &mut RequestContext,
    ) -> Result<(), AuthRejection> {
        let key = headers
            .get(self.api_key_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|k| !k.is_empty() && k.chars().all(|c| c.is_ascii_graphic()))
            .ok_or(AuthRejection::MissingCredential)?;

        ctx.set_api_key(key);
        Ok(())
    }
}

/// Basic credentials: presence and well-formedness only; verification is
/// delegated externally.
fn validate_basic(headers: &HeaderMap) -> Result<(), AuthRejection> {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthRejection::MissingCredential)?;

    let payload = value
        .strip_prefix("Basic ")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(AuthRejection::MissingCredential)?;

    let well_formed = payload
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='));
    if !well_formed {
        return Err(AuthRejection::MissingCredential);
    }

    Ok(())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
