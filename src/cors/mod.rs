//! CORS policy enforcement.
//!
//! # Responsibilities
//! - Decorate responses with allow-origin/method/header metadata
//! - Answer OPTIONS preflight requests with an empty 204
//!
//! # Design Decisions
//! - Preflight short-circuits before routing, auth, and rate limiting;
//!   browsers must always be able to complete the handshake
//! - With credentials enabled the concrete origin is echoed, never a
//!   literal `*` (the combination is rejected by browsers)

use axum::body::Body;
use axum::http::{header::HeaderValue, HeaderMap, Response, StatusCode};

use crate::config::schema::CorsConfig;

/// Whether `origin` is acceptable under the config.
fn origin_allowed(config: &CorsConfig, origin: &str) -> bool {
    config
        .allowed_origins
        .iter()
        .any(|allowed| allowed == "*" || allowed == origin)
}

/// Decorate `headers` for a response to a request that carried `origin`.
///
/// No-op when CORS is disabled or the origin is not allowed.
pub fn apply(config: &CorsConfig, origin: &str, headers: &mut HeaderMap) {
    if !config.enabled || !origin_allowed(config, origin) {
        return;
    }

    let wildcard = config.allowed_origins.iter().any(|o| o == "*");
    let allow_origin = if wildcard && !config.allow_credentials {
        "*"
    } else {
        origin
    };

    if let Ok(value) = HeaderValue::from_str(allow_origin) {
        headers.insert("access-control-allow-origin", value);
    }
    if let Ok(value) = HeaderValue::from_str(&config.allowed_methods.join(", ")) {
        headers.insert("access-control-allow-methods", value);
    }
    if let Ok(value) = HeaderValue::from_str(&config.allowed_headers.join(", ")) {
        headers.insert("access-control-allow-headers", value);
    }
    if config.allow_credentials {
        headers.insert(
            "access-control-allow-credentials",
            HeaderValue::from_static("true"),
        );
    }
    if let Ok(value) = HeaderValue::from_str(&config.max_age_secs.to_string()) {
        headers.insert("access-control-max-age", value);
    }
}

/// Build the preflight short-circuit response.
pub fn preflight_response(config: &CorsConfig, origin: Option<&str>) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    if let Some(origin) = origin {
        apply(config, origin, response.headers_mut());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_without_credentials_sends_star() {
        let config = CorsConfig::default();
        let mut headers = HeaderMap::new();
        apply(&config, "https://app.example.com", &mut headers);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers.get("access-control-allow-credentials").is_none());
    }

    #[test]
    fn credentials_echo_the_concrete_origin() {
        let config = CorsConfig {
            allow_credentials: true,
            ..CorsConfig::default()
        };
        let mut headers = HeaderMap::new();
        apply(&config, "https://app.example.com", &mut headers);
        assert_eq!(
            headers["access-control-allow-origin"],
            "https://app.example.com"
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[test]
    fn disallowed_origin_gets_no_headers() {
        let config = CorsConfig {
            allowed_origins: vec!["https://trusted.example.com".to_string()],
            ..CorsConfig::default()
        };
        let mut headers = HeaderMap::new();
        apply(&config, "https://evil.example.com", &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn exact_origin_match_is_echoed() {
        let config = CorsConfig {
            allowed_origins: vec!["https://trusted.example.com".to_string()],
            ..CorsConfig::default()
        };
        let mut headers = HeaderMap::new();
        apply(&config, "https://trusted.example.com", &mut headers);
        assert_eq!(
            headers["access-control-allow-origin"],
            "https://trusted.example.com"
        );
    }

    #[test]
    fn preflight_is_an_empty_204() {
        let config = CorsConfig::default();
        let response = preflight_response(&config, Some("https://app.example.com"));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            response.headers()["access-control-max-age"],
            config.max_age_secs.to_string().as_str()
        );
    }

    #[test]
    fn disabled_config_is_a_no_op() {
        let config = CorsConfig {
            enabled: false,
            ..CorsConfig::default()
        };
        let mut headers = HeaderMap::new();
        apply(&config, "https://app.example.com", &mut headers);
        assert!(headers.is_empty());
    }
}
