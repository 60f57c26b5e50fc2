//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml = r#"
            watched_prefix = "/api/"

            [[routes]]
            id = "public"
            name = "Public API"
            pattern = "/api/public/*"
            methods = ["GET"]
            priority = 10

            [routes.rate_limit]
            window_ms = 60000
            max_requests = 30
            key_by = "by-ip"

            [[versions]]
            version = "v1"
            status = "deprecated"
            message = "use v2"
        "#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].rate_limit.as_ref().unwrap().max_requests, 30);
        assert!(config.routes[0].active);
        assert_eq!(config.versions[0].message.as_deref(), Some("use v2"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_auth_scheme_parses_as_unknown() {
        let toml = r#"
            [[routes]]
            id = "r1"
            name = "r1"
            pattern = "/api/*"
            methods = ["*"]

            [routes.auth]
            required = true
            scheme = "oauth2-pkce"
        "#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.routes[0].auth.as_ref().unwrap().scheme,
            crate::config::schema::AuthScheme::Unknown
        );
    }
}
