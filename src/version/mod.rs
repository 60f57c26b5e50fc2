//! API version resolution.
//!
//! Extracts the path segment following the watched prefix and looks it up
//! in the configured descriptor set. Deprecated versions cause the
//! pipeline to attach deprecation headers; `sunset` status is carried but
//! refusal policy stays with the route rules.

use std::collections::HashMap;

use crate::config::schema::VersionDescriptor;

/// Resolves version tokens against the configured descriptors.
#[derive(Debug, Default)]
pub struct VersionResolver {
    versions: HashMap<String, VersionDescriptor>,
}

impl VersionResolver {
    pub fn from_config(descriptors: &[VersionDescriptor]) -> Self {
        Self {
            versions: descriptors
                .iter()
                .map(|d| (d.version.clone(), d.clone()))
                .collect(),
        }
    }

    /// Resolve the version for `path`, given the gateway's watched prefix.
    ///
    /// Only the first segment after the prefix is consulted; an unknown
    /// token resolves to nothing, which is a normal outcome.
    pub fn resolve(&self, path: &str, watched_prefix: &str) -> Option<&VersionDescriptor> {
        let rest = path.strip_prefix(watched_prefix)?;
        let token = rest.split('/').next()?;
        self.versions.get(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::VersionStatus;

    fn resolver() -> VersionResolver {
        VersionResolver::from_config(&[
            VersionDescriptor {
                version: "v1".to_string(),
                status: VersionStatus::Deprecated,
                sunset: Some("2027-01-01T00:00:00Z".to_string()),
                message: Some("use v2".to_string()),
            },
            VersionDescriptor {
                version: "v2".to_string(),
                status: VersionStatus::Current,
                sunset: None,
                message: None,
            },
        ])
    }

    #[test]
    fn resolves_segment_after_prefix() {
        let r = resolver();
        let d = r.resolve("/api/v1/users/42", "/api/").unwrap();
        assert_eq!(d.status, VersionStatus::Deprecated);
        assert_eq!(d.message.as_deref(), Some("use v2"));

        let d = r.resolve("/api/v2/users", "/api/").unwrap();
        assert_eq!(d.status, VersionStatus::Current);
    }

    #[test]
    fn unknown_or_missing_token_resolves_to_none() {
        let r = resolver();
        assert!(r.resolve("/api/v9/users", "/api/").is_none());
        assert!(r.resolve("/api/users", "/api/").is_none());
        assert!(r.resolve("/health", "/api/").is_none());
    }
}
