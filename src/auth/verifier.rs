//! Token verification boundary.
//!
//! Credential *issuance* and real signature checking live outside the
//! gateway; this module only defines the seam. The gateway calls the
//! verifier on the request critical path, so implementations must be
//! cheap or the pipeline's timeout will fail them closed.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use thiserror::Error;

/// Claims extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identifier.
    pub subject: String,
    /// Role claim, if the token carries one.
    pub role: Option<String>,
}

/// Error from the external verification call.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token rejected")]
    Rejected,

    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator that verifies a presented bearer token.
pub trait TokenVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Claims, VerifyError>>;
}

/// Config-seeded verifier mapping literal tokens to `subject:role` pairs.
///
/// Suitable for development and tests; production deployments supply a
/// verifier backed by a real token service.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Claims>,
}

impl StaticTokenVerifier {
    /// Build from `token -> "subject"` or `token -> "subject:role"` pairs.
    pub fn from_pairs(pairs: &HashMap<String, String>) -> Self {
        let tokens = pairs
            .iter()
            .map(|(token, value)| {
                let claims = match value.split_once(':') {
                    Some((subject, role)) => Claims {
                        subject: subject.to_string(),
                        role: Some(role.to_string()),
                    },
                    None => Claims {
                        subject: value.clone(),
                        role: None,
                    },
                };
                (token.clone(), claims)
            })
            .collect();
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Claims, VerifyError>> {
        let result = self.tokens.get(token).cloned().ok_or(VerifyError::Rejected);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_subject_and_role() {
        let mut pairs = HashMap::new();
        pairs.insert("tok-admin".to_string(), "alice:ADMIN".to_string());
        pairs.insert("tok-plain".to_string(), "bob".to_string());
        let verifier = StaticTokenVerifier::from_pairs(&pairs);

        let claims = verifier.verify("tok-admin").await.unwrap();
        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.role.as_deref(), Some("ADMIN"));

        let claims = verifier.verify("tok-plain").await.unwrap();
        assert_eq!(claims.subject, "bob");
        assert!(claims.role.is_none());

        assert!(verifier.verify("nope").await.is_err());
    }
}
