//! Authentication subsystem.
//!
//! Validation only: the gateway checks a presented credential against a
//! rule's auth policy. Issuing credentials and verifying key validity
//! against a store are external concerns reached through the
//! `TokenVerifier` seam.

pub mod validator;
pub mod verifier;

pub use validator::{AuthRejection, AuthValidator};
pub use verifier::{Claims, StaticTokenVerifier, TokenVerifier, VerifyError};
