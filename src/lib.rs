//! In-process request-admission and policy-enforcement gateway.
//!
//! Every inbound request is matched against a table of route rules and
//! checked, in fixed order, for API-version lifecycle, authentication,
//! and rate limits; CORS headers and diagnostics decorate every outcome.
//! The gateway either returns a terminal response itself or admits the
//! request into the business router it wraps.

pub mod auth;
pub mod config;
pub mod context;
pub mod cors;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod ratelimit;
pub mod routing;
pub mod version;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use pipeline::GatewayState;
