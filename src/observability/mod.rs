//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through all pipeline stages
//! - Metrics are cheap (atomic increments)
//! - Policy rejections, config faults, and dependent-service faults are
//!   distinguishable series

pub mod logging;
pub mod metrics;
