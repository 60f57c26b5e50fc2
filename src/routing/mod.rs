//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, method)
//!     → registry.rs (rule lookup against current snapshot)
//!     → pattern.rs (wildcard path matching)
//!     → Return: matched RouteRule or None
//!
//! Rule Compilation (at startup and reload):
//!     RouteRuleConfig[]
//!     → Drop inactive/malformed rules (loud log)
//!     → Compile patterns, sort by priority (stable)
//!     → Freeze as immutable snapshot, ArcSwap into place
//! ```
//!
//! # Design Decisions
//! - Rules compiled at load time, immutable at runtime
//! - No regex in hot path (chunk scanning only)
//! - Deterministic: same snapshot always matches same rule
//! - First match wins (ordered by priority, then load order)

pub mod pattern;
pub mod registry;

pub use pattern::PathPattern;
pub use registry::{RouteRegistry, RouteRule};
