//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → pipeline (admission decision)
//!     → inner router (business handlers, admitted requests only)
//! ```

pub mod server;

pub use server::GatewayServer;
