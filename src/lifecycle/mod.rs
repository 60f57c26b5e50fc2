//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C received → Broadcast signal → Tasks drain → Exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
