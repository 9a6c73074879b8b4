//! # Observability
//!
//! Structured logging setup for the Gitvault service.

pub mod logging;

pub use logging::init_logging;
