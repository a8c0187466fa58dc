//! # socsim-observability
//!
//! Tracing-based logging setup shared by the socsim binaries.

pub mod logging;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
