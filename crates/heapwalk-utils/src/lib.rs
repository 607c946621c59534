//! # heapwalk Utilities
//!
//! Shared utilities, logging and configuration for heapwalk.
//!
//! This crate provides the logging bootstrap used by hosts of the detail
//! resolver, built on `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    dated_log_file, init_logging, init_logging_to_default_file, init_logging_to_file, init_logging_with_config,
    init_logging_with_level, LogFormat, LogLevel, LoggingConfig, LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
