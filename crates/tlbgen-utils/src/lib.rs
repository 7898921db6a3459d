//! # tlbgen Utilities
//!
//! Shared utilities, logging and configuration for tlbgen.
//!
//! This crate provides common functionality used across the tlbgen workspace,
//! including logging infrastructure built on `tracing` and the
//! environment-backed generator settings.

pub mod config;
pub mod logging;

pub use config::{ConfigError, GeneratorSettings, MemberErrorMode, SectionMode};
// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
