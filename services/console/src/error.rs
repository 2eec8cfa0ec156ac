//! services/console/src/error.rs
//!
//! Defines the primary error type for the console client.

use crate::config::ConfigError;
use student_portal_core::ports::PortError;

/// The primary error type for the `console` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g. writing a downloaded report).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
