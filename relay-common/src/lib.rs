//! Common types and utilities shared across the relay crates.
//!
//! This crate holds the shared error type and the observability helpers used
//! by the scraper, the notifier and the binary. It stays dependency-light so
//! every crate in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`RelayError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use relay_common::RelayError;
//!
//! let err = RelayError::Structure("no username link found".into());
//! assert!(!err.is_fatal());
//! assert!(RelayError::Config("webhook_url is not set".into()).is_fatal());
//! ```

pub mod observability;

/// Error types used across the relay pipeline.
///
/// `Transport` and `Config` abort an invocation. `Structure` and `Parse`
/// describe a single block or message the scraper could not make sense of;
/// callers log them and move on.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    /// A request failed: network error, timeout or non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An expected element was missing from the page.
    #[error("Structure error: {0}")]
    Structure(String),

    /// A timestamp did not match the `h:mm AM/PM` pattern.
    #[error("Parse error: could not parse {input:?}: {reason}")]
    Parse { input: String, reason: String },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Whether the error must abort the whole invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::Transport(_) | RelayError::Config(_))
    }
}

/// Convenient alias for results that use [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;
