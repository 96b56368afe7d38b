//! Result and error types for Rejilla.
//!
//! The taxonomy is deliberately small: configuration problems are caught at
//! construction, timing problems surface as [`RejillaError::Timeout`], and
//! definitive comparison failures surface as [`RejillaError::Assertion`].
//! Matching and extraction primitives never construct errors themselves;
//! they return `None`/empty and leave the "is absence an error" decision to
//! the wait and assertion layers.

use thiserror::Error;

/// Result type for Rejilla operations
pub type RejillaResult<T> = Result<T, RejillaError>;

/// Errors that can occur in Rejilla
#[derive(Debug, Error)]
pub enum RejillaError {
    /// Malformed grid configuration, raised synchronously at construction
    #[error("Invalid grid configuration: {message}")]
    Configuration {
        /// What was wrong with the supplied configuration
        message: String,
    },

    /// A wait or retrying assertion did not hold within its bound
    #[error("Timed out after {ms}ms waiting for {condition}{}", .diagnostic.as_deref().map(|d| format!("\n{d}")).unwrap_or_default())]
    Timeout {
        /// The elapsed bound in milliseconds
        ms: u64,
        /// Human-readable description of the awaited condition
        condition: String,
        /// Closest-match diagnostic, when one was computed
        diagnostic: Option<String>,
    },

    /// A condition evaluated and definitively failed (distinct from timing out)
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Formatted comparison failure
        message: String,
    },

    /// The underlying page/automation layer reported a failure
    #[error("Page error: {message}")]
    Page {
        /// Error message from the automation layer
        message: String,
    },

    /// Pointer or keyboard dispatch failed
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// A bounded toggle-all loop hit its safety cap without converging.
    /// Distinct from finishing legitimately: cap exhaustion usually means the
    /// widget is not removing its toggles after they are invoked.
    #[error("{operation} stopped after {iterations} iterations without converging")]
    IterationCap {
        /// The looped operation ("expand-all", "collapse-all")
        operation: String,
        /// Number of iterations performed before giving up
        iterations: u32,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RejillaError {
    /// Construct a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Construct a timeout error without a diagnostic
    #[must_use]
    pub fn timeout(ms: u64, condition: impl Into<String>) -> Self {
        Self::Timeout {
            ms,
            condition: condition.into(),
            diagnostic: None,
        }
    }

    /// Construct an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Construct a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }
}
