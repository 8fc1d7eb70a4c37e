//! Error handling utilities.
//!
//! Provides a small catch-all error type for this crate's own helpers, plus
//! an [`ErrorContext`] extension trait and error-chain formatting used
//! across the workspace for consistent diagnostics.

mod context;

pub use context::{error_chain_length, format_error_chain, root_cause, ErrorContext};

/// Catch-all error for `flow-tooling`'s own helpers (env/config loading).
#[derive(Debug, thiserror::Error)]
pub enum ToolingError {
    /// A general, unstructured error.
    #[error("{0}")]
    General(String),

    /// I/O failure (e.g. reading a `.env` file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
