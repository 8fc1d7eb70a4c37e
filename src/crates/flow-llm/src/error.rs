//! Errors raised by chat model adapters and the tool contract.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    #[error("tool name '{0}' is ambiguous across registered sets")]
    AmbiguousTool(String),

    #[error("tool '{tool}' failed: {error}")]
    ToolFailed { tool: String, error: String },

    #[error(transparent)]
    Flow(#[from] flow_core::FlowError),
}

impl LlmError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}
