//! Errors raised by the normalizer, the vector-store contract, and the
//! extractor/parser/chunker/embedder traits.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Debug, Error, Clone)]
pub enum RagError {
    #[error("unknown collection key '{0}'")]
    UnknownCollection(String),

    #[error("validation failed for chunk in '{collection_key}': {reason}")]
    Validation { collection_key: String, reason: String },

    #[error("parser error: {0}")]
    Parse(String),

    #[error("chunker error: {0}")]
    Chunk(String),

    #[error("embedder error: {0}")]
    Embed(String),

    #[error("vector store error: {0}")]
    Store(String),

    #[error("extractor error: {0}")]
    Extract(String),

    #[error(transparent)]
    Flow(#[from] FlowErrorWrapper),
}

/// `flow_core::FlowError` isn't `Clone`, so wrap its rendered message
/// rather than the error itself — `RagError` needs to be `Clone` to
/// travel through per-item stats without fighting the borrow checker.
#[derive(Debug, Clone)]
pub struct FlowErrorWrapper(pub String);

impl std::fmt::Display for FlowErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FlowErrorWrapper {}

impl From<flow_core::FlowError> for RagError {
    fn from(e: flow_core::FlowError) -> Self {
        RagError::Flow(FlowErrorWrapper(e.to_string()))
    }
}
