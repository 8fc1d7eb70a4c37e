//! Flow-fatal error types.
//!
//! Per the error taxonomy this runtime implements, only a handful of
//! failure kinds abort a run outright: a malformed graph, a missing
//! context, or a resource that fails to initialize. Everything else a node
//! or the RAG/assistant loops encounter becomes data — see
//! [`crate::node::NodeOutputs`] and the per-item failure records in
//! `flow-rag`.

use thiserror::Error;

/// Result alias for fallible flow-core operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that abort an entire run rather than being isolated to one node.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The flow document referenced an unknown node, resource, or dock.
    #[error("invalid flow graph: {0}")]
    Validation(String),

    /// A resource's `init` hook returned an error before the first node
    /// ran.
    #[error("resource '{resource}' failed to initialize: {error}")]
    ResourceInit { resource: String, error: String },

    /// A run was started without the context it needs (e.g. no memory
    /// backend for a node that requires one).
    #[error("missing context: {0}")]
    MissingContext(String),

    /// The registry has no constructor for the requested type name.
    #[error("unknown type '{kind}' for {what}")]
    UnknownType { what: &'static str, kind: String },

    /// Config-value resolution failed (e.g. required env var missing).
    #[error("config error: {0}")]
    Configuration(String),

    /// Flow document failed to parse.
    #[error("failed to parse flow document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Flow document (YAML form) failed to parse.
    #[error("failed to parse flow document (yaml): {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FlowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource_init(resource: impl Into<String>, error: impl Into<String>) -> Self {
        Self::ResourceInit { resource: resource.into(), error: error.into() }
    }

    pub fn unknown_type(what: &'static str, kind: impl Into<String>) -> Self {
        Self::UnknownType { what, kind: kind.into() }
    }
}
