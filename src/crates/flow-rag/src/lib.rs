//! RAG ingestion pipeline contracts and node (§4.3-§4.5): pluggable
//! extractor/parser/chunker/embedder/vector-store stages, payload
//! normalization and deterministic chunk identity, and the node that
//! drives a full ingestion run.

pub mod contracts;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod stats;
pub mod types;
pub mod vector_store;

pub use contracts::{Chunker, Embedder, Extractor, Parser};
pub use error::{RagError, Result};
pub use ingestion::RagIngestionNode;
pub use normalizer::{CollectionSchema, Distance, PayloadNormalizer};
pub use stats::IngestionStats;
pub use types::{
    AgentContentItem, AgentEmbeddingChunk, AgentParsedContent, CollectionInfo, ContentAction,
    FilterSpec, RawChunk, SearchHit,
};
pub use vector_store::VectorStore;

use flow_core::{Node, NodeRegistry, Value};
use std::sync::Arc;

/// Registers this crate's node types into `registry` (see
/// `flow_llm::register_builtin` for the sibling bank).
pub fn register_builtin(registry: &mut NodeRegistry) {
    registry.register(
        "rag_ingestion",
        Arc::new(|_config: &Value| Ok(Box::new(RagIngestionNode::new()) as Box<dyn Node>)),
    );
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn register_builtin_makes_the_ingestion_type_buildable() {
        let mut registry = NodeRegistry::new();
        register_builtin(&mut registry);
        let factory = registry.get("rag_ingestion").expect("registered");
        let node = factory(&Value::Null).unwrap();
        assert_eq!(node.spec().type_name, "rag_ingestion");
    }
}
