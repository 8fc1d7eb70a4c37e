//! RAG data model (§3): the queue envelope, parsed content, embedding
//! chunk, and the filter shape vector-store queries are scoped by.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentAction {
    Upsert,
    Delete,
}

/// The queue envelope an extractor yields (§3 `AgentContentItem`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContentItem {
    pub id: String,
    pub action: ContentAction,
    pub collection_key: String,
    pub hash: String,
    pub content_type: String,
    pub content: Value,
    pub is_binary: bool,
    pub size: u64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentContentItem {
    /// `delete` items must carry `metadata.content_uuid` (§3).
    pub fn content_uuid(&self) -> Option<&str> {
        self.metadata.get("content_uuid").and_then(|v| v.as_str())
    }
}

/// What a parser produces from one content item (§3 `AgentParsedContent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentParsedContent {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
}

/// One chunk produced by a chunker, before metadata merge (§4.3 step 7).
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub text: String,
    pub meta: Map<String, Value>,
}

/// A fully built embedding chunk, ready for the embedder and vector
/// store (§3 `AgentEmbeddingChunk`). Invariant: `has_vector() == !vector.is_empty()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEmbeddingChunk {
    pub collection_key: String,
    pub chunk_index: u32,
    pub text: String,
    pub hash: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub vector: Vec<f32>,
}

impl AgentEmbeddingChunk {
    pub fn has_vector(&self) -> bool {
        !self.vector.is_empty()
    }
}

/// FilterSpec v1 (§3, §6): scalar under a key means equality (or
/// membership against a list-valued backend field); a list under a key
/// means backend-native OR.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub must: HashMap<String, Value>,
    #[serde(default)]
    pub any: HashMap<String, Value>,
    #[serde(default, rename = "must_not")]
    pub must_not: HashMap<String, Value>,
}

impl FilterSpec {
    pub fn must_eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut spec = Self::default();
        spec.must.insert(key.into(), value.into());
        spec
    }
}

#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub collection_key: String,
    pub backend_name: String,
    pub vector_size: usize,
    pub point_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, Value>,
}
