//! Payload normalizer (C9, §4.4): per-collection schema, validation,
//! payload construction, and deterministic chunk identity.

use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{RagError, Result};
use crate::types::AgentEmbeddingChunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
}

/// Workflow bookkeeping keys that never make it into a stored payload's
/// `meta` (§4.4: "all workflow keys ... are excluded").
const WORKFLOW_KEYS: &[&str] =
    &["job_id", "attempts", "locks", "error_message", "action", "collectionKey"];

/// Fixed namespace every collection's deterministic point ids are
/// derived under (§4.4, §6). Arbitrary but stable across process
/// restarts — changing it would silently break upsert idempotence for
/// already-stored points.
const POINT_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0x4a, 0x9e, 0x2c, 0x1b, 0x3d, 0x4a, 0x8e, 0x9f, 0x0a, 0x5c, 0x7d, 0x8e, 0x9f, 0x0a, 0x1b,
]);

#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub collection_key: String,
    pub backend_collection_name: String,
    pub vector_size: usize,
    pub distance: Distance,
    /// Metadata keys that must be present on every chunk in this
    /// collection (e.g. `content_uuid`) and are promoted to the flat
    /// payload instead of staying under `meta`.
    pub required_metadata_keys: Vec<String>,
    pub payload_schema: Value,
    /// Whether `text` must be non-empty for this collection (§4.4:
    /// "text empty on a text collection").
    pub requires_text: bool,
}

impl CollectionSchema {
    pub fn new(collection_key: impl Into<String>, vector_size: usize) -> Self {
        let key = collection_key.into();
        Self {
            backend_collection_name: key.clone(),
            collection_key: key,
            vector_size,
            distance: Distance::Cosine,
            required_metadata_keys: Vec::new(),
            payload_schema: Value::Null,
            requires_text: true,
        }
    }

    pub fn with_required_metadata_keys(mut self, keys: Vec<String>) -> Self {
        self.required_metadata_keys = keys;
        self
    }

    pub fn with_backend_name(mut self, name: impl Into<String>) -> Self {
        self.backend_collection_name = name.into();
        self
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }
}

/// Owns every collection's schema; the RAG node and vector-store
/// adapters consult it to validate and build payloads.
pub struct PayloadNormalizer {
    schemas: HashMap<String, CollectionSchema>,
}

impl PayloadNormalizer {
    pub fn new(schemas: Vec<CollectionSchema>) -> Self {
        Self {
            schemas: schemas.into_iter().map(|s| (s.collection_key.clone(), s)).collect(),
        }
    }

    fn schema(&self, collection_key: &str) -> Result<&CollectionSchema> {
        self.schemas
            .get(collection_key)
            .ok_or_else(|| RagError::UnknownCollection(collection_key.to_string()))
    }

    /// §4.4: throws when `collectionKey` empty/unknown, `chunkIndex < 0`
    /// (unrepresentable here since `chunk_index: u32`, so this case is a
    /// type-level guarantee instead), `text` empty on a text collection,
    /// `hash` empty, or a required metadata key is missing.
    pub fn validate(&self, chunk: &AgentEmbeddingChunk) -> Result<()> {
        if chunk.collection_key.is_empty() {
            return Err(RagError::Validation {
                collection_key: chunk.collection_key.clone(),
                reason: "collectionKey is empty".into(),
            });
        }
        let schema = self.schema(&chunk.collection_key)?;
        if schema.requires_text && chunk.text.trim().is_empty() {
            return Err(RagError::Validation {
                collection_key: chunk.collection_key.clone(),
                reason: "text is empty".into(),
            });
        }
        if chunk.hash.is_empty() {
            return Err(RagError::Validation {
                collection_key: chunk.collection_key.clone(),
                reason: "hash is empty".into(),
            });
        }
        for key in &schema.required_metadata_keys {
            if !chunk.metadata.contains_key(key) {
                return Err(RagError::Validation {
                    collection_key: chunk.collection_key.clone(),
                    reason: format!("missing required metadata key '{key}'"),
                });
            }
        }
        Ok(())
    }

    /// The stable per-chunk token: `hash` alone for the first chunk of
    /// an item, `hash-chunkIndex` otherwise (§4.4).
    pub fn chunk_token(chunk: &AgentEmbeddingChunk) -> String {
        if chunk.chunk_index == 0 {
            chunk.hash.clone()
        } else {
            format!("{}-{}", chunk.hash, chunk.chunk_index)
        }
    }

    /// Deterministic UUIDv5 point id from `hash + ":" + chunkIndex`
    /// (§4.4, §6, §8 invariant 3/4): identical inputs always yield the
    /// same id, giving idempotent upserts.
    pub fn point_id(hash: &str, chunk_index: u32) -> Uuid {
        Uuid::new_v5(&POINT_ID_NAMESPACE, format!("{hash}:{chunk_index}").as_bytes())
    }

    /// Flat payload map: `text`, `hash`, `collection_key`, `chunktoken`,
    /// `chunk_index`, every required lifecycle key promoted to the top
    /// level, and a `meta` object holding whatever metadata remains
    /// after excluding workflow keys and promoted lifecycle keys (§4.4).
    pub fn build_payload(&self, chunk: &AgentEmbeddingChunk) -> Result<Map<String, Value>> {
        self.validate(chunk)?;
        let schema = self.schema(&chunk.collection_key)?;

        let mut payload = Map::new();
        payload.insert("text".into(), Value::String(chunk.text.clone()));
        payload.insert("hash".into(), Value::String(chunk.hash.clone()));
        payload.insert("collection_key".into(), Value::String(chunk.collection_key.clone()));
        payload.insert("chunktoken".into(), Value::String(Self::chunk_token(chunk)));
        payload.insert("chunk_index".into(), Value::from(chunk.chunk_index));

        let mut meta = Map::new();
        for (key, value) in &chunk.metadata {
            if WORKFLOW_KEYS.contains(&key.as_str()) {
                continue;
            }
            if schema.required_metadata_keys.contains(key) {
                payload.insert(key.clone(), value.clone());
            } else {
                meta.insert(key.clone(), value.clone());
            }
        }
        payload.insert("meta".into(), Value::Object(meta));

        Ok(payload)
    }

    pub fn get_collection_keys(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    pub fn get_backend_collection_name(&self, collection_key: &str) -> Result<String> {
        Ok(self.schema(collection_key)?.backend_collection_name.clone())
    }

    pub fn get_vector_size(&self, collection_key: &str) -> Result<usize> {
        Ok(self.schema(collection_key)?.vector_size)
    }

    pub fn get_distance(&self, collection_key: &str) -> Result<Distance> {
        Ok(self.schema(collection_key)?.distance)
    }

    pub fn get_schema(&self, collection_key: &str) -> Result<Value> {
        Ok(self.schema(collection_key)?.payload_schema.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(collection_key: &str, hash: &str, chunk_index: u32, text: &str) -> AgentEmbeddingChunk {
        let mut metadata = Map::new();
        metadata.insert("content_uuid".into(), json!("c1"));
        metadata.insert("job_id".into(), json!("job-should-be-dropped"));
        metadata.insert("topic".into(), json!("rust"));
        AgentEmbeddingChunk {
            collection_key: collection_key.into(),
            chunk_index,
            text: text.into(),
            hash: hash.into(),
            metadata,
            vector: vec![0.1, 0.2],
        }
    }

    fn normalizer() -> PayloadNormalizer {
        let schema = CollectionSchema::new("lm", 2)
            .with_required_metadata_keys(vec!["content_uuid".into()]);
        PayloadNormalizer::new(vec![schema])
    }

    #[test]
    fn validate_rejects_unknown_collection() {
        let n = normalizer();
        let c = chunk("missing", "h1", 0, "hello");
        assert!(matches!(n.validate(&c), Err(RagError::UnknownCollection(_))));
    }

    #[test]
    fn validate_rejects_empty_hash() {
        let n = normalizer();
        let c = chunk("lm", "", 0, "hello");
        assert!(n.validate(&c).is_err());
    }

    #[test]
    fn validate_rejects_missing_required_metadata_key() {
        let n = normalizer();
        let mut c = chunk("lm", "h1", 0, "hello");
        c.metadata.remove("content_uuid");
        assert!(n.validate(&c).is_err());
    }

    #[test]
    fn chunk_token_uses_bare_hash_for_first_chunk_only() {
        let first = chunk("lm", "h999", 0, "x");
        let second = chunk("lm", "h999", 3, "x");
        assert_eq!(PayloadNormalizer::chunk_token(&first), "h999");
        assert_eq!(PayloadNormalizer::chunk_token(&second), "h999-3");
    }

    #[test]
    fn point_id_is_deterministic_across_calls() {
        let a = PayloadNormalizer::point_id("h999", 3);
        let b = PayloadNormalizer::point_id("h999", 3);
        assert_eq!(a, b);
        let c = PayloadNormalizer::point_id("h999", 4);
        assert_ne!(a, c);
    }

    #[test]
    fn build_payload_drops_workflow_keys_and_promotes_required_ones() {
        let n = normalizer();
        let c = chunk("lm", "h1", 0, "hello");
        let payload = n.build_payload(&c).unwrap();
        assert_eq!(payload["content_uuid"], json!("c1"));
        assert_eq!(payload["chunktoken"], json!("h1"));
        assert!(!payload["meta"].as_object().unwrap().contains_key("job_id"));
        assert_eq!(payload["meta"]["topic"], json!("rust"));
    }
}
