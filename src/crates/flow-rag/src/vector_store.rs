//! The vector-store contract (C10, §4.5): `upsert` / `existsByHash` /
//! `existsByFilter` / `deleteByFilter` / `search` / collection lifecycle.
//! No concrete backend ships here — implementations wire in a specific
//! database or service.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AgentEmbeddingChunk, CollectionInfo, FilterSpec, SearchHit};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Validates, builds the payload, ensures the collection and its
    /// indexes exist, then writes the point at its deterministic id
    /// (§4.4, §4.5, invariant: `upsert(c); upsert(c)` is a no-op on
    /// storage size).
    async fn upsert(&self, chunk: &AgentEmbeddingChunk) -> Result<()>;

    /// An empty `hash` is `false` with no backend round-trip (§8 invariant 5).
    async fn exists_by_hash(&self, collection_key: &str, hash: &str) -> Result<bool>;

    async fn exists_by_filter(&self, collection_key: &str, filter: &FilterSpec) -> Result<bool>;

    /// Returns the number of points removed, or `0` if the backend
    /// doesn't report a count.
    async fn delete_by_filter(&self, collection_key: &str, filter: &FilterSpec) -> Result<u64>;

    /// Hits filtered to `score >= min_score` when provided.
    async fn search(
        &self,
        collection_key: &str,
        vector: &[f32],
        limit: usize,
        min_score: Option<f32>,
        filter: Option<&FilterSpec>,
    ) -> Result<Vec<SearchHit>>;

    async fn create_collection(&self, collection_key: &str) -> Result<()>;

    async fn delete_collection(&self, collection_key: &str) -> Result<()>;

    async fn get_info(&self, collection_key: &str) -> Result<CollectionInfo>;
}
