//! Pluggable pipeline stage contracts the RAG node drives (§4.3): an
//! extractor yields work, a parser turns it into text, a chunker splits
//! that text, and an embedder turns chunks into vectors.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{AgentContentItem, AgentParsedContent, RawChunk};

/// Source of ingestion work. Owns the item's lifecycle: the RAG node
/// calls `ack`/`fail` to report what happened to each item it yielded
/// (§4.3 step 11).
#[async_trait]
pub trait Extractor: Send + Sync {
    /// A stable name used to route `ack`/`fail` back to the extractor
    /// that produced a given item, when more than one is docked.
    fn name(&self) -> &str;

    async fn extract(&self) -> Result<Vec<AgentContentItem>>;

    async fn ack(&self, item: &AgentContentItem, result_meta: Value) -> Result<()>;

    async fn fail(&self, item: &AgentContentItem, reason: &str, retry_hint: bool) -> Result<()>;
}

/// Turns a raw content item into parsed text. Parsers are tried in
/// ascending `priority` order; the first whose `supports` returns true
/// handles the item (§4.3 step 5).
#[async_trait]
pub trait Parser: Send + Sync {
    fn priority(&self) -> i32 {
        0
    }

    fn supports(&self, item: &AgentContentItem) -> bool;

    async fn parse(&self, item: &AgentContentItem) -> Result<AgentParsedContent>;
}

/// Splits parsed content into chunks. Tried in the same
/// first-match-by-priority fashion as `Parser` (§4.3 step 6).
#[async_trait]
pub trait Chunker: Send + Sync {
    fn priority(&self) -> i32 {
        0
    }

    fn supports(&self, parsed: &AgentParsedContent) -> bool;

    async fn chunk(&self, parsed: &AgentParsedContent) -> Result<Vec<RawChunk>>;
}

/// Turns chunk texts into vectors. Batched by the RAG node (only
/// non-empty texts are sent); implementations return one vector per
/// input text, in the same order (§4.3 step 8).
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
