//! Per-run counters the RAG node reports as its `stats` output (§4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IngestionStats {
    pub num_items: u64,
    pub num_items_done: u64,
    pub num_items_failed: u64,
    pub num_skipped: u64,
    pub num_deleted: u64,
    pub num_parsed: u64,
    pub num_chunks: u64,
    pub num_vectors: u64,
    pub num_vectors_skipped_empty: u64,
    pub num_store_upserts: u64,
    pub num_store_errors: u64,
    pub num_embed_errors: u64,
    pub num_parser_errors: u64,
    pub num_chunker_errors: u64,
    pub num_extractor_errors: u64,
    pub num_ack_fail_errors: u64,
}

impl IngestionStats {
    /// §8 invariant 6: `num_items == num_items_done + num_items_failed`.
    pub fn is_consistent(&self) -> bool {
        self.num_items == self.num_items_done + self.num_items_failed
    }
}
