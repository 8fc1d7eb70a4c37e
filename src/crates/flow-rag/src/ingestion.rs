//! The RAG ingestion node (C8, §4.3): extract -> route -> skip-check ->
//! parse -> chunk -> embed -> store, with per-item ack/fail back to the
//! owning extractor.

use async_trait::async_trait;
use flow_core::port::{Dock, Port};
use flow_core::{BoundResources, Context, Node, NodeInputs, NodeOutputs, NodeSpec};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::contracts::{Chunker, Embedder, Extractor, Parser};
use crate::stats::IngestionStats;
use crate::types::{AgentContentItem, AgentEmbeddingChunk, ContentAction, FilterSpec};
use crate::vector_store::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IngestMode {
    Skip,
    Append,
    Replace,
}

impl IngestMode {
    fn parse(raw: &str) -> Self {
        match raw {
            "replace" => IngestMode::Replace,
            "append" => IngestMode::Append,
            _ => IngestMode::Skip,
        }
    }
}

pub struct RagIngestionNode;

impl RagIngestionNode {
    pub fn new() -> Self {
        Self
    }

    async fn process_item(
        item: AgentContentItem,
        extractor: &dyn Extractor,
        mode: IngestMode,
        parsers: &[Arc<dyn Parser>],
        chunkers: &[Arc<dyn Chunker>],
        embedder: &dyn Embedder,
        vectordb: &dyn VectorStore,
        stats: &mut IngestionStats,
    ) {
        if item.action == ContentAction::Delete {
            let Some(content_uuid) = item.content_uuid().map(str::to_string) else {
                stats.num_items_failed += 1;
                if extractor.fail(&item, "missing metadata.content_uuid for delete", false).await.is_err() {
                    stats.num_ack_fail_errors += 1;
                }
                return;
            };
            let deleted = vectordb
                .delete_by_filter(&item.collection_key, &FilterSpec::must_eq("content_uuid", content_uuid))
                .await
                .unwrap_or_else(|_| {
                    stats.num_store_errors += 1;
                    0
                });
            stats.num_deleted += deleted;
            stats.num_items_done += 1;
            if extractor.ack(&item, json!({"action": "delete", "deleted": deleted})).await.is_err() {
                stats.num_ack_fail_errors += 1;
            }
            return;
        }

        if mode == IngestMode::Skip && !item.hash.is_empty() {
            match vectordb.exists_by_hash(&item.collection_key, &item.hash).await {
                Ok(true) => {
                    stats.num_skipped += 1;
                    stats.num_items_done += 1;
                    if extractor.ack(&item, json!({"action": "skip"})).await.is_err() {
                        stats.num_ack_fail_errors += 1;
                    }
                    return;
                }
                Ok(false) => {}
                Err(_) => stats.num_store_errors += 1,
            }
        }

        if mode == IngestMode::Replace {
            if let Some(content_uuid) = item.content_uuid() {
                if vectordb
                    .delete_by_filter(&item.collection_key, &FilterSpec::must_eq("content_uuid", content_uuid))
                    .await
                    .is_err()
                {
                    stats.num_store_errors += 1;
                }
            }
        }

        let Some(parser) = parsers.iter().find(|p| p.supports(&item)) else {
            stats.num_items_failed += 1;
            stats.num_parser_errors += 1;
            if extractor.fail(&item, "no parser supports this item", true).await.is_err() {
                stats.num_ack_fail_errors += 1;
            }
            return;
        };
        let parsed = match parser.parse(&item).await {
            Ok(p) => p,
            Err(e) => {
                stats.num_items_failed += 1;
                stats.num_parser_errors += 1;
                if extractor.fail(&item, &e.to_string(), true).await.is_err() {
                    stats.num_ack_fail_errors += 1;
                }
                return;
            }
        };
        stats.num_parsed += 1;

        let Some(chunker) = chunkers.iter().find(|c| c.supports(&parsed)) else {
            stats.num_items_failed += 1;
            stats.num_chunker_errors += 1;
            if extractor.fail(&item, "no chunker supports this content", true).await.is_err() {
                stats.num_ack_fail_errors += 1;
            }
            return;
        };
        let raw_chunks = match chunker.chunk(&parsed).await {
            Ok(c) => c,
            Err(e) => {
                stats.num_items_failed += 1;
                stats.num_chunker_errors += 1;
                if extractor.fail(&item, &e.to_string(), true).await.is_err() {
                    stats.num_ack_fail_errors += 1;
                }
                return;
            }
        };

        // §4.3 step 7: merge bottom-up (item -> parsed -> chunk), trim,
        // drop empty, assign chunkIndex, attach num_chunks.
        let mut built: Vec<AgentEmbeddingChunk> = Vec::new();
        for raw in raw_chunks {
            let text = raw.text.trim().to_string();
            if text.is_empty() {
                continue;
            }
            let mut metadata = item.metadata.clone();
            for (k, v) in &parsed.metadata {
                metadata.insert(k.clone(), v.clone());
            }
            for (k, v) in &raw.meta {
                metadata.insert(k.clone(), v.clone());
            }
            built.push(AgentEmbeddingChunk {
                collection_key: item.collection_key.clone(),
                chunk_index: built.len() as u32,
                text,
                hash: item.hash.clone(),
                metadata,
                vector: Vec::new(),
            });
        }

        if built.is_empty() {
            // Boundary (§8): zero non-empty chunks is a failure with no
            // ack at all, status `no-chunks`.
            stats.num_items_failed += 1;
            if extractor.fail(&item, "no-chunks", true).await.is_err() {
                stats.num_ack_fail_errors += 1;
            }
            return;
        }

        let num_chunks = built.len();
        for chunk in &mut built {
            chunk.metadata.insert("num_chunks".to_string(), Value::from(num_chunks));
        }
        stats.num_chunks += num_chunks as u64;

        let texts: Vec<String> = built.iter().map(|c| c.text.clone()).collect();
        let vectors = match embedder.embed_batch(&texts).await {
            Ok(v) => v,
            Err(_) => {
                stats.num_embed_errors += 1;
                vec![Vec::new(); built.len()]
            }
        };
        for (chunk, vector) in built.iter_mut().zip(vectors.into_iter()) {
            if vector.is_empty() {
                stats.num_vectors_skipped_empty += 1;
            } else {
                stats.num_vectors += 1;
                chunk.vector = vector;
            }
        }

        let mut stored = 0u64;
        for chunk in built.iter().filter(|c| c.has_vector()) {
            match vectordb.upsert(chunk).await {
                Ok(()) => {
                    stats.num_store_upserts += 1;
                    stored += 1;
                }
                Err(_) => stats.num_store_errors += 1,
            }
        }

        if stored > 0 {
            stats.num_items_done += 1;
            if extractor.ack(&item, json!({"action": "upsert", "stored": stored})).await.is_err() {
                stats.num_ack_fail_errors += 1;
            }
        } else {
            stats.num_items_failed += 1;
            if extractor.fail(&item, "no chunks were stored", true).await.is_err() {
                stats.num_ack_fail_errors += 1;
            }
        }
    }
}

impl Default for RagIngestionNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RagIngestionNode {
    async fn execute(&self, inputs: NodeInputs, resources: BoundResources, _ctx: Context) -> NodeOutputs {
        let mode = IngestMode::parse(inputs.get("mode").and_then(Value::as_str).unwrap_or("skip"));

        let extractors: Vec<Arc<dyn Extractor>> = resources.typed("extractor");
        let mut parsers: Vec<Arc<dyn Parser>> = resources.typed("parser");
        parsers.sort_by_key(|p| p.priority());
        let mut chunkers: Vec<Arc<dyn Chunker>> = resources.typed("chunker");
        chunkers.sort_by_key(|c| c.priority());
        let embedder = resources.typed_one::<Arc<dyn Embedder>>("embedder");
        let vectordb = resources.typed_one::<Arc<dyn VectorStore>>("vectordb");

        let mut outputs = NodeOutputs::new();
        let (Some(embedder), Some(vectordb)) = (embedder, vectordb) else {
            outputs.insert("error".into(), json!("RAG node requires exactly one embedder and one vectordb"));
            return outputs;
        };

        let mut stats = IngestionStats::default();
        for extractor in &extractors {
            let items = match extractor.extract().await {
                Ok(items) => items,
                Err(_) => {
                    stats.num_extractor_errors += 1;
                    continue;
                }
            };
            for item in items {
                stats.num_items += 1;
                Self::process_item(
                    item,
                    extractor.as_ref(),
                    mode,
                    &parsers,
                    &chunkers,
                    embedder.as_ref(),
                    vectordb.as_ref(),
                    &mut stats,
                )
                .await;
            }
        }

        outputs.insert("stats".into(), serde_json::to_value(&stats).unwrap_or(Value::Object(Map::new())));
        outputs
    }

    fn spec(&self) -> NodeSpec {
        NodeSpec::new("rag_ingestion")
            .with_inputs(vec![
                Port::input("mode", "string").with_default(json!("skip")),
                Port::input("debug", "bool").with_default(json!(false)),
                Port::input("debug_preview_len", "int").with_default(json!(200)),
            ])
            .with_outputs(vec![Port::input("stats", "mixed")])
            .with_docks(vec![
                Dock::new("extractor", "extractor").required(),
                Dock::new("parser", "parser").required(),
                Dock::new("chunker", "chunker").required(),
                Dock::new("embedder", "embedder").exactly_one(),
                Dock::new("vectordb", "vectordb").exactly_one(),
                Dock::new("logger", "logger"),
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::dock_binder::ResourceHandle;
    use flow_core::memory::InMemoryMemory;
    use flow_core::{DockBinder, Resource};
    use crate::types::{AgentParsedContent, RawChunk};
    use serde_json::Map as JsonMap;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeExtractor {
        items: Mutex<Vec<AgentContentItem>>,
        acked: Mutex<Vec<(String, Value)>>,
        failed: Mutex<Vec<(String, String)>>,
    }

    impl FakeExtractor {
        fn new(items: Vec<AgentContentItem>) -> Self {
            Self { items: Mutex::new(items), acked: Mutex::new(Vec::new()), failed: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        fn name(&self) -> &str {
            "fake"
        }

        async fn extract(&self) -> crate::error::Result<Vec<AgentContentItem>> {
            Ok(self.items.lock().unwrap().drain(..).collect())
        }

        async fn ack(&self, item: &AgentContentItem, result_meta: Value) -> crate::error::Result<()> {
            self.acked.lock().unwrap().push((item.id.clone(), result_meta));
            Ok(())
        }

        async fn fail(&self, item: &AgentContentItem, reason: &str, _retry_hint: bool) -> crate::error::Result<()> {
            self.failed.lock().unwrap().push((item.id.clone(), reason.to_string()));
            Ok(())
        }
    }

    struct FakeParser;
    #[async_trait]
    impl Parser for FakeParser {
        fn supports(&self, _item: &AgentContentItem) -> bool {
            true
        }

        async fn parse(&self, item: &AgentContentItem) -> crate::error::Result<AgentParsedContent> {
            Ok(AgentParsedContent {
                text: item.content.as_str().unwrap_or_default().to_string(),
                metadata: item.metadata.clone(),
                structured: None,
                attachments: None,
            })
        }
    }

    /// Yields one chunk holding the whole parsed text, or (when
    /// `yields_empty`) a single whitespace-only chunk to exercise the
    /// zero-non-empty-chunks path.
    struct FakeChunker {
        yields_empty: bool,
    }

    #[async_trait]
    impl Chunker for FakeChunker {
        fn supports(&self, _parsed: &AgentParsedContent) -> bool {
            true
        }

        async fn chunk(&self, parsed: &AgentParsedContent) -> crate::error::Result<Vec<RawChunk>> {
            if self.yields_empty {
                return Ok(vec![RawChunk { text: "   ".into(), meta: JsonMap::new() }]);
            }
            Ok(vec![RawChunk { text: parsed.text.clone(), meta: Default::default() }])
        }
    }

    struct FakeEmbedder;
    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2]).collect())
        }
    }

    #[derive(Default)]
    struct FakeVectorStore {
        hashes_seen: AsyncMutex<std::collections::HashSet<String>>,
        upserts: AsyncMutex<Vec<AgentEmbeddingChunk>>,
        deletes: AsyncMutex<u32>,
    }

    #[async_trait]
    impl VectorStore for FakeVectorStore {
        async fn upsert(&self, chunk: &AgentEmbeddingChunk) -> crate::error::Result<()> {
            self.hashes_seen.lock().await.insert(chunk.hash.clone());
            self.upserts.lock().await.push(chunk.clone());
            Ok(())
        }

        async fn exists_by_hash(&self, _collection_key: &str, hash: &str) -> crate::error::Result<bool> {
            Ok(self.hashes_seen.lock().await.contains(hash))
        }

        async fn exists_by_filter(&self, _collection_key: &str, _filter: &FilterSpec) -> crate::error::Result<bool> {
            Ok(false)
        }

        async fn delete_by_filter(&self, _collection_key: &str, _filter: &FilterSpec) -> crate::error::Result<u64> {
            *self.deletes.lock().await += 1;
            Ok(1)
        }

        async fn search(
            &self,
            _collection_key: &str,
            _vector: &[f32],
            _limit: usize,
            _min_score: Option<f32>,
            _filter: Option<&FilterSpec>,
        ) -> crate::error::Result<Vec<crate::types::SearchHit>> {
            Ok(Vec::new())
        }

        async fn create_collection(&self, _collection_key: &str) -> crate::error::Result<()> {
            Ok(())
        }

        async fn delete_collection(&self, _collection_key: &str) -> crate::error::Result<()> {
            Ok(())
        }

        async fn get_info(&self, collection_key: &str) -> crate::error::Result<crate::types::CollectionInfo> {
            Ok(crate::types::CollectionInfo {
                collection_key: collection_key.to_string(),
                backend_name: collection_key.to_string(),
                vector_size: 2,
                point_count: self.upserts.lock().await.len() as u64,
            })
        }
    }

    struct ExtractorResource;
    #[async_trait]
    impl Resource for ExtractorResource {}
    struct ParserResource;
    #[async_trait]
    impl Resource for ParserResource {}
    struct ChunkerResource;
    #[async_trait]
    impl Resource for ChunkerResource {}
    struct EmbedderResource;
    #[async_trait]
    impl Resource for EmbedderResource {}
    struct VectordbResource;
    #[async_trait]
    impl Resource for VectordbResource {}

    fn item(id: &str, hash: &str, action: ContentAction, text: &str) -> AgentContentItem {
        AgentContentItem {
            id: id.into(),
            action,
            collection_key: "docs".into(),
            hash: hash.into(),
            content_type: "text/plain".into(),
            content: json!(text),
            is_binary: false,
            size: text.len() as u64,
            metadata: JsonMap::new(),
        }
    }

    fn bound_resources(
        extractor: Arc<dyn Extractor>,
        chunker_yields_empty: bool,
        vectordb: Arc<FakeVectorStore>,
    ) -> BoundResources {
        let parser: Arc<dyn Parser> = Arc::new(FakeParser);
        let chunker: Arc<dyn Chunker> = Arc::new(FakeChunker { yields_empty: chunker_yields_empty });
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);
        let vectordb: Arc<dyn VectorStore> = vectordb;

        let handles = vec![
            ResourceHandle::new("extractor", Arc::new(ExtractorResource), extractor),
            ResourceHandle::new("parser", Arc::new(ParserResource), parser),
            ResourceHandle::new("chunker", Arc::new(ChunkerResource), chunker),
            ResourceHandle::new("embedder", Arc::new(EmbedderResource), embedder),
            ResourceHandle::new("vectordb", Arc::new(VectordbResource), vectordb),
        ];
        let binder = DockBinder::new(handles, HashMap::new());
        let mut docks = HashMap::new();
        docks.insert("extractor".to_string(), vec!["extractor".to_string()]);
        docks.insert("parser".to_string(), vec!["parser".to_string()]);
        docks.insert("chunker".to_string(), vec!["chunker".to_string()]);
        docks.insert("embedder".to_string(), vec!["embedder".to_string()]);
        docks.insert("vectordb".to_string(), vec!["vectordb".to_string()]);
        binder.bind(&docks).unwrap()
    }

    fn ctx() -> Context {
        Context::new(Arc::new(InMemoryMemory::new()))
    }

    #[tokio::test]
    async fn new_item_is_parsed_chunked_embedded_and_stored() {
        let extractor = Arc::new(FakeExtractor::new(vec![item("i1", "h1", ContentAction::Upsert, "hello world")]));
        let vectordb = Arc::new(FakeVectorStore::default());
        let resources = bound_resources(extractor.clone(), false, vectordb.clone());

        let node = RagIngestionNode::new();
        let outputs = node.execute(NodeInputs::new(), resources, ctx()).await;

        let stats: IngestionStats = serde_json::from_value(outputs["stats"].clone()).unwrap();
        assert_eq!(stats.num_items, 1);
        assert_eq!(stats.num_items_done, 1);
        assert_eq!(stats.num_items_failed, 0);
        assert_eq!(stats.num_store_upserts, 1);
        assert!(stats.is_consistent());
        assert_eq!(extractor.acked.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn skip_mode_acks_a_duplicate_hash_without_reparsing() {
        let vectordb = Arc::new(FakeVectorStore::default());
        vectordb.hashes_seen.lock().await.insert("h1".to_string());
        let extractor = Arc::new(FakeExtractor::new(vec![item("i1", "h1", ContentAction::Upsert, "hello")]));
        let resources = bound_resources(extractor.clone(), false, vectordb.clone());

        let mut inputs = NodeInputs::new();
        inputs.insert("mode".into(), json!("skip"));
        let node = RagIngestionNode::new();
        let outputs = node.execute(inputs, resources, ctx()).await;

        let stats: IngestionStats = serde_json::from_value(outputs["stats"].clone()).unwrap();
        assert_eq!(stats.num_skipped, 1);
        assert_eq!(stats.num_items_done, 1);
        assert_eq!(stats.num_parsed, 0);
        assert_eq!(extractor.acked.lock().unwrap()[0].1["action"], json!("skip"));
    }

    #[tokio::test]
    async fn replace_mode_deletes_the_prior_content_uuid_before_reingesting() {
        let mut it = item("i1", "h1", ContentAction::Upsert, "hello");
        it.metadata.insert("content_uuid".into(), json!("c1"));
        let extractor = Arc::new(FakeExtractor::new(vec![it]));
        let vectordb = Arc::new(FakeVectorStore::default());
        let resources = bound_resources(extractor.clone(), false, vectordb.clone());

        let mut inputs = NodeInputs::new();
        inputs.insert("mode".into(), json!("replace"));
        let node = RagIngestionNode::new();
        let outputs = node.execute(inputs, resources, ctx()).await;

        let stats: IngestionStats = serde_json::from_value(outputs["stats"].clone()).unwrap();
        assert_eq!(*vectordb.deletes.lock().await, 1);
        assert_eq!(stats.num_items_done, 1);
        assert!(stats.is_consistent());
    }

    #[tokio::test]
    async fn delete_action_removes_points_and_acks_without_parsing() {
        let mut it = item("i1", "h1", ContentAction::Delete, "");
        it.metadata.insert("content_uuid".into(), json!("c1"));
        let extractor = Arc::new(FakeExtractor::new(vec![it]));
        let vectordb = Arc::new(FakeVectorStore::default());
        let resources = bound_resources(extractor.clone(), false, vectordb.clone());

        let node = RagIngestionNode::new();
        let outputs = node.execute(NodeInputs::new(), resources, ctx()).await;

        let stats: IngestionStats = serde_json::from_value(outputs["stats"].clone()).unwrap();
        assert_eq!(stats.num_deleted, 1);
        assert_eq!(stats.num_items_done, 1);
        assert_eq!(stats.num_parsed, 0);
    }

    #[tokio::test]
    async fn zero_non_empty_chunks_fails_the_item_without_acking() {
        let extractor = Arc::new(FakeExtractor::new(vec![item("i1", "h1", ContentAction::Upsert, "hello")]));
        let vectordb = Arc::new(FakeVectorStore::default());
        let resources = bound_resources(extractor.clone(), true, vectordb.clone());

        let node = RagIngestionNode::new();
        let outputs = node.execute(NodeInputs::new(), resources, ctx()).await;

        let stats: IngestionStats = serde_json::from_value(outputs["stats"].clone()).unwrap();
        assert_eq!(stats.num_items_failed, 1);
        assert_eq!(stats.num_items_done, 0);
        assert!(stats.is_consistent());
        assert!(extractor.acked.lock().unwrap().is_empty());
        assert_eq!(extractor.failed.lock().unwrap()[0].1, "no-chunks");
    }
}
