//! The tool proxy (§4.7, C14): a fixed set of meta-tools —
//! `list_categories`, `search`, `describe`, `call` — that re-expose a
//! large underlying `ToolRegistry` to a model without handing it every
//! tool definition at once.

use flow_core::Context;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::chat_model::ToolDefinition;
use crate::error::LlmError;
use crate::tool::{ToolCall, ToolCallResult, ToolOutput, ToolRegistry};

/// Wraps a `ToolRegistry` behind the four proxy entry points. Holds the
/// registry by `Arc` so a single instance can back many assistant runs.
pub struct ToolProxy {
    registry: Arc<ToolRegistry>,
}

impl ToolProxy {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The four meta-tool definitions the model is actually given,
    /// instead of the full underlying tool set.
    pub fn proxy_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "list_categories".into(),
                description: "List the tag categories available across registered tools".into(),
                parameters: json!({"type": "object", "properties": {}}),
            },
            ToolDefinition {
                name: "search".into(),
                description: "Search registered tools by a free-text query".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: "describe".into(),
                description: "Describe a tool's full definition by name".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}},
                    "required": ["name"]
                }),
            },
            ToolDefinition {
                name: "call".into(),
                description: "Invoke a registered tool by name with arguments".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}, "arguments": {"type": "object"}},
                    "required": ["name", "arguments"]
                }),
            },
        ]
    }

    /// Every distinct tag across the registry, in first-seen order.
    pub fn list_categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for tool in self.registry.iter_in_order() {
            for tag in &tool.tags {
                if !seen.contains(tag) {
                    seen.push(tag.clone());
                }
            }
        }
        seen
    }

    /// Ranks tools by (tag-match count desc, priority desc, name asc,
    /// declaration order) against a whitespace-split query (§4.7).
    pub fn search(&self, query: &str) -> Vec<ToolDefinition> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut ranked: Vec<(usize, i32, String, usize, ToolDefinition)> = self
            .registry
            .iter_in_order()
            .enumerate()
            .map(|(order, tool)| {
                let matches = tool
                    .tags
                    .iter()
                    .filter(|tag| words.iter().any(|w| tag.to_lowercase() == *w))
                    .count();
                (matches, tool.priority, tool.name.clone(), order, tool.definition())
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(b.1.cmp(&a.1))
                .then(a.2.cmp(&b.2))
                .then(a.3.cmp(&b.3))
        });

        ranked.into_iter().map(|(_, _, _, _, def)| def).collect()
    }

    pub fn describe(&self, name: &str) -> Option<ToolDefinition> {
        self.registry.get(name).map(|t| t.definition())
    }

    /// Invokes the named tool, emitting exactly one of `tool.finished`
    /// (success) or `tool.error` (unknown name or execution failure) on
    /// the context's event stream, bracketed by `tool.started` once the
    /// tool is known to exist.
    pub async fn call(&self, call: &ToolCall, ctx: &Context) -> ToolCallResult {
        let stream = ctx.eventstream();

        if !self.registry.contains(&call.name) {
            let error = LlmError::ToolNotFound(call.name.clone()).to_string();
            if let Some(stream) = &stream {
                stream.push("tool.error", json!({"id": call.id, "name": call.name, "error": error}));
            }
            return ToolCallResult {
                id: call.id.clone(),
                name: call.name.clone(),
                output: ToolOutput::Error { error },
            };
        }

        if let Some(stream) = &stream {
            stream.push("tool.started", json!({"id": call.id, "name": call.name}));
        }

        let result = self.registry.call(call, Some(ctx.clone())).await;

        if let Some(stream) = &stream {
            match &result.output {
                ToolOutput::Success { .. } => {
                    stream.push("tool.finished", json!({"id": call.id, "name": call.name}));
                }
                ToolOutput::Error { error } => {
                    stream.push("tool.error", json!({"id": call.id, "name": call.name, "error": error}));
                }
            }
        }

        result
    }
}
