//! Chat model contract, tool contract and proxy, and the streaming
//! assistant node that drives a bounded tool-calling loop into a
//! token-streaming reply (§4.6, §4.7).
//!
//! This crate has no opinion on *which* provider backs a `ChatModel` —
//! it defines the contract and the node that consumes it. Concrete
//! provider adapters (OpenAI, Anthropic, local models) are out of scope
//! here; wire one in by implementing [`chat_model::ChatModel`].

pub mod assistant;
pub mod chat_model;
pub mod error;
pub mod tool;
pub mod tool_proxy;

pub use assistant::{AssistantNode, AssistantOutcome};
pub use chat_model::{
    ChatChoice, ChatMessage, ChatModel, ChatRawResponse, ChatStream, ChatStreamEvent,
    ToolCallRequest, ToolDefinition,
};
pub use error::{LlmError, Result};
pub use tool::{Tool, ToolCall, ToolCallResult, ToolExecutor, ToolOutput, ToolRegistry};
pub use tool_proxy::ToolProxy;

use flow_core::{Node, NodeRegistry, Value};
use std::sync::Arc;

/// Registers this crate's node types into `registry`, keyed by
/// `NodeSpec::type_name` — a process wiring multiple flows calls this
/// once instead of hand-registering each type.
///
/// `AssistantNode` needs its own flow-document node id for memory-history
/// keying, but a [`flow_core::registry::NodeFactory`] only receives a
/// node's `config`, not its id — by convention the loader mirrors it into
/// `config["node_id"]`; this factory falls back to `"assistant"` if that
/// key is absent.
pub fn register_builtin(registry: &mut NodeRegistry) {
    registry.register(
        "streaming_assistant",
        Arc::new(|config: &Value| {
            let node_id = config.get("node_id").and_then(Value::as_str).unwrap_or("assistant");
            Ok(Box::new(AssistantNode::new(node_id)) as Box<dyn Node>)
        }),
    );
}
