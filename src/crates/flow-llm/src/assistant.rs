//! The streaming assistant node (§4.6, C11): opens an event stream
//! immediately, runs a bounded tool-calling loop, then switches to
//! token streaming for the final reply.

use async_trait::async_trait;
use flow_core::{
    BoundResources, Context, EventStreamGuard, Memory, Message, Node, NodeInputs, NodeOutputs,
    NodeSpec,
};
use flow_core::port::{Dock, Port};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::chat_model::{ChatModel, ChatStreamEvent, ToolDefinition};
use crate::error::Result as LlmResult;
use crate::tool::{Tool, ToolCall, ToolRegistry};
use crate::tool_proxy::ToolProxy;

const MAX_TOOL_ITERATIONS: usize = 5;

/// What the node returns to the scheduler. The event-stream output is
/// what actually carries the reply to a client — this is just the
/// node-local bookkeeping signal (§4.6: "returns `{stream_ready: true}`
/// on success, or `{error: …}` if the stream was never opened").
#[derive(Debug, Clone)]
pub enum AssistantOutcome {
    StreamReady,
    NeverOpened(String),
}

impl AssistantOutcome {
    pub fn into_outputs(self) -> NodeOutputs {
        let mut out = NodeOutputs::new();
        match self {
            AssistantOutcome::StreamReady => {
                out.insert("stream_ready".into(), json!(true));
            }
            AssistantOutcome::NeverOpened(message) => {
                out.insert("error".into(), json!(message));
            }
        }
        out
    }
}

pub struct AssistantNode {
    node_id: String,
}

impl AssistantNode {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self { node_id: node_id.into() }
    }

    /// Merges every docked `Tool` resource into one registry, failing if
    /// two docked tools share a name (§4.7's ambiguous-name rule applies
    /// just as much to docking collisions as to a single explicit
    /// registration).
    fn build_registry(resources: &BoundResources) -> LlmResult<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in resources.typed::<Arc<Tool>>("tools") {
            registry.register((*tool).clone())?;
        }
        Ok(registry)
    }

    async fn append_to_memories(memories: &[Arc<dyn Memory>], node_id: &str, message: Message) {
        for memory in memories {
            let _ = memory.append_node_history(node_id, message.clone()).await;
        }
    }
}

#[async_trait]
impl Node for AssistantNode {
    async fn execute(&self, inputs: NodeInputs, resources: BoundResources, ctx: Context) -> NodeOutputs {
        let user_text = inputs
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let suggestions_mode = inputs
            .get("suggestions_mode")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let Some(stream) = ctx.eventstream() else {
            return AssistantOutcome::NeverOpened("no event stream available".into()).into_outputs();
        };
        let guard = EventStreamGuard::open(stream);
        guard.push("msgid", json!({"id": Uuid::new_v4().to_string()}));

        let mut memories: Vec<Arc<dyn Memory>> = resources.typed("memory");
        memories.sort_by_key(|m| m.priority());

        let history = match memories.first() {
            Some(primary) => primary.load_node_history(&self.node_id).await.unwrap_or_default(),
            None => Vec::new(),
        };

        let user_message = Message::user(user_text.clone());
        if !suggestions_mode {
            Self::append_to_memories(&memories, &self.node_id, user_message.clone()).await;
        }

        let mut messages = history;
        messages.push(user_message);

        let model = resources.typed_one::<Arc<dyn ChatModel>>("model");
        let Some(model) = model else {
            guard.push("error", json!({"message": "no chat model docked"}));
            guard.close_err("no chat model docked");
            return AssistantOutcome::StreamReady.into_outputs();
        };

        let registry = match Self::build_registry(&resources) {
            Ok(r) => r,
            Err(e) => {
                guard.push("error", json!({"message": e.to_string()}));
                guard.close_err(e.to_string());
                return AssistantOutcome::StreamReady.into_outputs();
            }
        };
        let proxy = (!suggestions_mode && registry.iter_in_order().next().is_some())
            .then(|| ToolProxy::new(Arc::new(registry)));
        let tool_defs: Vec<ToolDefinition> = proxy
            .as_ref()
            .map(|_| ToolProxy::proxy_definitions())
            .unwrap_or_default();

        if let Some(proxy) = &proxy {
            for _ in 0..MAX_TOOL_ITERATIONS {
                // A disconnected client stops emission, not the loop: tool
                // calls still have side effects that need to finish.
                let live = !guard.is_disconnected();
                let raw = match model.raw(&messages, &tool_defs).await {
                    Ok(r) => r,
                    Err(e) => {
                        if live {
                            guard.push("error", json!({"message": e.to_string()}));
                            guard.close_err(e.to_string());
                        }
                        return AssistantOutcome::StreamReady.into_outputs();
                    }
                };
                let Some(choice) = raw.first_message().cloned() else {
                    break;
                };
                let Some(requests) = choice.tool_calls.filter(|c| !c.is_empty()) else {
                    break;
                };

                let assistant_msg = Message::assistant_tool_call(
                    choice.content.clone().unwrap_or_default(),
                    serde_json::to_value(&requests).unwrap_or(json!([])),
                );
                messages.push(assistant_msg.clone());
                if !suggestions_mode {
                    Self::append_to_memories(&memories, &self.node_id, assistant_msg).await;
                }

                for request in &requests {
                    let result = proxy
                        .call(
                            &ToolCall {
                                id: request.id.clone(),
                                name: request.name.clone(),
                                arguments: request.arguments.clone(),
                            },
                            &ctx,
                        )
                        .await;
                    let content = serde_json::to_string(&result.output).unwrap_or_default();
                    let tool_msg = Message::tool_result(content, request.id.clone());
                    messages.push(tool_msg.clone());
                    if !suggestions_mode {
                        Self::append_to_memories(&memories, &self.node_id, tool_msg).await;
                    }
                }
            }
        }

        let stream_result = model.stream(&messages, &[]).await;
        let mut chat_stream = match stream_result {
            Ok(s) => s,
            Err(e) => {
                guard.push("error", json!({"message": e.to_string()}));
                guard.close_err(e.to_string());
                return AssistantOutcome::StreamReady.into_outputs();
            }
        };

        let mut final_text = String::new();
        while let Some(event) = chat_stream.next().await {
            if guard.is_disconnected() {
                break;
            }
            match event {
                ChatStreamEvent::Token(delta) => {
                    final_text.push_str(&delta);
                    guard.push("token", json!(delta));
                }
                ChatStreamEvent::Meta(meta) => {
                    guard.push("meta", meta);
                }
                ChatStreamEvent::Done => break,
            }
        }

        if !suggestions_mode {
            let final_message = Message::assistant(final_text);
            Self::append_to_memories(&memories, &self.node_id, final_message).await;
        }

        guard.close_ok();
        AssistantOutcome::StreamReady.into_outputs()
    }

    fn spec(&self) -> NodeSpec {
        NodeSpec::new("streaming_assistant")
            .with_inputs(vec![
                Port::input("message", "string").required(),
                Port::input("suggestions_mode", "bool").with_default(json!(false)),
            ])
            .with_outputs(vec![
                Port::input("stream_ready", "bool").with_default(json!(false)),
                Port::input("error", "string"),
            ])
            .with_docks(vec![
                Dock::new("model", "chat_model").exactly_one(),
                Dock::new("memory", "memory"),
                Dock::new("tools", "tool"),
            ])
    }
}
