//! The chat model contract every adapter implements, and the matching
//! streaming event shape the assistant node consumes (§4.6, §6).

use async_trait::async_trait;
use flow_core::Message;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::error::Result;

/// A tool definition as handed to a model's function-calling surface.
/// Mirrors the `name`/`description`/`parameters` triple every provider's
/// tool-calling API expects, regardless of wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// A tool invocation requested by the model inside a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The message shape inside a raw response, distinct from
/// `flow_core::Message` because it carries tool-call requests that have
/// no place in the long-lived conversation history until they're
/// resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// The non-streaming response shape (§4.6 `raw`): one or more choices,
/// each carrying a message that may itself carry tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRawResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatRawResponse {
    /// The first choice's message, which is all the assistant node ever
    /// looks at (§4.6 only consults `choices[0]`).
    pub fn first_message(&self) -> Option<&ChatMessage> {
        self.choices.first().map(|c| &c.message)
    }
}

/// One event out of a streaming turn. `Token` carries a content delta,
/// `Meta` carries provider-specific structured data a caller may want to
/// surface verbatim (e.g. usage counts), `Done` closes the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatStreamEvent {
    Token(String),
    Meta(Value),
    Done,
}

pub type ChatStream = Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>;

/// The contract every chat model adapter implements. `raw` is used for
/// the bounded tool-calling phase, `stream` for the final token-by-token
/// phase (§4.6's two-phase assistant loop).
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn raw(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ChatRawResponse>;

    async fn stream(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ChatStream>;

    /// Whether this adapter is currently usable (credentials present,
    /// endpoint reachable). Adapters default to `true`; wrap one in a
    /// health check when that matters.
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A deterministic, in-memory `ChatModel` for tests: the first `raw`
    /// call returns the scripted tool calls (if any), every call after
    /// that returns plain content so the assistant's bounded loop
    /// terminates; `stream` yields the reply split into one-token-per-word
    /// chunks followed by `Done`.
    pub struct ScriptedChatModel {
        pub reply: String,
        pub tool_calls: Vec<ToolCallRequest>,
        raw_calls: AtomicUsize,
    }

    impl ScriptedChatModel {
        pub fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                tool_calls: Vec::new(),
                raw_calls: AtomicUsize::new(0),
            }
        }

        pub fn with_tool_call(mut self, call: ToolCallRequest) -> Self {
            self.tool_calls.push(call);
            self
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChatModel {
        async fn raw(&self, _messages: &[Message], _tools: &[ToolDefinition]) -> Result<ChatRawResponse> {
            let call_index = self.raw_calls.fetch_add(1, Ordering::SeqCst);
            let tool_calls = if call_index == 0 && !self.tool_calls.is_empty() {
                Some(self.tool_calls.clone())
            } else {
                None
            };
            Ok(ChatRawResponse {
                choices: vec![ChatChoice {
                    message: ChatMessage {
                        role: "assistant".into(),
                        content: if tool_calls.is_some() { None } else { Some(self.reply.clone()) },
                        tool_calls,
                    },
                }],
            })
        }

        async fn stream(&self, _messages: &[Message], _tools: &[ToolDefinition]) -> Result<ChatStream> {
            let mut events: Vec<ChatStreamEvent> = self
                .reply
                .split(' ')
                .map(|w| ChatStreamEvent::Token(format!("{w} ")))
                .collect();
            events.push(ChatStreamEvent::Done);
            Ok(Box::pin(stream::iter(events)))
        }
    }
}
