//! Node-scoped conversation memory (C3).
//!
//! `Memory` is the pluggable per-node history store docked to nodes like
//! the streaming assistant. It's swappable per [`crate::context::Context`]
//! (sub-flow isolation swaps in a scoped memory for the duration of a
//! nested run) and may be backed by a database or session store that
//! outlives any single flow run — the trait says nothing about
//! lifetime, only about the four operations below.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a [`Message`] in a node's conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat-history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            feedback: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn assistant_tool_call(content: impl Into<String>, tool_calls: serde_json::Value) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = Some(tool_calls);
        msg
    }

    pub fn tool_result(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// Per-node conversational history store.
///
/// `getPriority()` determines write/read ordering when a node has more
/// than one memory docked (lower runs first) — the streaming assistant
/// node appends to every docked memory in priority order (§4.6).
#[async_trait]
pub trait Memory: Send + Sync {
    async fn load_node_history(&self, node_id: &str) -> crate::error::Result<Vec<Message>>;
    async fn append_node_history(&self, node_id: &str, message: Message) -> crate::error::Result<()>;
    /// Returns `true` iff a message with `message_id` was found and its
    /// feedback updated.
    async fn set_feedback(
        &self,
        node_id: &str,
        message_id: &str,
        feedback: &str,
    ) -> crate::error::Result<bool>;
    async fn reset_node_history(&self, node_id: &str) -> crate::error::Result<()>;
    fn priority(&self) -> i32 {
        0
    }
}

/// In-process [`Memory`] backed by a `Mutex<HashMap>`. The reference
/// implementation used by tests and as the default when no memory
/// resource is docked; production deployments dock a database- or
/// session-backed implementation instead (out of scope for this crate).
#[derive(Default)]
pub struct InMemoryMemory {
    priority: i32,
    histories: tokio::sync::Mutex<std::collections::HashMap<String, Vec<Message>>>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(priority: i32) -> Self {
        Self { priority, ..Self::default() }
    }
}

#[async_trait]
impl Memory for InMemoryMemory {
    async fn load_node_history(&self, node_id: &str) -> crate::error::Result<Vec<Message>> {
        let histories = self.histories.lock().await;
        Ok(histories.get(node_id).cloned().unwrap_or_default())
    }

    async fn append_node_history(&self, node_id: &str, message: Message) -> crate::error::Result<()> {
        let mut histories = self.histories.lock().await;
        histories.entry(node_id.to_string()).or_default().push(message);
        Ok(())
    }

    async fn set_feedback(
        &self,
        node_id: &str,
        message_id: &str,
        feedback: &str,
    ) -> crate::error::Result<bool> {
        let mut histories = self.histories.lock().await;
        if let Some(history) = histories.get_mut(node_id) {
            if let Some(msg) = history.iter_mut().find(|m| m.id == message_id) {
                msg.feedback = Some(feedback.to_string());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn reset_node_history(&self, node_id: &str) -> crate::error::Result<()> {
        let mut histories = self.histories.lock().await;
        histories.remove(node_id);
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
