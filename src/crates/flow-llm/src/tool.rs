//! The tool contract (§4.7, C14): a tool declares a function definition
//! the model can call and an executor that handles the invocation,
//! carrying the `tags`/`priority` fields the tool proxy's `search`
//! ranking needs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::chat_model::ToolDefinition;
use crate::error::{LlmError, Result};

pub type ToolFuture = Pin<Box<dyn Future<Output = std::result::Result<Value, String>> + Send>>;

/// Tool executor function type. Resources a tool needs arrive through
/// `flow_core::Context` rather than a separate runtime/store handle.
pub type ToolExecutor =
    Arc<dyn Fn(Value, Option<flow_core::Context>) -> ToolFuture + Send + Sync>;

/// One tool's full specification: the definition the model sees plus
/// the executor the proxy's `call` meta-tool invokes. `Clone` so a
/// `Tool` can be carried as a resource's dock capability ([`flow_core::BoundResources::typed`]).
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    /// Free-form tags `search` matches against a query's words.
    pub tags: Vec<String>,
    /// Higher priority wins ties in `search` ranking.
    pub priority: i32,
    pub executor: ToolExecutor,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        executor: ToolExecutor,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            tags: Vec::new(),
            priority: 0,
            executor,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }

    pub async fn execute(&self, args: Value, ctx: Option<flow_core::Context>) -> Result<Value> {
        (self.executor)(args, ctx)
            .await
            .map_err(|error| LlmError::ToolFailed {
                tool: self.name.clone(),
                error,
            })
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("priority", &self.priority)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutput {
    Success { content: Value },
    Error { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub id: String,
    pub name: String,
    pub output: ToolOutput,
}

/// A registered collection of tools, resolved by name. Declaration order
/// (the order `register` was called in) is preserved for the proxy's
/// name-ascending / declaration-order tie-breaks.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool`, failing with [`LlmError::AmbiguousTool`] if a
    /// tool with the same name is already registered — `call` resolves a
    /// name to exactly one tool, so two same-named registrations (e.g.
    /// from two docked `Tool` resources merged into one registry) can
    /// never both be reachable (§4.7).
    pub fn register(&mut self, tool: Tool) -> Result<()> {
        if self.tools.contains_key(&tool.name) {
            return Err(LlmError::AmbiguousTool(tool.name));
        }
        self.order.push(tool.name.clone());
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered tools in declaration order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Tool> {
        self.order.iter().filter_map(move |name| self.tools.get(name))
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.iter_in_order().map(Tool::definition).collect()
    }

    pub async fn call(
        &self,
        call: &ToolCall,
        ctx: Option<flow_core::Context>,
    ) -> ToolCallResult {
        let Some(tool) = self.get(&call.name) else {
            return ToolCallResult {
                id: call.id.clone(),
                name: call.name.clone(),
                output: ToolOutput::Error {
                    error: format!("tool '{}' not found", call.name),
                },
            };
        };
        match tool.execute(call.arguments.clone(), ctx).await {
            Ok(content) => ToolCallResult {
                id: call.id.clone(),
                name: call.name.clone(),
                output: ToolOutput::Success { content },
            },
            Err(error) => ToolCallResult {
                id: call.id.clone(),
                name: call.name.clone(),
                output: ToolOutput::Error {
                    error: error.to_string(),
                },
            },
        }
    }
}
