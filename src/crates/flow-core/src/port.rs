//! Port and dock declarations (C1).
//!
//! Ports describe a node's input/output surface; docks describe what
//! *resources* (not data) a node needs attached before it can run. Both
//! are pure metadata — the scheduler and dock binder consult them, but
//! neither the engine nor the node trait enforces the `type` string
//! beyond presence/absence checks (see [`crate::value::is_truthy`] for
//! the one piece of interpretation the engine does perform).

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Declaration of a single input or output port on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique name within this side (inputs or outputs) of the node.
    pub name: String,
    /// Free-form type tag: `string|int|float|bool|array|mixed|array<T>`.
    /// Advisory only — never enforced by the engine.
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
}

impl Port {
    pub fn input(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: false,
            default: None,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// How many resources a dock may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxConnections {
    Exactly(usize),
    Unlimited,
}

impl MaxConnections {
    pub fn allows(&self, count: usize) -> bool {
        match self {
            MaxConnections::Exactly(n) => count <= *n,
            MaxConnections::Unlimited => true,
        }
    }
}

/// Declaration of a resource dependency slot on a node or resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dock {
    pub name: String,
    /// Capability name the docked resource(s) must provide, e.g.
    /// `"vectordb"` or `"chat_model"`. Purely descriptive at this layer;
    /// the dock binder matches by declared resource id, not by
    /// interface-based discovery (see [`crate::dock_binder`]).
    pub interface_name: String,
    pub max_connections: MaxConnections,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl Dock {
    pub fn new(name: impl Into<String>, interface_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface_name: interface_name.into(),
            max_connections: MaxConnections::Unlimited,
            required: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max(mut self, n: usize) -> Self {
        self.max_connections = MaxConnections::Exactly(n);
        self
    }

    pub fn exactly_one(self) -> Self {
        self.max(1).required()
    }
}
