//! Resource/node/flow registries and factories (C4).
//!
//! Nodes, resources, and flows are all resolved the same way: by a type
//! name string, through a registry of factories. A registry never decides
//! whether a missing name is an error — it returns `None` and lets the
//! caller (the flow loader, which treats it as fatal; a resource registry
//! probe, which may not) make that call (§9 design notes).

use crate::dock_binder::UnboundResourceHandle;
use crate::node::Node;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a [`Node`] from its declared `config` map.
pub type NodeFactory = Arc<dyn Fn(&Value) -> crate::error::Result<Box<dyn Node>> + Send + Sync>;

/// Builds a resource from its declared `config` map, returning both its
/// lifecycle object and its type-erased capability (see
/// [`UnboundResourceHandle`]). The flow loader assigns the id.
pub type ResourceFactory =
    Arc<dyn Fn(&Value) -> crate::error::Result<UnboundResourceHandle> + Send + Sync>;

/// A generic name → factory registry.
pub struct Registry<F> {
    entries: HashMap<String, F>,
}

impl<F> Default for Registry<F> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<F> Registry<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `type_name`.
    pub fn register(&mut self, type_name: impl Into<String>, factory: F) {
        self.entries.insert(type_name.into(), factory);
    }

    /// Look up a factory by type name. Returns `None` for an unknown
    /// name — never errors; the caller decides what that means.
    pub fn get(&self, type_name: &str) -> Option<&F> {
        self.entries.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Registry of node factories, keyed by node `type`.
pub type NodeRegistry = Registry<NodeFactory>;

/// Registry of resource factories, keyed by resource `type`.
pub type ResourceRegistry = Registry<ResourceFactory>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeOutputs, NodeSpec};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Node for Noop {
        async fn execute(
            &self,
            _inputs: crate::node::NodeInputs,
            _resources: crate::dock_binder::BoundResources,
            _ctx: crate::context::Context,
        ) -> crate::node::NodeOutputs {
            NodeOutputs::new()
        }

        fn spec(&self) -> NodeSpec {
            NodeSpec::new("noop")
        }
    }

    #[test]
    fn unknown_type_name_returns_none_not_error() {
        let registry: NodeRegistry = Registry::new();
        assert!(registry.get("does-not-exist").is_none());
    }

    #[test]
    fn register_then_build_node() {
        let mut registry: NodeRegistry = Registry::new();
        registry.register("noop", Arc::new(|_cfg: &Value| Ok(Box::new(Noop) as Box<dyn Node>)));
        let factory = registry.get("noop").expect("registered");
        let node = factory(&Value::Null).expect("builds");
        assert_eq!(node.spec().type_name, "noop");
    }
}
