//! Builds a runnable [`StrictFlow`] out of a [`FlowDocument`] by resolving
//! every node and resource `type_name` through a [`NodeRegistry`]/
//! [`ResourceRegistry`] pair (§6 "Flow document" external interface).
//!
//! This is the piece `registry.rs` and `graph.rs` describe as "the flow
//! loader": a document only carries type names and config, never
//! constructed instances, so something has to turn those names into
//! `Box<dyn Node>`/resource handles before a [`StrictFlow`] can run.

use crate::dock_binder::{DockBinder, DockRefs, ResourceHandle};
use crate::error::{FlowError, Result};
use crate::graph::FlowDocument;
use crate::node::Node;
use crate::registry::{NodeRegistry, ResourceRegistry};
use crate::scheduler::StrictFlow;
use crate::value::Value;
use std::collections::HashMap;

/// A node's declared id is mirrored into `config["node_id"]` before its
/// factory runs, so node types that need their own flow-document identity
/// (e.g. `flow_llm::AssistantNode`, keyed by node id for memory-history
/// lookups) can read it without `NodeFactory` itself carrying an id
/// parameter. An explicit `node_id` already present in the document's
/// config wins over this.
fn with_node_id(config: &Value, node_id: &str) -> Value {
    match config {
        Value::Object(map) => {
            let mut merged = map.clone();
            merged
                .entry("node_id".to_string())
                .or_insert_with(|| Value::String(node_id.to_string()));
            Value::Object(merged)
        }
        Value::Null => serde_json::json!({ "node_id": node_id }),
        other => other.clone(),
    }
}

/// Resolve every `ResourceDef`/`NodeDef` in `document` through the given
/// registries and assemble a ready-to-run [`StrictFlow`].
///
/// Resources are built first, in declaration order, since node
/// construction never depends on resource instances (only on dock
/// *wiring*, which `DockBinder` resolves lazily per-call) while resource
/// `init` ordering does depend on this same declaration order (§4.2).
/// An unknown `type_name` on either side is a flow-fatal
/// [`FlowError::UnknownType`], not a node-local error — malformed wiring
/// never reaches the scheduler.
pub fn build_flow(
    document: FlowDocument,
    node_registry: &NodeRegistry,
    resource_registry: &ResourceRegistry,
) -> Result<StrictFlow> {
    let mut resource_handles = Vec::with_capacity(document.resources.len());
    let mut resource_docks: HashMap<String, DockRefs> = HashMap::new();

    for resource_def in &document.resources {
        let factory = resource_registry.get(&resource_def.type_name).ok_or_else(|| {
            FlowError::unknown_type("resource", resource_def.type_name.clone())
        })?;
        let unbound = factory(&resource_def.config)?;
        resource_handles.push(unbound.with_id(resource_def.id.clone()));
        resource_docks.insert(resource_def.id.clone(), resource_def.docks.clone());
    }

    let binder = DockBinder::new(resource_handles, resource_docks);

    let mut nodes: HashMap<String, Box<dyn Node>> = HashMap::with_capacity(document.nodes.len());
    for node_def in &document.nodes {
        let factory = node_registry
            .get(&node_def.type_name)
            .ok_or_else(|| FlowError::unknown_type("node", node_def.type_name.clone()))?;
        let config = with_node_id(&node_def.config, &node_def.id);
        nodes.insert(node_def.id.clone(), factory(&config)?);
    }

    Ok(StrictFlow::new(document, nodes, binder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::dock_binder::BoundResources;
    use crate::graph::{ConnectionDef, NodeDef, ResourceDef, INPUT_NODE_ID};
    use crate::memory::InMemoryMemory;
    use crate::node::{NodeInputs, NodeOutputs, NodeSpec};
    use crate::port::Port;
    use crate::resource::Resource;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct StringReverser;

    #[async_trait]
    impl Node for StringReverser {
        async fn execute(&self, inputs: NodeInputs, _resources: BoundResources, _ctx: Context) -> NodeOutputs {
            let text = inputs.get("text").and_then(Value::as_str).unwrap_or_default();
            let mut out = NodeOutputs::new();
            out.insert("reversed".into(), Value::String(text.chars().rev().collect()));
            out
        }

        fn spec(&self) -> NodeSpec {
            NodeSpec::new("string_reverser")
                .with_inputs(vec![Port::input("text", "string").required()])
                .with_outputs(vec![Port::input("reversed", "string")])
        }
    }

    /// Echoes back whatever `node_id` its factory saw in `config`, so the
    /// mirroring test can assert on it without the node needing any input
    /// of its own.
    struct NodeIdEcho(Value);

    #[async_trait]
    impl Node for NodeIdEcho {
        async fn execute(&self, _inputs: NodeInputs, _resources: BoundResources, _ctx: Context) -> NodeOutputs {
            let mut out = NodeOutputs::new();
            out.insert("seen_node_id".into(), self.0.clone());
            out
        }

        fn spec(&self) -> NodeSpec {
            NodeSpec::new("node_id_echo").with_outputs(vec![Port::input("seen_node_id", "string")])
        }
    }

    struct PlainResource;
    #[async_trait]
    impl Resource for PlainResource {}

    fn node_registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register(
            "string_reverser",
            Arc::new(|_cfg: &Value| Ok(Box::new(StringReverser) as Box<dyn Node>)),
        );
        registry.register(
            "node_id_echo",
            Arc::new(|cfg: &Value| {
                let node_id = cfg.get("node_id").cloned().unwrap_or(Value::Null);
                Ok(Box::new(NodeIdEcho(node_id)) as Box<dyn Node>)
            }),
        );
        registry
    }

    fn resource_registry() -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        registry.register(
            "plain",
            Arc::new(|_cfg: &Value| {
                Ok(crate::dock_binder::UnboundResourceHandle::new(Arc::new(PlainResource), ()))
            }),
        );
        registry
    }

    #[tokio::test]
    async fn builds_and_runs_a_document_through_the_registries() {
        let document = FlowDocument {
            id: "f1".into(),
            nodes: vec![NodeDef {
                id: "rev".into(),
                type_name: "string_reverser".into(),
                config: Value::Null,
                initial_inputs: HashMap::new(),
                docks: HashMap::new(),
            }],
            resources: vec![],
            connections: vec![ConnectionDef {
                from_node: INPUT_NODE_ID.into(),
                from_output: "text".into(),
                to_node: "rev".into(),
                to_input: "text".into(),
            }],
        };

        let flow = build_flow(document, &node_registry(), &resource_registry()).unwrap();
        let ctx = Context::new(Arc::new(InMemoryMemory::new()));
        let result = flow.run(ctx, HashMap::from([("text".to_string(), json!("hello"))])).await.unwrap();
        assert_eq!(result["rev"]["reversed"], json!("olleh"));
    }

    #[tokio::test]
    async fn mirrors_the_declared_node_id_into_config_for_factories_that_want_it() {
        let document = FlowDocument {
            id: "f1".into(),
            nodes: vec![NodeDef {
                id: "assistant1".into(),
                type_name: "node_id_echo".into(),
                config: Value::Null,
                initial_inputs: HashMap::new(),
                docks: HashMap::new(),
            }],
            resources: vec![],
            connections: vec![],
        };

        let flow = build_flow(document, &node_registry(), &resource_registry()).unwrap();
        let ctx = Context::new(Arc::new(InMemoryMemory::new()));
        let result = flow.run(ctx, HashMap::new()).await.unwrap();
        assert_eq!(result["assistant1"]["seen_node_id"], json!("assistant1"));
    }

    #[tokio::test]
    async fn unknown_node_type_is_a_flow_fatal_error() {
        let document = FlowDocument {
            id: "f1".into(),
            nodes: vec![NodeDef {
                id: "n1".into(),
                type_name: "does-not-exist".into(),
                config: Value::Null,
                initial_inputs: HashMap::new(),
                docks: HashMap::new(),
            }],
            resources: vec![],
            connections: vec![],
        };

        let err = build_flow(document, &node_registry(), &resource_registry()).unwrap_err();
        assert!(matches!(err, FlowError::UnknownType { what: "node", .. }));
    }

    #[tokio::test]
    async fn unknown_resource_type_is_a_flow_fatal_error() {
        let document = FlowDocument {
            id: "f1".into(),
            nodes: vec![],
            resources: vec![ResourceDef {
                id: "r1".into(),
                type_name: "does-not-exist".into(),
                config: Value::Null,
                docks: HashMap::new(),
            }],
            connections: vec![],
        };

        let err = build_flow(document, &node_registry(), &resource_registry()).unwrap_err();
        assert!(matches!(err, FlowError::UnknownType { what: "resource", .. }));
    }
}
