//! The declarative flow document: the external (JSON/YAML) shape a flow
//! loader deserializes before building nodes, resources, and connections
//! through the registries (§3, §6).

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel node id standing in for the run's runtime inputs — a
/// connection `(fromNode: "__input__", fromOutput: "x") → (toNode, toInput)`
/// seeds `toInput` from the caller-supplied `inputs["x"]` at the start of a
/// run (§3 Connection, §4.1).
pub const INPUT_NODE_ID: &str = "__input__";

/// One node entry in a flow document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Opaque config handed to the node factory; each node type
    /// interprets its own shape.
    #[serde(default)]
    pub config: Value,
    /// Values fixed at load time for this node's inputs, applied before
    /// any connection-sourced input (§4.1 step: "seed per-node inputs
    /// with initialInputs[nodeId]").
    #[serde(default)]
    pub initial_inputs: HashMap<String, Value>,
    /// Dock name → ordered resource ids.
    #[serde(default)]
    pub docks: HashMap<String, Vec<String>>,
}

/// One resource entry in a flow document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub config: Value,
    /// This resource's own docks onto other resources (§4.2).
    #[serde(default)]
    pub docks: HashMap<String, Vec<String>>,
}

/// A wire between one node's output port and another node's input port.
/// `from_node == INPUT_NODE_ID` draws from the run's runtime inputs
/// instead of a node's produced outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDef {
    pub from_node: String,
    pub from_output: String,
    pub to_node: String,
    pub to_input: String,
}

/// The full declarative flow: every node and resource definition plus the
/// connections wiring them together. This is the unit a flow loader
/// deserializes from JSON or YAML and hands to [`crate::loader::build_flow`],
/// which resolves `type_name`s through the node/resource registries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FlowDocument {
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

impl FlowDocument {
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Connections whose target is `node_id`, in declaration order.
    pub fn connections_into(&self, node_id: &str) -> impl Iterator<Item = &ConnectionDef> {
        self.connections.iter().filter(move |c| c.to_node == node_id)
    }

    /// Connections whose source is `node_id`.
    pub fn connections_from(&self, node_id: &str) -> impl Iterator<Item = &ConnectionDef> {
        self.connections.iter().filter(move |c| c.from_node == node_id)
    }

    /// A node with no outgoing connection is a terminal node; its outputs
    /// are included in the run's result (§4.1 "Terminal outputs").
    pub fn is_terminal(&self, node_id: &str) -> bool {
        self.connections_from(node_id).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> FlowDocument {
        FlowDocument {
            id: "f1".into(),
            nodes: vec![
                NodeDef {
                    id: "reverse".into(),
                    type_name: "string_reverser".into(),
                    config: Value::Null,
                    initial_inputs: HashMap::new(),
                    docks: HashMap::new(),
                },
            ],
            resources: vec![],
            connections: vec![ConnectionDef {
                from_node: INPUT_NODE_ID.into(),
                from_output: "text".into(),
                to_node: "reverse".into(),
                to_input: "text".into(),
            }],
        }
    }

    #[test]
    fn terminal_nodes_have_no_outgoing_connection() {
        let doc = sample();
        assert!(doc.is_terminal("reverse"));
        assert!(!doc.is_terminal(INPUT_NODE_ID));
    }

    #[test]
    fn connections_into_filters_by_target() {
        let doc = sample();
        let into: Vec<_> = doc.connections_into("reverse").collect();
        assert_eq!(into.len(), 1);
        assert_eq!(into[0].from_node, INPUT_NODE_ID);
    }

    #[test]
    fn roundtrips_through_json() {
        let doc = sample();
        let raw = serde_json::to_string(&doc).unwrap();
        let parsed = FlowDocument::from_json(&raw).unwrap();
        assert_eq!(parsed.id, "f1");
        assert_eq!(parsed.nodes.len(), 1);
    }

    #[test]
    fn node_config_defaults_to_null_when_absent() {
        let raw = json!({
            "id": "n1",
            "type": "noop",
        });
        let node: NodeDef = serde_json::from_value(raw).unwrap();
        assert!(node.config.is_null());
        assert!(node.initial_inputs.is_empty());
    }
}
