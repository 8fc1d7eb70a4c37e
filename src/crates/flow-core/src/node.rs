//! The `Node` contract: a single unit of computation in a flow.

use crate::context::Context;
use crate::dock_binder::BoundResources;
use crate::port::{Dock, Port};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::HashMap;

/// A node's accumulating input map (keyed by port name).
pub type NodeInputs = HashMap<String, Value>;

/// A node's produced output map (keyed by port name). Outputs not listed
/// in the node's declared output ports are allowed but not routed by the
/// scheduler (§3).
pub type NodeOutputs = HashMap<String, Value>;

/// Static declaration of a node's ports, docks, and opaque config —
/// everything the scheduler and dock binder need to know about a node
/// without running it.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub type_name: String,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    pub docks: Vec<Dock>,
}

impl NodeSpec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), ..Default::default() }
    }

    pub fn with_inputs(mut self, inputs: Vec<Port>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Port>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_docks(mut self, docks: Vec<Dock>) -> Self {
        self.docks = docks;
        self
    }
}

/// A unit of computation in a flow graph.
///
/// `execute` receives the node's accumulated inputs (after the scheduler
/// has applied defaults and checked required-ness — see
/// [`crate::scheduler::StrictFlow`]), its docked resources grouped by dock
/// name, and the run's shared [`Context`]. Any error raised here is
/// isolated to this node: the scheduler records it as `{error: ...}` in
/// this node's outputs and continues running the rest of the graph (§4.1
/// step 5, §7 node-local errors).
#[async_trait]
pub trait Node: Send + Sync {
    async fn execute(
        &self,
        inputs: NodeInputs,
        resources: BoundResources,
        ctx: Context,
    ) -> NodeOutputs;

    /// Static port/dock declaration for this node type.
    fn spec(&self) -> NodeSpec;
}
