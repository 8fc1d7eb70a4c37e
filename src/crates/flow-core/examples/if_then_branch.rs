//! A gate node that emits only one of two output ports per run, so the
//! node wired to the other port is never ready and never executes. Run
//! with:
//!
//! ```text
//! cargo run -p flow-core --example if_then_branch
//! ```

use async_trait::async_trait;
use flow_core::memory::InMemoryMemory;
use flow_core::{
    BoundResources, ConnectionDef, Context, DockBinder, FlowDocument, Node, NodeDef, NodeInputs,
    NodeOutputs, NodeSpec, Port, StrictFlow, Value, INPUT_NODE_ID,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

struct IfNode;

#[async_trait]
impl Node for IfNode {
    async fn execute(&self, inputs: NodeInputs, _resources: BoundResources, _ctx: Context) -> NodeOutputs {
        let taken = inputs.get("condition").map(flow_core::value::is_truthy).unwrap_or(false);
        let mut out = NodeOutputs::new();
        out.insert(if taken { "true" } else { "false" }.to_string(), json!(1));
        out
    }

    fn spec(&self) -> NodeSpec {
        NodeSpec::new("if_node")
            .with_inputs(vec![Port::input("condition", "bool").required()])
            .with_outputs(vec![Port::input("true", "int"), Port::input("false", "int")])
    }
}

struct Sink;

#[async_trait]
impl Node for Sink {
    async fn execute(&self, inputs: NodeInputs, _resources: BoundResources, _ctx: Context) -> NodeOutputs {
        let mut out = NodeOutputs::new();
        if let Some(v) = inputs.get("value") {
            out.insert("value".into(), v.clone());
        }
        out
    }

    fn spec(&self) -> NodeSpec {
        NodeSpec::new("sink")
            .with_inputs(vec![Port::input("value", "mixed")])
            .with_outputs(vec![Port::input("value", "mixed")])
    }
}

fn node_def(id: &str, type_name: &str) -> NodeDef {
    NodeDef {
        id: id.to_string(),
        type_name: type_name.to_string(),
        config: Value::Null,
        initial_inputs: HashMap::new(),
        docks: HashMap::new(),
    }
}

#[tokio::main]
async fn main() -> flow_core::Result<()> {
    let document = FlowDocument {
        id: "if-then".into(),
        nodes: vec![node_def("gate", "if_node"), node_def("true_side", "sink"), node_def("false_side", "sink")],
        resources: vec![],
        connections: vec![
            ConnectionDef {
                from_node: INPUT_NODE_ID.into(),
                from_output: "condition".into(),
                to_node: "gate".into(),
                to_input: "condition".into(),
            },
            ConnectionDef {
                from_node: "gate".into(),
                from_output: "true".into(),
                to_node: "true_side".into(),
                to_input: "value".into(),
            },
            ConnectionDef {
                from_node: "gate".into(),
                from_output: "false".into(),
                to_node: "false_side".into(),
                to_input: "value".into(),
            },
        ],
    };

    let mut nodes: HashMap<String, Box<dyn Node>> = HashMap::new();
    nodes.insert("gate".into(), Box::new(IfNode));
    nodes.insert("true_side".into(), Box::new(Sink));
    nodes.insert("false_side".into(), Box::new(Sink));
    let flow = StrictFlow::new(document, nodes, DockBinder::new(vec![], HashMap::new()));

    let ctx = Context::new(Arc::new(InMemoryMemory::new()));
    let result = flow.run(ctx, HashMap::from([("condition".to_string(), json!(true))])).await?;

    // Only `true_side` appears: `false_side` was never ready, so it was
    // never executed and has no entry here at all.
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
