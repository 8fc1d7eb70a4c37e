//! Smallest possible flow: one node, one connection from the runtime
//! input sentinel, one terminal output. Run with:
//!
//! ```text
//! cargo run -p flow-core --example string_reverser
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

#[tokio::main]
async fn main() -> flow_core::Result<()> {
    let document = FlowDocument {
        id: "string-reverser".into(),
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

    let mut nodes: HashMap<String, Box<dyn Node>> = HashMap::new();
    nodes.insert("rev".into(), Box::new(StringReverser));
    let flow = StrictFlow::new(document, nodes, DockBinder::new(vec![], HashMap::new()));

    let ctx = Context::new(Arc::new(InMemoryMemory::new()));
    let result = flow.run(ctx, HashMap::from([("text".to_string(), json!("MissionBay"))])).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
