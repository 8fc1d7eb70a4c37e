//! Readiness-based flow scheduler (C6): runs a [`FlowDocument`] to
//! quiescence and returns the outputs of every terminal node (§4.1).

use crate::context::Context;
use crate::dock_binder::DockBinder;
use crate::error::{FlowError, Result};
use crate::graph::{FlowDocument, NodeDef, INPUT_NODE_ID};
use crate::node::{Node, NodeInputs, NodeOutputs};
use crate::value::{is_truthy, Value};
use std::collections::{HashMap, HashSet};

/// Hard minimum for the round cap; configurable upward only.
const DEFAULT_ROUND_CAP: usize = 1000;

/// Synthetic key under which [`StrictFlow::run`] reports the round-cap
/// sentinel — there's no node id to attach it to, since the cap fires
/// against the scheduler itself, not any one node.
pub const ROUND_CAP_SENTINEL_KEY: &str = "__flow__";

/// Observability counters for one `run`, additive to the `Run(inputs)`
/// contract (§9): available via [`StrictFlow::run_with_metrics`] for
/// callers that want them, ignored by plain `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowMetrics {
    pub rounds_run: usize,
    pub nodes_executed: usize,
    pub nodes_errored: usize,
}

/// Runs one [`FlowDocument`] to completion. Holds the already-constructed
/// node instances (keyed by node id) and the resource dock binder; a flow
/// loader is responsible for resolving `type_name`s through the node and
/// resource registries before building one of these.
pub struct StrictFlow {
    document: FlowDocument,
    nodes: HashMap<String, Box<dyn Node>>,
    binder: DockBinder,
    round_cap: usize,
}

impl StrictFlow {
    pub fn new(
        document: FlowDocument,
        nodes: HashMap<String, Box<dyn Node>>,
        binder: DockBinder,
    ) -> Self {
        Self { document, nodes, binder, round_cap: DEFAULT_ROUND_CAP }
    }

    /// Override the round cap. Clamped up to the hard minimum of 1000 —
    /// this only ever widens the safety margin.
    pub fn with_round_cap(mut self, cap: usize) -> Self {
        self.round_cap = cap.max(DEFAULT_ROUND_CAP);
        self
    }

    /// Execute the graph to quiescence and return the outputs of every
    /// terminal node (one with no outgoing connection). `inputs` supplies
    /// the runtime values drawn from the `__input__` sentinel node.
    pub async fn run(
        &self,
        ctx: Context,
        inputs: HashMap<String, Value>,
    ) -> Result<HashMap<String, NodeOutputs>> {
        self.run_with_metrics(ctx, inputs).await.map(|(outputs, _)| outputs)
    }

    /// Same as [`Self::run`], additionally returning [`FlowMetrics`] for
    /// callers that want dispatch-round and node-execution counts.
    pub async fn run_with_metrics(
        &self,
        ctx: Context,
        inputs: HashMap<String, Value>,
    ) -> Result<(HashMap<String, NodeOutputs>, FlowMetrics)> {
        tracing::debug!(flow = %self.document.id, "starting flow run");
        let mut metrics = FlowMetrics::default();

        self.binder.init_all(ctx.clone()).await?;

        let node_defs: HashMap<&str, &NodeDef> =
            self.document.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut node_inputs: HashMap<String, NodeInputs> = HashMap::new();
        let mut node_outputs: HashMap<String, NodeOutputs> = HashMap::new();
        let mut executed: HashSet<String> = HashSet::new();

        for node in &self.document.nodes {
            let entry = node_inputs.entry(node.id.clone()).or_default();
            for (k, v) in &node.initial_inputs {
                entry.insert(k.clone(), v.clone());
            }
        }
        for conn in self.document.connections_from(INPUT_NODE_ID) {
            if let Some(value) = inputs.get(&conn.from_output) {
                node_inputs
                    .entry(conn.to_node.clone())
                    .or_default()
                    .insert(conn.to_input.clone(), value.clone());
            }
        }

        let total = self.document.nodes.len();
        let mut round = 0usize;
        loop {
            if ctx.is_cancelled() || executed.len() == total {
                break;
            }

            let ready_now: Vec<String> = self
                .document
                .nodes
                .iter()
                .map(|n| n.id.clone())
                .filter(|id| !executed.contains(id) && self.is_ready(id, &node_inputs))
                .collect();

            if ready_now.is_empty() {
                break;
            }

            tracing::debug!(round, ready = ready_now.len(), "dispatching round");

            for node_id in ready_now {
                let node_def = node_defs[node_id.as_str()];
                let node = self
                    .nodes
                    .get(&node_id)
                    .ok_or_else(|| FlowError::validation(format!("no node instance for '{node_id}'")))?;
                let outputs = self
                    .execute_one(node.as_ref(), node_def, &mut node_inputs, &ctx)
                    .await?;
                metrics.nodes_executed += 1;
                if outputs.contains_key("error") {
                    metrics.nodes_errored += 1;
                    tracing::warn!(node = %node_id, error = ?outputs.get("error"), "node reported an error output");
                }
                self.propagate(&node_id, &outputs, &mut node_inputs);
                node_outputs.insert(node_id.clone(), outputs);
                executed.insert(node_id);
            }

            round += 1;
            metrics.rounds_run = round;
            if round >= self.round_cap && executed.len() < total {
                let mut sentinel = NodeOutputs::new();
                sentinel.insert(
                    "error".to_string(),
                    Value::String("Flow execution exceeded safe iteration limit".to_string()),
                );
                return Ok((HashMap::from([(ROUND_CAP_SENTINEL_KEY.to_string(), sentinel)]), metrics));
            }
        }

        Ok((self.terminal_outputs(node_outputs), metrics))
    }

    /// A node is ready iff every connection targeting it already has its
    /// `toInput` present in the node's accumulating inputs. Only
    /// connection-backed ports count — unconnected declared ports are
    /// handled by defaults/required checks inside `execute_one` (§4.1).
    fn is_ready(&self, node_id: &str, node_inputs: &HashMap<String, NodeInputs>) -> bool {
        self.document.connections_into(node_id).all(|conn| {
            node_inputs
                .get(node_id)
                .map(|inputs| inputs.contains_key(&conn.to_input))
                .unwrap_or(false)
        })
    }

    async fn execute_one(
        &self,
        node: &dyn Node,
        node_def: &NodeDef,
        node_inputs: &mut HashMap<String, NodeInputs>,
        ctx: &Context,
    ) -> Result<NodeOutputs> {
        let spec = node.spec();
        let inputs = node_inputs.entry(node_def.id.clone()).or_default();

        if spec.inputs.iter().any(|p| p.name == "active") {
            let truthy = inputs.get("active").map(is_truthy).unwrap_or(true);
            if !truthy {
                return Ok(NodeOutputs::new());
            }
        }

        for port in &spec.inputs {
            if !inputs.contains_key(&port.name) {
                if let Some(default) = &port.default {
                    inputs.insert(port.name.clone(), default.clone());
                }
            }
        }
        for port in &spec.inputs {
            if port.required && !inputs.contains_key(&port.name) {
                let mut error_output = NodeOutputs::new();
                error_output.insert(
                    "error".to_string(),
                    Value::String(format!(
                        "Missing required input '{}' for node '{}'",
                        port.name, node_def.id
                    )),
                );
                return Ok(error_output);
            }
        }

        let resources = self.binder.bind(&node_def.docks)?;
        let mut outputs = node.execute(inputs.clone(), resources, ctx.clone()).await;

        for port in &spec.outputs {
            if !outputs.contains_key(&port.name) {
                if let Some(default) = &port.default {
                    outputs.insert(port.name.clone(), default.clone());
                }
            }
        }

        Ok(outputs)
    }

    /// Apply this node's produced outputs to every connection it feeds,
    /// skipping connections whose `fromOutput` key wasn't actually
    /// produced (explicit `null` propagates; an absent key does not).
    fn propagate(
        &self,
        node_id: &str,
        outputs: &NodeOutputs,
        node_inputs: &mut HashMap<String, NodeInputs>,
    ) {
        for conn in self.document.connections_from(node_id) {
            if let Some(value) = outputs.get(&conn.from_output) {
                node_inputs
                    .entry(conn.to_node.clone())
                    .or_default()
                    .insert(conn.to_input.clone(), value.clone());
            }
        }
    }

    fn terminal_outputs(
        &self,
        mut node_outputs: HashMap<String, NodeOutputs>,
    ) -> HashMap<String, NodeOutputs> {
        node_outputs.retain(|id, _| self.document.is_terminal(id));
        node_outputs
    }
}
