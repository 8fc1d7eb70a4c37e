//! Flow scheduler, resource docking, and the context/memory/event-stream
//! primitives shared by every node and resource in the agent flow
//! runtime.
//!
//! This crate owns the engine (`graph`, `scheduler`, `dock_binder`,
//! `registry`) and the small set of contracts (`node`, `resource`,
//! `memory`, `event_stream`, `port`, `context`) that `flow-llm` and
//! `flow-rag` build concrete nodes and resources against. It has no
//! opinion on what a node *does* — only on how nodes are wired, run, and
//! given their resources.

pub mod config_value;
pub mod context;
pub mod dock_binder;
pub mod error;
pub mod event_stream;
pub mod graph;
pub mod loader;
pub mod memory;
pub mod node;
pub mod port;
pub mod registry;
pub mod resource;
pub mod scheduler;
pub mod value;

pub use context::Context;
pub use dock_binder::{BoundResources, DockBinder, ResourceHandle, UnboundResourceHandle};
pub use error::{FlowError, Result};
pub use event_stream::{ChannelEventStream, EventStream, EventStreamGuard, StreamEvent};
pub use graph::{ConnectionDef, FlowDocument, NodeDef, ResourceDef, INPUT_NODE_ID};
pub use loader::build_flow;
pub use memory::{Memory, Message, Role};
pub use node::{Node, NodeInputs, NodeOutputs, NodeSpec};
pub use port::{Dock, MaxConnections, Port};
pub use registry::{NodeFactory, NodeRegistry, ResourceFactory, ResourceRegistry};
pub use resource::Resource;
pub use scheduler::{FlowMetrics, StrictFlow};
pub use value::Value;
