//! Resource docking and resource→resource initialization ordering (C7).
//!
//! A node (or a resource) declares docks by name; the flow document wires
//! each dock to an ordered list of resource ids. [`DockBinder`] holds every
//! constructed resource by id and, on request, groups the ids behind one
//! dock into an ordered [`BoundResources`] — the shape `Node::execute` and
//! `Resource::init` both consume.
//!
//! Nodes want a *typed* capability (`Arc<dyn VectorStore>`), not the bare
//! lifecycle trait object (`Arc<dyn Resource>`). [`ResourceHandle`] carries
//! both: the lifecycle object for `init`, and a type-erased capability
//! object a node downcasts back to its concrete trait-object type via
//! [`BoundResources::typed`]. The erasure trick is ordinary `Any`
//! downcasting applied to the *pointer value* `Arc<dyn Capability>` itself
//! (which is `Sized + 'static`), not to the unsized trait object —
//! `Any::downcast_ref` only works on the former.

use crate::context::Context;
use crate::error::{FlowError, Result};
use crate::resource::Resource;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// One constructed resource: its lifecycle handle plus its type-erased
/// capability trait object.
#[derive(Clone)]
pub struct ResourceHandle {
    pub id: String,
    pub resource: Arc<dyn Resource>,
    capability: Arc<dyn Any + Send + Sync>,
}

impl ResourceHandle {
    /// `resource` is used for `docks()`/`init()`; `capability` is the
    /// concrete `Arc<dyn SomeCapabilityTrait>` a node will downcast back
    /// out of [`BoundResources::typed`].
    pub fn new<C: Send + Sync + 'static>(
        id: impl Into<String>,
        resource: Arc<dyn Resource>,
        capability: C,
    ) -> Self {
        Self { id: id.into(), resource, capability: Arc::new(capability) }
    }
}

/// What a [`crate::registry::ResourceFactory`] produces: a resource isn't
/// assigned its id until the flow loader places it, so construction and
/// id assignment are split.
pub struct UnboundResourceHandle {
    resource: Arc<dyn Resource>,
    capability: Arc<dyn Any + Send + Sync>,
}

impl UnboundResourceHandle {
    pub fn new<C: Send + Sync + 'static>(resource: Arc<dyn Resource>, capability: C) -> Self {
        Self { resource, capability: Arc::new(capability) }
    }

    pub fn with_id(self, id: impl Into<String>) -> ResourceHandle {
        ResourceHandle { id: id.into(), resource: self.resource, capability: self.capability }
    }
}

/// A node's (or resource's) resources, grouped by dock name, in the
/// insertion order they appeared in the flow document (§3: "fan-out
/// within a dock preserves insertion order").
#[derive(Default, Clone)]
pub struct BoundResources {
    docks: HashMap<String, Vec<ResourceHandle>>,
}

impl BoundResources {
    pub fn dock(&self, name: &str) -> &[ResourceHandle] {
        self.docks.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty_dock(&self, name: &str) -> bool {
        self.dock(name).is_empty()
    }

    /// Downcast every handle in `dock` to the capability type `T`
    /// (typically `Arc<dyn SomeTrait>`), dropping any handle whose
    /// capability doesn't match — in well-formed flows this never
    /// happens, since dock wiring is checked against `interfaceName` at
    /// flow-build time.
    pub fn typed<T: Clone + Send + Sync + 'static>(&self, dock: &str) -> Vec<T> {
        self.dock(dock)
            .iter()
            .filter_map(|h| h.capability.downcast_ref::<T>().cloned())
            .collect()
    }

    /// Convenience for docks with `maxConnections = 1`.
    pub fn typed_one<T: Clone + Send + Sync + 'static>(&self, dock: &str) -> Option<T> {
        self.typed::<T>(dock).into_iter().next()
    }
}

/// Declared wiring for one node or resource: dock name → ordered resource
/// ids.
pub type DockRefs = HashMap<String, Vec<String>>;

/// Owns every constructed resource and the declared dock wiring for both
/// nodes and resources; resolves dock names to [`BoundResources`] and runs
/// resource-to-resource `init` in declaration order.
pub struct DockBinder {
    resources: HashMap<String, ResourceHandle>,
    resource_order: Vec<String>,
    resource_docks: HashMap<String, DockRefs>,
}

impl DockBinder {
    pub fn new(
        resources: Vec<ResourceHandle>,
        resource_docks: HashMap<String, DockRefs>,
    ) -> Self {
        let resource_order = resources.iter().map(|r| r.id.clone()).collect();
        let resources = resources.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { resources, resource_order, resource_docks }
    }

    /// Resolve a dock-wiring map (a node's `docks` or a resource's own
    /// `docks`) into [`BoundResources`]. Fails fatally if a referenced
    /// resource id doesn't exist — malformed wiring is a flow-fatal error,
    /// not a node-local one (§7).
    pub fn bind(&self, docks: &DockRefs) -> Result<BoundResources> {
        let mut bound = BoundResources::default();
        for (dock_name, ids) in docks {
            let mut handles = Vec::with_capacity(ids.len());
            for id in ids {
                let handle = self
                    .resources
                    .get(id)
                    .ok_or_else(|| FlowError::validation(format!("unknown resource id '{id}'")))?;
                handles.push(handle.clone());
            }
            bound.docks.insert(dock_name.clone(), handles);
        }
        Ok(bound)
    }

    /// Run `init` on every resource that declares its own docks, in
    /// declaration order, resolving each resource's docked resources by id
    /// (never eagerly constructing — cycles in declaration are fine, §4.2).
    pub async fn init_all(&self, ctx: Context) -> Result<()> {
        for id in &self.resource_order {
            let handle = &self.resources[id];
            if handle.resource.docks().is_empty() {
                continue;
            }
            let empty = DockRefs::new();
            let own_docks = self.resource_docks.get(id).unwrap_or(&empty);
            let bound = self.bind(own_docks)?;
            handle
                .resource
                .init(bound, ctx.clone())
                .await
                .map_err(|e| FlowError::resource_init(id, e.to_string()))?;
        }
        Ok(())
    }
}
