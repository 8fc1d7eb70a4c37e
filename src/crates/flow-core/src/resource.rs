//! The `Resource` contract: a pluggable side-effect provider attached to
//! nodes (or to other resources) via docks.

use crate::context::Context;
use crate::dock_binder::BoundResources;
use crate::port::Dock;
use async_trait::async_trait;

/// Static declaration of a resource's own docks (resources may depend on
/// other resources — §4.2). A resource with no docks is returned as
/// `Vec::new()` and skips `init` entirely.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Docks this resource itself declares onto other resources. Cycles
    /// in declaration are fine — resolution is by id, not eager
    /// construction (§4.2, §9).
    fn docks(&self) -> Vec<Dock> {
        Vec::new()
    }

    /// One-time hook run before the first node executes, with this
    /// resource's own docked resources already resolved. Resources that
    /// declare no docks never have `init` called. An error here is
    /// flow-fatal, unlike a node error (§4.2, §7).
    async fn init(&self, _resources: BoundResources, _ctx: Context) -> crate::error::Result<()> {
        Ok(())
    }
}
