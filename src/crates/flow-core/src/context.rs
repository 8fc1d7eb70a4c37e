//! Per-run execution context (C2).
//!
//! A `Context` is created once per flow run and handed to every node's
//! `execute`. It carries the memory handle (swappable, to let a node
//! isolate a sub-flow onto its own memory), a `vars` scratchpad scoped to
//! this run, an optional event-stream handle, and a cancellation flag a
//! caller can set to ask the scheduler not to start further node
//! iterations (§5).

use crate::event_stream::EventStream;
use crate::memory::Memory;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Reserved `vars` key carrying the run's cancellation flag, per §5's
/// `context.Done()`-style convention. Prefer [`Context::cancel`] /
/// [`Context::is_cancelled`] over reading this key directly.
pub const CANCEL_VAR_KEY: &str = "__cancel__";

/// Per-run scratchpad: memory, variables, and an optional event stream.
#[derive(Clone)]
pub struct Context {
    memory: Arc<RwLock<Arc<dyn Memory>>>,
    vars: Arc<RwLock<HashMap<String, Value>>>,
    eventstream: Option<Arc<dyn EventStream>>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new(memory: Arc<dyn Memory>) -> Self {
        Self {
            memory: Arc::new(RwLock::new(memory)),
            vars: Arc::new(RwLock::new(HashMap::new())),
            eventstream: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_eventstream(mut self, stream: Arc<dyn EventStream>) -> Self {
        self.eventstream = Some(stream);
        self
    }

    pub fn memory(&self) -> Arc<dyn Memory> {
        self.memory.read().expect("memory lock poisoned").clone()
    }

    /// Swap the active memory handle, e.g. to isolate a sub-flow run.
    pub fn swap_memory(&self, memory: Arc<dyn Memory>) {
        *self.memory.write().expect("memory lock poisoned") = memory;
    }

    pub fn eventstream(&self) -> Option<Arc<dyn EventStream>> {
        self.eventstream.clone()
    }

    pub fn get_var(&self, key: &str) -> Option<Value> {
        self.vars.read().expect("vars lock poisoned").get(key).cloned()
    }

    pub fn set_var(&self, key: impl Into<String>, value: Value) {
        self.vars.write().expect("vars lock poisoned").insert(key.into(), value);
    }

    pub fn vars_snapshot(&self) -> HashMap<String, Value> {
        self.vars.read().expect("vars lock poisoned").clone()
    }

    /// Request cancellation; the scheduler checks this before starting
    /// each dispatch round and will not begin a new one once set.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.set_var(CANCEL_VAR_KEY, Value::Bool(true));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMemory;

    #[test]
    fn vars_are_isolated_per_context_instance() {
        let ctx_a = Context::new(Arc::new(InMemoryMemory::new()));
        let ctx_b = Context::new(Arc::new(InMemoryMemory::new()));
        ctx_a.set_var("x", Value::from(1));
        assert_eq!(ctx_a.get_var("x"), Some(Value::from(1)));
        assert_eq!(ctx_b.get_var("x"), None);
    }

    #[test]
    fn swapping_memory_is_visible_through_clones() {
        let ctx = Context::new(Arc::new(InMemoryMemory::with_priority(0)));
        let clone = ctx.clone();
        ctx.swap_memory(Arc::new(InMemoryMemory::with_priority(9)));
        assert_eq!(clone.memory().priority(), 9);
    }

    #[test]
    fn cancel_sets_flag_and_reserved_var() {
        let ctx = Context::new(Arc::new(InMemoryMemory::new()));
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.get_var(CANCEL_VAR_KEY), Some(Value::Bool(true)));
    }
}
