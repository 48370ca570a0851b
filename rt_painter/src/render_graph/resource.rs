/// Graph-scoped texture handles

use std::sync::atomic::{AtomicU64, Ordering};
use slotmap::new_key_type;

new_key_type! {
    /// Slot of a texture inside one graph
    pub struct GraphTextureKey;
}

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique graph id
pub(crate) fn next_graph_id() -> u64 {
    NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)
}

/// Reference to a texture tracked by one render graph
///
/// Only meaningful for the builder that returned it. Builders reject
/// handles carrying another graph's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphTextureHandle {
    pub(crate) key: GraphTextureKey,
    pub(crate) graph_id: u64,
}

impl GraphTextureHandle {
    /// Id of the graph that issued this handle
    pub fn graph_id(&self) -> u64 {
        self.graph_id
    }
}
