/// Render pass begin info and attachment load/store actions

use std::sync::Arc;
use crate::graphics_device::Texture;

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content to `AttachmentActions::clear_color`
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Discard the rendered content
    DontCare,
}

/// Load/store behavior of the color attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentActions {
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    /// Used when `load_op` is `Clear`
    pub clear_color: [f32; 4],
}

impl AttachmentActions {
    /// Prior contents discarded, result persisted
    pub const DONT_LOAD_STORE: Self = Self {
        load_op: LoadOp::DontCare,
        store_op: StoreOp::Store,
        clear_color: [0.0; 4],
    };

    pub const LOAD_STORE: Self = Self {
        load_op: LoadOp::Load,
        store_op: StoreOp::Store,
        clear_color: [0.0; 4],
    };

    pub fn clear_store(color: [f32; 4]) -> Self {
        Self { load_op: LoadOp::Clear, store_op: StoreOp::Store, clear_color: color }
    }
}

/// Everything needed to begin a single-attachment render pass
#[derive(Clone)]
pub struct RenderPassInfo {
    /// Debug label
    pub name: String,
    /// Color attachment; must be in `ResourceAccess::RenderTarget`
    pub color_target: Arc<dyn Texture>,
    pub actions: AttachmentActions,
}
