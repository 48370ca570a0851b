/// Pass declaration types: flags, parameter blocks, dependencies and the
/// context handed to pass callbacks.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use bitflags::bitflags;

use crate::graphics_device::{AttachmentActions, CommandList, GraphicsDevice};
use crate::render_graph::GraphTextureHandle;
use crate::resource::RenderTargetResource;

bitflags! {
    /// Kind of work a pass records
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PassFlags: u32 {
        /// Draws into a render target; the graph opens and closes the render pass
        const RASTER = 1 << 0;
        /// Dispatch work, no render pass
        const COMPUTE = 1 << 1;
        /// Copy work, no render pass
        const COPY = 1 << 2;
    }
}

/// A pass parameter block
///
/// The only way a pass tells the graph which tracked textures it touches.
pub trait PassParameters: Send + 'static {
    /// Declare the textures this block reads or writes
    fn declare(&self, dependencies: &mut PassDependencies);
}

/// Textures a pass reads and writes, as declared by its parameters
#[derive(Debug, Clone, Default)]
pub struct PassDependencies {
    render_targets: Vec<(GraphTextureHandle, AttachmentActions)>,
    texture_reads: Vec<GraphTextureHandle>,
}

impl PassDependencies {
    /// Write dependency: `texture` is bound as a color attachment
    pub fn write_render_target(&mut self, texture: GraphTextureHandle, actions: AttachmentActions) {
        self.render_targets.push((texture, actions));
    }

    /// Read dependency: `texture` is sampled by a shader
    pub fn read_texture(&mut self, texture: GraphTextureHandle) {
        self.texture_reads.push(texture);
    }

    pub fn render_targets(&self) -> &[(GraphTextureHandle, AttachmentActions)] {
        &self.render_targets
    }

    pub fn texture_reads(&self) -> &[GraphTextureHandle] {
        &self.texture_reads
    }

    pub fn is_empty(&self) -> bool {
        self.render_targets.is_empty() && self.texture_reads.is_empty()
    }

    pub(crate) fn handles(&self) -> impl Iterator<Item = GraphTextureHandle> + '_ {
        self.render_targets
            .iter()
            .map(|(handle, _)| *handle)
            .chain(self.texture_reads.iter().copied())
    }
}

/// Parameter block owned by a render graph
///
/// Allocated by `RenderGraphBuilder::allocate_parameters()`, handed to
/// exactly one pass, and dropped as soon as that pass has executed.
pub struct GraphParameters<T: PassParameters> {
    value: Box<T>,
    graph_id: u64,
    live: Arc<AtomicUsize>,
}

impl<T: PassParameters> GraphParameters<T> {
    pub(crate) fn new(value: T, graph_id: u64, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { value: Box::new(value), graph_id, live }
    }

    pub(crate) fn graph_id(&self) -> u64 {
        self.graph_id
    }
}

impl<T: PassParameters> Deref for GraphParameters<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: PassParameters> DerefMut for GraphParameters<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: PassParameters> Drop for GraphParameters<T> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a pass callback may record against
pub struct PassContext<'c> {
    pub pass_name: &'c str,
    pub cmd: &'c mut dyn CommandList,
    pub device: &'c mut dyn GraphicsDevice,
    /// Render target of a raster pass, already bound by the graph
    pub render_target: Option<Arc<RenderTargetResource>>,
}
