/// CommandList trait - for recording rendering commands

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, Pipeline, Texture, IndexType, ShaderStage,
    RenderPassInfo, ResourceAccess,
};

/// Command list for recording rendering commands
///
/// Commands are recorded between `begin()` and `end()` and executed later by
/// `GraphicsDevice::submit()`.
pub trait CommandList: Send {
    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Open a named debug event scope
    fn begin_event(&mut self, name: &str) -> Result<()>;

    /// Close the innermost debug event scope
    fn end_event(&mut self) -> Result<()>;

    /// Change the access state of a texture
    ///
    /// Must be recorded outside of a render pass.
    fn transition(&mut self, transition: &TextureTransition) -> Result<()>;

    /// Begin a render pass against a single color target
    fn begin_render_pass(&mut self, info: &RenderPassInfo) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Upload a shader parameter block to one stage
    ///
    /// The bytes are copied at record time.
    fn set_shader_parameters(&mut self, stage: ShaderStage, data: &[u8]) -> Result<()>;

    /// Bind a vertex buffer as stream `slot`
    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw indexed primitives
    fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Access-state change of one texture
#[derive(Clone)]
pub struct TextureTransition {
    pub texture: Arc<dyn Texture>,
    pub before: ResourceAccess,
    pub after: ResourceAccess,
}

/// Indexed draw parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawIndexedArgs {
    /// Added to every fetched index
    pub base_vertex_index: i32,
    /// Lowest vertex index referenced
    pub min_index: u32,
    /// Number of vertices referenced, starting at `min_index`
    pub num_vertices: u32,
    /// First index read from the index buffer
    pub start_index: u32,
    pub num_primitives: u32,
    pub num_instances: u32,
}

impl DrawIndexedArgs {
    /// Two triangles over four vertices, one instance
    pub const QUAD: Self = Self {
        base_vertex_index: 0,
        min_index: 0,
        num_vertices: 4,
        start_index: 0,
        num_primitives: 2,
        num_instances: 1,
    };
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering a `width` x `height` target, depth range 0..1
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}
