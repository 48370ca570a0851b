/// GraphicsDevice trait - resource factory and command submission interface

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, Texture, Shader, Pipeline, CommandList,
    BufferDesc, TextureDesc, ShaderDesc, PipelineDesc,
};

/// Graphics device configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable command validation (access-state checks on transitions and passes)
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Upper bound for live buffer memory in bytes (None = unlimited)
    pub max_buffer_memory: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "RtPainter Application".to_string(),
            max_buffer_memory: None,
        }
    }
}

/// Cumulative device statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicsDeviceStats {
    /// Number of indexed draws executed (one per instance)
    pub draw_calls: u32,
    /// Number of triangles rasterized
    pub triangles: u32,
    /// Number of buffers created since the device was built
    pub buffers_created: u32,
    /// Bytes held by live buffers
    pub buffer_memory_used: u64,
    /// Number of `submit` calls executed
    pub submissions: u32,
}

/// Main graphics device trait
///
/// Central factory for GPU resources and the only way to execute recorded
/// command lists. A device is owned by exactly one render thread at a time.
pub trait GraphicsDevice: Send {
    /// Create a buffer
    ///
    /// # Errors
    ///
    /// `Error::OutOfMemory` when the allocation cannot be satisfied.
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a shader stage
    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create a graphics pipeline
    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Create a new command list in the initial (not recording) state
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Execute ended command lists, in order
    fn submit(&mut self, commands: &[&dyn CommandList]) -> Result<()>;

    /// Read back the texels of a texture, encoded in the texture's format
    fn read_texture(&self, texture: &dyn Texture) -> Result<Vec<u8>>;

    /// Wait for all submitted work to complete
    fn wait_idle(&self) -> Result<()>;

    /// Get statistics about the device
    fn stats(&self) -> GraphicsDeviceStats;
}
