/// Mock graphics device for unit tests (no backend required)
///
/// Records every command as a string and tracks created resources through
/// shared handles, so tests can inspect a device after it moved into a
/// render thread.

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, GraphicsDeviceStats,
    Buffer, Texture, Shader, Pipeline, CommandList,
    BufferDesc, BufferType, BufferUsage, TextureDesc, TextureInfo,
    ShaderDesc, ShaderStage, PipelineDesc, PrimitiveTopology,
    RenderPassInfo, TextureTransition, Viewport, DrawIndexedArgs,
    IndexType, ResourceAccess,
};
use crate::engine_bail;

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub size: u64,
    pub buffer_type: BufferType,
    pub usage: BufferUsage,
    pub name: String,
    data: Mutex<Vec<u8>>,
}

impl MockBuffer {
    pub fn new(desc: &BufferDesc, name: String) -> Self {
        let data = desc.initial_data.clone().unwrap_or_else(|| vec![0; desc.size as usize]);
        Self {
            size: desc.size,
            buffer_type: desc.buffer_type,
            usage: desc.usage,
            name,
            data: Mutex::new(data),
        }
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.usage == BufferUsage::Static {
            return Err(Error::InvalidResource(format!("{}: static buffer is immutable", self.name)));
        }
        let end = offset + data.len() as u64;
        if end > self.size {
            return Err(Error::InvalidResource(format!("{}: write {}..{} out of range", self.name, offset, end)));
        }
        let mut bytes = self.data.lock().unwrap();
        bytes[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let end = offset + len;
        if end > self.size {
            return Err(Error::InvalidResource(format!("{}: read {}..{} out of range", self.name, offset, end)));
        }
        Ok(self.data.lock().unwrap()[offset as usize..end as usize].to_vec())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
    pub name: String,
}

impl MockTexture {
    pub fn new(info: TextureInfo, name: String) -> Self {
        Self { info, name }
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Shader
// ============================================================================

#[derive(Debug)]
pub struct MockShader {
    pub stage: ShaderStage,
    pub source_name: String,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

#[derive(Debug)]
pub struct MockPipeline {
    pub topology: PrimitiveTopology,
    pub name: String,
}

impl Pipeline for MockPipeline {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug, Default)]
pub struct MockCommandList {
    pub commands: Vec<String>,
    pub draws: Vec<DrawIndexedArgs>,
    pub transitions: Vec<(ResourceAccess, ResourceAccess)>,
    pub shader_parameters: Vec<(ShaderStage, Vec<u8>)>,
    pub viewports: Vec<Viewport>,
    pub recording: bool,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded command names, without their arguments
    pub fn command_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .map(|c| c.split(':').next().unwrap_or(c.as_str()))
            .collect()
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            engine_bail!("rtp::mock", "begin: command list already recording");
        }
        self.recording = true;
        self.commands.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.recording {
            engine_bail!("rtp::mock", "end: command list not recording");
        }
        self.recording = false;
        self.commands.push("end".to_string());
        Ok(())
    }

    fn begin_event(&mut self, name: &str) -> Result<()> {
        self.commands.push(format!("begin_event:{}", name));
        Ok(())
    }

    fn end_event(&mut self) -> Result<()> {
        self.commands.push("end_event".to_string());
        Ok(())
    }

    fn transition(&mut self, transition: &TextureTransition) -> Result<()> {
        self.transitions.push((transition.before, transition.after));
        self.commands.push(format!("transition:{:?}->{:?}", transition.before, transition.after));
        Ok(())
    }

    fn begin_render_pass(&mut self, info: &RenderPassInfo) -> Result<()> {
        self.commands.push(format!(
            "begin_render_pass:{}:{:?}/{:?}",
            info.name, info.actions.load_op, info.actions.store_op
        ));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.viewports.push(viewport);
        self.commands.push(format!("set_viewport:{}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.commands.push("bind_pipeline".to_string());
        Ok(())
    }

    fn set_shader_parameters(&mut self, stage: ShaderStage, data: &[u8]) -> Result<()> {
        self.shader_parameters.push((stage, data.to_vec()));
        self.commands.push(format!("set_shader_parameters:{:?}", stage));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, slot: u32, _buffer: &Arc<dyn Buffer>, _offset: u64) -> Result<()> {
        self.commands.push(format!("bind_vertex_buffer:{}", slot));
        Ok(())
    }

    fn bind_index_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64, index_type: IndexType) -> Result<()> {
        self.commands.push(format!("bind_index_buffer:{:?}", index_type));
        Ok(())
    }

    fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<()> {
        self.draws.push(args);
        self.commands.push(format!(
            "draw_indexed:{}/{}/{}",
            args.num_vertices, args.num_primitives, args.num_instances
        ));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock device that tracks created resources and submitted commands
#[derive(Debug, Default)]
pub struct MockGraphicsDevice {
    /// Names of created buffers
    pub created_buffers: Arc<Mutex<Vec<String>>>,
    /// Names of created textures
    pub created_textures: Arc<Mutex<Vec<String>>>,
    /// Names of created shaders
    pub created_shaders: Arc<Mutex<Vec<String>>>,
    /// Count of created pipelines
    pub created_pipelines: Arc<Mutex<usize>>,
    /// Commands of every submitted list, in submission order
    pub submitted_commands: Arc<Mutex<Vec<String>>>,
    /// Draws of every submitted list
    pub submitted_draws: Arc<Mutex<Vec<DrawIndexedArgs>>>,
    /// Shader parameter uploads of every submitted list
    pub submitted_parameters: Arc<Mutex<Vec<(ShaderStage, Vec<u8>)>>>,
    /// Every buffer allocation fails with `OutOfMemory`
    pub fail_buffer_allocations: bool,
    stats: GraphicsDeviceStats,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device whose buffer allocations always fail
    pub fn out_of_memory() -> Self {
        Self { fail_buffer_allocations: true, ..Self::default() }
    }

    pub fn get_created_buffers(&self) -> Vec<String> {
        self.created_buffers.lock().unwrap().clone()
    }

    pub fn get_submitted_commands(&self) -> Vec<String> {
        self.submitted_commands.lock().unwrap().clone()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        if self.fail_buffer_allocations {
            return Err(Error::OutOfMemory);
        }
        if let Some(data) = &desc.initial_data {
            if data.len() as u64 != desc.size {
                return Err(Error::InvalidResource("initial data size mismatch".to_string()));
            }
        }
        let name = format!("buffer_{:?}_{:?}_{}", desc.buffer_type, desc.usage, desc.size);
        self.created_buffers.lock().unwrap().push(name.clone());
        self.stats.buffers_created += 1;
        Ok(Arc::new(MockBuffer::new(&desc, name)))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        let name = format!("texture_{}x{}", desc.width, desc.height);
        self.created_textures.lock().unwrap().push(name.clone());
        let info = TextureInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
        };
        Ok(Arc::new(MockTexture::new(info, name)))
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        self.created_shaders.lock().unwrap().push(format!("{}:{:?}", desc.source_name, desc.stage));
        Ok(Arc::new(MockShader { stage: desc.stage, source_name: desc.source_name }))
    }

    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        *self.created_pipelines.lock().unwrap() += 1;
        Ok(Arc::new(MockPipeline { topology: desc.topology, name: "pipeline".to_string() }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::new()))
    }

    fn submit(&mut self, commands: &[&dyn CommandList]) -> Result<()> {
        for cmd in commands {
            let Some(mock) = cmd.as_any().downcast_ref::<MockCommandList>() else {
                engine_bail!("rtp::mock", "submit: foreign command list");
            };
            if mock.recording {
                engine_bail!("rtp::mock", "submit: command list still recording");
            }
            self.submitted_commands.lock().unwrap().extend(mock.commands.iter().cloned());
            self.submitted_draws.lock().unwrap().extend(mock.draws.iter().copied());
            self.submitted_parameters.lock().unwrap().extend(mock.shader_parameters.iter().cloned());
            for draw in &mock.draws {
                self.stats.draw_calls += draw.num_instances;
                self.stats.triangles += draw.num_primitives * draw.num_instances;
            }
        }
        self.stats.submissions += 1;
        Ok(())
    }

    fn read_texture(&self, texture: &dyn Texture) -> Result<Vec<u8>> {
        Ok(vec![0; texture.info().byte_size() as usize])
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> GraphicsDeviceStats {
        self.stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
