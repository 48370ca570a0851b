/// SoftGraphicsDevice - CPU reference implementation of GraphicsDevice
///
/// Command lists are replayed synchronously inside `submit`, so
/// `wait_idle` never has anything to wait for.

use rt_painter::rtp::{
    Result,
    Error,
    render::{
        Buffer, BufferDesc, BufferType, BufferUsage, CommandList, Config, DrawIndexedArgs,
        GraphicsDevice, GraphicsDeviceStats, IndexType, LoadOp, Pipeline, PipelineDesc,
        PrimitiveTopology, ResourceAccess, Shader, ShaderDesc, ShaderStage, StoreOp, Texture,
        TextureDesc, TextureFormat, Viewport,
    },
};
use rt_painter::{engine_bail, engine_debug, engine_info, engine_warn};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::soft_buffer::SoftBuffer;
use crate::soft_command_list::{SoftCommand, SoftCommandList};
use crate::soft_pipeline::SoftPipeline;
use crate::soft_rasterizer::{rasterize_triangle, viewport_transform, RasterTarget};
use crate::soft_shader::{ShaderLibrary, SoftShader};
use crate::soft_texture::{SoftTexture, Texel};

/// Software graphics device
pub struct SoftGraphicsDevice {
    config: Config,
    shaders: ShaderLibrary,
    /// Bytes held by live buffers, shared with every SoftBuffer
    buffer_memory: Arc<AtomicU64>,
    stats: GraphicsDeviceStats,
}

impl SoftGraphicsDevice {
    /// Create a new software device
    ///
    /// # Arguments
    ///
    /// * `config` - Validation switch, application name and buffer memory budget
    pub fn new(config: Config) -> Result<Self> {
        engine_info!("rtp::soft", "SoftGraphicsDevice created for '{}' (validation: {}, budget: {:?})",
            config.app_name, config.enable_validation, config.max_buffer_memory);
        Ok(Self {
            config,
            shaders: ShaderLibrary::builtin(),
            buffer_memory: Arc::new(AtomicU64::new(0)),
            stats: GraphicsDeviceStats::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn execute_list(&mut self, list: &SoftCommandList, touched: &mut Vec<Arc<dyn Buffer>>) -> Result<()> {
        let mut state = ExecutionState::default();

        for command in list.commands() {
            match command {
                SoftCommand::BeginEvent(name) => {
                    engine_debug!("rtp::soft", "begin event '{}'", name);
                }
                SoftCommand::EndEvent => {}
                SoftCommand::Transition { texture, before, after } => {
                    let soft = as_soft_texture(texture)?;
                    if self.config.enable_validation
                        && *before != ResourceAccess::Unknown
                        && soft.access() != *before
                    {
                        engine_bail!("rtp::soft", "transition {:?} -> {:?}: texture is in {:?}",
                            before, after, soft.access());
                    }
                    soft.set_access(*after);
                }
                SoftCommand::BeginRenderPass { name, target, actions } => {
                    let soft = as_soft_texture(target)?;
                    if self.config.enable_validation && soft.access() != ResourceAccess::RenderTarget {
                        engine_bail!("rtp::soft", "render pass '{}': target is in {:?} access",
                            name, soft.access());
                    }
                    let texels = match actions.load_op {
                        LoadOp::Load => soft.texels()?,
                        LoadOp::Clear => vec![actions.clear_color; soft.texel_count()],
                        LoadOp::DontCare => vec![[0.0; 4]; soft.texel_count()],
                    };
                    state.pass = Some(OpenPass {
                        target: Arc::clone(target),
                        texels,
                        width: target.info().width,
                        height: target.info().height,
                        format: target.info().format,
                        store_op: actions.store_op,
                    });
                }
                SoftCommand::EndRenderPass => {
                    let Some(pass) = state.pass.take() else {
                        engine_bail!("rtp::soft", "end_render_pass: no render pass open");
                    };
                    if pass.store_op == StoreOp::Store {
                        as_soft_texture(&pass.target)?.store(pass.texels)?;
                    }
                }
                SoftCommand::SetViewport(viewport) => state.viewport = Some(*viewport),
                SoftCommand::BindPipeline(pipeline) => state.pipeline = Some(Arc::clone(pipeline)),
                SoftCommand::SetShaderParameters(stage, data) => {
                    if *stage == ShaderStage::Fragment {
                        state.fragment_parameters = data.clone();
                    }
                }
                SoftCommand::BindVertexBuffer { slot, buffer, offset } => {
                    state.vertex_streams.insert(*slot, (Arc::clone(buffer), *offset));
                    touched.push(Arc::clone(buffer));
                }
                SoftCommand::BindIndexBuffer { buffer, offset, index_type } => {
                    state.index_stream = Some((Arc::clone(buffer), *offset, *index_type));
                    touched.push(Arc::clone(buffer));
                }
                SoftCommand::DrawIndexed(args) => {
                    execute_draw(&mut state, *args, &mut self.stats)?;
                }
            }
        }

        if state.pass.is_some() {
            engine_bail!("rtp::soft", "command list ended with a render pass open");
        }
        Ok(())
    }
}

// ===== EXECUTION =====

struct OpenPass {
    target: Arc<dyn Texture>,
    texels: Vec<Texel>,
    width: u32,
    height: u32,
    format: TextureFormat,
    store_op: StoreOp,
}

#[derive(Default)]
struct ExecutionState {
    pass: Option<OpenPass>,
    viewport: Option<Viewport>,
    pipeline: Option<Arc<dyn Pipeline>>,
    fragment_parameters: Vec<u8>,
    vertex_streams: FxHashMap<u32, (Arc<dyn Buffer>, u64)>,
    index_stream: Option<(Arc<dyn Buffer>, u64, IndexType)>,
}

fn as_soft_texture(texture: &Arc<dyn Texture>) -> Result<&SoftTexture> {
    texture.as_any().downcast_ref::<SoftTexture>()
        .ok_or_else(|| Error::InvalidResource("texture was not created by the soft device".to_string()))
}

fn as_soft_buffer(buffer: &Arc<dyn Buffer>) -> Result<&SoftBuffer> {
    let soft = buffer.as_any().downcast_ref::<SoftBuffer>()
        .ok_or_else(|| Error::InvalidResource("buffer was not created by the soft device".to_string()))?;
    if soft.is_retired() {
        engine_bail!("rtp::soft", "volatile buffer used by a second submission");
    }
    Ok(soft)
}

fn read_indices(bytes: &[u8], offset: u64, index_type: IndexType, start: u32, count: u32) -> Result<Vec<u32>> {
    let size = index_type.size_bytes() as usize;
    let first = offset as usize + start as usize * size;
    let last = first + count as usize * size;
    let Some(range) = bytes.get(first..last) else {
        return Err(Error::InvalidResource(format!(
            "draw_indexed: indices {}..{} exceed the index buffer", start, start + count
        )));
    };
    Ok(match index_type {
        IndexType::U16 => range
            .chunks_exact(2)
            .map(|chunk| bytemuck::pod_read_unaligned::<u16>(chunk) as u32)
            .collect(),
        IndexType::U32 => range
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<u32>)
            .collect(),
    })
}

fn execute_draw(state: &mut ExecutionState, args: DrawIndexedArgs, stats: &mut GraphicsDeviceStats) -> Result<()> {
    let Some(pass) = state.pass.as_mut() else {
        engine_bail!("rtp::soft", "draw_indexed: no render pass open");
    };
    let Some(pipeline) = state.pipeline.as_ref() else {
        engine_bail!("rtp::soft", "draw_indexed: no pipeline bound");
    };
    let pipeline = pipeline.as_any().downcast_ref::<SoftPipeline>()
        .ok_or_else(|| Error::InvalidResource("pipeline was not created by the soft device".to_string()))?;
    let Some(viewport) = state.viewport else {
        engine_bail!("rtp::soft", "draw_indexed: no viewport set");
    };
    if pipeline.render_targets.color_formats.first() != Some(&pass.format) {
        return Err(Error::InvalidResource(format!(
            "draw_indexed: pipeline compiled for {:?}, pass target is {:?}",
            pipeline.render_targets.color_formats, pass.format
        )));
    }

    let Some((vertex_buffer, vertex_offset)) = state.vertex_streams.get(&pipeline.position_binding.binding) else {
        engine_bail!("rtp::soft", "draw_indexed: no vertex buffer at slot {}", pipeline.position_binding.binding);
    };
    let Some((index_buffer, index_offset, index_type)) = state.index_stream.as_ref() else {
        engine_bail!("rtp::soft", "draw_indexed: no index buffer bound");
    };
    if let BufferType::Index(buffer_index_type) = index_buffer.buffer_type() {
        if buffer_index_type != *index_type {
            engine_bail!("rtp::soft", "draw_indexed: {:?} buffer bound as {:?}", buffer_index_type, index_type);
        }
    }

    let vertex_bytes = as_soft_buffer(vertex_buffer)?.with_bytes(|bytes| bytes.to_vec())?;
    let index_count = pipeline.topology.index_count(args.num_primitives);
    let indices = as_soft_buffer(index_buffer)?
        .with_bytes(|bytes| read_indices(bytes, *index_offset, *index_type, args.start_index, index_count))??;

    let mut window = Vec::with_capacity(indices.len());
    for index in &indices {
        let vertex = args.base_vertex_index as i64 + *index as i64;
        let in_range = vertex >= args.min_index as i64
            && vertex < args.min_index as i64 + args.num_vertices as i64;
        if !in_range {
            return Err(Error::InvalidResource(format!(
                "draw_indexed: vertex {} outside {}..{}",
                vertex, args.min_index, args.min_index + args.num_vertices
            )));
        }
        let position = pipeline.fetch_position(&vertex_bytes, *vertex_offset, vertex as u32)
            .ok_or_else(|| Error::InvalidResource(format!("draw_indexed: vertex {} exceeds the vertex buffer", vertex)))?;
        let clip = pipeline.vertex_program.shade_vertex(position);
        window.push(viewport_transform(clip, &viewport));
    }

    let color = pipeline.fragment_program.shade_fragment(&state.fragment_parameters)?;
    let mut target = RasterTarget { texels: &mut pass.texels, width: pass.width, height: pass.height };

    for _instance in 0..args.num_instances {
        for primitive in 0..args.num_primitives as usize {
            let corners = match pipeline.topology {
                PrimitiveTopology::TriangleList => [primitive * 3, primitive * 3 + 1, primitive * 3 + 2],
                PrimitiveTopology::TriangleStrip => [primitive, primitive + 1, primitive + 2],
            };
            let (Some(a), Some(b), Some(c)) = (window[corners[0]], window[corners[1]], window[corners[2]]) else {
                continue;
            };
            rasterize_triangle(&mut target, [a, b, c], color, pipeline.color_write_mask, &viewport);
        }
    }

    stats.draw_calls += args.num_instances;
    stats.triangles += args.num_primitives * args.num_instances;
    Ok(())
}

// ===== GRAPHICS DEVICE =====

impl GraphicsDevice for SoftGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("create_buffer: zero-sized buffer".to_string()));
        }
        match (&desc.initial_data, desc.usage) {
            (None, BufferUsage::Static) => {
                return Err(Error::InvalidResource("create_buffer: static buffer without initial data".to_string()));
            }
            (Some(data), _) if data.len() as u64 != desc.size => {
                return Err(Error::InvalidResource(format!(
                    "create_buffer: {} bytes of initial data for a {}-byte buffer", data.len(), desc.size
                )));
            }
            _ => {}
        }

        let used = self.buffer_memory.load(Ordering::SeqCst);
        if let Some(max) = self.config.max_buffer_memory {
            if used + desc.size > max {
                engine_warn!("rtp::soft", "create_buffer: {} bytes requested, {} of {} in use", desc.size, used, max);
                return Err(Error::OutOfMemory);
            }
        }

        self.buffer_memory.fetch_add(desc.size, Ordering::SeqCst);
        self.stats.buffers_created += 1;
        Ok(Arc::new(SoftBuffer::new(desc, Arc::clone(&self.buffer_memory))))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "create_texture: empty texture {}x{}", desc.width, desc.height
            )));
        }
        Ok(Arc::new(SoftTexture::new(&desc)))
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        let program = self.shaders.resolve(&desc)?;
        Ok(Arc::new(SoftShader::new(desc, program)))
    }

    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(SoftPipeline::new(&desc)?))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(SoftCommandList::new()))
    }

    fn submit(&mut self, commands: &[&dyn CommandList]) -> Result<()> {
        let mut touched = Vec::new();
        for cmd in commands {
            let Some(list) = cmd.as_any().downcast_ref::<SoftCommandList>() else {
                engine_bail!("rtp::soft", "submit: command list was not created by the soft device");
            };
            if list.is_recording() {
                engine_bail!("rtp::soft", "submit: command list is still recording");
            }
            self.execute_list(list, &mut touched)?;
        }

        for buffer in &touched {
            if let Some(soft) = buffer.as_any().downcast_ref::<SoftBuffer>() {
                soft.retire();
            }
        }
        self.stats.submissions += 1;
        Ok(())
    }

    fn read_texture(&self, texture: &dyn Texture) -> Result<Vec<u8>> {
        let soft = texture.as_any().downcast_ref::<SoftTexture>()
            .ok_or_else(|| Error::InvalidResource("read_texture: texture was not created by the soft device".to_string()))?;
        soft.encode()
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> GraphicsDeviceStats {
        GraphicsDeviceStats {
            buffer_memory_used: self.buffer_memory.load(Ordering::SeqCst),
            ..self.stats
        }
    }
}

#[cfg(test)]
#[path = "soft_graphics_device_tests.rs"]
mod tests;
