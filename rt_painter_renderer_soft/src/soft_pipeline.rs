/// Pipeline - validated fixed-function state for the software rasterizer

use rt_painter::rtp::{
    Result,
    Error,
    render::{
        BufferFormat, ColorWriteMask, CullMode, FrontFace, Pipeline, PipelineDesc, PolygonMode, PrimitiveTopology,
        RenderTargetsInfo, SampleCount, Shader, ShaderStage, VertexAttribute, VertexBinding,
    },
};
use std::any::Any;
use std::sync::Arc;

use crate::soft_shader::{ShaderProgram, SoftShader};

/// CPU graphics pipeline
///
/// Only the state the rasterizer honors is kept: position fetch, topology,
/// color write mask and the attachment formats.
#[derive(Debug)]
pub struct SoftPipeline {
    pub(crate) vertex_program: ShaderProgram,
    pub(crate) fragment_program: ShaderProgram,
    pub(crate) position_binding: VertexBinding,
    pub(crate) position_attribute: VertexAttribute,
    pub(crate) topology: PrimitiveTopology,
    pub(crate) color_write_mask: ColorWriteMask,
    pub(crate) render_targets: RenderTargetsInfo,
}

fn program_of(shader: &Arc<dyn Shader>, stage: ShaderStage) -> Result<ShaderProgram> {
    let soft = shader.as_any().downcast_ref::<SoftShader>().ok_or_else(|| {
        Error::InvalidResource(format!("shader '{}' was not created by the soft device", shader.source_name()))
    })?;
    if soft.program().stage() != stage {
        return Err(Error::InvalidResource(format!(
            "shader '{}' bound as {:?} stage runs a {:?} program",
            shader.source_name(), stage, soft.program().stage()
        )));
    }
    Ok(soft.program())
}

impl SoftPipeline {
    pub(crate) fn new(desc: &PipelineDesc) -> Result<Self> {
        let vertex_program = program_of(&desc.vertex_shader, ShaderStage::Vertex)?;
        let fragment_program = program_of(&desc.fragment_shader, ShaderStage::Fragment)?;

        if desc.color_blend.blend_enable {
            return Err(Error::BackendError("soft pipeline: blending is not supported".to_string()));
        }
        if desc.rasterization.polygon_mode != PolygonMode::Fill {
            return Err(Error::BackendError(format!(
                "soft pipeline: polygon mode {:?} is not supported",
                desc.rasterization.polygon_mode
            )));
        }
        // The rasterizer fills both windings
        if desc.rasterization.cull_mode != CullMode::None {
            return Err(Error::BackendError(format!(
                "soft pipeline: cull mode {:?} is not supported",
                desc.rasterization.cull_mode
            )));
        }
        if desc.rasterization.front_face != FrontFace::CounterClockwise {
            return Err(Error::BackendError(format!(
                "soft pipeline: front face {:?} is not supported",
                desc.rasterization.front_face
            )));
        }
        if desc.render_targets.sample_count != SampleCount::S1 {
            return Err(Error::BackendError(format!(
                "soft pipeline: sample count {:?} is not supported",
                desc.render_targets.sample_count
            )));
        }
        if desc.depth_stencil.depth_test_enable || desc.depth_stencil.stencil_test_enable {
            return Err(Error::BackendError("soft pipeline: no depth/stencil attachment".to_string()));
        }
        if desc.render_targets.color_formats.len() != 1 {
            return Err(Error::InvalidResource(format!(
                "soft pipeline: expected one color attachment, got {}",
                desc.render_targets.color_formats.len()
            )));
        }

        let position_attribute = desc.vertex_layout.attributes
            .iter()
            .find(|attribute| attribute.location == 0)
            .copied()
            .ok_or_else(|| Error::InvalidResource("soft pipeline: no position attribute at location 0".to_string()))?;
        let position_binding = desc.vertex_layout.bindings
            .iter()
            .find(|binding| binding.binding == position_attribute.binding)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!(
                "soft pipeline: position attribute references missing binding {}",
                position_attribute.binding
            )))?;
        if position_attribute.offset + position_attribute.format.size_bytes() > position_binding.stride {
            return Err(Error::InvalidResource("soft pipeline: position attribute overruns its stride".to_string()));
        }

        Ok(Self {
            vertex_program,
            fragment_program,
            position_binding,
            position_attribute,
            topology: desc.topology,
            color_write_mask: desc.color_blend.color_write_mask,
            render_targets: desc.render_targets.clone(),
        })
    }

    /// Read a position from the bound vertex stream bytes
    ///
    /// Missing components default to z = 0, w = 1.
    pub(crate) fn fetch_position(&self, stream: &[u8], stream_offset: u64, vertex: u32) -> Option<glam::Vec4> {
        let start = stream_offset as usize
            + vertex as usize * self.position_binding.stride as usize
            + self.position_attribute.offset as usize;
        let size = self.position_attribute.format.size_bytes() as usize;
        let bytes = stream.get(start..start + size)?;
        let component = |i: usize| -> f32 { bytemuck::pod_read_unaligned(&bytes[i * 4..i * 4 + 4]) };

        Some(match self.position_attribute.format {
            BufferFormat::R32G32_SFLOAT => glam::Vec4::new(component(0), component(1), 0.0, 1.0),
            BufferFormat::R32G32B32_SFLOAT => glam::Vec4::new(component(0), component(1), component(2), 1.0),
            BufferFormat::R32G32B32A32_SFLOAT => {
                glam::Vec4::new(component(0), component(1), component(2), component(3))
            }
        })
    }
}

impl Pipeline for SoftPipeline {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
