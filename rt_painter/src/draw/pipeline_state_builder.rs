/// Immutable pipeline descriptor assembly for the full-screen quad

use crate::error::{Error, Result};
use crate::graphics_device::{
    ColorBlendState, DepthStencilState, PipelineDesc, PrimitiveTopology,
    RasterizationState, RenderTargetsInfo, ShaderStage, VertexLayout,
};
use crate::shader::ShaderStagePair;

/// Builds the `PipelineDesc` of a FirstShader draw
///
/// Every non-shader field is fixed: no depth test, opaque blend, solid fill
/// without culling, triangle list, one 16-byte position stream. Only the
/// shader stages and the render-target formats vary between builds.
#[derive(Debug, Clone)]
pub struct PipelineStateBuilder {
    stages: ShaderStagePair,
    render_targets: Option<RenderTargetsInfo>,
}

impl PipelineStateBuilder {
    pub fn new(stages: &ShaderStagePair) -> Self {
        Self { stages: stages.clone(), render_targets: None }
    }

    /// Use the attachment configuration of the currently open pass
    pub fn apply_cached_render_targets(mut self, render_targets: RenderTargetsInfo) -> Self {
        self.render_targets = Some(render_targets);
        self
    }

    /// Produce the descriptor
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if a stage sits in the wrong slot or no
    /// usable render-target configuration was applied.
    pub fn build(&self) -> Result<PipelineDesc> {
        if self.stages.vertex.stage() != ShaderStage::Vertex
            || self.stages.fragment.stage() != ShaderStage::Fragment
        {
            return Err(Error::InvalidResource(format!(
                "PipelineStateBuilder: stage mismatch ({:?}, {:?})",
                self.stages.vertex.stage(),
                self.stages.fragment.stage()
            )));
        }

        let render_targets = match &self.render_targets {
            Some(info) if !info.color_formats.is_empty() => info.clone(),
            _ => {
                return Err(Error::InvalidResource(
                    "PipelineStateBuilder: no render-target configuration applied".to_string(),
                ));
            }
        };

        Ok(PipelineDesc {
            vertex_shader: self.stages.vertex.clone(),
            fragment_shader: self.stages.fragment.clone(),
            vertex_layout: VertexLayout::position4(),
            topology: PrimitiveTopology::TriangleList,
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::ALWAYS_PASS,
            color_blend: ColorBlendState::OPAQUE,
            render_targets,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_state_builder_tests.rs"]
mod tests;
