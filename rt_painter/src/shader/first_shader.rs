/// FirstShader: full-screen solid-color program and its parameter block

use bytemuck::{Pod, Zeroable};

use crate::color::LinearColor;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, ShaderDesc, ShaderStage, LoadOp, StoreOp, AttachmentActions};
use crate::render_graph::{GraphTextureHandle, PassDependencies, PassParameters};
use crate::shader::{CapabilityTier, ShaderCache, ShaderStagePair};

/// Shader source identifier resolved by backends
pub const FIRST_SHADER_SOURCE: &str = "FirstShader";
pub const FIRST_SHADER_VS_ENTRY: &str = "MainVS";
pub const FIRST_SHADER_PS_ENTRY: &str = "MainPS";

/// Render-target slot of a pass parameter block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetBinding {
    pub texture: GraphTextureHandle,
    pub actions: AttachmentActions,
}

impl RenderTargetBinding {
    pub fn new(texture: GraphTextureHandle, load_op: LoadOp, store_op: StoreOp) -> Self {
        Self {
            texture,
            actions: AttachmentActions { load_op, store_op, clear_color: [0.0; 4] },
        }
    }
}

/// Parameters of the FirstShader pixel stage
///
/// `render_target` is only read by the render graph, the immediate path
/// binds its target directly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FirstShaderParameters {
    pub simple_color: LinearColor,
    pub render_target: Option<RenderTargetBinding>,
}

impl FirstShaderParameters {
    pub fn new(simple_color: LinearColor) -> Self {
        Self { simple_color, render_target: None }
    }

    /// Bytes uploaded to the fragment stage
    pub fn uniforms(&self) -> FirstShaderUniforms {
        FirstShaderUniforms { simple_color: self.simple_color.to_array() }
    }
}

impl PassParameters for FirstShaderParameters {
    fn declare(&self, dependencies: &mut PassDependencies) {
        if let Some(binding) = &self.render_target {
            dependencies.write_render_target(binding.texture, binding.actions);
        }
    }
}

/// Fragment-stage wire layout: one 16-byte color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FirstShaderUniforms {
    pub simple_color: [f32; 4],
}

impl FirstShaderUniforms {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Shader descriptors of both FirstShader stages
pub fn first_shader_descs() -> [ShaderDesc; 2] {
    [
        ShaderDesc {
            stage: ShaderStage::Vertex,
            source_name: FIRST_SHADER_SOURCE.to_string(),
            entry_point: FIRST_SHADER_VS_ENTRY.to_string(),
            code: Vec::new(),
        },
        ShaderDesc {
            stage: ShaderStage::Fragment,
            source_name: FIRST_SHADER_SOURCE.to_string(),
            entry_point: FIRST_SHADER_PS_ENTRY.to_string(),
            code: Vec::new(),
        },
    ]
}

/// Create both FirstShader stages on `device`
pub fn create_first_shader(device: &mut dyn GraphicsDevice) -> Result<ShaderStagePair> {
    let [vs, ps] = first_shader_descs();
    let vertex = device.create_shader(vs)?;
    let fragment = device.create_shader(ps)?;
    ShaderStagePair::new(vertex, fragment)
}

/// Build a cache holding FirstShader for every tier in `tiers`
pub fn build_first_shader_cache(
    device: &mut dyn GraphicsDevice,
    tiers: &[CapabilityTier],
) -> Result<ShaderCache> {
    let mut cache = ShaderCache::new();
    for &tier in tiers {
        cache.insert(tier, create_first_shader(device)?)?;
    }
    crate::engine_debug!("rtp::ShaderCache", "FirstShader compiled for {} tier(s)", cache.len());
    Ok(cache)
}

#[cfg(test)]
#[path = "first_shader_tests.rs"]
mod tests;
