/// Shader - builtin CPU shader programs

use rt_painter::rtp::{
    Result,
    Error,
    render::{Shader, ShaderDesc, ShaderStage},
    shader::FIRST_SHADER_SOURCE,
};
use glam::Vec4;
use rustc_hash::FxHashMap;
use std::any::Any;

/// Program executed by the software rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderProgram {
    /// Clip position = input position
    PassthroughVertex,
    /// Every fragment = first 16 bytes of the pixel-stage parameters
    SolidColorFragment,
}

impl ShaderProgram {
    pub fn stage(&self) -> ShaderStage {
        match self {
            ShaderProgram::PassthroughVertex => ShaderStage::Vertex,
            ShaderProgram::SolidColorFragment => ShaderStage::Fragment,
        }
    }

    /// Vertex stage
    pub fn shade_vertex(&self, position: Vec4) -> Vec4 {
        match self {
            ShaderProgram::PassthroughVertex => position,
            ShaderProgram::SolidColorFragment => Vec4::ZERO,
        }
    }

    /// Fragment stage; constant across the draw for every builtin
    pub fn shade_fragment(&self, parameters: &[u8]) -> Result<Vec4> {
        match self {
            ShaderProgram::SolidColorFragment => {
                let Some(bytes) = parameters.get(..16) else {
                    return Err(Error::BackendError(format!(
                        "SolidColorFragment: expected 16 parameter bytes, got {}",
                        parameters.len()
                    )));
                };
                let color: [f32; 4] = bytemuck::pod_read_unaligned(bytes);
                Ok(Vec4::from_array(color))
            }
            ShaderProgram::PassthroughVertex => Err(Error::BackendError(
                "PassthroughVertex is not a fragment program".to_string(),
            )),
        }
    }
}

/// Builtin programs by (source name, stage)
pub(crate) struct ShaderLibrary {
    programs: FxHashMap<(String, ShaderStage), ShaderProgram>,
}

impl ShaderLibrary {
    pub(crate) fn builtin() -> Self {
        let mut programs = FxHashMap::default();
        programs.insert((FIRST_SHADER_SOURCE.to_string(), ShaderStage::Vertex), ShaderProgram::PassthroughVertex);
        programs.insert((FIRST_SHADER_SOURCE.to_string(), ShaderStage::Fragment), ShaderProgram::SolidColorFragment);
        Self { programs }
    }

    pub(crate) fn resolve(&self, desc: &ShaderDesc) -> Result<ShaderProgram> {
        self.programs
            .get(&(desc.source_name.clone(), desc.stage))
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!(
                "no builtin {:?} program named '{}'",
                desc.stage, desc.source_name
            )))
    }
}

/// CPU shader stage
#[derive(Debug)]
pub struct SoftShader {
    stage: ShaderStage,
    source_name: String,
    entry_point: String,
    program: ShaderProgram,
}

impl SoftShader {
    pub(crate) fn new(desc: ShaderDesc, program: ShaderProgram) -> Self {
        Self {
            stage: desc.stage,
            source_name: desc.source_name,
            entry_point: desc.entry_point,
            program,
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn program(&self) -> ShaderProgram {
        self.program
    }
}

impl Shader for SoftShader {
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
