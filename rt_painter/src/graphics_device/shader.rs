/// Shader trait and shader descriptor

use std::any::Any;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Descriptor for creating a shader stage
///
/// `code` is opaque to the core: backends resolve the program from
/// `source_name`/`entry_point` and may ignore the bytes entirely.
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    pub stage: ShaderStage,
    /// Shader source identifier (e.g. "FirstShader")
    pub source_name: String,
    pub entry_point: String,
    pub code: Vec<u8>,
}

/// Shader resource trait
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn source_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}
