/// Shader module - capability-tier shader cache and the solid-color FirstShader

pub mod shader_cache;
pub mod first_shader;

pub use shader_cache::*;
pub use first_shader::*;
