/// Pipeline trait, pipeline descriptor and fixed-function state

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{Shader, TextureFormat};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Triangle list
    TriangleList,
    /// Triangle strip
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Number of indices consumed by `primitive_count` primitives
    pub fn index_count(&self, primitive_count: u32) -> u32 {
        match self {
            PrimitiveTopology::TriangleList => primitive_count * 3,
            PrimitiveTopology::TriangleStrip if primitive_count == 0 => 0,
            PrimitiveTopology::TriangleStrip => primitive_count + 2,
        }
    }
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
}

impl BufferFormat {
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32G32_SFLOAT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index (stream slot)
    pub binding: u32,
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    /// Binding index (stream slot)
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

/// Vertex input layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// One stream at slot 0 carrying a 4-float position at location 0
    pub fn position4() -> Self {
        Self {
            bindings: vec![VertexBinding {
                binding: 0,
                stride: BufferFormat::R32G32B32A32_SFLOAT.size_bytes(),
                input_rate: VertexInputRate::Vertex,
            }],
            attributes: vec![VertexAttribute {
                location: 0,
                binding: 0,
                format: BufferFormat::R32G32B32A32_SFLOAT,
                offset: 0,
            }],
        }
    }
}

// ===== RASTERIZATION =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
}

impl Default for RasterizationState {
    /// Solid fill, no culling
    fn default() -> Self {
        Self {
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
        }
    }
}

// ===== DEPTH/STENCIL =====

/// Comparison operator for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test_enable: bool,
}

impl DepthStencilState {
    /// No depth test, no depth writes, every fragment passes
    pub const ALWAYS_PASS: Self = Self {
        depth_test_enable: false,
        depth_write_enable: false,
        depth_compare_op: CompareOp::Always,
        stencil_test_enable: false,
    };
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self::ALWAYS_PASS
    }
}

// ===== COLOR BLEND =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    Subtract,
}

/// Color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWriteMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorWriteMask {
    /// All channels enabled
    pub const ALL: Self = Self { r: true, g: true, b: true, a: true };
    /// No channels enabled
    pub const NONE: Self = Self { r: false, g: false, b: false, a: false };
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Color blending state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBlendState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
}

impl ColorBlendState {
    /// Blending disabled, source overwrites destination
    pub const OPAQUE: Self = Self {
        blend_enable: false,
        src_color_factor: BlendFactor::One,
        dst_color_factor: BlendFactor::Zero,
        color_blend_op: BlendOp::Add,
        color_write_mask: ColorWriteMask::ALL,
    };
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

// ===== RENDER TARGETS =====

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleCount {
    S1,
    S4,
}

/// Attachment configuration a pipeline is compiled against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetsInfo {
    pub color_formats: Vec<TextureFormat>,
    pub sample_count: SampleCount,
}

impl RenderTargetsInfo {
    /// Single color attachment of the given format, no MSAA
    pub fn single(format: TextureFormat) -> Self {
        Self { color_formats: vec![format], sample_count: SampleCount::S1 }
    }
}

// ===== PIPELINE DESCRIPTOR =====

/// Descriptor for creating a graphics pipeline
#[derive(Clone)]
pub struct PipelineDesc {
    pub vertex_shader: Arc<dyn Shader>,
    pub fragment_shader: Arc<dyn Shader>,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    pub render_targets: RenderTargetsInfo,
}

impl PipelineDesc {
    /// True when every fixed-function field matches `other`
    ///
    /// Shader handles are compared by identity.
    pub fn same_state_as(&self, other: &PipelineDesc) -> bool {
        Arc::ptr_eq(&self.vertex_shader, &other.vertex_shader)
            && Arc::ptr_eq(&self.fragment_shader, &other.fragment_shader)
            && self.vertex_layout == other.vertex_layout
            && self.topology == other.topology
            && self.rasterization == other.rasterization
            && self.depth_stencil == other.depth_stencil
            && self.color_blend == other.color_blend
            && self.render_targets == other.render_targets
    }
}

/// Pipeline resource trait
///
/// Implemented by backend-specific pipeline types.
pub trait Pipeline: Send + Sync {
    fn topology(&self) -> PrimitiveTopology;

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
