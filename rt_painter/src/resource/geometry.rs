/// Full-screen quad geometry and vertex record layouts

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// Unit quad in normalized device space, homogeneous w = 1
///
/// Order: top-left, top-right, bottom-left, bottom-right.
pub const QUAD_VERTICES: [Vec4; 4] = [
    Vec4::new(-1.0, 1.0, 0.0, 1.0),
    Vec4::new(1.0, 1.0, 0.0, 1.0),
    Vec4::new(-1.0, -1.0, 0.0, 1.0),
    Vec4::new(1.0, -1.0, 0.0, 1.0),
];

/// Two triangles covering `QUAD_VERTICES`
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Position + UV vertex record (24 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
}

impl TexturedVertex {
    pub const fn new(position: [f32; 4], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// `QUAD_VERTICES` with UVs, (0,0) at the top-left corner
pub const TEXTURED_QUAD_VERTICES: [TexturedVertex; 4] = [
    TexturedVertex::new([-1.0, 1.0, 0.0, 1.0], [0.0, 0.0]),
    TexturedVertex::new([1.0, 1.0, 0.0, 1.0], [1.0, 0.0]),
    TexturedVertex::new([-1.0, -1.0, 0.0, 1.0], [0.0, 1.0]),
    TexturedVertex::new([1.0, -1.0, 0.0, 1.0], [1.0, 1.0]),
];
