/*!
# RtPainter - Software Renderer Backend

CPU implementation of the rt_painter device traits.

Command lists are recorded into plain command vectors and replayed on
`submit`: transitions update the texture access state, render passes load
and store linear RGBA texels, and indexed triangle draws are rasterized with
edge functions at pixel centers. `read_texture` encodes the texels in the
texture's format, which makes the backend usable as a readback oracle in
tests and headless tools.

Only the built-in programs are known to `create_shader`: the passthrough
vertex stage and the solid color fragment stage of `FirstShader`.
*/

mod soft_graphics_device;
mod soft_buffer;
mod soft_texture;
mod soft_shader;
mod soft_pipeline;
mod soft_command_list;
mod soft_rasterizer;

pub use soft_graphics_device::SoftGraphicsDevice;
pub use soft_buffer::SoftBuffer;
pub use soft_texture::{encode_texels, SoftTexture, Texel};
pub use soft_shader::{ShaderProgram, SoftShader};
pub use soft_pipeline::SoftPipeline;
pub use soft_command_list::SoftCommandList;

/// Backend types under the `rtp` namespace used by the core crate
pub mod rtp {
    pub use crate::SoftGraphicsDevice;
    pub use crate::{SoftBuffer, SoftCommandList, SoftPipeline, SoftShader, SoftTexture};
}
