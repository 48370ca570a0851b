/// Graphics device module - backend-agnostic device, resource and command traits

// Module declarations
pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod shader;
pub mod pipeline;
pub mod render_pass;
pub mod command_list;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use texture::*;
pub use buffer::*;
pub use shader::*;
pub use pipeline::*;
pub use render_pass::*;
pub use command_list::*;

// Mock graphics device for tests (no backend required)
#[cfg(test)]
pub mod mock_graphics_device;
