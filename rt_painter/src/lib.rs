/*!
# RtPainter

Core traits and types of a GPU draw-command submission pipeline that paints
a full-screen quad into a render target.

Backend implementations (the software reference device, GPU backends) provide
concrete types implementing the `graphics_device` traits.

## Architecture

- **GraphicsDevice**: Factory trait for buffers, textures, shaders, pipelines and command lists
- **ResourceFactory**: Volatile/static vertex and index buffer creation
- **PipelineStateBuilder**: Fixed-function state of the quad draw
- **ImmediateRecorder**: State-machine driven render pass recording
- **RenderGraphBuilder**: Deferred pass submission with automatic transitions
- **RenderThread**: FIFO handoff of render commands to the thread owning the device

`draw_render_target()` ties them together: it enqueues one render command that
overwrites the target with a solid color, in immediate or graph mode.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod color;
pub mod graphics_device;
pub mod resource;
pub mod shader;
pub mod draw;
pub mod render_graph;
pub mod render_thread;

// Main rtp namespace module
pub mod rtp {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Color and entry point
    pub use crate::color::LinearColor;
    pub use crate::draw::{draw_render_target, enqueue_draw, DrawRequest, RenderContext, SubmissionMode};

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device traits and descriptors
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Shader cache and FirstShader
    pub mod shader {
        pub use crate::shader::*;
    }

    // Immediate-mode recording
    pub mod draw {
        pub use crate::draw::*;
    }

    // Render graph
    pub mod graph {
        pub use crate::render_graph::*;
    }

    // Render thread handoff
    pub mod thread {
        pub use crate::render_thread::*;
    }
}

// Re-export math library at crate root
pub use glam;
