/// Draw module - pipeline state assembly, immediate recording and the
/// render-target draw entry point

pub mod pipeline_state_builder;
pub mod immediate_recorder;
pub mod draw_render_target;

pub use pipeline_state_builder::*;
pub use immediate_recorder::*;
pub use draw_render_target::*;
