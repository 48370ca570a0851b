/// Render thread module - single-consumer FIFO handoff of render commands

pub mod render_thread;

pub use render_thread::*;
