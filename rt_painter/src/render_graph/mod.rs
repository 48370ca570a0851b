/// Render graph module - deferred, dependency-tracked pass submission
///
/// A `RenderGraphBuilder` collects external textures and passes, then
/// `execute()` runs every pass in declaration order with access-state
/// transitions inserted from what each pass's parameters declare.

pub mod resource;
pub mod pass;
pub mod render_graph_builder;

pub use resource::*;
pub use pass::*;
pub use render_graph_builder::*;
