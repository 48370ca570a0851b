/// Resource module - quad geometry, GPU buffer factory and render target wrapper

pub mod geometry;
pub mod resource_factory;
pub mod render_target;

pub use geometry::*;
pub use resource_factory::*;
pub use render_target::*;
