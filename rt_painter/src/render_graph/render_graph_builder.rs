/// Single-use render graph builder and executor

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, GraphicsDevice, RenderPassInfo, ResourceAccess, Texture, TextureTransition,
};
use crate::render_graph::{
    next_graph_id, GraphParameters, GraphTextureHandle, GraphTextureKey,
    PassContext, PassDependencies, PassFlags, PassParameters,
};
use crate::render_thread::is_in_rendering_thread;
use crate::resource::RenderTargetResource;

type PassExecutor<'a> = Box<dyn for<'c, 'd> FnOnce(&'d mut PassContext<'c>) -> Result<()> + 'a>;

fn erase_executor<'a, F>(executor: F) -> PassExecutor<'a>
where
    F: for<'c, 'd> FnOnce(&'d mut PassContext<'c>) -> Result<()> + 'a,
{
    Box::new(executor)
}

/// External texture tracked by the graph
struct GraphTexture<'a> {
    resource: Arc<RenderTargetResource>,
    initial_access: ResourceAccess,
    current_access: ResourceAccess,
    extraction_slots: Vec<&'a mut Option<Arc<dyn Texture>>>,
}

/// Declared pass, waiting for `execute()`
struct PassNode<'a> {
    name: String,
    flags: PassFlags,
    dependencies: PassDependencies,
    executor: PassExecutor<'a>,
}

/// Transition emitted while executing a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransition {
    pub texture: String,
    pub before: ResourceAccess,
    pub after: ResourceAccess,
}

/// What `execute()` did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Pass names, in execution order
    pub executed_passes: Vec<String>,
    /// Every transition recorded, in order
    pub transitions: Vec<RecordedTransition>,
    /// Parameter blocks released during execution
    pub parameter_blocks_released: usize,
}

/// Render graph builder
///
/// # Usage
///
/// 1. `register_external_texture()` for every texture passes touch
/// 2. `allocate_parameters()` and fill the block
/// 3. `add_pass()` with the block and a callback (not invoked yet)
/// 4. optional `queue_texture_extraction()`
/// 5. `execute()` on the rendering thread, consuming the builder
///
/// `'a` is the lifetime of data the pass callbacks and extraction slots
/// borrow from the caller.
pub struct RenderGraphBuilder<'a> {
    graph_id: u64,
    textures: SlotMap<GraphTextureKey, GraphTexture<'a>>,
    passes: Vec<PassNode<'a>>,
    live_parameters: Arc<AtomicUsize>,
}

impl Default for RenderGraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RenderGraphBuilder<'a> {
    pub fn new() -> Self {
        Self {
            graph_id: next_graph_id(),
            textures: SlotMap::with_key(),
            passes: Vec::new(),
            live_parameters: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn graph_id(&self) -> u64 {
        self.graph_id
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Parameter blocks allocated by this graph and not yet dropped
    pub fn live_parameter_blocks(&self) -> usize {
        self.live_parameters.load(Ordering::SeqCst)
    }

    /// Track an externally owned render target
    ///
    /// Its current access becomes the initial state, restored once the graph
    /// has executed. Registering the same target twice returns the same handle.
    pub fn register_external_texture(&mut self, target: &Arc<RenderTargetResource>) -> GraphTextureHandle {
        if let Some((key, _)) = self.textures.iter().find(|(_, t)| Arc::ptr_eq(&t.resource, target)) {
            return GraphTextureHandle { key, graph_id: self.graph_id };
        }
        let access = target.current_access();
        let key = self.textures.insert(GraphTexture {
            resource: Arc::clone(target),
            initial_access: access,
            current_access: access,
            extraction_slots: Vec::new(),
        });
        crate::engine_trace!("rtp::RenderGraph",
            "graph {}: registered '{}' ({:?})", self.graph_id, target.name(), access);
        GraphTextureHandle { key, graph_id: self.graph_id }
    }

    /// Allocate a default-initialized parameter block bound to this graph
    pub fn allocate_parameters<T: PassParameters + Default>(&self) -> GraphParameters<T> {
        GraphParameters::new(T::default(), self.graph_id, Arc::clone(&self.live_parameters))
    }

    /// Declare a pass
    ///
    /// `execute` runs once, during `execute()`, after every earlier pass.
    /// Dependencies come from `parameters.declare()` only.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the block or a declared handle belongs to
    /// another graph, if a `RASTER` pass does not bind exactly one render
    /// target, or if a non-raster pass binds one.
    pub fn add_pass<T, F>(
        &mut self,
        name: &str,
        parameters: GraphParameters<T>,
        flags: PassFlags,
        execute: F,
    ) -> Result<()>
    where
        T: PassParameters,
        F: for<'c, 'd> FnOnce(&T, &'d mut PassContext<'c>) -> Result<()> + 'a,
    {
        if parameters.graph_id() != self.graph_id {
            return Err(Error::InvalidResource(format!(
                "pass '{}': parameter block belongs to graph {}, not {}",
                name,
                parameters.graph_id(),
                self.graph_id
            )));
        }

        let mut dependencies = PassDependencies::default();
        parameters.declare(&mut dependencies);

        for handle in dependencies.handles() {
            self.resolve(handle)?;
        }

        let render_target_count = dependencies.render_targets().len();
        if flags.contains(PassFlags::RASTER) && render_target_count != 1 {
            return Err(Error::InvalidResource(format!(
                "raster pass '{}' must bind exactly one render target, found {}",
                name, render_target_count
            )));
        }
        if !flags.contains(PassFlags::RASTER) && render_target_count != 0 {
            return Err(Error::InvalidResource(format!(
                "pass '{}' binds a render target but is not a raster pass",
                name
            )));
        }

        let executor = erase_executor(move |ctx| execute(&*parameters, ctx));
        self.passes.push(PassNode {
            name: name.to_string(),
            flags,
            dependencies,
            executor,
        });
        crate::engine_trace!("rtp::RenderGraph", "graph {}: pass '{}' declared", self.graph_id, name);
        Ok(())
    }

    /// Refresh `slot` with the underlying texture of `handle` once execution completes
    pub fn queue_texture_extraction(
        &mut self,
        handle: GraphTextureHandle,
        slot: &'a mut Option<Arc<dyn Texture>>,
    ) -> Result<()> {
        let key = self.resolve(handle)?;
        self.textures[key].extraction_slots.push(slot);
        Ok(())
    }

    /// Compile and run every declared pass, then submit
    ///
    /// Schedule is declaration order. Each texture is transitioned to what its
    /// next pass requires, and back to its initial access at the end.
    ///
    /// # Panics
    ///
    /// When called outside of the rendering thread.
    pub fn execute(self, device: &mut dyn GraphicsDevice) -> Result<ExecutionReport> {
        assert!(
            is_in_rendering_thread(),
            "RenderGraphBuilder::execute must be called on the rendering thread"
        );

        let RenderGraphBuilder { graph_id, mut textures, passes, live_parameters } = self;
        let live_before = live_parameters.load(Ordering::SeqCst);
        let mut report = ExecutionReport::default();

        // Tracked accesses move at record time; nothing submitted means nothing moved.
        if let Err(err) = Self::record_and_submit(&mut textures, passes, device, &mut report) {
            for texture in textures.values() {
                texture.resource.set_access(texture.initial_access);
            }
            return Err(err);
        }

        for texture in textures.values_mut() {
            for slot in texture.extraction_slots.drain(..) {
                *slot = Some(Arc::clone(texture.resource.texture()));
            }
        }

        report.parameter_blocks_released = live_before - live_parameters.load(Ordering::SeqCst);
        crate::engine_debug!("rtp::RenderGraph",
            "graph {}: executed {} pass(es), {} transition(s)",
            graph_id, report.executed_passes.len(), report.transitions.len());
        Ok(report)
    }

    fn record_and_submit(
        textures: &mut SlotMap<GraphTextureKey, GraphTexture<'a>>,
        passes: Vec<PassNode<'a>>,
        device: &mut dyn GraphicsDevice,
        report: &mut ExecutionReport,
    ) -> Result<()> {
        let mut cmd = device.create_command_list()?;
        cmd.begin()?;

        for pass in passes {
            let PassNode { name, flags, dependencies, executor } = pass;
            cmd.begin_event(&name)?;

            for (handle, _) in dependencies.render_targets() {
                Self::transition_to(&mut textures[handle.key], cmd.as_mut(), ResourceAccess::RenderTarget, report)?;
            }
            for handle in dependencies.texture_reads() {
                Self::transition_to(&mut textures[handle.key], cmd.as_mut(), ResourceAccess::ShaderRead, report)?;
            }

            let render_target = dependencies
                .render_targets()
                .first()
                .map(|(handle, actions)| (Arc::clone(&textures[handle.key].resource), *actions));

            let raster = flags.contains(PassFlags::RASTER);
            if let (true, Some((resource, actions))) = (raster, &render_target) {
                cmd.begin_render_pass(&RenderPassInfo {
                    name: name.clone(),
                    color_target: Arc::clone(resource.texture()),
                    actions: *actions,
                })?;
            }

            {
                let mut ctx = PassContext {
                    pass_name: &name,
                    cmd: cmd.as_mut(),
                    device: &mut *device,
                    render_target: render_target.map(|(resource, _)| resource),
                };
                executor(&mut ctx)?;
            }

            if raster {
                cmd.end_render_pass()?;
            }
            cmd.end_event()?;
            report.executed_passes.push(name);
        }

        for texture in textures.values_mut() {
            if texture.initial_access != ResourceAccess::Unknown {
                let initial = texture.initial_access;
                Self::transition_to(texture, cmd.as_mut(), initial, report)?;
            }
        }

        cmd.end()?;
        device.submit(&[cmd.as_ref()])
    }

    fn resolve(&self, handle: GraphTextureHandle) -> Result<GraphTextureKey> {
        if handle.graph_id != self.graph_id {
            return Err(Error::InvalidResource(format!(
                "texture handle belongs to graph {}, not {}",
                handle.graph_id, self.graph_id
            )));
        }
        if !self.textures.contains_key(handle.key) {
            return Err(Error::InvalidResource("texture handle is not registered".to_string()));
        }
        Ok(handle.key)
    }

    fn transition_to(
        texture: &mut GraphTexture<'a>,
        cmd: &mut dyn CommandList,
        after: ResourceAccess,
        report: &mut ExecutionReport,
    ) -> Result<()> {
        let before = texture.current_access;
        if before == after {
            return Ok(());
        }
        cmd.transition(&TextureTransition {
            texture: Arc::clone(texture.resource.texture()),
            before,
            after,
        })?;
        texture.current_access = after;
        texture.resource.set_access(after);
        report.transitions.push(RecordedTransition {
            texture: texture.resource.name().to_string(),
            before,
            after,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_graph_builder_tests.rs"]
mod tests;
