/// State-machine driven recording of one full-screen quad render pass
///
/// ```text
/// Idle -> PassOpen -> PipelineBound -> BuffersBound -> Drawn -> PassClosed -> Idle
/// ```
///
/// Calls made out of sequence are contract violations and panic.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentActions, Buffer, CommandList, DrawIndexedArgs, GraphicsDevice, IndexType,
    Pipeline, PipelineDesc, RenderPassInfo, RenderTargetsInfo, ResourceAccess, ShaderStage,
    TextureTransition, Viewport, BufferUsage,
};
use crate::render_graph::PassContext;
use crate::render_thread::is_in_rendering_thread;
use crate::resource::{RenderTargetResource, ResourceFactory, QUAD_INDICES, QUAD_VERTICES};
use crate::shader::FirstShaderParameters;

/// Render pass opened by the immediate path
pub const DRAW_PASS_NAME: &str = "DrawTestShader";

/// Whether the recorder moves the target in and out of `RenderTarget` access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// `current -> RenderTarget` before the pass and `RenderTarget -> current`
    /// after it; nothing when the target is already writable. A target in
    /// `Unknown` access is left in `RenderTarget`, as the render graph does.
    #[default]
    Explicit,
    /// No transitions; the target must already be in `RenderTarget` access
    None,
}

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    PassOpen,
    PipelineBound,
    BuffersBound,
    Drawn,
    PassClosed,
}

/// Immediate command recorder
pub struct ImmediateRecorder<'r> {
    cmd: &'r mut dyn CommandList,
    device: &'r mut dyn GraphicsDevice,
    target: Arc<RenderTargetResource>,
    policy: TransitionPolicy,
    state: RecorderState,
    owns_pass: bool,
    /// Access `end_pass` hands the target back to
    restore_access: Option<ResourceAccess>,
    viewport_set: bool,
    cached_render_targets: Option<RenderTargetsInfo>,
    pipeline: Option<Arc<dyn Pipeline>>,
    vertex_buffer: Option<Arc<dyn Buffer>>,
    index_buffer: Option<Arc<dyn Buffer>>,
}

impl<'r> ImmediateRecorder<'r> {
    /// Recorder that opens and closes its own pass on `cmd`
    pub fn new(
        cmd: &'r mut dyn CommandList,
        device: &'r mut dyn GraphicsDevice,
        target: Arc<RenderTargetResource>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            cmd,
            device,
            target,
            policy,
            state: RecorderState::Idle,
            owns_pass: true,
            restore_access: None,
            viewport_set: false,
            cached_render_targets: None,
            pipeline: None,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    /// Recorder attached to the pass a render graph already opened
    ///
    /// Starts in `PassOpen`. Never begins or ends the pass and never
    /// transitions the target; `finish()` is legal right after the draw.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the pass has no render target.
    pub fn within_graph_pass(ctx: &'r mut PassContext<'_>) -> Result<Self> {
        let target = ctx.render_target.clone().ok_or_else(|| {
            Error::InvalidResource(format!("pass '{}' has no render target", ctx.pass_name))
        })?;
        let cached_render_targets = Some(target.render_targets_info());
        Ok(Self {
            cmd: &mut *ctx.cmd,
            device: &mut *ctx.device,
            target,
            policy: TransitionPolicy::None,
            state: RecorderState::PassOpen,
            owns_pass: false,
            restore_access: None,
            viewport_set: false,
            cached_render_targets,
            pipeline: None,
            vertex_buffer: None,
            index_buffer: None,
        })
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn target(&self) -> &Arc<RenderTargetResource> {
        &self.target
    }

    /// Pipeline bound by the last `bind_pipeline()`
    pub fn pipeline(&self) -> Option<&Arc<dyn Pipeline>> {
        self.pipeline.as_ref()
    }

    /// Vertex and index buffers created by `upload_and_bind_geometry()`
    pub fn geometry(&self) -> Option<(&Arc<dyn Buffer>, &Arc<dyn Buffer>)> {
        self.vertex_buffer.as_ref().zip(self.index_buffer.as_ref())
    }

    /// Attachment configuration of the open pass
    pub fn cached_render_targets(&self) -> Option<&RenderTargetsInfo> {
        self.cached_render_targets.as_ref()
    }

    fn expect_state(&self, allowed: &[RecorderState], operation: &str) {
        assert!(
            allowed.contains(&self.state),
            "ImmediateRecorder::{} called in state {:?}",
            operation,
            self.state
        );
    }

    /// The tracked access moves at record time. `draw_immediate` rolls it back
    /// when the recording is never submitted.
    fn transition(&mut self, before: ResourceAccess, after: ResourceAccess) -> Result<()> {
        self.cmd.transition(&TextureTransition {
            texture: Arc::clone(self.target.texture()),
            before,
            after,
        })?;
        self.target.set_access(after);
        crate::engine_trace!("rtp::ImmediateRecorder",
            "'{}': {:?} -> {:?}", self.target.name(), before, after);
        Ok(())
    }

    /// Open the draw pass with `DontCare / Store` actions
    ///
    /// # Panics
    ///
    /// Outside of the rendering thread, or when not `Idle`.
    pub fn begin_pass(&mut self) -> Result<()> {
        assert!(
            is_in_rendering_thread(),
            "ImmediateRecorder::begin_pass must be called on the rendering thread"
        );
        self.expect_state(&[RecorderState::Idle], "begin_pass");

        let current = self.target.current_access();
        match self.policy {
            TransitionPolicy::Explicit => {
                if current != ResourceAccess::RenderTarget {
                    self.transition(current, ResourceAccess::RenderTarget)?;
                    if current != ResourceAccess::Unknown {
                        self.restore_access = Some(current);
                    }
                }
            }
            TransitionPolicy::None => {
                if current != ResourceAccess::RenderTarget {
                    crate::engine_bail!("rtp::ImmediateRecorder",
                        "'{}' is in {:?} access, not writable without a transition",
                        self.target.name(), current);
                }
            }
        }

        self.cmd.begin_render_pass(&RenderPassInfo {
            name: DRAW_PASS_NAME.to_string(),
            color_target: Arc::clone(self.target.texture()),
            actions: AttachmentActions::DONT_LOAD_STORE,
        })?;
        self.cached_render_targets = Some(self.target.render_targets_info());
        self.state = RecorderState::PassOpen;
        Ok(())
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.expect_state(
            &[RecorderState::PassOpen, RecorderState::PipelineBound, RecorderState::BuffersBound],
            "set_viewport",
        );
        self.cmd.set_viewport(Viewport::full(width, height))?;
        self.viewport_set = true;
        Ok(())
    }

    /// Create the pipeline object from `desc` and bind it
    ///
    /// Binding again before any geometry only replaces the pipeline.
    pub fn bind_pipeline(&mut self, desc: PipelineDesc) -> Result<()> {
        self.expect_state(&[RecorderState::PassOpen, RecorderState::PipelineBound], "bind_pipeline");
        let pipeline = self.device.create_pipeline(desc)?;
        self.cmd.bind_pipeline(&pipeline)?;
        self.pipeline = Some(pipeline);
        self.state = RecorderState::PipelineBound;
        Ok(())
    }

    /// Upload the 16-byte color to the pixel stage
    pub fn bind_shader_parameters(&mut self, parameters: &FirstShaderParameters) -> Result<()> {
        self.expect_state(&[RecorderState::PipelineBound], "bind_shader_parameters");
        let uniforms = parameters.uniforms();
        self.cmd.set_shader_parameters(ShaderStage::Fragment, uniforms.as_bytes())
    }

    /// Create the volatile quad buffers and bind them to stream 0 and the index slot
    pub fn upload_and_bind_geometry(&mut self) -> Result<()> {
        self.expect_state(&[RecorderState::PipelineBound], "upload_and_bind_geometry");
        let vertex_buffer = ResourceFactory::create_vertex_buffer(&mut *self.device, &QUAD_VERTICES)?;
        let index_buffer = ResourceFactory::create_index_buffer(&mut *self.device, &QUAD_INDICES, BufferUsage::Volatile)?;

        self.cmd.bind_vertex_buffer(0, &vertex_buffer, 0)?;
        self.cmd.bind_index_buffer(&index_buffer, 0, IndexType::U16)?;

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        self.state = RecorderState::BuffersBound;
        Ok(())
    }

    /// # Panics
    ///
    /// When no viewport was set.
    pub fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<()> {
        self.expect_state(&[RecorderState::BuffersBound], "draw_indexed");
        assert!(self.viewport_set, "ImmediateRecorder::draw_indexed called without a viewport");
        self.cmd.draw_indexed(args)?;
        crate::engine_trace!("rtp::ImmediateRecorder",
            "'{}': {} primitive(s)", self.target.name(), args.num_primitives);
        self.state = RecorderState::Drawn;
        Ok(())
    }

    /// Close the pass and hand the target back to its access before `begin_pass`
    ///
    /// # Panics
    ///
    /// When the pass belongs to a render graph.
    pub fn end_pass(&mut self) -> Result<()> {
        self.expect_state(&[RecorderState::Drawn], "end_pass");
        assert!(self.owns_pass, "ImmediateRecorder::end_pass on a pass owned by the render graph");

        self.cmd.end_render_pass()?;
        if let Some(access) = self.restore_access.take() {
            self.transition(ResourceAccess::RenderTarget, access)?;
        }
        self.state = RecorderState::PassClosed;
        Ok(())
    }

    /// Return to `Idle`, releasing the recorder's hold on the draw resources
    pub fn finish(mut self) {
        if self.owns_pass {
            self.expect_state(&[RecorderState::PassClosed], "finish");
        } else {
            self.expect_state(&[RecorderState::Drawn], "finish");
        }
        self.state = RecorderState::Idle;
    }
}

#[cfg(test)]
#[path = "immediate_recorder_tests.rs"]
mod tests;
