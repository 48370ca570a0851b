/// Entry point: paint a whole render target with one solid color
///
/// The producer side only validates input and enqueues one render command.
/// Everything touching the device happens inside that command, on the render
/// thread, through either the immediate recorder or a one-pass render graph.

use std::sync::Arc;

use crate::color::LinearColor;
use crate::error::{Error, Result};
use crate::graphics_device::{DrawIndexedArgs, GraphicsDevice, LoadOp, StoreOp, Texture};
use crate::draw::{ImmediateRecorder, PipelineStateBuilder, TransitionPolicy, DRAW_PASS_NAME};
use crate::render_graph::{ExecutionReport, PassFlags, RenderGraphBuilder};
use crate::render_thread::RenderThread;
use crate::resource::RenderTargetResource;
use crate::shader::{CapabilityTier, FirstShaderParameters, RenderTargetBinding, ShaderCache, ShaderStagePair};

/// Name of the render command enqueued per draw
pub const DRAW_COMMAND_NAME: &str = "FirstShaderDraw";

/// How a draw reaches the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// Record and submit right away
    Immediate,
    /// Declare a single raster pass and execute a render graph
    Graph,
}

/// One solid-color draw, moved into exactly one render command
#[derive(Debug, Clone)]
pub struct DrawRequest {
    pub target: Arc<RenderTargetResource>,
    pub capability_tier: CapabilityTier,
    pub color: LinearColor,
    pub mode: SubmissionMode,
}

/// Owner of everything a draw needs besides its target
///
/// The shader cache is shared read-only with the render thread.
pub struct RenderContext {
    name: String,
    capability_tier: CapabilityTier,
    shader_cache: Arc<ShaderCache>,
    render_thread: Arc<RenderThread>,
    transition_policy: TransitionPolicy,
}

impl RenderContext {
    pub fn new(
        name: &str,
        capability_tier: CapabilityTier,
        shader_cache: Arc<ShaderCache>,
        render_thread: Arc<RenderThread>,
    ) -> Self {
        Self {
            name: name.to_string(),
            capability_tier,
            shader_cache,
            render_thread,
            transition_policy: TransitionPolicy::default(),
        }
    }

    /// Transition policy of immediate-mode draws
    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability_tier(&self) -> CapabilityTier {
        self.capability_tier
    }

    pub fn shader_cache(&self) -> &Arc<ShaderCache> {
        &self.shader_cache
    }

    pub fn render_thread(&self) -> &Arc<RenderThread> {
        &self.render_thread
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        self.transition_policy
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("name", &self.name)
            .field("capability_tier", &self.capability_tier)
            .field("render_thread", &self.render_thread.name())
            .field("transition_policy", &self.transition_policy)
            .finish()
    }
}

/// Overwrite the whole of `target` with `color`
///
/// Returns immediately. An absent context or target is logged and nothing
/// is enqueued.
pub fn draw_render_target(
    context: Option<&RenderContext>,
    target: Option<&Arc<RenderTargetResource>>,
    color: LinearColor,
    use_graph_mode: bool,
) {
    let (Some(context), Some(target)) = (context, target) else {
        crate::engine_error!("rtp::draw",
            "draw_render_target: param error (context: {}, target: {})",
            if context.is_some() { "set" } else { "none" },
            if target.is_some() { "set" } else { "none" });
        return;
    };

    let request = DrawRequest {
        target: Arc::clone(target),
        capability_tier: context.capability_tier(),
        color,
        mode: if use_graph_mode { SubmissionMode::Graph } else { SubmissionMode::Immediate },
    };
    // Already logged by `RenderThread::enqueue` or `enqueue_draw`
    let _ = enqueue_draw(context, request);
}

/// Enqueue `request` on the render thread of `context`
///
/// # Errors
///
/// - `Error::InvalidResource` if the shader cache has no stages for the
///   request's tier (nothing is enqueued, the render thread keeps running)
/// - `Error::BackendError` if the render thread rejects the command
pub fn enqueue_draw(context: &RenderContext, request: DrawRequest) -> Result<()> {
    if !context.shader_cache.contains(request.capability_tier) {
        let message = format!("'{}': no FirstShader compiled for tier {:?}, draw of '{}' dropped",
            context.name, request.capability_tier, request.target.name());
        crate::engine_error!("rtp::draw", "{}", message);
        return Err(Error::InvalidResource(message));
    }
    let shader_cache = Arc::clone(&context.shader_cache);
    let policy = context.transition_policy;
    crate::engine_trace!("rtp::draw", "'{}': enqueue {:?} draw of '{}'",
        context.name, request.mode, request.target.name());

    context.render_thread.enqueue(DRAW_COMMAND_NAME, move |device| {
        execute_draw_request(device, &shader_cache, policy, request)
    })
}

/// Render-thread side of a draw
pub(crate) fn execute_draw_request(
    device: &mut dyn GraphicsDevice,
    shader_cache: &ShaderCache,
    policy: TransitionPolicy,
    request: DrawRequest,
) -> Result<()> {
    let stages = shader_cache.get(request.capability_tier)?;
    match request.mode {
        SubmissionMode::Immediate => draw_immediate(device, stages, policy, &request),
        SubmissionMode::Graph => draw_with_graph(device, stages, &request).map(|_| ()),
    }
}

/// Record and submit one immediate draw
///
/// The tracked access of the target is restored when nothing was submitted.
fn draw_immediate(
    device: &mut dyn GraphicsDevice,
    stages: &ShaderStagePair,
    policy: TransitionPolicy,
    request: &DrawRequest,
) -> Result<()> {
    let initial_access = request.target.current_access();
    let result = record_and_submit_immediate(device, stages, policy, request);
    if result.is_err() {
        request.target.set_access(initial_access);
    }
    result
}

fn record_and_submit_immediate(
    device: &mut dyn GraphicsDevice,
    stages: &ShaderStagePair,
    policy: TransitionPolicy,
    request: &DrawRequest,
) -> Result<()> {
    let mut cmd = device.create_command_list()?;
    cmd.begin()?;
    cmd.begin_event(&format!("FirstShader {}", request.target.name()))?;
    {
        let mut recorder = ImmediateRecorder::new(cmd.as_mut(), &mut *device, Arc::clone(&request.target), policy);
        recorder.begin_pass()?;
        record_quad(&mut recorder, stages, &FirstShaderParameters::new(request.color))?;
        recorder.end_pass()?;
        recorder.finish();
    }
    cmd.end_event()?;
    cmd.end()?;
    device.submit(&[cmd.as_ref()])
}

/// Declare and execute a one-pass render graph
pub(crate) fn draw_with_graph(
    device: &mut dyn GraphicsDevice,
    stages: &ShaderStagePair,
    request: &DrawRequest,
) -> Result<ExecutionReport> {
    let mut extracted: Option<Arc<dyn Texture>> = None;

    let report = {
        let mut builder = RenderGraphBuilder::new();
        let handle = builder.register_external_texture(&request.target);

        let mut parameters = builder.allocate_parameters::<FirstShaderParameters>();
        parameters.simple_color = request.color;
        parameters.render_target = Some(RenderTargetBinding::new(handle, LoadOp::DontCare, StoreOp::Store));

        builder.add_pass(DRAW_PASS_NAME, parameters, PassFlags::RASTER, |parameters, ctx| {
            let mut recorder = ImmediateRecorder::within_graph_pass(ctx)?;
            record_quad(&mut recorder, stages, parameters)?;
            recorder.finish();
            Ok(())
        })?;
        builder.queue_texture_extraction(handle, &mut extracted)?;
        builder.execute(device)?
    };

    if extracted.is_none() {
        return Err(Error::InvalidResource(format!(
            "'{}' was not extracted from the render graph", request.target.name()
        )));
    }
    crate::engine_trace!("rtp::draw", "graph draw of '{}': {} transition(s), {} block(s) released",
        request.target.name(), report.transitions.len(), report.parameter_blocks_released);
    Ok(report)
}

/// Viewport, pipeline, parameters, geometry and the quad draw, on an open pass
fn record_quad(
    recorder: &mut ImmediateRecorder<'_>,
    stages: &ShaderStagePair,
    parameters: &FirstShaderParameters,
) -> Result<()> {
    let render_targets = recorder.cached_render_targets().cloned().ok_or_else(|| {
        Error::InvalidResource("no render-target configuration cached for the open pass".to_string())
    })?;
    let desc = PipelineStateBuilder::new(stages)
        .apply_cached_render_targets(render_targets)
        .build()?;

    let (width, height) = (recorder.target().size_x(), recorder.target().size_y());
    recorder.set_viewport(width, height)?;
    recorder.bind_pipeline(desc)?;
    recorder.bind_shader_parameters(parameters)?;
    recorder.upload_and_bind_geometry()?;
    recorder.draw_indexed(DrawIndexedArgs::QUAD)
}

#[cfg(test)]
#[path = "draw_render_target_tests.rs"]
mod tests;
