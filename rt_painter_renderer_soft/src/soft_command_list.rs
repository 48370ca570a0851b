/// Command list - recorded commands replayed by SoftGraphicsDevice::submit

use rt_painter::rtp::{
    Result,
    Error,
    render::{
        AttachmentActions, Buffer, CommandList, DrawIndexedArgs, IndexType, Pipeline,
        RenderPassInfo, ResourceAccess, ShaderStage, Texture, TextureTransition, Viewport,
    },
};
use rt_painter::engine_bail;
use std::any::Any;
use std::sync::Arc;

use crate::soft_buffer::SoftBuffer;
use crate::soft_pipeline::SoftPipeline;
use crate::soft_texture::SoftTexture;

/// One recorded command
pub(crate) enum SoftCommand {
    BeginEvent(String),
    EndEvent,
    Transition {
        texture: Arc<dyn Texture>,
        before: ResourceAccess,
        after: ResourceAccess,
    },
    BeginRenderPass {
        name: String,
        target: Arc<dyn Texture>,
        actions: AttachmentActions,
    },
    EndRenderPass,
    SetViewport(Viewport),
    BindPipeline(Arc<dyn Pipeline>),
    SetShaderParameters(ShaderStage, Vec<u8>),
    BindVertexBuffer {
        slot: u32,
        buffer: Arc<dyn Buffer>,
        offset: u64,
    },
    BindIndexBuffer {
        buffer: Arc<dyn Buffer>,
        offset: u64,
        index_type: IndexType,
    },
    DrawIndexed(DrawIndexedArgs),
}

/// CPU command list
///
/// Structural errors (recording state, pass nesting, foreign resources) are
/// reported while recording. Access states are checked at submit.
#[derive(Default)]
pub struct SoftCommandList {
    commands: Vec<SoftCommand>,
    recording: bool,
    in_render_pass: bool,
    event_depth: u32,
}

impl SoftCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn commands(&self) -> &[SoftCommand] {
        &self.commands
    }

    fn record(&mut self, operation: &str, command: SoftCommand) -> Result<()> {
        if !self.recording {
            engine_bail!("rtp::soft", "{}: command list is not recording", operation);
        }
        self.commands.push(command);
        Ok(())
    }

    fn require_pass(&self, operation: &str) -> Result<()> {
        if !self.in_render_pass {
            engine_bail!("rtp::soft", "{}: no render pass open", operation);
        }
        Ok(())
    }
}

fn check_soft_buffer(buffer: &Arc<dyn Buffer>, operation: &str) -> Result<()> {
    let Some(soft) = buffer.as_any().downcast_ref::<SoftBuffer>() else {
        return Err(Error::InvalidResource(format!("{}: buffer was not created by the soft device", operation)));
    };
    if soft.is_retired() {
        engine_bail!("rtp::soft", "{}: volatile buffer was already submitted once", operation);
    }
    Ok(())
}

impl CommandList for SoftCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            engine_bail!("rtp::soft", "begin: command list already recording");
        }
        self.commands.clear();
        self.recording = true;
        self.in_render_pass = false;
        self.event_depth = 0;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.recording {
            engine_bail!("rtp::soft", "end: command list is not recording");
        }
        if self.in_render_pass {
            engine_bail!("rtp::soft", "end: render pass still open");
        }
        if self.event_depth != 0 {
            engine_bail!("rtp::soft", "end: {} debug event(s) still open", self.event_depth);
        }
        self.recording = false;
        Ok(())
    }

    fn begin_event(&mut self, name: &str) -> Result<()> {
        self.record("begin_event", SoftCommand::BeginEvent(name.to_string()))?;
        self.event_depth += 1;
        Ok(())
    }

    fn end_event(&mut self) -> Result<()> {
        if self.event_depth == 0 {
            engine_bail!("rtp::soft", "end_event: no debug event open");
        }
        self.record("end_event", SoftCommand::EndEvent)?;
        self.event_depth -= 1;
        Ok(())
    }

    fn transition(&mut self, transition: &TextureTransition) -> Result<()> {
        if self.in_render_pass {
            engine_bail!("rtp::soft", "transition: not allowed inside a render pass");
        }
        if transition.texture.as_any().downcast_ref::<SoftTexture>().is_none() {
            return Err(Error::InvalidResource("transition: texture was not created by the soft device".to_string()));
        }
        self.record("transition", SoftCommand::Transition {
            texture: Arc::clone(&transition.texture),
            before: transition.before,
            after: transition.after,
        })
    }

    fn begin_render_pass(&mut self, info: &RenderPassInfo) -> Result<()> {
        if self.in_render_pass {
            engine_bail!("rtp::soft", "begin_render_pass '{}': a render pass is already open", info.name);
        }
        if info.color_target.as_any().downcast_ref::<SoftTexture>().is_none() {
            return Err(Error::InvalidResource(format!(
                "begin_render_pass '{}': target was not created by the soft device", info.name
            )));
        }
        if !info.color_target.info().usage.is_render_target() {
            return Err(Error::InvalidResource(format!(
                "begin_render_pass '{}': target is not render-target capable", info.name
            )));
        }
        self.record("begin_render_pass", SoftCommand::BeginRenderPass {
            name: info.name.clone(),
            target: Arc::clone(&info.color_target),
            actions: info.actions,
        })?;
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_pass("end_render_pass")?;
        self.record("end_render_pass", SoftCommand::EndRenderPass)?;
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return Err(Error::InvalidResource(format!(
                "set_viewport: empty viewport {}x{}", viewport.width, viewport.height
            )));
        }
        self.record("set_viewport", SoftCommand::SetViewport(viewport))
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        if pipeline.as_any().downcast_ref::<SoftPipeline>().is_none() {
            return Err(Error::InvalidResource("bind_pipeline: pipeline was not created by the soft device".to_string()));
        }
        self.record("bind_pipeline", SoftCommand::BindPipeline(Arc::clone(pipeline)))
    }

    fn set_shader_parameters(&mut self, stage: ShaderStage, data: &[u8]) -> Result<()> {
        self.record("set_shader_parameters", SoftCommand::SetShaderParameters(stage, data.to_vec()))
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        check_soft_buffer(buffer, "bind_vertex_buffer")?;
        self.record("bind_vertex_buffer", SoftCommand::BindVertexBuffer {
            slot,
            buffer: Arc::clone(buffer),
            offset,
        })
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()> {
        check_soft_buffer(buffer, "bind_index_buffer")?;
        self.record("bind_index_buffer", SoftCommand::BindIndexBuffer {
            buffer: Arc::clone(buffer),
            offset,
            index_type,
        })
    }

    fn draw_indexed(&mut self, args: DrawIndexedArgs) -> Result<()> {
        self.require_pass("draw_indexed")?;
        self.record("draw_indexed", SoftCommand::DrawIndexed(args))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
