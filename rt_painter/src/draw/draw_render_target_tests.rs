//! Unit tests for the draw entry point against the mock device

use super::*;
use std::sync::Mutex;
use serial_test::serial;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockTexture};
use crate::graphics_device::{ResourceAccess, ShaderStage, TextureFormat, TextureInfo, TextureUsage};
use crate::log::{LogEntry, LogSeverity, Logger};
use crate::render_thread::{RenderThreadConfig, RenderingThreadScope};
use crate::rtp::Engine;
use crate::shader::build_first_shader_cache;

// ============================================================================
// Helpers
// ============================================================================

fn make_target(name: &str) -> Arc<RenderTargetResource> {
    make_target_in(name, ResourceAccess::ShaderRead)
}

fn make_target_in(name: &str, access: ResourceAccess) -> Arc<RenderTargetResource> {
    let info = TextureInfo {
        width: 128,
        height: 64,
        format: TextureFormat::B8G8R8A8_UNORM,
        usage: TextureUsage::SampledAndRenderTarget,
    };
    let texture: Arc<dyn Texture> = Arc::new(MockTexture::new(info, name.to_string()));
    Arc::new(RenderTargetResource::new(name, texture, access).unwrap())
}

fn sm5_cache() -> ShaderCache {
    let mut device = MockGraphicsDevice::new();
    build_first_shader_cache(&mut device, &[CapabilityTier::Sm5]).unwrap()
}

fn request(target: &Arc<RenderTargetResource>, color: LinearColor, mode: SubmissionMode) -> DrawRequest {
    DrawRequest {
        target: Arc::clone(target),
        capability_tier: CapabilityTier::Sm5,
        color,
        mode,
    }
}

struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.source.clone()));
    }
}

// ============================================================================
// Render-thread side
// ============================================================================

#[test]
fn test_immediate_draw_sequence() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Canvas");

    execute_draw_request(&mut device, &sm5_cache(), TransitionPolicy::Explicit,
        request(&target, LinearColor::RED, SubmissionMode::Immediate)).unwrap();

    assert_eq!(device.get_submitted_commands(), vec![
        "begin",
        "begin_event:FirstShader Canvas",
        "transition:ShaderRead->RenderTarget",
        "begin_render_pass:DrawTestShader:DontCare/Store",
        "set_viewport:128x64",
        "bind_pipeline",
        "set_shader_parameters:Fragment",
        "bind_vertex_buffer:0",
        "bind_index_buffer:U16",
        "draw_indexed:4/2/1",
        "end_render_pass",
        "transition:RenderTarget->ShaderRead",
        "end_event",
        "end",
    ]);
    assert_eq!(device.stats().draw_calls, 1);
    assert_eq!(device.stats().triangles, 2);
    assert_eq!(target.current_access(), ResourceAccess::ShaderRead);
}

#[test]
fn test_graph_draw_sequence() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Canvas");

    execute_draw_request(&mut device, &sm5_cache(), TransitionPolicy::Explicit,
        request(&target, LinearColor::BLUE, SubmissionMode::Graph)).unwrap();

    assert_eq!(device.get_submitted_commands(), vec![
        "begin",
        "begin_event:DrawTestShader",
        "transition:ShaderRead->RenderTarget",
        "begin_render_pass:DrawTestShader:DontCare/Store",
        "set_viewport:128x64",
        "bind_pipeline",
        "set_shader_parameters:Fragment",
        "bind_vertex_buffer:0",
        "bind_index_buffer:U16",
        "draw_indexed:4/2/1",
        "end_render_pass",
        "end_event",
        "transition:RenderTarget->ShaderRead",
        "end",
    ]);
    assert_eq!(target.current_access(), ResourceAccess::ShaderRead);
}

#[test]
fn test_both_modes_leave_writable_target_writable() {
    let _scope = RenderingThreadScope::enter();
    let cache = sm5_cache();

    for mode in [SubmissionMode::Immediate, SubmissionMode::Graph] {
        let mut device = MockGraphicsDevice::new();
        let target = make_target_in("Canvas", ResourceAccess::RenderTarget);

        execute_draw_request(&mut device, &cache, TransitionPolicy::Explicit,
            request(&target, LinearColor::RED, mode)).unwrap();

        let commands = device.get_submitted_commands();
        assert!(commands.iter().all(|command| !command.starts_with("transition")), "{:?}: {:?}", mode, commands);
        assert_eq!(target.current_access(), ResourceAccess::RenderTarget, "{:?}", mode);
    }
}

#[test]
fn test_graph_draw_reports_released_parameters() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let cache = sm5_cache();
    let stages = cache.get(CapabilityTier::Sm5).unwrap();
    let draw = request(&make_target("Canvas"), LinearColor::GREEN, SubmissionMode::Graph);

    let report = draw_with_graph(&mut device, stages, &draw).unwrap();

    assert_eq!(report.parameter_blocks_released, 1);
    assert_eq!(report.executed_passes, vec![DRAW_PASS_NAME.to_string()]);
    assert_eq!(report.transitions.len(), 2);
}

#[test]
fn test_failed_draw_keeps_tracked_access() {
    let _scope = RenderingThreadScope::enter();
    let cache = sm5_cache();

    for mode in [SubmissionMode::Immediate, SubmissionMode::Graph] {
        let mut device = MockGraphicsDevice::out_of_memory();
        let target = make_target("Canvas");

        let result = execute_draw_request(&mut device, &cache, TransitionPolicy::Explicit,
            request(&target, LinearColor::RED, mode));

        assert!(matches!(result, Err(Error::OutOfMemory)), "{:?}", mode);
        assert!(device.get_submitted_commands().is_empty(), "{:?}", mode);
        assert_eq!(target.current_access(), ResourceAccess::ShaderRead, "{:?}", mode);
    }
}

#[test]
fn test_both_modes_upload_the_same_parameters() {
    let _scope = RenderingThreadScope::enter();
    let color = LinearColor::new(0.1, 0.2, 0.3, 0.4);
    let cache = sm5_cache();

    let mut uploads = Vec::new();
    for mode in [SubmissionMode::Immediate, SubmissionMode::Graph] {
        let mut device = MockGraphicsDevice::new();
        execute_draw_request(&mut device, &cache, TransitionPolicy::Explicit,
            request(&make_target("Canvas"), color, mode)).unwrap();
        uploads.push(device.submitted_parameters.lock().unwrap().clone());
    }

    assert_eq!(uploads[0], uploads[1]);
    assert_eq!(uploads[0], vec![(ShaderStage::Fragment, bytemuck::bytes_of(&[0.1f32, 0.2, 0.3, 0.4]).to_vec())]);
}

#[test]
fn test_missing_capability_tier_fails_before_recording() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let mut draw = request(&make_target("Canvas"), LinearColor::RED, SubmissionMode::Immediate);
    draw.capability_tier = CapabilityTier::Es31;

    let result = execute_draw_request(&mut device, &sm5_cache(), TransitionPolicy::Explicit, draw);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(device.get_submitted_commands().is_empty());
    assert!(device.get_created_buffers().is_empty());
}

// ============================================================================
// Producer side
// ============================================================================

#[test]
fn test_draws_reach_device_in_order() {
    let device = MockGraphicsDevice::new();
    let parameters = Arc::clone(&device.submitted_parameters);
    let render_thread = Arc::new(RenderThread::spawn(Box::new(device), RenderThreadConfig::default()).unwrap());
    let context = RenderContext::new("test", CapabilityTier::Sm5, Arc::new(sm5_cache()), Arc::clone(&render_thread));
    let target = make_target("Canvas");

    draw_render_target(Some(&context), Some(&target), LinearColor::RED, false);
    draw_render_target(Some(&context), Some(&target), LinearColor::BLUE, true);
    let device = render_thread.shutdown().unwrap();

    let colors: Vec<Vec<u8>> = parameters.lock().unwrap().iter().map(|(_, bytes)| bytes.clone()).collect();
    assert_eq!(colors, vec![
        bytemuck::bytes_of(&LinearColor::RED.to_array()).to_vec(),
        bytemuck::bytes_of(&LinearColor::BLUE.to_array()).to_vec(),
    ]);
    assert_eq!(device.stats().draw_calls, 2);
    assert_eq!(device.stats().submissions, 2);
}

#[test]
#[serial]
fn test_missing_target_logs_once_and_enqueues_nothing() {
    let device = MockGraphicsDevice::new();
    let buffers = Arc::clone(&device.created_buffers);
    let render_thread = Arc::new(RenderThread::spawn(Box::new(device), RenderThreadConfig::default()).unwrap());
    let context = RenderContext::new("test", CapabilityTier::Sm5, Arc::new(sm5_cache()), Arc::clone(&render_thread));

    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: Arc::clone(&entries) });
    draw_render_target(Some(&context), None, LinearColor::RED, false);
    draw_render_target(None, Some(&make_target("Canvas")), LinearColor::RED, true);
    Engine::reset_logger();

    render_thread.shutdown().unwrap();

    let errors: Vec<_> = entries.lock().unwrap().iter()
        .filter(|(severity, source)| *severity == LogSeverity::Error && source == "rtp::draw")
        .cloned()
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(render_thread.executed_count(), 0);
    assert!(buffers.lock().unwrap().is_empty());
}

#[test]
#[serial]
fn test_uncompiled_tier_is_dropped_and_thread_keeps_running() {
    let render_thread = Arc::new(RenderThread::spawn(Box::new(MockGraphicsDevice::new()), RenderThreadConfig::default()).unwrap());
    let cache = Arc::new(sm5_cache());
    let es31 = RenderContext::new("es31", CapabilityTier::Es31, Arc::clone(&cache), Arc::clone(&render_thread));
    let sm5 = RenderContext::new("sm5", CapabilityTier::Sm5, cache, Arc::clone(&render_thread));
    let target = make_target("Canvas");

    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: Arc::clone(&entries) });
    draw_render_target(Some(&es31), Some(&target), LinearColor::RED, false);
    let result = enqueue_draw(&es31, request(&target, LinearColor::RED, SubmissionMode::Graph));
    Engine::reset_logger();

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(render_thread.is_running());
    draw_render_target(Some(&sm5), Some(&target), LinearColor::BLUE, false);

    assert!(render_thread.shutdown().is_ok());
    assert_eq!(render_thread.executed_count(), 1);
    let errors = entries.lock().unwrap().iter()
        .filter(|(severity, source)| *severity == LogSeverity::Error && source == "rtp::draw")
        .count();
    assert_eq!(errors, 2);
}

#[test]
fn test_enqueue_after_shutdown_reports_error() {
    let render_thread = Arc::new(RenderThread::spawn(Box::new(MockGraphicsDevice::new()), RenderThreadConfig::default()).unwrap());
    let context = RenderContext::new("test", CapabilityTier::Sm5, Arc::new(sm5_cache()), Arc::clone(&render_thread));
    render_thread.shutdown().unwrap();

    let result = enqueue_draw(&context, request(&make_target("Canvas"), LinearColor::RED, SubmissionMode::Immediate));
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_context_defaults_to_explicit_transitions() {
    let render_thread = Arc::new(RenderThread::spawn(Box::new(MockGraphicsDevice::new()), RenderThreadConfig::default()).unwrap());
    let context = RenderContext::new("ctx", CapabilityTier::Sm6, Arc::new(ShaderCache::new()), render_thread);

    assert_eq!(context.transition_policy(), TransitionPolicy::Explicit);
    let context = context.with_transition_policy(TransitionPolicy::None);
    assert_eq!(context.transition_policy(), TransitionPolicy::None);
    assert_eq!(context.capability_tier(), CapabilityTier::Sm6);
    assert_eq!(context.name(), "ctx");
}
