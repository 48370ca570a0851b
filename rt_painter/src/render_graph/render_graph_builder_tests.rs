/// Unit tests for RenderGraphBuilder

use super::*;
use std::cell::{Cell, RefCell};
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockTexture};
use crate::graphics_device::{AttachmentActions, TextureFormat, TextureInfo, TextureUsage};
use crate::render_thread::RenderingThreadScope;

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct TestParameters {
    target: Option<GraphTextureHandle>,
    reads: Vec<GraphTextureHandle>,
}

impl PassParameters for TestParameters {
    fn declare(&self, dependencies: &mut PassDependencies) {
        if let Some(target) = self.target {
            dependencies.write_render_target(target, AttachmentActions::LOAD_STORE);
        }
        for read in &self.reads {
            dependencies.read_texture(*read);
        }
    }
}

fn make_target(name: &str, access: ResourceAccess) -> Arc<RenderTargetResource> {
    let info = TextureInfo {
        width: 64,
        height: 32,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::SampledAndRenderTarget,
    };
    let texture: Arc<dyn Texture> = Arc::new(MockTexture::new(info, name.to_string()));
    Arc::new(RenderTargetResource::new(name, texture, access).unwrap())
}

fn raster_parameters(builder: &RenderGraphBuilder<'_>, target: GraphTextureHandle) -> GraphParameters<TestParameters> {
    let mut parameters = builder.allocate_parameters::<TestParameters>();
    parameters.target = Some(target);
    parameters
}

// ============================================================================
// Deferred execution and ordering
// ============================================================================

#[test]
fn test_passes_are_deferred_until_execute() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let ran = Cell::new(false);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let parameters = raster_parameters(&builder, handle);
    builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| {
        ran.set(true);
        Ok(())
    }).unwrap();

    assert!(!ran.get());
    assert_eq!(builder.pass_count(), 1);

    builder.execute(&mut device).unwrap();
    assert!(ran.get());
}

#[test]
fn test_passes_run_in_declaration_order() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::RenderTarget);
    let order = RefCell::new(Vec::new());

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    for name in ["First", "Second", "Third"] {
        let parameters = raster_parameters(&builder, handle);
        let order = &order;
        builder.add_pass(name, parameters, PassFlags::RASTER, move |_params, ctx| {
            order.borrow_mut().push(ctx.pass_name.to_string());
            Ok(())
        }).unwrap();
    }

    let report = builder.execute(&mut device).unwrap();
    assert_eq!(*order.borrow(), vec!["First", "Second", "Third"]);
    assert_eq!(report.executed_passes, vec!["First", "Second", "Third"]);
}

#[test]
fn test_pass_receives_its_parameters_and_target() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let seen = RefCell::new(None);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let parameters = raster_parameters(&builder, handle);
    builder.add_pass("Draw", parameters, PassFlags::RASTER, |params, ctx| {
        let bound = ctx.render_target.as_ref().map(|rt| rt.name().to_string());
        *seen.borrow_mut() = Some((params.target, bound, ctx.render_target.as_ref().map(|rt| rt.current_access())));
        Ok(())
    }).unwrap();
    builder.execute(&mut device).unwrap();

    let (declared, bound, access) = seen.borrow().clone().unwrap();
    assert_eq!(declared, Some(handle));
    assert_eq!(bound.as_deref(), Some("Target"));
    assert_eq!(access, Some(ResourceAccess::RenderTarget));
}

#[test]
fn test_parameter_blocks_released_after_execute() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::RenderTarget);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    for name in ["A", "B"] {
        let parameters = raster_parameters(&builder, handle);
        builder.add_pass(name, parameters, PassFlags::RASTER, |_params, _ctx| Ok(())).unwrap();
    }
    assert_eq!(builder.live_parameter_blocks(), 2);

    let report = builder.execute(&mut device).unwrap();
    assert_eq!(report.parameter_blocks_released, 2);
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn test_raster_pass_transitions_and_restores_target() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::ShaderRead);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let parameters = raster_parameters(&builder, handle);
    builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| Ok(())).unwrap();
    let report = builder.execute(&mut device).unwrap();

    assert_eq!(device.get_submitted_commands(), vec![
        "begin",
        "begin_event:Draw",
        "transition:ShaderRead->RenderTarget",
        "begin_render_pass:Draw:Load/Store",
        "end_render_pass",
        "end_event",
        "transition:RenderTarget->ShaderRead",
        "end",
    ]);
    assert_eq!(report.transitions.len(), 2);
    assert_eq!(report.transitions[0].texture, "Target");
    assert_eq!(target.current_access(), ResourceAccess::ShaderRead);
}

#[test]
fn test_no_transition_when_access_already_matches() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::RenderTarget);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let parameters = raster_parameters(&builder, handle);
    builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| Ok(())).unwrap();
    let report = builder.execute(&mut device).unwrap();

    assert!(report.transitions.is_empty());
    assert!(!device.get_submitted_commands().iter().any(|c| c.starts_with("transition")));
}

#[test]
fn test_unknown_initial_access_is_not_restored() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::Unknown);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let parameters = raster_parameters(&builder, handle);
    builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| Ok(())).unwrap();
    let report = builder.execute(&mut device).unwrap();

    assert_eq!(report.transitions, vec![RecordedTransition {
        texture: "Target".to_string(),
        before: ResourceAccess::Unknown,
        after: ResourceAccess::RenderTarget,
    }]);
    assert_eq!(target.current_access(), ResourceAccess::RenderTarget);
}

#[test]
fn test_read_dependency_moves_texture_to_shader_read() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let output = make_target("Output", ResourceAccess::RenderTarget);
    let input = make_target("Input", ResourceAccess::RenderTarget);

    let mut builder = RenderGraphBuilder::new();
    let output_handle = builder.register_external_texture(&output);
    let input_handle = builder.register_external_texture(&input);
    let mut parameters = raster_parameters(&builder, output_handle);
    parameters.reads.push(input_handle);
    builder.add_pass("Composite", parameters, PassFlags::RASTER, |_params, _ctx| Ok(())).unwrap();
    let report = builder.execute(&mut device).unwrap();

    let input_transitions: Vec<_> = report.transitions.iter()
        .filter(|t| t.texture == "Input")
        .map(|t| (t.before, t.after))
        .collect();
    assert_eq!(input_transitions, vec![
        (ResourceAccess::RenderTarget, ResourceAccess::ShaderRead),
        (ResourceAccess::ShaderRead, ResourceAccess::RenderTarget),
    ]);
    assert_eq!(input.current_access(), ResourceAccess::RenderTarget);
}

#[test]
fn test_compute_pass_opens_no_render_pass() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let input = make_target("Input", ResourceAccess::ShaderRead);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&input);
    let mut parameters = builder.allocate_parameters::<TestParameters>();
    parameters.reads.push(handle);
    builder.add_pass("Reduce", parameters, PassFlags::COMPUTE, |_params, ctx| {
        assert!(ctx.render_target.is_none());
        Ok(())
    }).unwrap();
    builder.execute(&mut device).unwrap();

    assert!(!device.get_submitted_commands().iter().any(|c| c.starts_with("begin_render_pass")));
}

// ============================================================================
// Declaration errors
// ============================================================================

#[test]
fn test_raster_pass_without_render_target_rejected() {
    let mut builder = RenderGraphBuilder::new();
    let parameters = builder.allocate_parameters::<TestParameters>();

    let result = builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| Ok(()));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(builder.pass_count(), 0);
    assert_eq!(builder.live_parameter_blocks(), 0);
}

#[test]
fn test_non_raster_pass_with_render_target_rejected() {
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let parameters = raster_parameters(&builder, handle);

    let result = builder.add_pass("Copy", parameters, PassFlags::COPY, |_params, _ctx| Ok(()));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_foreign_parameter_block_rejected() {
    let other = RenderGraphBuilder::new();
    let parameters = other.allocate_parameters::<TestParameters>();

    let mut builder = RenderGraphBuilder::new();
    let result = builder.add_pass("Reduce", parameters, PassFlags::COMPUTE, |_params, _ctx| Ok(()));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_foreign_texture_handle_rejected() {
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let mut other = RenderGraphBuilder::new();
    let foreign = other.register_external_texture(&target);

    let mut slot = None;
    let mut builder = RenderGraphBuilder::new();
    let parameters = raster_parameters(&builder, foreign);
    let result = builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| Ok(()));
    assert!(matches!(result, Err(Error::InvalidResource(_))));

    assert!(builder.queue_texture_extraction(foreign, &mut slot).is_err());
}

#[test]
fn test_register_same_target_twice_returns_same_handle() {
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let mut builder = RenderGraphBuilder::new();

    let first = builder.register_external_texture(&target);
    let second = builder.register_external_texture(&target);
    assert_eq!(first, second);
    assert_eq!(builder.texture_count(), 1);
    assert_eq!(first.graph_id(), builder.graph_id());
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_extraction_slot_filled_after_execute() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let mut extracted: Option<Arc<dyn Texture>> = None;

    {
        let mut builder = RenderGraphBuilder::new();
        let handle = builder.register_external_texture(&target);
        let parameters = raster_parameters(&builder, handle);
        builder.add_pass("Draw", parameters, PassFlags::RASTER, |_params, _ctx| Ok(())).unwrap();
        builder.queue_texture_extraction(handle, &mut extracted).unwrap();
        builder.execute(&mut device).unwrap();
    }

    let extracted = extracted.unwrap();
    assert!(Arc::ptr_eq(&extracted, target.texture()));
}

#[test]
fn test_pass_error_aborts_execution() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::RenderTarget);
    let second_ran = Cell::new(false);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let failing = raster_parameters(&builder, handle);
    builder.add_pass("Fail", failing, PassFlags::RASTER, |_params, _ctx| {
        Err(Error::BackendError("pipeline lost".to_string()))
    }).unwrap();
    let next = raster_parameters(&builder, handle);
    builder.add_pass("Next", next, PassFlags::RASTER, |_params, _ctx| {
        second_ran.set(true);
        Ok(())
    }).unwrap();

    assert!(builder.execute(&mut device).is_err());
    assert!(!second_ran.get());
    assert!(device.get_submitted_commands().is_empty());
}

#[test]
fn test_failed_execution_rolls_back_tracked_access() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();
    let target = make_target("Target", ResourceAccess::ShaderRead);
    let access_in_pass = Cell::new(ResourceAccess::Unknown);

    let mut builder = RenderGraphBuilder::new();
    let handle = builder.register_external_texture(&target);
    let failing = raster_parameters(&builder, handle);
    builder.add_pass("Fail", failing, PassFlags::RASTER, |_params, ctx| {
        if let Some(resource) = &ctx.render_target {
            access_in_pass.set(resource.current_access());
        }
        Err(Error::BackendError("pipeline lost".to_string()))
    }).unwrap();

    assert!(builder.execute(&mut device).is_err());
    assert_eq!(access_in_pass.get(), ResourceAccess::RenderTarget);
    assert_eq!(target.current_access(), ResourceAccess::ShaderRead);
    assert!(device.get_submitted_commands().is_empty());
}

#[test]
fn test_empty_graph_submits_empty_list() {
    let _scope = RenderingThreadScope::enter();
    let mut device = MockGraphicsDevice::new();

    let report = RenderGraphBuilder::new().execute(&mut device).unwrap();
    assert!(report.executed_passes.is_empty());
    assert_eq!(device.get_submitted_commands(), vec!["begin", "end"]);
}

#[test]
#[should_panic(expected = "rendering thread")]
fn test_execute_off_rendering_thread_panics() {
    let mut device = MockGraphicsDevice::new();
    let _ = RenderGraphBuilder::new().execute(&mut device);
}
