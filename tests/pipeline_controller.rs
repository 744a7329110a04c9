//! Controller behaviour against a recording compositor: chain shape,
//! parameter isolation, size/image propagation, reset, swaps, export and
//! render coalescing.

use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use proptest::prelude::*;

use shaderfx::compositor::{Compositor, Scene};
use shaderfx::effects::catalog::{ANISOTROPIC_KUWAHARA, EDGE_BOOST, GAMMA, LEVELS};
use shaderfx::effects::{EffectDescriptor, EffectId, ImageHandle, ParamSet, ParamTemplate, ParamValue};
use shaderfx::export::{EXPORT_FILE_NAME, ExportSink};
use shaderfx::io::{ImageLoader, LoadResult};
use shaderfx::panel::{Control, PanelEvent, ParamTarget, SETTINGS_LABEL};
use shaderfx::pipelines::{PipelineDescriptor, PipelineId, Registry};
use shaderfx::scheduler::RenderScheduler;
use shaderfx::{PipelineController, PipelineError};

// ----------------------------------------------------------------------------
// Test doubles
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
enum Pass {
    Scene(u64),
    Effect(u64, EffectId),
}

impl Pass {
    fn id(&self) -> u64 {
        match self {
            Pass::Scene(id) | Pass::Effect(id, _) => *id,
        }
    }
}

#[derive(Default)]
struct Recording {
    next_id: u64,
    chain: Vec<Pass>,
    released: Vec<u64>,
    resizes: Vec<(u32, u32)>,
    executes: usize,
    last_params: Vec<ParamSet>,
    last_scene: Option<Scene>,
    fail_on: Option<EffectId>,
}

impl Recording {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Compositor for Recording {
    type Pass = Pass;

    fn scene_pass(&mut self) -> Pass {
        Pass::Scene(self.next())
    }

    fn effect_pass(&mut self, effect: &'static EffectDescriptor) -> shaderfx::Result<Pass> {
        if self.fail_on == Some(effect.id) {
            return Err(PipelineError::ShaderCompile { effect: effect.id.as_str(), message: "rejected".into() });
        }
        Ok(Pass::Effect(self.next(), effect.id))
    }

    fn set_passes(&mut self, passes: Vec<Pass>) {
        let old: Vec<u64> = self.chain.drain(..).map(|p| p.id()).collect();
        self.released.extend(old);
        self.chain = passes;
    }

    fn pass_count(&self) -> usize {
        self.chain.len()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn execute(&mut self, scene: &Scene, params: &[&ParamSet]) {
        self.executes += 1;
        self.last_params = params.iter().map(|p| (*p).clone()).collect();
        self.last_scene = Some(scene.clone());
    }

    fn read_frame(&mut self) -> shaderfx::Result<RgbaImage> {
        if self.executes == 0 {
            return Err(PipelineError::Readback("nothing rendered".into()));
        }
        let (w, h) = self.resizes.last().copied().unwrap_or((1, 1));
        Ok(RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255])))
    }
}

#[derive(Default)]
struct RecordingSink {
    saves: Vec<(String, Vec<u8>)>,
}

impl ExportSink for RecordingSink {
    fn save(&mut self, file_name: &str, png: &[u8]) -> shaderfx::Result<()> {
        self.saves.push((file_name.to_string(), png.to_vec()));
        Ok(())
    }
}

type TestController = PipelineController<Recording, RecordingSink>;

fn controller_with(registry: Registry, initial: PipelineId) -> TestController {
    PipelineController::new(registry, Recording::default(), RecordingSink::default(), initial)
}

fn builtin(initial: PipelineId) -> TestController {
    let mut c = controller_with(Registry::builtin(), initial);
    c.initialize().unwrap();
    c
}

fn size_of(params: &ParamSet, name: &str) -> Option<(f32, f32)> {
    params.get(name).and_then(|p| p.value.as_size())
}

// ----------------------------------------------------------------------------
// Custom descriptors
// ----------------------------------------------------------------------------

static SIZED: EffectDescriptor = EffectDescriptor {
    id: EffectId::Sharpen,
    label: "Sized",
    vertex: "",
    fragment: "",
    params: &[
        ParamTemplate::chain_input("tDiffuse"),
        ParamTemplate::viewport_size("resolution"),
        ParamTemplate::tunable("strength", 1.0),
    ],
    bind_panel: None,
};

static EXAMPLE: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::Dreamy,
    label: "X",
    effects: &[&SIZED, &GAMMA],
};

static DOUBLE_GAMMA: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::LensSwirl,
    label: "Double gamma",
    effects: &[&GAMMA, &GAMMA],
};

static EMPTY: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::Ryuukishi,
    label: "Passthrough",
    effects: &[],
};

static WITH_INPUT: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::Painterly,
    label: "Input readers",
    effects: &[&LEVELS, &ANISOTROPIC_KUWAHARA, &EDGE_BOOST],
};

// ----------------------------------------------------------------------------
// Build shape
// ----------------------------------------------------------------------------

#[test]
fn chain_is_scene_plus_one_pass_per_effect() {
    for id in PipelineId::ALL {
        let c = builtin(id);
        let descriptor = c.registry().get(id).unwrap();
        let chain = &c.compositor().chain;
        assert_eq!(chain.len(), 1 + descriptor.effects.len(), "{}", id);
        assert!(matches!(chain[0], Pass::Scene(_)));
        for (pass, effect) in chain[1..].iter().zip(descriptor.effects) {
            assert!(matches!(pass, Pass::Effect(_, e) if *e == effect.id));
        }
        assert_eq!(c.passes().len(), descriptor.effects.len());
        assert_eq!(c.selected(), id);
    }
}

#[test]
fn build_renders_once() {
    let c = builtin(PipelineId::LensSwirl);
    assert_eq!(c.compositor().executes, 1);
    assert_eq!(c.frames_rendered(), 1);
    assert_eq!(c.compositor().last_params.len(), 2);
}

#[test]
fn empty_pipeline_is_just_the_scene() {
    let mut c = controller_with(Registry::from_descriptors([&EMPTY]), PipelineId::Ryuukishi);
    c.initialize().unwrap();
    assert_eq!(c.compositor().chain.len(), 1);
    assert!(c.passes().is_empty());
    let settings = c.panel().section(SETTINGS_LABEL).unwrap();
    assert_eq!(settings.controls.len(), 1, "only the reset action");
}

// ----------------------------------------------------------------------------
// Worked example
// ----------------------------------------------------------------------------

#[test]
fn worked_example() {
    let mut c = controller_with(Registry::from_descriptors([&EXAMPLE]), PipelineId::Dreamy);
    c.select_pipeline(PipelineId::Dreamy).unwrap();
    assert_eq!(c.compositor().chain.len(), 3);

    c.set_size(640, 480);
    assert_eq!(size_of(&c.passes()[0].params, "resolution"), Some((640.0, 480.0)));

    assert!(c.passes_mut()[0].params.set_scalar("strength", 5.0));
    c.reset_parameters_to_defaults();
    assert_eq!(c.passes()[0].params.scalar("strength"), Some(1.0));
    assert_eq!(size_of(&c.passes()[0].params, "resolution"), Some((640.0, 480.0)));
}

// ----------------------------------------------------------------------------
// Isolation
// ----------------------------------------------------------------------------

#[test]
fn duplicate_effects_have_independent_parameters() {
    let mut c = controller_with(Registry::from_descriptors([&DOUBLE_GAMMA]), PipelineId::LensSwirl);
    c.initialize().unwrap();
    assert!(c.set_param(ParamTarget { pass: 0, name: "gamma" }, 2.0));

    assert_eq!(c.passes()[0].params.scalar("gamma"), Some(2.0));
    assert_eq!(c.passes()[1].params.scalar("gamma"), Some(0.6));
    assert_eq!(GAMMA.default_param("gamma").map(|p| p.default), Some(shaderfx::effects::TemplateValue::Scalar(0.6)));
}

#[test]
fn rebuild_starts_from_authored_defaults() {
    let mut c = builtin(PipelineId::LensSwirl);
    let last = c.passes().len() - 1;
    c.set_param(ParamTarget { pass: last, name: "gamma" }, 1.9);
    c.select_pipeline(PipelineId::Ryuukishi).unwrap();
    c.select_pipeline(PipelineId::LensSwirl).unwrap();
    assert_eq!(c.passes()[last].params.scalar("gamma"), Some(0.6));
}

proptest! {
    #[test]
    fn edits_never_leak_between_passes(value in -10.0f32..10.0, which in 0usize..2) {
        let mut c = controller_with(Registry::from_descriptors([&DOUBLE_GAMMA]), PipelineId::LensSwirl);
        c.initialize().unwrap();
        let target = ParamTarget { pass: which, name: "gamma" };
        let written = c.set_param(target, value);
        prop_assert!(written);
        prop_assert_eq!(c.passes()[which].params.scalar("gamma"), Some(value));
        prop_assert_eq!(c.passes()[1 - which].params.scalar("gamma"), Some(0.6));
        prop_assert_eq!(GAMMA.instantiate_params().scalar("gamma"), Some(0.6));
    }
}

// ----------------------------------------------------------------------------
// Size and image propagation
// ----------------------------------------------------------------------------

#[test]
fn size_survives_pipeline_swaps() {
    let mut c = builtin(PipelineId::AnisotropicKuwahara);
    c.set_size(320, 200);
    for live in c.passes() {
        if let Some(size) = size_of(&live.params, "resolution") {
            assert_eq!(size, (320.0, 200.0), "{}", live.effect.id);
        }
    }

    c.select_pipeline(PipelineId::LensSwirl).unwrap();
    let sized: Vec<_> = c.passes().iter().filter_map(|p| size_of(&p.params, "resolution")).collect();
    assert!(!sized.is_empty());
    assert!(sized.iter().all(|s| *s == (320.0, 200.0)));
    assert_eq!(c.compositor().resizes.last(), Some(&(320, 200)));
    assert_eq!(c.size(), (320, 200));
}

#[test]
fn size_is_skipped_for_passes_without_a_size_parameter() {
    let mut c = builtin(PipelineId::Ryuukishi);
    c.set_size(99, 77);
    for live in c.passes() {
        assert!(live.params.iter().all(|p| !matches!(p.value, ParamValue::Size { .. })));
    }
}

#[test]
fn image_is_bound_before_and_after_swaps() {
    let image = ImageHandle::new(RgbaImage::from_pixel(4, 2, Rgba([9, 9, 9, 255])));
    let mut c = controller_with(
        Registry::from_descriptors([&WITH_INPUT, &DOUBLE_GAMMA]),
        PipelineId::LensSwirl,
    );
    c.set_input_image(Some(image.clone()));
    c.initialize().unwrap();
    c.select_pipeline(PipelineId::Painterly).unwrap();

    let bound: Vec<_> = c.passes().iter().filter_map(|p| p.params.input_image()).collect();
    assert_eq!(bound.len(), 2, "Kuwahara and edge boost read the input");
    assert!(bound.iter().all(|h| **h == image));
    assert_eq!(c.passes()[0].params.input_image(), None);
    assert_eq!(c.scene().image.as_ref(), Some(&image));

    // Clearing the image empties the slots.
    c.set_input_image(None);
    assert!(c.passes().iter().all(|p| p.params.input_image().is_none()));
    assert!(c.scene().image.is_none());
}

// ----------------------------------------------------------------------------
// Reset
// ----------------------------------------------------------------------------

#[test]
fn reset_restores_tunables_only_and_renders() {
    let image = ImageHandle::new(RgbaImage::new(8, 8));
    let mut c = builtin(PipelineId::AnisotropicKuwahara);
    c.set_size(100, 50);
    c.set_input_image(Some(image.clone()));
    let kuwahara = c.passes().iter().position(|p| p.effect.id == EffectId::AnisotropicKuwahara).unwrap();
    let gamma = c.passes().len() - 1;
    c.set_param(ParamTarget { pass: gamma, name: "gamma" }, 2.2);

    let before = c.frames_rendered();
    c.reset_parameters_to_defaults();
    assert_eq!(c.frames_rendered(), before + 1);
    assert_eq!(c.passes()[gamma].params.scalar("gamma"), Some(0.6));
    assert_eq!(size_of(&c.passes()[kuwahara].params, "resolution"), Some((100.0, 50.0)));
    assert_eq!(c.passes()[kuwahara].params.input_image(), Some(&image));

    // The panel shows the restored value.
    let shown = c.panel().sliders().find(|(_, t, _)| t.pass == gamma).map(|(_, _, v)| v);
    assert_eq!(shown, Some(0.6));
}

// ----------------------------------------------------------------------------
// Swap cleanup
// ----------------------------------------------------------------------------

#[test]
fn swaps_never_leak_passes() {
    let mut c = builtin(PipelineId::AnisotropicKuwahara);
    let first: Vec<u64> = c.compositor().chain.iter().map(Pass::id).collect();
    let first_panel = c.panel().generation();

    c.select_pipeline(PipelineId::LensSwirl).unwrap();
    c.select_pipeline(PipelineId::Ryuukishi).unwrap();

    let chain = &c.compositor().chain;
    assert_eq!(chain.len(), 1 + 2);
    assert_eq!(c.passes().len(), 2);
    assert!(first.iter().all(|id| c.compositor().released.contains(id)));
    assert!(chain.iter().all(|p| !c.compositor().released.contains(&p.id())));
    assert!(c.panel().generation() > first_panel);
    assert!(!c.panel().is_destroyed());
}

#[test]
fn unknown_pipeline_propagates_and_keeps_state() {
    let mut c = controller_with(Registry::from_descriptors([&DOUBLE_GAMMA]), PipelineId::LensSwirl);
    c.initialize().unwrap();
    let chain = c.compositor().chain.clone();

    let err = c.select_pipeline(PipelineId::Dreamy).unwrap_err();
    assert_eq!(err, PipelineError::UnknownPipeline("dreamy".into()));
    assert_eq!(c.compositor().chain, chain);
    assert_eq!(c.selected(), PipelineId::LensSwirl);
}

#[test]
fn compile_failure_leaves_a_scene_only_chain() {
    let mut compositor = Recording::default();
    compositor.fail_on = Some(EffectId::Sharpen);
    let mut c = PipelineController::new(Registry::builtin(), compositor, RecordingSink::default(), PipelineId::LensSwirl);
    c.initialize().unwrap();

    c.set_size(64, 48);
    let image = ImageHandle::new(RgbaImage::new(2, 2));
    c.set_input_image(Some(image.clone()));
    let rendered = c.frames_rendered();

    let err = c.select_pipeline(PipelineId::Ryuukishi).unwrap_err();
    assert!(matches!(err, PipelineError::ShaderCompile { effect: "sharpen", .. }));
    assert_eq!(c.compositor().chain.len(), 1);
    assert!(c.passes().is_empty());
    assert_eq!(c.selected(), PipelineId::LensSwirl);
    assert_eq!(c.built(), None);

    // The scene-only chain is sized, shows the image and is on screen.
    assert_eq!(c.frames_rendered(), rendered + 1);
    assert_eq!(c.compositor().resizes.last(), Some(&(64, 48)));
    assert_eq!(c.compositor().last_scene.as_ref().and_then(|s| s.image.as_ref()), Some(&image));
    assert!(c.compositor().last_params.is_empty());
}

#[test]
fn previous_pipeline_can_be_rebuilt_after_a_compile_failure() {
    let now = Instant::now();
    let mut compositor = Recording::default();
    compositor.fail_on = Some(EffectId::Sharpen);
    let mut c = PipelineController::new(Registry::builtin(), compositor, RecordingSink::default(), PipelineId::LensSwirl);
    c.initialize().unwrap();
    assert_eq!(c.built(), Some(PipelineId::LensSwirl));

    assert!(c.handle_event(PanelEvent::SelectPipeline(PipelineId::Ryuukishi), now).is_err());

    // The selector shows the failed choice, so picking the old one is a change.
    let shown = c.panel().controls().iter().find_map(|ctl| match ctl {
        Control::Selector { selected, .. } => Some(*selected),
        _ => None,
    });
    assert_eq!(shown, Some(PipelineId::Ryuukishi));

    c.handle_event(PanelEvent::SelectPipeline(PipelineId::LensSwirl), now).unwrap();
    assert_eq!(c.compositor().chain.len(), 3);
    assert_eq!(c.passes().len(), 2);
    assert_eq!(c.built(), Some(PipelineId::LensSwirl));
    assert_eq!(c.selected(), PipelineId::LensSwirl);
}

#[test]
fn failed_decode_leaves_image_and_chain_untouched() {
    let image = ImageHandle::new(RgbaImage::from_pixel(3, 3, Rgba([7, 7, 7, 255])));
    let mut c = controller_with(Registry::builtin(), PipelineId::AnisotropicKuwahara);
    c.set_input_image(Some(image.clone()));
    c.initialize().unwrap();
    let chain = c.compositor().chain.clone();
    let rendered = c.frames_rendered();

    let mut loader = ImageLoader::new();
    loader.request("/definitely/not/here.png".into());
    let deadline = Instant::now() + Duration::from_secs(5);
    let result = loop {
        if let Some(r) = loader.poll() {
            break r;
        }
        assert!(Instant::now() < deadline, "loader never answered");
        std::thread::sleep(Duration::from_millis(5));
    };

    assert!(c.apply_load_result(result).is_err());
    assert_eq!(c.input_image(), Some(&image));
    assert_eq!(c.scene().image.as_ref(), Some(&image));
    assert_eq!(c.compositor().chain, chain);
    assert_eq!(c.frames_rendered(), rendered);
}

#[test]
fn successful_decode_binds_and_renders() {
    let image = ImageHandle::new(RgbaImage::new(5, 5));
    let mut c = builtin(PipelineId::AnisotropicKuwahara);
    let rendered = c.frames_rendered();

    let result = LoadResult { path: "in.png".into(), image: Ok(image.clone()) };
    assert_eq!(c.apply_load_result(result).unwrap(), image);
    assert_eq!(c.input_image(), Some(&image));
    assert_eq!(c.frames_rendered(), rendered + 1);
}

// ----------------------------------------------------------------------------
// Export
// ----------------------------------------------------------------------------

#[test]
fn export_forces_a_render_and_saves_png() {
    let mut c = builtin(PipelineId::LensSwirl);
    c.set_size(6, 4);
    let before = c.frames_rendered();
    c.export_image().unwrap();
    assert_eq!(c.frames_rendered(), before + 1);

    let (name, png) = &c.sink().saves[0];
    assert_eq!(name, EXPORT_FILE_NAME);
    assert_eq!(name, "screenshot.png");
    let decoded = image::load_from_memory(png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (6, 4));
}

// ----------------------------------------------------------------------------
// Panel events and coalescing
// ----------------------------------------------------------------------------

#[test]
fn slider_edits_coalesce_into_one_render() {
    let t0 = Instant::now();
    let mut c = controller_with(Registry::builtin(), PipelineId::Ryuukishi)
        .with_scheduler(RenderScheduler::new(Duration::from_millis(10)));
    c.initialize().unwrap();
    let rendered = c.frames_rendered();

    for (i, v) in [0.1, 0.2, 0.3].into_iter().enumerate() {
        let target = ParamTarget { pass: 0, name: "levelBlack" };
        c.handle_event(PanelEvent::ParamEdited { target, value: v }, t0 + Duration::from_millis(i as u64)).unwrap();
    }
    assert_eq!(c.frames_rendered(), rendered, "edits only schedule");
    assert!(!c.tick(t0 + Duration::from_millis(5)));
    assert!(c.tick(t0 + Duration::from_millis(10)));
    assert!(!c.tick(t0 + Duration::from_millis(30)));
    assert_eq!(c.frames_rendered(), rendered + 1);
    assert_eq!(c.compositor().last_params[0].scalar("levelBlack"), Some(0.3));
}

#[test]
fn immediate_render_supersedes_pending_one() {
    let t0 = Instant::now();
    let mut c = builtin(PipelineId::LensSwirl);
    let gamma = c.passes().len() - 1;
    c.handle_event(PanelEvent::ParamEdited { target: ParamTarget { pass: gamma, name: "gamma" }, value: 1.0 }, t0)
        .unwrap();
    assert!(c.scheduler().is_pending());
    c.render();
    assert!(!c.scheduler().is_pending());
    assert!(!c.tick(t0 + Duration::from_secs(1)));
}

#[test]
fn selector_event_rebuilds_only_on_change() {
    let now = Instant::now();
    let mut c = builtin(PipelineId::LensSwirl);
    let generation = c.panel().generation();

    c.handle_event(PanelEvent::SelectPipeline(PipelineId::LensSwirl), now).unwrap();
    assert_eq!(c.panel().generation(), generation);

    c.handle_event(PanelEvent::SelectPipeline(PipelineId::Dreamy), now).unwrap();
    assert_eq!(c.selected(), PipelineId::Dreamy);
    assert!(c.panel().generation() > generation);
}

#[test]
fn reset_and_export_events() {
    let now = Instant::now();
    let mut c = builtin(PipelineId::Ryuukishi);
    c.set_param(ParamTarget { pass: 0, name: "levelWhite" }, 0.5);
    c.handle_event(PanelEvent::Reset, now).unwrap();
    assert_eq!(c.passes()[0].params.scalar("levelWhite"), Some(0.8));

    c.handle_event(PanelEvent::Export, now).unwrap();
    assert_eq!(c.sink().saves.len(), 1);
}

#[test]
fn unknown_slider_target_is_ignored() {
    let now = Instant::now();
    let mut c = builtin(PipelineId::Ryuukishi);
    let target = ParamTarget { pass: 42, name: "levelWhite" };
    c.handle_event(PanelEvent::ParamEdited { target, value: 0.5 }, now).unwrap();
    assert!(!c.scheduler().is_pending());
}
