// ============================================================================
// PIPELINE CONTROLLER — owns the live chain and keeps it consistent
// ============================================================================
//
// Three inputs change independently: the selected pipeline, the viewport
// size and the input image.  The controller remembers the last size and
// image so that every rebuild of the chain starts from the current values,
// and pushes updates into the live passes by parameter role.
//
// Rebuild order (select_pipeline):
//   1. resolve the descriptor (UnknownPipeline propagates)
//   2. release the old panel, chain and live passes
//   3. scene pass + one freshly compiled pass per effect
//   4. new control panel
//   5. re-apply size and image
//   6. render
//
// A failed compile still runs 5 and 6 over a scene-only chain, and leaves
// no pipeline built so that any later selection rebuilds.
// ============================================================================

use std::time::Instant;

use crate::compositor::{Compositor, Scene};
use crate::effects::{EffectDescriptor, ImageHandle, ParamSet};
use crate::error::Result;
use crate::export::{EXPORT_FILE_NAME, ExportSink, encode_png};
use crate::io::LoadResult;
use crate::panel::{ControlPanel, PanelEvent, ParamTarget};
use crate::pipelines::{PipelineId, Registry};
use crate::scheduler::RenderScheduler;
use crate::{log_err, log_info, log_warn};

/// One effect of the built pipeline: descriptor, its own parameters and the
/// compositor pass that runs it.
#[derive(Debug, Clone)]
pub struct LivePass<P> {
    pub effect: &'static EffectDescriptor,
    pub params: ParamSet,
    pub pass: P,
}

pub struct PipelineController<C: Compositor, S: ExportSink> {
    registry: Registry,
    compositor: C,
    sink: S,
    selected: PipelineId,
    /// Pipeline whose chain is live.  `None` before the first build and after
    /// a failed one.
    built: Option<PipelineId>,
    /// Selector value of the current panel.
    shown: PipelineId,
    passes: Vec<LivePass<C::Pass>>,
    size: (u32, u32),
    scene: Scene,
    image: Option<ImageHandle>,
    panel: ControlPanel,
    generation: u64,
    scheduler: RenderScheduler,
    frames: u64,
}

impl<C: Compositor, S: ExportSink> PipelineController<C, S> {
    /// Bind a controller to a compositor.  Nothing is built until
    /// [`initialize`](Self::initialize).
    pub fn new(registry: Registry, compositor: C, sink: S, initial: PipelineId) -> Self {
        Self {
            registry,
            compositor,
            sink,
            selected: initial,
            built: None,
            shown: initial,
            passes: Vec::new(),
            size: (1, 1),
            scene: Scene::default(),
            image: None,
            panel: ControlPanel::empty(),
            generation: 0,
            scheduler: RenderScheduler::default(),
            frames: 0,
        }
    }

    pub fn with_scheduler(mut self, scheduler: RenderScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// First pipeline build.
    pub fn initialize(&mut self) -> Result<()> {
        self.select_pipeline(self.selected)
    }

    /// Tear down the current chain and build `id` from scratch.
    pub fn select_pipeline(&mut self, id: PipelineId) -> Result<()> {
        let descriptor = self.registry.get(id)?;

        self.panel.destroy();
        self.compositor.set_passes(Vec::new());
        self.passes.clear();
        self.built = None;
        self.shown = id;

        let scene_pass = self.compositor.scene_pass();
        let mut live = Vec::with_capacity(descriptor.effects.len());
        for &effect in descriptor.effects {
            match self.compositor.effect_pass(effect) {
                Ok(pass) => live.push(LivePass { effect, params: effect.instantiate_params(), pass }),
                Err(e) => {
                    log_err!("pipeline '{}': {}", id, e);
                    self.compositor.set_passes(vec![scene_pass]);
                    self.generation += 1;
                    // The selector shows the failed choice so that picking
                    // any pipeline, the previous one included, is an edit.
                    self.panel = ControlPanel::build::<C::Pass>(self.generation, &self.registry, id, &[]);
                    self.apply_size();
                    self.apply_image();
                    self.render();
                    return Err(e);
                }
            }
        }

        let mut chain = Vec::with_capacity(live.len() + 1);
        chain.push(scene_pass);
        chain.extend(live.iter().map(|p| p.pass.clone()));
        self.compositor.set_passes(chain);
        self.passes = live;
        self.selected = id;
        self.built = Some(id);

        self.generation += 1;
        self.panel = ControlPanel::build(self.generation, &self.registry, id, &self.passes);

        self.apply_size();
        self.apply_image();

        log_info!(
            "pipeline '{}' built: {} effect pass(es), viewport {}x{}",
            id,
            self.passes.len(),
            self.size.0,
            self.size.1
        );
        self.render();
        Ok(())
    }

    /// Remember the viewport size and push it into the chain.  Does not render.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.apply_size();
    }

    /// Remember the input image (or its absence) and bind it into every pass
    /// that reads it.  Does not render.
    pub fn set_input_image(&mut self, image: Option<ImageHandle>) {
        self.image = image;
        self.scene.image = self.image.clone();
        self.apply_image();
    }

    /// Install a finished background decode as the input and render.  A
    /// failed decode leaves the image, chain and frame as they were.
    pub fn apply_load_result(&mut self, result: LoadResult) -> std::result::Result<ImageHandle, String> {
        let image = result.image?;
        log_info!("loaded {} ({}x{})", result.path.display(), image.width(), image.height());
        self.set_input_image(Some(image.clone()));
        self.render();
        Ok(image)
    }

    /// Restore every tunable to its authored default, refresh the panel and
    /// render.  Sizes and image slots are left alone.
    pub fn reset_parameters_to_defaults(&mut self) {
        for live in &mut self.passes {
            live.params.reset_scalars(live.effect.params);
        }
        self.panel.refresh_all(&self.passes, self.shown);
        self.render();
    }

    /// Run the chain now.  Supersedes any pending coalesced render.
    pub fn render(&mut self) {
        self.scheduler.cancel();
        let params: Vec<&ParamSet> = self.passes.iter().map(|p| &p.params).collect();
        self.compositor.execute(&self.scene, &params);
        self.frames += 1;
    }

    /// Render, read the frame back, encode it as PNG and hand it to the
    /// export sink under the fixed file name.
    pub fn export_image(&mut self) -> Result<()> {
        self.render();
        let frame = self.compositor.read_frame()?;
        let png = encode_png(&frame)?;
        self.sink.save(EXPORT_FILE_NAME, &png)?;
        log_info!("exported {}x{} frame ({} bytes)", frame.width(), frame.height(), png.len());
        Ok(())
    }

    /// Write one tunable.  Returns `false` when the target does not exist.
    pub fn set_param(&mut self, target: ParamTarget, value: f32) -> bool {
        let Some(live) = self.passes.get_mut(target.pass) else {
            return false;
        };
        live.params.set_scalar(target.name, value)
    }

    /// Apply a panel event.
    pub fn handle_event(&mut self, event: PanelEvent, now: Instant) -> Result<()> {
        match event {
            PanelEvent::Export => self.export_image()?,
            PanelEvent::Reset => self.reset_parameters_to_defaults(),
            PanelEvent::SelectPipeline(id) => {
                if self.built != Some(id) {
                    self.select_pipeline(id)?;
                }
            }
            PanelEvent::ParamEdited { target, value } => {
                if self.set_param(target, value) {
                    self.panel.refresh_all(&self.passes, self.shown);
                    self.request_render(now);
                } else {
                    log_warn!("panel edit for unknown parameter {}#{}", target.name, target.pass);
                }
            }
        }
        Ok(())
    }

    /// Ask for a coalesced render.  Returns `false` when one was already pending.
    pub fn request_render(&mut self, now: Instant) -> bool {
        self.scheduler.request(now)
    }

    /// Fire the pending render if it is due.  Returns whether a render ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.scheduler.poll(now) {
            self.render();
            true
        } else {
            false
        }
    }

    fn apply_size(&mut self) {
        let (w, h) = self.size;
        self.compositor.resize(w, h);
        for live in &mut self.passes {
            live.params.apply_viewport_size(w, h);
        }
    }

    fn apply_image(&mut self) {
        for live in &mut self.passes {
            live.params.apply_input_image(self.image.as_ref());
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn selected(&self) -> PipelineId {
        self.selected
    }

    /// Pipeline whose chain is live, if the last build succeeded.
    pub fn built(&self) -> Option<PipelineId> {
        self.built
    }

    pub fn passes(&self) -> &[LivePass<C::Pass>] {
        &self.passes
    }

    pub fn passes_mut(&mut self) -> &mut [LivePass<C::Pass>] {
        &mut self.passes
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn input_image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ControlPanel {
        &mut self.panel
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut C {
        &mut self.compositor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Renders executed since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}
