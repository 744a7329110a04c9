// ============================================================================
// COMPOSITOR — the rendering capability the pipeline controller drives
// ============================================================================
//
// A compositor owns one ordered chain of passes.  Pass 0 is always the scene
// pass (the source image drawn into the viewport); every following pass runs
// one effect's shader pair over the previous pass's output.  The controller
// never looks inside a pass, it only keeps the handle next to the live
// parameters that belong to it.
//
// `gpu::GpuCompositor` is the wgpu implementation.  Tests drive the
// controller with a recording implementation instead.
// ============================================================================

use image::RgbaImage;

use crate::effects::{EffectDescriptor, ImageHandle, ParamSet};
use crate::error::Result;

/// Background behind the letterboxed source image (`#1c1c1f`).
pub const BACKGROUND: [u8; 3] = [0x1c, 0x1c, 0x1f];

/// What the scene pass draws.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Image shown on the image plane, fitted to the viewport.  `None`
    /// draws only the background.
    pub image: Option<ImageHandle>,
    pub background: [u8; 3],
}

impl Scene {
    /// Background as normalised RGBA.
    pub fn background_rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.background;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self { image: None, background: BACKGROUND }
    }
}

pub trait Compositor {
    /// Opaque handle to one pass of the chain.
    type Pass: Clone;

    /// Pass that renders the scene.  Always chain step 0.
    fn scene_pass(&mut self) -> Self::Pass;

    /// Compile a pass for one effect.  Fails when the backend rejects the
    /// shader pair.
    fn effect_pass(&mut self, effect: &'static EffectDescriptor) -> Result<Self::Pass>;

    /// Replace the whole chain.  Resources held by the previous chain are
    /// released before this returns.
    fn set_passes(&mut self, passes: Vec<Self::Pass>);

    /// Number of passes in the chain, scene pass included.
    fn pass_count(&self) -> usize;

    /// Resize every render target.  Called with whatever the controller was
    /// given.
    fn resize(&mut self, width: u32, height: u32);

    /// Run the chain.  `params[i]` belongs to chain step `i + 1`.
    fn execute(&mut self, scene: &Scene, params: &[&ParamSet]);

    /// Read back the most recent frame.
    fn read_frame(&mut self) -> Result<RgbaImage>;
}
