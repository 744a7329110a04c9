// ============================================================================
// EFFECTS — static descriptors of the shader stages a pipeline is built from
// ============================================================================
//
// Architecture:
//   params.rs  — parameter templates, live parameter sets, image handles
//   catalog.rs — every built-in effect (shader pair, defaults, panel binding)
// ============================================================================

pub mod catalog;
pub mod params;

use std::fmt;
use std::str::FromStr;

use crate::panel::PassPanel;
pub use params::{ImageHandle, Param, ParamRole, ParamSet, ParamTemplate, ParamValue, TemplateValue};

/// Identity of a built-in effect.  Used as a registry and UI key only; the
/// display name lives in [`EffectDescriptor::label`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectId {
    Gamma,
    StructureTensor,
    GaussianBlurX,
    GaussianBlurY,
    AnisotropicKuwahara,
    RadialChromaticAberration,
    RadialBlur,
    ZoomBlur,
    MotionBlur,
    Vignette,
    Levels,
    Sharpen,
    Posterize,
    EdgeBoost,
}

impl EffectId {
    pub const ALL: [EffectId; 14] = [
        EffectId::Gamma,
        EffectId::StructureTensor,
        EffectId::GaussianBlurX,
        EffectId::GaussianBlurY,
        EffectId::AnisotropicKuwahara,
        EffectId::RadialChromaticAberration,
        EffectId::RadialBlur,
        EffectId::ZoomBlur,
        EffectId::MotionBlur,
        EffectId::Vignette,
        EffectId::Levels,
        EffectId::Sharpen,
        EffectId::Posterize,
        EffectId::EdgeBoost,
    ];

    /// Stable string key.
    pub fn as_str(self) -> &'static str {
        match self {
            EffectId::Gamma => "gamma",
            EffectId::StructureTensor => "structure-tensor",
            EffectId::GaussianBlurX => "gaussian-blur-x",
            EffectId::GaussianBlurY => "gaussian-blur-y",
            EffectId::AnisotropicKuwahara => "anisotropic-kuwahara",
            EffectId::RadialChromaticAberration => "radial-chromatic-aberration",
            EffectId::RadialBlur => "radial-blur",
            EffectId::ZoomBlur => "zoom-blur",
            EffectId::MotionBlur => "motion-blur",
            EffectId::Vignette => "vignette",
            EffectId::Levels => "level",
            EffectId::Sharpen => "sharpen",
            EffectId::Posterize => "posterize",
            EffectId::EdgeBoost => "edge-boost",
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown effect '{}'", s))
    }
}

/// Populates a control-panel section for one live pass.
///
/// Receives the section (already bound to the pass), the pass's live
/// parameters and the effect itself.  Every slider added through the section
/// requests a render when it changes.
pub type BindPanelFn = fn(&mut PassPanel<'_>, &ParamSet, &EffectDescriptor);

/// Static definition of one shader stage.
#[derive(Debug)]
pub struct EffectDescriptor {
    pub id: EffectId,
    pub label: &'static str,
    /// WGSL vertex stage; entry point `vs_main`.
    pub vertex: &'static str,
    /// WGSL fragment stage; entry point `fs_main`.
    pub fragment: &'static str,
    pub params: &'static [ParamTemplate],
    pub bind_panel: Option<BindPanelFn>,
}

impl EffectDescriptor {
    /// Fresh, independent parameter instance for a new pass.
    pub fn instantiate_params(&self) -> ParamSet {
        ParamSet::instantiate(self.params)
    }

    pub fn default_param(&self, name: &str) -> Option<&ParamTemplate> {
        self.params.iter().find(|p| p.name == name)
    }
}
