// ============================================================================
// EFFECT CATALOG — every built-in effect and its control-panel binding
// ============================================================================
//
// Parameter naming follows the shader uniforms: `tDiffuse` is the previous
// pass, `inputTex` the untouched input image, `resolution` the viewport size.
// Numeric parameters are uploaded to the fragment stage in the order they are
// declared here, so the WGSL `Params` structs in `gpu::shaders` mirror these
// tables field for field.
// ============================================================================

use super::params::ParamTemplate as P;
use super::{EffectDescriptor, EffectId, ParamSet};
use crate::gpu::shaders;
use crate::panel::PassPanel;

// ----------------------------------------------------------------------------
// Colour
// ----------------------------------------------------------------------------

pub static GAMMA: EffectDescriptor = EffectDescriptor {
    id: EffectId::Gamma,
    label: "Gamma",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::GAMMA_FRAGMENT,
    params: &[P::chain_input("tDiffuse"), P::tunable("gamma", 0.6)],
    bind_panel: Some(bind_gamma),
};

fn bind_gamma(panel: &mut PassPanel<'_>, params: &ParamSet, effect: &EffectDescriptor) {
    panel.slider(params, "gamma", effect.label, 0.3..=2.5, 0.1);
}

pub static LEVELS: EffectDescriptor = EffectDescriptor {
    id: EffectId::Levels,
    label: "Levels",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::LEVELS_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::tunable("levelBlack", 0.20),
        P::tunable("levelWhite", 0.80),
    ],
    bind_panel: Some(bind_levels),
};

fn bind_levels(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "levelBlack", "Black", 0.0..=1.0, 0.01)
        .slider(params, "levelWhite", "White", 0.0..=1.0, 0.01);
}

pub static POSTERIZE: EffectDescriptor = EffectDescriptor {
    id: EffectId::Posterize,
    label: "Posterize",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::POSTERIZE_FRAGMENT,
    params: &[P::chain_input("tDiffuse"), P::tunable("levels", 9.0)],
    bind_panel: Some(bind_posterize),
};

fn bind_posterize(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel.slider(params, "levels", "Levels", 2.0..=32.0, 1.0);
}

pub static VIGNETTE: EffectDescriptor = EffectDescriptor {
    id: EffectId::Vignette,
    label: "Vignette",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::VIGNETTE_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::tunable("vignetteStrength", 0.0),
        P::tunable("vignetteSize", 0.0),
    ],
    bind_panel: Some(bind_vignette),
};

fn bind_vignette(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "vignetteStrength", "Strength", 0.0..=3.0, 0.05)
        .slider(params, "vignetteSize", "Size", 0.0..=0.5, 0.01);
}

// ----------------------------------------------------------------------------
// Kuwahara building blocks (no user-editable parameters except the filter)
// ----------------------------------------------------------------------------

pub static STRUCTURE_TENSOR: EffectDescriptor = EffectDescriptor {
    id: EffectId::StructureTensor,
    label: "Structure Tensor",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::STRUCTURE_TENSOR_FRAGMENT,
    params: &[P::chain_input("tDiffuse"), P::viewport_size("resolution")],
    bind_panel: None,
};

pub static GAUSSIAN_BLUR_X: EffectDescriptor = EffectDescriptor {
    id: EffectId::GaussianBlurX,
    label: "Gaussian Blur X",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::GAUSSIAN_BLUR_X_FRAGMENT,
    params: &[P::chain_input("tDiffuse"), P::viewport_size("resolution")],
    bind_panel: None,
};

pub static GAUSSIAN_BLUR_Y: EffectDescriptor = EffectDescriptor {
    id: EffectId::GaussianBlurY,
    label: "Gaussian Blur Y",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::GAUSSIAN_BLUR_Y_FRAGMENT,
    params: &[P::chain_input("tDiffuse"), P::viewport_size("resolution")],
    bind_panel: None,
};

pub static ANISOTROPIC_KUWAHARA: EffectDescriptor = EffectDescriptor {
    id: EffectId::AnisotropicKuwahara,
    label: "Anisotropic Kuwahara",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::ANISOTROPIC_KUWAHARA_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::input_image("inputTex"),
        P::viewport_size("resolution"),
        P::tunable("kernelRadius", 3.0),
        P::tunable("zetaModifier", 1.0),
        P::tunable("zeroCrossing", 0.78),
        P::tunable("sharpness", 8.0),
    ],
    bind_panel: Some(bind_anisotropic_kuwahara),
};

fn bind_anisotropic_kuwahara(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "kernelRadius", "Kernel radius", 2.0..=8.0, 1.0)
        .slider(params, "zetaModifier", "Inner blur", 0.2..=5.0, 0.1)
        .slider(params, "zeroCrossing", "Outer blur", 0.4..=1.0, 0.01)
        .slider(params, "sharpness", "Sharpness", 1.0..=20.0, 1.0);
}

// ----------------------------------------------------------------------------
// Lens
// ----------------------------------------------------------------------------

pub static RADIAL_CHROMATIC_ABERRATION: EffectDescriptor = EffectDescriptor {
    id: EffectId::RadialChromaticAberration,
    label: "Chromatic Aberration",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::RADIAL_CHROMATIC_ABERRATION_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::viewport_size("resolution"),
        P::tunable("redScale", 0.0),
        P::tunable("blueScale", 0.0),
    ],
    bind_panel: Some(bind_radial_chromatic_aberration),
};

fn bind_radial_chromatic_aberration(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "redScale", "Red aberration", -1.0..=1.0, 0.01)
        .slider(params, "blueScale", "Blue aberration", -1.0..=1.0, 0.01);
}

pub static RADIAL_BLUR: EffectDescriptor = EffectDescriptor {
    id: EffectId::RadialBlur,
    label: "Radial Blur",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::RADIAL_BLUR_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::tunable("radialBlurStrength", 0.0),
        P::tunable("radialBlurSize", 0.0),
    ],
    bind_panel: Some(bind_radial_blur),
};

fn bind_radial_blur(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "radialBlurStrength", "Radial blur strength", 0.0..=1.5, 0.01)
        .slider(params, "radialBlurSize", "Radial blur size", 0.0..=1.0, 0.01);
}

pub static ZOOM_BLUR: EffectDescriptor = EffectDescriptor {
    id: EffectId::ZoomBlur,
    label: "Zoom Blur",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::ZOOM_BLUR_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::tunable("zoomBlurStrength", 0.0),
        P::tunable("zoomBlurSize", 0.0),
    ],
    bind_panel: Some(bind_zoom_blur),
};

fn bind_zoom_blur(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "zoomBlurStrength", "Strength", 0.0..=1.5, 0.01)
        .slider(params, "zoomBlurSize", "Size", 0.0..=1.0, 0.01);
}

pub static MOTION_BLUR: EffectDescriptor = EffectDescriptor {
    id: EffectId::MotionBlur,
    label: "Motion Blur",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::MOTION_BLUR_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::tunable("sigma", 10.0),
        P::tunable("angle", 155.0),
        P::tunable("blendStrength", 0.70),
    ],
    bind_panel: Some(bind_motion_blur),
};

fn bind_motion_blur(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "sigma", "Sigma", 0.0..=30.0, 0.1)
        .slider(params, "angle", "Angle", 0.0..=180.0, 0.5)
        .slider(params, "blendStrength", "Blend strength", 0.0..=1.0, 0.01);
}

// ----------------------------------------------------------------------------
// Detail
// ----------------------------------------------------------------------------

pub static SHARPEN: EffectDescriptor = EffectDescriptor {
    id: EffectId::Sharpen,
    label: "Sharpen",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::SHARPEN_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::tunable("kernelSize", 1.0),
        P::tunable("strength", 1.0),
    ],
    bind_panel: Some(bind_sharpen),
};

fn bind_sharpen(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "kernelSize", "Kernel size", 0.2..=4.0, 0.1)
        .slider(params, "strength", "Strength", 0.0..=3.0, 0.05);
}

pub static EDGE_BOOST: EffectDescriptor = EffectDescriptor {
    id: EffectId::EdgeBoost,
    label: "Edge Boost",
    vertex: shaders::FULLSCREEN_VERTEX,
    fragment: shaders::EDGE_BOOST_FRAGMENT,
    params: &[
        P::chain_input("tDiffuse"),
        P::input_image("inputTex"),
        P::tunable("threshold", 0.25),
        P::tunable("opacity", 0.50),
    ],
    bind_panel: Some(bind_edge_boost),
};

fn bind_edge_boost(panel: &mut PassPanel<'_>, params: &ParamSet, _effect: &EffectDescriptor) {
    panel
        .slider(params, "threshold", "Edge sensitivity", 0.0..=1.0, 0.01)
        .slider(params, "opacity", "Strength", 0.0..=1.0, 0.01);
}

/// Every built-in effect, in `EffectId::ALL` order.
pub static ALL_EFFECTS: [&EffectDescriptor; 14] = [
    &GAMMA,
    &STRUCTURE_TENSOR,
    &GAUSSIAN_BLUR_X,
    &GAUSSIAN_BLUR_Y,
    &ANISOTROPIC_KUWAHARA,
    &RADIAL_CHROMATIC_ABERRATION,
    &RADIAL_BLUR,
    &ZOOM_BLUR,
    &MOTION_BLUR,
    &VIGNETTE,
    &LEVELS,
    &SHARPEN,
    &POSTERIZE,
    &EDGE_BOOST,
];

pub fn effect(id: EffectId) -> &'static EffectDescriptor {
    match id {
        EffectId::Gamma => &GAMMA,
        EffectId::StructureTensor => &STRUCTURE_TENSOR,
        EffectId::GaussianBlurX => &GAUSSIAN_BLUR_X,
        EffectId::GaussianBlurY => &GAUSSIAN_BLUR_Y,
        EffectId::AnisotropicKuwahara => &ANISOTROPIC_KUWAHARA,
        EffectId::RadialChromaticAberration => &RADIAL_CHROMATIC_ABERRATION,
        EffectId::RadialBlur => &RADIAL_BLUR,
        EffectId::ZoomBlur => &ZOOM_BLUR,
        EffectId::MotionBlur => &MOTION_BLUR,
        EffectId::Vignette => &VIGNETTE,
        EffectId::Levels => &LEVELS,
        EffectId::Sharpen => &SHARPEN,
        EffectId::Posterize => &POSTERIZE,
        EffectId::EdgeBoost => &EDGE_BOOST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ParamRole, TemplateValue};
    use std::collections::HashSet;

    #[test]
    fn effect_ids_are_unique() {
        let keys: HashSet<&str> = ALL_EFFECTS.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(keys.len(), ALL_EFFECTS.len());
    }

    #[test]
    fn catalog_order_matches_id_order() {
        for (id, effect) in EffectId::ALL.iter().zip(ALL_EFFECTS.iter()) {
            assert_eq!(*id, effect.id);
            assert!(std::ptr::eq(super::effect(*id), *effect));
        }
    }

    #[test]
    fn lookup_returns_the_descriptor_for_every_id() {
        for id in EffectId::ALL {
            assert_eq!(effect(id).id, id);
        }
    }

    #[test]
    fn effects_have_shader_pairs_and_labels() {
        for effect in ALL_EFFECTS {
            assert!(!effect.label.is_empty(), "{} has no label", effect.id);
            assert!(effect.vertex.contains("fn vs_main"), "{} vertex", effect.id);
            assert!(effect.fragment.contains("fn fs_main"), "{} fragment", effect.id);
        }
    }

    #[test]
    fn every_effect_reads_the_previous_pass() {
        for effect in ALL_EFFECTS {
            assert!(
                effect.params.iter().any(|p| p.role == ParamRole::ChainInput),
                "{} has no chain input",
                effect.id
            );
        }
    }

    #[test]
    fn parameter_names_are_unique_per_effect() {
        for effect in ALL_EFFECTS {
            let names: HashSet<&str> = effect.params.iter().map(|p| p.name).collect();
            assert_eq!(names.len(), effect.params.len(), "{}", effect.id);
        }
    }

    #[test]
    fn image_slots_are_authored_empty() {
        for effect in ALL_EFFECTS {
            for p in effect.params {
                if matches!(p.role, ParamRole::InputImage | ParamRole::ChainInput) {
                    assert_eq!(p.default, TemplateValue::EmptyImage, "{}.{}", effect.id, p.name);
                }
            }
        }
    }

    #[test]
    fn effects_without_tunables_have_no_panel() {
        for effect in ALL_EFFECTS {
            let has_tunable = effect.params.iter().any(|p| p.role == ParamRole::Tunable);
            assert_eq!(has_tunable, effect.bind_panel.is_some(), "{}", effect.id);
        }
    }
}
