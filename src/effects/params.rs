// ============================================================================
// EFFECT PARAMETERS — authored templates and live, per-pass instances
// ============================================================================
//
// An effect declares its parameters once, as a `const` slice of
// `ParamTemplate`s.  Every pass built from the effect gets its own `ParamSet`
// instantiated from that slice, so no two passes (and never the template)
// share mutable state.
//
// Each parameter carries an explicit `ParamRole`.  The controller dispatches
// on the role when it pushes the viewport size or the input image into a
// chain; parameter names are only used for UI bindings and lookups.
// ============================================================================

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use uuid::Uuid;

/// A decoded RGBA image handed to the engine by the acquisition layer.
pub struct InputImage {
    id: Uuid,
    pixels: RgbaImage,
}

/// Shared, cheaply clonable reference to an [`InputImage`].
///
/// Equality is identity: two handles are equal when they refer to the same
/// loaded image, regardless of pixel content.
#[derive(Clone)]
pub struct ImageHandle(Arc<InputImage>);

impl ImageHandle {
    pub fn new(pixels: RgbaImage) -> Self {
        Self(Arc::new(InputImage {
            id: Uuid::new_v4(),
            pixels,
        }))
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn width(&self) -> u32 {
        self.0.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.0.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0.pixels
    }

    /// Width / height, or 1.0 for a degenerate image.
    pub fn aspect(&self) -> f32 {
        let (w, h) = (self.width(), self.height());
        if h == 0 { 1.0 } else { w as f32 / h as f32 }
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ImageHandle {}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({} {}x{})", self.0.id, self.width(), self.height())
    }
}

/// What a parameter is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// Numeric value the user edits from the control panel.
    Tunable,
    /// Render-target size in pixels, kept in sync by `set_size`.
    ViewportSize,
    /// The original (unprocessed) input image, kept in sync by `set_input_image`.
    InputImage,
    /// Output of the previous pass in the chain.  Bound by the compositor.
    ChainInput,
}

/// Authoring-time default of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TemplateValue {
    Scalar(f32),
    Size { width: f32, height: f32 },
    /// Image slot; always empty when authored.
    EmptyImage,
}

/// One entry of an effect's default parameter table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamTemplate {
    pub name: &'static str,
    pub role: ParamRole,
    pub default: TemplateValue,
}

impl ParamTemplate {
    pub const fn tunable(name: &'static str, value: f32) -> Self {
        Self { name, role: ParamRole::Tunable, default: TemplateValue::Scalar(value) }
    }

    /// Viewport-size parameter, authored as 1x1.
    pub const fn viewport_size(name: &'static str) -> Self {
        Self {
            name,
            role: ParamRole::ViewportSize,
            default: TemplateValue::Size { width: 1.0, height: 1.0 },
        }
    }

    pub const fn input_image(name: &'static str) -> Self {
        Self { name, role: ParamRole::InputImage, default: TemplateValue::EmptyImage }
    }

    pub const fn chain_input(name: &'static str) -> Self {
        Self { name, role: ParamRole::ChainInput, default: TemplateValue::EmptyImage }
    }
}

/// Live value of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Size { width: f32, height: f32 },
    Image(Option<ImageHandle>),
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<(f32, f32)> {
        match self {
            ParamValue::Size { width, height } => Some((*width, *height)),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageHandle> {
        match self {
            ParamValue::Image(img) => img.as_ref(),
            _ => None,
        }
    }

    /// Uniform slot for numeric values (`xy` used, `zw` zero).
    fn uniform_slot(&self) -> Option<[f32; 4]> {
        match self {
            ParamValue::Scalar(v) => Some([*v, 0.0, 0.0, 0.0]),
            ParamValue::Size { width, height } => Some([*width, *height, 0.0, 0.0]),
            ParamValue::Image(_) => None,
        }
    }
}

impl From<TemplateValue> for ParamValue {
    fn from(t: TemplateValue) -> Self {
        match t {
            TemplateValue::Scalar(v) => ParamValue::Scalar(v),
            TemplateValue::Size { width, height } => ParamValue::Size { width, height },
            TemplateValue::EmptyImage => ParamValue::Image(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub role: ParamRole,
    pub value: ParamValue,
}

/// The live parameter instance of one pass.
///
/// Keys and their order always match the template the set was instantiated
/// from.  The order is also the uniform layout seen by the shader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamSet {
    params: Vec<Param>,
}

impl ParamSet {
    /// Build a fresh, independent instance from an effect's template.
    pub fn instantiate(template: &[ParamTemplate]) -> Self {
        Self {
            params: template
                .iter()
                .map(|t| Param { name: t.name, role: t.role, value: t.default.into() })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|p| p.name)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Param> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(|p| p.value.as_scalar())
    }

    /// Overwrite a scalar parameter.  Returns `false` (and changes nothing)
    /// when `name` is missing or not a scalar.
    pub fn set_scalar(&mut self, name: &str, value: f32) -> bool {
        match self.get_mut(name) {
            Some(Param { value: ParamValue::Scalar(v), .. }) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    /// Store `width x height` into every viewport-size parameter.
    /// Returns how many parameters were touched.
    pub fn apply_viewport_size(&mut self, width: u32, height: u32) -> usize {
        let mut touched = 0;
        for p in self.params.iter_mut().filter(|p| p.role == ParamRole::ViewportSize) {
            p.value = ParamValue::Size { width: width as f32, height: height as f32 };
            touched += 1;
        }
        touched
    }

    /// Bind (or clear) every input-image slot.  Returns how many slots were touched.
    pub fn apply_input_image(&mut self, image: Option<&ImageHandle>) -> usize {
        let mut touched = 0;
        for p in self.params.iter_mut().filter(|p| p.role == ParamRole::InputImage) {
            p.value = ParamValue::Image(image.cloned());
            touched += 1;
        }
        touched
    }

    /// Restore scalar values from the template.  Only entries that are
    /// scalars on both sides are restored; sizes and image slots keep their
    /// runtime values.
    pub fn reset_scalars(&mut self, template: &[ParamTemplate]) {
        for t in template {
            let TemplateValue::Scalar(default) = t.default else { continue };
            if let Some(Param { value: ParamValue::Scalar(v), .. }) = self.get_mut(t.name) {
                *v = default;
            }
        }
    }

    /// First bound input image, if any.
    pub fn input_image(&self) -> Option<&ImageHandle> {
        self.params
            .iter()
            .filter(|p| p.role == ParamRole::InputImage)
            .find_map(|p| p.value.as_image())
    }

    /// Numeric parameters packed as one `vec4<f32>` each, in declaration
    /// order.  Never empty: a zero slot is emitted for sets without numbers
    /// because uniform buffers cannot be zero-sized.
    pub fn uniform_slots(&self) -> Vec<[f32; 4]> {
        let mut slots: Vec<[f32; 4]> = self.params.iter().filter_map(|p| p.value.uniform_slot()).collect();
        if slots.is_empty() {
            slots.push([0.0; 4]);
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &[ParamTemplate] = &[
        ParamTemplate::chain_input("tDiffuse"),
        ParamTemplate::input_image("inputTex"),
        ParamTemplate::viewport_size("resolution"),
        ParamTemplate::tunable("strength", 1.0),
    ];

    #[test]
    fn instantiate_copies_every_key_in_order() {
        let set = ParamSet::instantiate(TEMPLATE);
        let keys: Vec<_> = set.keys().collect();
        assert_eq!(keys, vec!["tDiffuse", "inputTex", "resolution", "strength"]);
        assert_eq!(set.get("resolution").unwrap().value, ParamValue::Size { width: 1.0, height: 1.0 });
        assert_eq!(set.get("inputTex").unwrap().value, ParamValue::Image(None));
    }

    #[test]
    fn instances_are_independent() {
        let mut a = ParamSet::instantiate(TEMPLATE);
        let b = ParamSet::instantiate(TEMPLATE);
        assert!(a.set_scalar("strength", 5.0));
        a.apply_viewport_size(640, 480);
        assert_eq!(b.scalar("strength"), Some(1.0));
        assert_eq!(b.get("resolution").unwrap().value.as_size(), Some((1.0, 1.0)));
        assert_eq!(TEMPLATE[3].default, TemplateValue::Scalar(1.0));
    }

    #[test]
    fn set_scalar_rejects_non_scalars() {
        let mut set = ParamSet::instantiate(TEMPLATE);
        assert!(!set.set_scalar("resolution", 3.0));
        assert!(!set.set_scalar("missing", 3.0));
        assert_eq!(set.get("resolution").unwrap().value.as_size(), Some((1.0, 1.0)));
    }

    #[test]
    fn role_dispatch_touches_only_matching_slots() {
        let mut set = ParamSet::instantiate(TEMPLATE);
        let img = ImageHandle::new(RgbaImage::new(4, 2));
        assert_eq!(set.apply_input_image(Some(&img)), 1);
        assert_eq!(set.apply_viewport_size(320, 200), 1);
        assert_eq!(set.input_image(), Some(&img));
        assert_eq!(set.get("tDiffuse").unwrap().value, ParamValue::Image(None));

        let mut bare = ParamSet::instantiate(&[ParamTemplate::tunable("gamma", 0.6)]);
        assert_eq!(bare.apply_viewport_size(320, 200), 0);
        assert_eq!(bare.apply_input_image(Some(&img)), 0);
    }

    #[test]
    fn reset_restores_scalars_only() {
        let mut set = ParamSet::instantiate(TEMPLATE);
        set.set_scalar("strength", 9.0);
        set.apply_viewport_size(640, 480);
        set.reset_scalars(TEMPLATE);
        assert_eq!(set.scalar("strength"), Some(1.0));
        assert_eq!(set.get("resolution").unwrap().value.as_size(), Some((640.0, 480.0)));
    }

    #[test]
    fn uniform_slots_skip_images_and_never_empty() {
        let mut set = ParamSet::instantiate(TEMPLATE);
        set.apply_viewport_size(8, 4);
        assert_eq!(set.uniform_slots(), vec![[8.0, 4.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);

        let images_only = ParamSet::instantiate(&[ParamTemplate::chain_input("tDiffuse")]);
        assert_eq!(images_only.uniform_slots(), vec![[0.0; 4]]);
    }

    #[test]
    fn image_handles_compare_by_identity() {
        let a = ImageHandle::new(RgbaImage::new(2, 2));
        let b = ImageHandle::new(RgbaImage::new(2, 2));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!((ImageHandle::new(RgbaImage::new(4, 2)).aspect() - 2.0).abs() < f32::EPSILON);
    }
}
