// ============================================================================
// CONTROL PANEL — retained model of the parameter-editing surface
// ============================================================================
//
// The panel is rebuilt from scratch on every pipeline build.  It is plain
// data: a tree of controls that a front-end (see
// `components::control_panel`) draws and that reports user edits back as
// `PanelEvent`s.  The controller owns the panel and applies the events.
//
// Layout (top to bottom):
//   [Download image]             action  -> PanelEvent::Export
//   Pipeline [combo]             selector -> PanelEvent::SelectPipeline
//   Settings (expanded)
//     [Reset to defaults]        action  -> PanelEvent::Reset
//     <effect label>             one sub-section per pass with a binder
//       <slider> ...             -> PanelEvent::ParamEdited
// ============================================================================

use std::ops::RangeInclusive;

use crate::controller::LivePass;
use crate::effects::ParamSet;
use crate::log_warn;
use crate::pipelines::{PipelineId, Registry};

pub const EXPORT_LABEL: &str = "Download image";
pub const PIPELINE_LABEL: &str = "Pipeline";
pub const SETTINGS_LABEL: &str = "Settings";
pub const RESET_LABEL: &str = "Reset to defaults";

/// Address of one live parameter: pass index within the effect list (the
/// scene pass is not counted) plus parameter name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamTarget {
    pub pass: usize,
    pub name: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    Export,
    Reset,
}

/// Something the user did in the panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelEvent {
    Export,
    Reset,
    SelectPipeline(PipelineId),
    ParamEdited { target: ParamTarget, value: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub label: String,
    pub expanded: bool,
    pub controls: Vec<Control>,
}

impl Section {
    pub fn new(label: impl Into<String>, expanded: bool) -> Self {
        Self { label: label.into(), expanded, controls: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Control {
    Action {
        label: String,
        action: PanelAction,
    },
    Selector {
        label: String,
        /// `(display label, value)` in registry order.
        options: Vec<(String, PipelineId)>,
        selected: PipelineId,
    },
    Slider {
        label: String,
        target: ParamTarget,
        range: RangeInclusive<f32>,
        step: f32,
        /// Value currently shown by the widget.
        value: f32,
    },
    Section(Section),
}

impl Control {
    /// Re-read the displayed value from the live state.
    pub fn refresh_display<P>(&mut self, passes: &[LivePass<P>], active: PipelineId) {
        match self {
            Control::Slider { target, value, .. } => {
                if let Some(v) = passes.get(target.pass).and_then(|p| p.params.scalar(target.name)) {
                    *value = v;
                }
            }
            Control::Selector { selected, .. } => *selected = active,
            Control::Action { .. } | Control::Section(_) => {}
        }
    }

    /// Event a widget emits when it is edited to `value` (sliders) or
    /// activated (actions).
    pub fn event_for_action(action: PanelAction) -> PanelEvent {
        match action {
            PanelAction::Export => PanelEvent::Export,
            PanelAction::Reset => PanelEvent::Reset,
        }
    }
}

/// Builder handed to an effect's binding function.  Every slider it adds is
/// bound to one live pass.
pub struct PassPanel<'a> {
    section: &'a mut Section,
    pass: usize,
}

impl<'a> PassPanel<'a> {
    pub fn new(section: &'a mut Section, pass: usize) -> Self {
        Self { section, pass }
    }

    pub fn pass(&self) -> usize {
        self.pass
    }

    /// Add a slider for the scalar parameter `name`.  Parameters that are
    /// missing or not scalar are skipped with a warning.
    pub fn slider(
        &mut self,
        params: &ParamSet,
        name: &'static str,
        label: &str,
        range: RangeInclusive<f32>,
        step: f32,
    ) -> &mut Self {
        match params.scalar(name) {
            Some(value) => self.section.controls.push(Control::Slider {
                label: label.to_string(),
                target: ParamTarget { pass: self.pass, name },
                range,
                step,
                value,
            }),
            None => {
                log_warn!("panel: pass {} has no scalar parameter '{}'", self.pass, name);
            }
        }
        self
    }
}

/// The live panel for one pipeline build.
#[derive(Debug, PartialEq)]
pub struct ControlPanel {
    generation: u64,
    controls: Vec<Control>,
    destroyed: bool,
}

impl ControlPanel {
    /// Build the panel for the current chain.
    pub fn build<P>(generation: u64, registry: &Registry, active: PipelineId, passes: &[LivePass<P>]) -> Self {
        let mut controls = vec![
            Control::Action { label: EXPORT_LABEL.to_string(), action: PanelAction::Export },
            Control::Selector {
                label: PIPELINE_LABEL.to_string(),
                options: registry.list().iter().map(|d| (d.label.to_string(), d.id)).collect(),
                selected: active,
            },
        ];

        let mut settings = Section::new(SETTINGS_LABEL, true);
        settings.controls.push(Control::Action { label: RESET_LABEL.to_string(), action: PanelAction::Reset });

        for (index, live) in passes.iter().enumerate() {
            let Some(bind) = live.effect.bind_panel else { continue };
            let mut sub = Section::new(live.effect.label, true);
            bind(&mut PassPanel::new(&mut sub, index), &live.params, live.effect);
            settings.controls.push(Control::Section(sub));
        }
        controls.push(Control::Section(settings));

        Self { generation, controls, destroyed: false }
    }

    /// An empty, already-released panel (before the first build).
    pub fn empty() -> Self {
        Self { generation: 0, controls: Vec::new(), destroyed: true }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Release every control.  The panel is inert afterwards.
    pub fn destroy(&mut self) {
        self.controls.clear();
        self.destroyed = true;
    }

    /// Top-level controls, in display order.
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Mutable access for front-ends that edit displayed values in place.
    pub fn controls_mut(&mut self) -> &mut [Control] {
        &mut self.controls
    }

    /// Every non-section control, depth first.
    pub fn all_controls(&self) -> Vec<&Control> {
        fn walk<'a>(controls: &'a [Control], out: &mut Vec<&'a Control>) {
            for c in controls {
                match c {
                    Control::Section(s) => walk(&s.controls, out),
                    other => out.push(other),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.controls, &mut out);
        out
    }

    /// Visit every non-section control mutably, depth first.
    pub fn for_each_control_mut(&mut self, f: &mut dyn FnMut(&mut Control)) {
        fn walk(controls: &mut [Control], f: &mut dyn FnMut(&mut Control)) {
            for c in controls.iter_mut() {
                if let Control::Section(s) = c {
                    walk(&mut s.controls, f);
                } else {
                    f(c);
                }
            }
        }
        walk(&mut self.controls, f);
    }

    /// Refresh every widget from the live state.
    pub fn refresh_all<P>(&mut self, passes: &[LivePass<P>], active: PipelineId) {
        self.for_each_control_mut(&mut |c| c.refresh_display(passes, active));
    }

    /// Find a top-level or nested section by label.
    pub fn section(&self, label: &str) -> Option<&Section> {
        fn walk<'a>(controls: &'a [Control], label: &str) -> Option<&'a Section> {
            controls.iter().find_map(|c| match c {
                Control::Section(s) if s.label == label => Some(s),
                Control::Section(s) => walk(&s.controls, label),
                _ => None,
            })
        }
        walk(&self.controls, label)
    }

    pub fn sliders(&self) -> impl Iterator<Item = (&str, ParamTarget, f32)> + '_ {
        self.all_controls().into_iter().filter_map(|c| match c {
            Control::Slider { label, target, value, .. } => Some((label.as_str(), *target, *value)),
            _ => None,
        })
    }
}
