// ============================================================================
// CONTROL PANEL WIDGETS — egui rendering of `panel::ControlPanel`
// ============================================================================
//
// Immediate-mode front-end for the retained panel model.  Widgets edit the
// displayed values in place so drags feel live; every edit is also reported
// as a `PanelEvent` for the controller to apply.
// ============================================================================

use eframe::egui;
use egui::{Color32, Sense, Vec2};

use crate::panel::{Control, ControlPanel, PanelEvent};
use crate::pipelines::PipelineId;

/// Colours pulled from the active egui visuals.
pub(crate) struct PanelColors {
    pub accent: Color32,
    pub accent_faint: Color32,
    pub text_muted: Color32,
}

impl PanelColors {
    pub(crate) fn from_ctx(ctx: &egui::Context) -> Self {
        let v = ctx.style().visuals.clone();
        let accent = v.selection.stroke.color;
        let alpha = if v.dark_mode { 35 } else { 25 };
        Self {
            accent,
            accent_faint: Color32::from_rgba_unmultiplied(accent.r(), accent.g(), accent.b(), alpha),
            // In dark mode, boost muted text so labels stay readable
            text_muted: if v.dark_mode { Color32::from_gray(160) } else { v.weak_text_color() },
        }
    }
}

/// Styled section label (small caps feel).
pub(crate) fn section_label(ui: &mut egui::Ui, colors: &PanelColors, text: &str) {
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.add_space(2.0);
        ui.label(egui::RichText::new(text).size(11.0).color(colors.text_muted).strong());
    });
    ui.add_space(2.0);
}

/// Thin separator line using accent color (very faint).
pub(crate) fn accent_separator(ui: &mut egui::Ui, colors: &PanelColors) {
    let available_width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(Vec2::new(available_width, 1.0), Sense::hover());
    ui.painter().rect_filled(rect, 0.0, colors.accent_faint);
}

/// Draw the whole panel.  Returns the edits made this frame, in widget order.
pub fn show(ui: &mut egui::Ui, panel: &mut ControlPanel) -> Vec<PanelEvent> {
    let mut events = Vec::new();
    if panel.is_destroyed() {
        return events;
    }
    let colors = PanelColors::from_ctx(ui.ctx());
    // Panel generation in the id keeps collapse state from leaking across rebuilds.
    let salt = panel.generation();
    draw_controls(ui, panel.controls_mut(), &colors, salt, &mut events);
    events
}

fn draw_controls(
    ui: &mut egui::Ui,
    controls: &mut [Control],
    colors: &PanelColors,
    salt: u64,
    events: &mut Vec<PanelEvent>,
) {
    for (index, control) in controls.iter_mut().enumerate() {
        match control {
            Control::Action { label, action } => {
                let button = egui::Button::new(egui::RichText::new(label.as_str()).color(Color32::WHITE).strong())
                    .fill(colors.accent)
                    .min_size(Vec2::new(ui.available_width(), 26.0));
                if ui.add(button).clicked() {
                    events.push(Control::event_for_action(*action));
                }
                ui.add_space(4.0);
            }
            Control::Selector { label, options, selected } => {
                section_label(ui, colors, label);
                let current = options
                    .iter()
                    .find(|(_, id)| id == selected)
                    .map(|(l, _)| l.clone())
                    .unwrap_or_else(|| selected.to_string());
                let mut choice: PipelineId = *selected;
                egui::ComboBox::from_id_source(("shaderfx_pipeline", salt, index))
                    .width(ui.available_width())
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for (option_label, id) in options.iter() {
                            ui.selectable_value(&mut choice, *id, option_label.as_str());
                        }
                    });
                if choice != *selected {
                    *selected = choice;
                    events.push(PanelEvent::SelectPipeline(choice));
                }
                ui.add_space(4.0);
                accent_separator(ui, colors);
            }
            Control::Slider { label, target, range, step, value } => {
                section_label(ui, colors, label);
                let slider = egui::Slider::new(value, range.clone()).step_by(*step as f64);
                if ui.add(slider).changed() {
                    events.push(PanelEvent::ParamEdited { target: *target, value: *value });
                }
            }
            Control::Section(section) => {
                let response = egui::CollapsingHeader::new(section.label.as_str())
                    .id_source(("shaderfx_section", salt, section.label.as_str(), index))
                    .default_open(section.expanded)
                    .show(ui, |ui| draw_controls(ui, &mut section.controls, colors, salt, events));
                section.expanded = response.openness > 0.5;
            }
        }
    }
}
