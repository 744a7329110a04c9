// ============================================================================
// SHADERFX APP — eframe shell around the pipeline controller
// ============================================================================
//
// Layout:
//   top bar      Open image, status line
//   left side    control panel (export, pipeline selector, settings)
//   centre       original image | processed image
//
// The processed view owns the render size: whenever its fitted rect changes
// the controller is resized and re-rendered, and the new frame is read back
// into an egui texture.
// ============================================================================

use std::path::PathBuf;
use std::time::Instant;

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions};

use crate::components::control_panel;
use crate::compositor::Compositor;
use crate::controller::PipelineController;
use crate::effects::ImageHandle;
use crate::export::DialogExportSink;
use crate::gpu::GpuCompositor;
use crate::io::{ImageLoader, default_image, fit_rect, is_supported_image, pick_image_file, render_size};
use crate::panel::PanelEvent;
use crate::pipelines::Registry;
use crate::scheduler::RenderScheduler;
use crate::settings::AppSettings;
use crate::log_err;

const DEFAULT_IMAGE_SIZE: (u32, u32) = (1280, 720);
const FULL_UV: Rect = Rect { min: Pos2::ZERO, max: Pos2 { x: 1.0, y: 1.0 } };

pub struct ShaderFxApp {
    settings: AppSettings,
    /// `None` when no GPU adapter could be created.
    controller: Option<PipelineController<GpuCompositor, DialogExportSink>>,
    loader: ImageLoader,
    original: ImageHandle,
    original_tex: Option<TextureHandle>,
    processed_tex: Option<TextureHandle>,
    /// `frames_rendered()` value the processed texture was read at.
    shown_frame: u64,
    status: String,
}

impl ShaderFxApp {
    pub fn new(cc: &eframe::CreationContext<'_>, startup_files: Vec<PathBuf>) -> Self {
        let settings = AppSettings::load();
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let (w, h) = DEFAULT_IMAGE_SIZE;
        let original = ImageHandle::new(default_image(w, h));

        let (controller, status) = match GpuCompositor::headless(&settings.preferred_gpu) {
            Ok(compositor) => {
                let mut status = format!("GPU: {}", compositor.adapter_name());
                let mut controller =
                    PipelineController::new(Registry::builtin(), compositor, DialogExportSink::new(), settings.default_pipeline)
                        .with_scheduler(RenderScheduler::new(settings.render_delay()));
                controller.set_input_image(Some(original.clone()));
                if let Err(e) = controller.initialize() {
                    log_err!("startup pipeline: {}", e);
                    status = e.to_string();
                }
                (Some(controller), status)
            }
            Err(e) => {
                log_err!("GPU init failed: {}", e);
                (None, e.to_string())
            }
        };

        let mut loader = ImageLoader::new();
        if let Some(path) = startup_files.into_iter().rev().find(|p| is_supported_image(p)) {
            loader.request(path);
        }

        Self {
            settings,
            controller,
            loader,
            original,
            original_tex: None,
            processed_tex: None,
            shown_frame: 0,
            status,
        }
    }

    fn open_image(&mut self, path: PathBuf) {
        self.status = format!("Loading {}…", path.display());
        self.loader.request(path);
    }

    fn handle_events(&mut self, events: Vec<PanelEvent>) {
        let Some(controller) = &mut self.controller else { return };
        let now = Instant::now();
        for event in events {
            match controller.handle_event(event, now) {
                Ok(()) => {
                    if let PanelEvent::SelectPipeline(id) = event {
                        self.settings.default_pipeline = controller.selected();
                        self.settings.save();
                        self.status = format!("Pipeline: {}", id);
                    }
                }
                Err(e) => {
                    log_err!("{}", e);
                    self.status = e.to_string();
                }
            }
        }
    }

    /// Re-upload the processed frame when the controller rendered since the
    /// last upload.
    fn sync_processed_texture(&mut self, ctx: &egui::Context) {
        let Some(controller) = &mut self.controller else { return };
        let frames = controller.frames_rendered();
        if frames == self.shown_frame && self.processed_tex.is_some() {
            return;
        }
        match controller.compositor_mut().read_frame() {
            Ok(frame) => {
                let size = [frame.width() as usize, frame.height() as usize];
                let image = ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
                match &mut self.processed_tex {
                    Some(tex) => tex.set(image, TextureOptions::LINEAR),
                    None => self.processed_tex = Some(ctx.load_texture("shaderfx_processed", image, TextureOptions::LINEAR)),
                }
                self.shown_frame = frames;
            }
            Err(e) => {
                log_err!("{}", e);
            }
        }
    }

    fn original_texture(&mut self, ctx: &egui::Context) -> TextureHandle {
        self.original_tex
            .get_or_insert_with(|| {
                let size = [self.original.width() as usize, self.original.height() as usize];
                let image = ColorImage::from_rgba_unmultiplied(size, self.original.pixels().as_raw());
                ctx.load_texture("shaderfx_original", image, TextureOptions::LINEAR)
            })
            .clone()
    }

    fn show_processed(&mut self, ui: &mut egui::Ui) {
        let area = ui.available_rect_before_wrap();
        let aspect = self.original.aspect();
        let ppp = ui.ctx().pixels_per_point();

        if let Some(controller) = &mut self.controller {
            let wanted = render_size(area.width() * ppp, area.height() * ppp, aspect);
            if controller.size() != wanted {
                controller.set_size(wanted.0, wanted.1);
                controller.render();
            }
        }
        self.sync_processed_texture(ui.ctx());

        match &self.processed_tex {
            Some(tex) => paint_fitted(ui, area, tex, aspect),
            None => {
                ui.centered_and_justified(|ui| ui.label("No GPU output"));
            }
        }
    }
}

/// Draw `tex` letterboxed inside `area`.
fn paint_fitted(ui: &mut egui::Ui, area: Rect, tex: &TextureHandle, aspect: f32) {
    let (w, h) = fit_rect(area.width(), area.height(), aspect);
    let rect = Rect::from_center_size(area.center(), egui::vec2(w, h));
    ui.painter().image(tex.id(), rect, FULL_UV, Color32::WHITE);
}

impl eframe::App for ShaderFxApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        let c = crate::compositor::BACKGROUND;
        [c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0, 1.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.settings.save();
        }

        // --- Finished background decodes ---
        while let Some(result) = self.loader.poll() {
            let path = result.path.display().to_string();
            let applied = match &mut self.controller {
                Some(controller) => controller.apply_load_result(result),
                None => result.image,
            };
            match applied {
                Ok(image) => {
                    self.status = path;
                    self.original = image;
                    self.original_tex = None;
                }
                Err(e) => self.status = e,
            }
        }
        if self.loader.is_busy() {
            ctx.request_repaint();
        }

        // --- Drag-and-Drop: the last supported file wins ---
        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(path) = dropped.into_iter().filter_map(|f| f.path).filter(|p| is_supported_image(p)).last() {
            self.open_image(path);
        }

        // --- Coalesced renders from slider drags ---
        if let Some(controller) = &mut self.controller {
            let now = Instant::now();
            controller.tick(now);
            if let Some(wait) = controller.scheduler().time_until_due(now) {
                ctx.request_repaint_after(wait);
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open image…").clicked()
                    && let Some(path) = pick_image_file()
                {
                    self.open_image(path);
                }
                ui.separator();
                ui.label(egui::RichText::new(&self.status).weak());
            });
        });

        let mut events = Vec::new();
        egui::SidePanel::left("control_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if let Some(controller) = &mut self.controller {
                        events = control_panel::show(ui, controller.panel_mut());
                    } else {
                        ui.label("No compatible GPU adapter found.");
                    }
                });
            });
        if !events.is_empty() {
            self.handle_events(events);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let full = ui.available_rect_before_wrap();
            let split = full.left() + full.width() * self.settings.left_panel_fraction;
            let left = Rect::from_min_max(full.min, Pos2::new(split - 2.0, full.max.y));
            let right = Rect::from_min_max(Pos2::new(split + 2.0, full.min.y), full.max);

            let original = self.original_texture(ui.ctx());
            let aspect = self.original.aspect();
            ui.allocate_ui_at_rect(left, |ui| paint_fitted(ui, left, &original, aspect));
            ui.allocate_ui_at_rect(right, |ui| self.show_processed(ui));
        });
    }
}
