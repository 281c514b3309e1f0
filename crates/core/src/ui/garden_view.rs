//! Main application window.
//!
//! `GardenView` owns the [`Session`] and is its only writer. File reads and
//! processing runs happen on worker threads, each with its own current-thread
//! tokio runtime, and report back through a channel drained every frame.

use super::rendering::{
    draw_highlight, draw_loader, draw_message, draw_zoom_hint, draw_zoom_marker, paint_contained,
    paint_zoomed, square_panel, ACCENT, ACCENT_DARK, ERROR_COLOR, MUTED, PANEL_STROKE,
};
use super::state::{EditedPanel, Interaction, WorkerEvent};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::flow::{
    failure_message, FlowEvent, GeminiFlow, RunId, Session, UploadedImage,
};
use crate::image_processing::ImageProcessor;
use crate::overlay::fit_rect;
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub struct GardenView {
    config: Config,
    session: Session,
    interaction: Interaction,

    // Textures for the current session
    original_texture: Option<egui::TextureHandle>,
    edited_texture: Option<egui::TextureHandle>,
    edited_panel: Option<egui::Rect>,
    original_error: Option<String>,
    edited_error: Option<String>,

    /// Latest file read; older reads are dropped when they complete.
    read_ticket: u64,
    pending_path: Option<PathBuf>,
    rx: Receiver<WorkerEvent>,
    tx: Sender<WorkerEvent>,
}

impl GardenView {
    /// Creates the view, optionally starting on a file given at launch.
    pub fn new(config: Config, initial: Option<PathBuf>) -> Self {
        let (tx, rx) = channel();
        Self {
            config,
            session: Session::new(),
            interaction: Interaction::default(),
            original_texture: None,
            edited_texture: None,
            edited_panel: None,
            original_error: None,
            edited_error: None,
            read_ticket: 0,
            pending_path: initial,
            rx,
            tx,
        }
    }

    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", ACCEPTED_EXTENSIONS)
            .pick_file()
        {
            self.load_path(ctx, path);
        }
    }

    /// Reads a picked file in the background.
    fn load_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        self.read_ticket += 1;
        let ticket = self.read_ticket;
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        tracing::debug!(path = %path.display(), ticket, "reading upload");

        thread::spawn(move || {
            let event = match block_on(UploadedImage::from_path(&path)) {
                Ok(Ok(image)) => WorkerEvent::Loaded { ticket, image },
                Ok(Err(e)) | Err(e) => WorkerEvent::ReadFailed {
                    ticket,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    /// Starts a processing run for a freshly read upload.
    fn begin_run(&mut self, ctx: &egui::Context, image: UploadedImage) {
        self.clear_view();
        let run = self.session.start(image.clone());

        match image
            .payload()
            .and_then(|payload| ImageProcessor::color_image(&payload))
        {
            Ok(color_image) => {
                self.original_texture =
                    Some(ctx.load_texture("original", color_image, egui::TextureOptions::LINEAR));
            }
            Err(e) => self.original_error = Some(e.to_string()),
        }

        self.spawn_flow(ctx, run, image);
    }

    fn spawn_flow(&self, ctx: &egui::Context, run: RunId, image: UploadedImage) {
        let tx = self.tx.clone();
        let config = self.config.clone();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let send = |event: FlowEvent| {
                let _ = tx.send(WorkerEvent::Flow(event));
                ctx.request_repaint();
            };

            // Failures inside `run` are already reported through `send`
            let outcome = block_on(async {
                let flow = GeminiFlow::from_config(&config)?;
                let _ = flow.run(run, &image, &send).await;
                Ok::<_, AppError>(())
            });

            if let Err(e) = outcome.and_then(|setup| setup) {
                send_failure(&tx, &ctx, run, &e);
            }
        });
    }

    /// Drains worker messages into the session.
    fn process_worker_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                WorkerEvent::Loaded { ticket, image } if ticket == self.read_ticket => {
                    self.begin_run(ctx, image);
                }
                WorkerEvent::ReadFailed { ticket, message } if ticket == self.read_ticket => {
                    self.clear_view();
                    self.session.fail_upload(message);
                }
                WorkerEvent::Loaded { .. } | WorkerEvent::ReadFailed { .. } => {
                    tracing::debug!("dropping superseded file read");
                }
                WorkerEvent::Flow(event) => {
                    let edited = matches!(event, FlowEvent::Edited { .. });
                    if self.session.apply(event) && edited {
                        self.load_edited_texture(ctx);
                    }
                }
            }
        }
    }

    fn load_edited_texture(&mut self, ctx: &egui::Context) {
        let Some(edited) = self.session.edited() else {
            return;
        };
        match edited
            .payload()
            .and_then(|payload| ImageProcessor::color_image(&payload))
        {
            Ok(color_image) => {
                self.edited_texture =
                    Some(ctx.load_texture("edited", color_image, egui::TextureOptions::LINEAR));
            }
            Err(e) => {
                tracing::warn!(error = %e, "edited image could not be decoded");
                self.edited_error = Some(e.to_string());
            }
        }
    }

    fn clear_view(&mut self) {
        self.interaction.reset();
        self.original_texture = None;
        self.edited_texture = None;
        self.edited_panel = None;
        self.original_error = None;
        self.edited_error = None;
    }

    /// "Upload New Image": drop everything, including pending reads.
    fn reset(&mut self) {
        self.read_ticket += 1;
        self.session.reset();
        self.clear_view();
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .find_map(|file| file.path.clone())
        });
        if let Some(path) = dropped {
            self.load_path(ctx, path);
        }
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            ui.heading(
                egui::RichText::new("AI Plant Suggestion Tool")
                    .size(28.0)
                    .strong()
                    .color(ACCENT_DARK),
            );
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new(
                    "Upload a photo of any space, and the AI will suggest and place suitable \
                     plants and trees to beautify it.",
                )
                .color(MUTED),
            );
            ui.add_space(16.0);
        });
    }

    fn render_upload_prompt(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(2.0, PANEL_STROKE))
            .inner_margin(32.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("⬆").size(48.0).color(MUTED));
                    ui.label(
                        egui::RichText::new("Upload an Image")
                            .size(20.0)
                            .strong()
                            .color(ACCENT_DARK),
                    );
                    ui.label("The AI will automatically add suitable plants or trees.");
                    ui.label(
                        egui::RichText::new("PNG, JPEG or WEBP. You can also drop a file here.")
                            .small()
                            .color(MUTED),
                    );
                    ui.add_space(8.0);
                    let choose = egui::Button::new(egui::RichText::new("Choose File").strong());
                    if ui.add(choose.fill(ACCENT)).clicked() {
                        self.open_file_dialog(ctx);
                    }
                    if let Some(error) = self.session.error() {
                        ui.add_space(8.0);
                        ui.label(egui::RichText::new(error).color(ERROR_COLOR));
                    }
                });
            });
    }

    fn render_original(&self, ui: &mut egui::Ui) {
        panel_title(ui, "Original Image");
        let (panel, _) = square_panel(ui);
        match (&self.original_texture, &self.original_error) {
            (Some(texture), _) => {
                paint_contained(ui.painter(), texture, panel);
            }
            (None, Some(error)) => {
                draw_message(ui.painter(), panel, "Preview unavailable", error, ERROR_COLOR);
            }
            (None, None) => {}
        }
    }

    fn render_edited(&mut self, ui: &mut egui::Ui) {
        panel_title(ui, "Edited Image");
        let (panel, response) = square_panel(ui);
        self.edited_panel = Some(panel);

        let content = EditedPanel::select(
            &self.session,
            self.edited_texture.is_some(),
            self.edited_error.as_deref(),
        );

        match content {
            EditedPanel::Loading(stage) => {
                draw_loader(ui, panel, stage.message());
                ui.ctx().request_repaint();
            }
            EditedPanel::Image => {
                let Some(texture) = &self.edited_texture else {
                    return;
                };
                let image_rect = paint_contained(ui.painter(), texture, panel);
                let flora = self.session.flora().unwrap_or_default();

                if let Some(detail) = self.interaction.visible_highlight(flora) {
                    draw_highlight(ui.painter(), image_rect, detail);
                } else if response.hovered() && !self.interaction.is_zoomed() {
                    draw_zoom_hint(ui.painter(), image_rect);
                }

                if response.clicked() {
                    self.interaction.open_whole_image();
                }
            }
            EditedPanel::PreviewUnavailable(error) => {
                draw_message(ui.painter(), panel, "Preview unavailable", error, ERROR_COLOR);
            }
            EditedPanel::Error(error) => {
                draw_message(ui.painter(), panel, "Error", error, ERROR_COLOR);
            }
            EditedPanel::Placeholder => {
                draw_message(
                    ui.painter(),
                    panel,
                    "🖼",
                    "Your edited image will appear here.",
                    MUTED,
                );
            }
        }
    }

    fn render_details(&mut self, ui: &mut egui::Ui) {
        if self.session.is_loading() {
            return;
        }

        if self.session.details_unavailable() {
            let error = self.session.error().unwrap_or_default().to_string();
            details_frame(ui, |ui| {
                ui.label(
                    egui::RichText::new("Plant details unavailable")
                        .strong()
                        .color(ERROR_COLOR),
                );
                ui.label(egui::RichText::new(error).color(MUTED));
            });
            return;
        }

        let Some(flora) = self.session.flora() else {
            return;
        };

        if flora.is_empty() {
            if self.session.edited().is_some() {
                details_frame(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new(
                                "AI added plants, but could not identify them with confidence.",
                            )
                            .color(MUTED),
                        );
                    });
                });
            }
            return;
        }

        let mut hovered = None;
        let mut clicked = None;

        details_frame(ui, |ui| {
            ui.label(
                egui::RichText::new("Added Flora Details")
                    .size(20.0)
                    .strong()
                    .color(ACCENT_DARK),
            );
            ui.add_space(8.0);

            for (index, detail) in flora.iter().enumerate() {
                let highlighted = self.interaction.highlighted == Some(index);
                let (fill, stroke) = if highlighted {
                    (egui::Color32::from_rgb(240, 253, 244), ACCENT)
                } else {
                    (egui::Color32::WHITE, PANEL_STROKE)
                };
                let card = egui::Frame::group(ui.style())
                    .fill(fill)
                    .stroke(egui::Stroke::new(1.0, stroke))
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(
                            egui::RichText::new(&detail.name)
                                .size(17.0)
                                .strong()
                                .color(ACCENT),
                        );
                        ui.label(&detail.description);
                        ui.horizontal_wrapped(|ui| {
                            ui.label(egui::RichText::new("Care Tips:").strong());
                            ui.label(egui::RichText::new(&detail.care_tips).color(MUTED));
                        });
                    });

                let response = card.response.interact(egui::Sense::click());
                if response.hovered() {
                    hovered = Some(index);
                }
                if response.clicked() {
                    clicked = Some(index);
                }
                ui.add_space(6.0);
            }
        });

        self.interaction.highlighted = hovered;
        if let Some(index) = clicked {
            self.interaction.open_item(index);
            if let Some(panel) = self.edited_panel {
                ui.scroll_to_rect(panel, Some(egui::Align::Center));
            }
        }
    }

    fn render_zoom(&mut self, ctx: &egui::Context) {
        let Some(texture) = &self.edited_texture else {
            return;
        };
        let flora = self.session.flora().unwrap_or_default();
        let Some(zoom) = self.interaction.zoom_transform(flora) else {
            return;
        };
        let marker = self.interaction.zoomed_item(flora).map(|detail| {
            let (x, y) = detail.bounding_box.top_center();
            (zoom.apply(x * 100.0, y * 100.0), detail.name.clone())
        });

        let screen = ctx.viewport_rect();
        let mut close = ctx.input(|i| i.key_pressed(egui::Key::Escape));

        egui::Area::new(egui::Id::new("zoom_view"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let backdrop = ui.allocate_rect(screen, egui::Sense::click());
                ui.painter().rect_filled(screen, 0.0, egui::Color32::from_black_alpha(204));

                let bounds = egui::Rect::from_center_size(screen.center(), screen.size() * 0.9);
                let frame = fit_rect(bounds, texture.size_vec2());
                paint_zoomed(ui.painter(), texture, frame, &zoom);

                if let Some(((px, py), name)) = &marker {
                    let offset =
                        egui::vec2(px / 100.0 * frame.width(), py / 100.0 * frame.height());
                    let anchor = frame.min + offset;
                    draw_zoom_marker(&ui.painter().with_clip_rect(frame), anchor, name);
                }

                let close_rect = egui::Rect::from_min_size(
                    egui::pos2(screen.max.x - 56.0, screen.min.y + 16.0),
                    egui::vec2(40.0, 40.0),
                );
                let close_button =
                    egui::Button::new(egui::RichText::new("✕").size(24.0)).frame(false);
                if ui.put(close_rect, close_button).clicked() {
                    close = true;
                }

                let outside_image = backdrop
                    .interact_pointer_pos()
                    .is_some_and(|pos| !frame.contains(pos));
                if backdrop.clicked() && outside_image {
                    close = true;
                }
            });

        if close {
            self.interaction.close_zoom();
        }
    }
}

impl eframe::App for GardenView {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::light());

        if let Some(path) = self.pending_path.take() {
            self.load_path(ctx, path);
        }

        self.process_worker_events(ctx);
        self.handle_dropped_files(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_header(ui);

                if self.session.original().is_none() {
                    self.render_upload_prompt(ui, ctx);
                    return;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("Upload New Image").clicked() {
                        self.reset();
                    }
                });
                if self.session.original().is_none() {
                    return;
                }
                ui.add_space(12.0);

                ui.columns(2, |columns| {
                    self.render_original(&mut columns[0]);
                    self.render_edited(&mut columns[1]);
                });

                ui.add_space(16.0);
                self.render_details(ui);
            });
        });

        self.render_zoom(ctx);
    }
}

fn panel_title(ui: &mut egui::Ui, title: &str) {
    ui.vertical_centered(|ui| ui.label(egui::RichText::new(title).strong().size(16.0)));
}

fn details_frame(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::group(ui.style())
        .stroke(egui::Stroke::new(1.0, PANEL_STROKE))
        .inner_margin(16.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
}

/// Runs a future to completion on a fresh current-thread runtime.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::ui(format!("Failed to create async runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

fn send_failure(tx: &Sender<WorkerEvent>, ctx: &egui::Context, run: RunId, error: &AppError) {
    let _ = tx.send(WorkerEvent::Flow(FlowEvent::Failed {
        run,
        message: failure_message(error),
    }));
    ctx.request_repaint();
}
