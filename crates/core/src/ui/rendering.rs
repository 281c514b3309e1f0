//! Drawing helpers for the image panels, overlays and zoom view.

use crate::flora::FloraDetail;
use crate::overlay::{fit_rect, ZoomTransform};
use eframe::egui;

pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(22, 163, 74);
pub const ACCENT_DARK: egui::Color32 = egui::Color32::from_rgb(20, 83, 45);
pub const PANEL_FILL: egui::Color32 = egui::Color32::WHITE;
pub const PANEL_STROKE: egui::Color32 = egui::Color32::from_rgb(187, 247, 208);
pub const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
pub const MUTED: egui::Color32 = egui::Color32::from_rgb(107, 114, 128);

/// Allocates a square, clickable panel spanning the available width.
pub fn square_panel(ui: &mut egui::Ui) -> (egui::Rect, egui::Response) {
    let side = ui.available_width();
    let (rect, response) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::click());
    ui.painter().rect_filled(rect, 8.0, PANEL_FILL);
    ui.painter().rect_stroke(
        rect,
        8.0,
        egui::Stroke::new(1.0, PANEL_STROKE),
        egui::StrokeKind::Inside,
    );
    (rect, response)
}

/// Paints a texture contained in `panel` and returns the rect it occupies.
pub fn paint_contained(
    painter: &egui::Painter,
    texture: &egui::TextureHandle,
    panel: egui::Rect,
) -> egui::Rect {
    let image_rect = fit_rect(panel, texture.size_vec2());
    painter.image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
    image_rect
}

/// Paints a texture through a zoom transform, clipped to `frame`.
pub fn paint_zoomed(
    painter: &egui::Painter,
    texture: &egui::TextureHandle,
    frame: egui::Rect,
    zoom: &ZoomTransform,
) {
    painter
        .with_clip_rect(frame)
        .image(texture.id(), frame, zoom.uv_window(), egui::Color32::WHITE);
}

/// Highlight box for a hovered flora item, with its name above.
pub fn draw_highlight(painter: &egui::Painter, image_rect: egui::Rect, detail: &FloraDetail) {
    let rect = detail.bounding_box.to_screen(image_rect);

    painter.rect_filled(rect, 6.0, ACCENT.gamma_multiply(0.2));
    painter.rect_stroke(
        rect,
        6.0,
        egui::Stroke::new(4.0, ACCENT),
        egui::StrokeKind::Inside,
    );

    draw_pill(
        painter,
        egui::pos2(rect.min.x, rect.min.y - 4.0),
        egui::Align2::LEFT_BOTTOM,
        &detail.name,
        12.0,
    );
}

/// Name label with a downward arrow whose tip sits just above `anchor`.
pub fn draw_zoom_marker(painter: &egui::Painter, anchor: egui::Pos2, name: &str) {
    let tip = anchor - egui::vec2(0.0, 8.0);
    let arrow_height = 16.0;
    let half_width = 10.0;

    painter.add(egui::Shape::convex_polygon(
        vec![
            tip,
            egui::pos2(tip.x - half_width, tip.y - arrow_height),
            egui::pos2(tip.x + half_width, tip.y - arrow_height),
        ],
        ACCENT,
        egui::Stroke::NONE,
    ));

    draw_pill(
        painter,
        egui::pos2(tip.x, tip.y - arrow_height - 2.0),
        egui::Align2::CENTER_BOTTOM,
        name,
        16.0,
    );
}

/// Rounded label on an accent background.
fn draw_pill(
    painter: &egui::Painter,
    pos: egui::Pos2,
    align: egui::Align2,
    text: &str,
    size: f32,
) {
    let galley = painter.layout_no_wrap(
        text.to_string(),
        egui::FontId::proportional(size),
        egui::Color32::WHITE,
    );
    let padding = egui::vec2(size * 0.6, size * 0.25);
    let rect = align.anchor_size(pos, galley.size() + padding * 2.0);

    painter.rect_filled(rect, rect.height() / 2.0, ACCENT);
    painter.galley(rect.min + padding, galley, egui::Color32::WHITE);
}

/// Spinner with a status line, centered in `rect`.
pub fn draw_loader(ui: &egui::Ui, rect: egui::Rect, message: &str) {
    let spinner_rect =
        egui::Rect::from_center_size(rect.center() - egui::vec2(0.0, 16.0), egui::vec2(40.0, 40.0));
    egui::Spinner::new().color(ACCENT).paint_at(ui, spinner_rect);

    ui.painter().text(
        rect.center() + egui::vec2(0.0, 24.0),
        egui::Align2::CENTER_TOP,
        message,
        egui::FontId::proportional(15.0),
        ACCENT_DARK,
    );
}

/// Title and body text centered in `rect`.
pub fn draw_message(
    painter: &egui::Painter,
    rect: egui::Rect,
    title: &str,
    body: &str,
    color: egui::Color32,
) {
    let body_galley = painter.layout(
        body.to_string(),
        egui::FontId::proportional(13.0),
        color,
        rect.width() * 0.8,
    );

    painter.text(
        rect.center() - egui::vec2(0.0, 8.0),
        egui::Align2::CENTER_BOTTOM,
        title,
        egui::FontId::proportional(17.0),
        color,
    );
    let body_pos = egui::pos2(rect.center().x - body_galley.size().x / 2.0, rect.center().y + 4.0);
    painter.galley(body_pos, body_galley, color);
}

/// Dimmed hint drawn over the edited image while hovered.
pub fn draw_zoom_hint(painter: &egui::Painter, image_rect: egui::Rect) {
    painter.rect_filled(image_rect, 0.0, egui::Color32::from_black_alpha(128));
    painter.text(
        image_rect.center(),
        egui::Align2::CENTER_CENTER,
        "🔍",
        egui::FontId::proportional(48.0),
        egui::Color32::WHITE,
    );
}
