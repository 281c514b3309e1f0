//! Geometry for highlight overlays and the zoom view.
//!
//! Bounding boxes arrive as fractions of the edited image. Everything here
//! maps them either to percentage boxes (relative to the displayed image)
//! or to screen rectangles once the image has been fitted into its panel.

use eframe::egui;
use serde::{Deserialize, Serialize};

/// Magnification used when zooming onto a single flora item.
pub const ITEM_ZOOM: f32 = 3.0;

/// Rectangle in image-relative coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Forces the rectangle inside the unit square.
    ///
    /// The origin is clamped first, then the size is shrunk so the far
    /// edges stay within 1. Non-finite components become 0.
    pub fn clamped(self) -> Self {
        let x = unit(self.x);
        let y = unit(self.y);
        Self {
            x,
            y,
            width: unit(self.width).min(1.0 - x),
            height: unit(self.height).min(1.0 - y),
        }
    }

    /// Center of the rectangle, still normalized.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Top-center of the rectangle, where the zoom marker points.
    pub fn top_center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y)
    }

    /// Percentage placement relative to the displayed image.
    pub fn to_percent(&self) -> PercentBox {
        PercentBox {
            left: self.x * 100.0,
            top: self.y * 100.0,
            width: self.width * 100.0,
            height: self.height * 100.0,
        }
    }

    /// Maps the rectangle onto the screen area the image occupies.
    pub fn to_screen(&self, image_rect: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_size(
            image_rect.min + egui::vec2(self.x * image_rect.width(), self.y * image_rect.height()),
            egui::vec2(self.width * image_rect.width(), self.height * image_rect.height()),
        )
    }
}

fn unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Overlay placement in percent of the displayed image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Scaling of the image around a fixed focal point.
///
/// The focal point is given in percent of the image; it is the one point
/// that does not move on screen when the scale changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub origin_x: f32,
    pub origin_y: f32,
    pub scale: f32,
}

impl ZoomTransform {
    /// No magnification, used when the whole image is shown.
    pub fn identity() -> Self {
        Self {
            origin_x: 50.0,
            origin_y: 50.0,
            scale: 1.0,
        }
    }

    /// Zoom of [`ITEM_ZOOM`] centered on the rectangle's centroid.
    pub fn focus_on(rect: &NormalizedRect) -> Self {
        let (cx, cy) = rect.center();
        Self {
            origin_x: cx * 100.0,
            origin_y: cy * 100.0,
            scale: ITEM_ZOOM,
        }
    }

    /// Where a point of the image (in percent) ends up after scaling.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.origin_x + (x - self.origin_x) * self.scale,
            self.origin_y + (y - self.origin_y) * self.scale,
        )
    }

    /// Texture coordinates visible through the unscaled frame.
    ///
    /// Painting this sub-rectangle of the texture into the full frame is
    /// equivalent to scaling the image around the origin and clipping.
    pub fn uv_window(&self) -> egui::Rect {
        let ox = self.origin_x / 100.0;
        let oy = self.origin_y / 100.0;
        let inv = 1.0 / self.scale.max(1.0);
        egui::Rect::from_min_max(
            egui::pos2(ox - ox * inv, oy - oy * inv),
            egui::pos2(ox + (1.0 - ox) * inv, oy + (1.0 - oy) * inv),
        )
    }
}

/// Largest rectangle with the image's aspect ratio that fits in `container`,
/// centered in it.
pub fn fit_rect(container: egui::Rect, image_size: egui::Vec2) -> egui::Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return container;
    }
    let scale = (container.width() / image_size.x).min(container.height() / image_size.y);
    egui::Rect::from_center_size(container.center(), image_size * scale)
}
