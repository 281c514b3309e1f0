//! Decoding of base64 image payloads for display.
//!
//! The flow itself never touches pixels; this is only used by the UI to
//! turn the original upload and the edited result into textures.

use crate::data_url::ImagePayload;
use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use eframe::egui;
use image::DynamicImage;

/// Image processing utilities for the display path.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Decodes a base64 payload into an image.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the payload is not valid
    /// base64 or the bytes are not a decodable image.
    pub fn decode_payload(payload: &ImagePayload) -> Result<DynamicImage> {
        let bytes = BASE64
            .decode(payload.data.as_bytes())
            .map_err(|e| AppError::image(format!("Invalid base64 payload: {}", e)))?;

        image::load_from_memory(&bytes)
            .map_err(|e| AppError::image(format!("Failed to decode {}: {}", payload.mime_type, e)))
    }

    /// Converts a decoded image into an egui color image ready for upload.
    pub fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
        let image_buffer = image.to_rgba8();
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image_buffer.as_flat_samples();
        egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
    }

    /// Decodes a payload straight to a color image.
    pub fn color_image(payload: &ImagePayload) -> Result<egui::ColorImage> {
        Self::decode_payload(payload).map(|image| Self::to_color_image(&image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_payload(width: u32, height: u32) -> ImagePayload {
        let image = RgbaImage::from_pixel(width, height, Rgba([34, 139, 34, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImagePayload::new(BASE64.encode(bytes), "image/png")
    }

    #[test]
    fn decodes_png_payload_to_color_image() {
        let color = ImageProcessor::color_image(&png_payload(4, 3)).unwrap();
        assert_eq!(color.size, [4, 3]);
    }

    #[test]
    fn rejects_invalid_base64() {
        let payload = ImagePayload::new("not base64!!", "image/png");
        assert!(matches!(
            ImageProcessor::decode_payload(&payload),
            Err(AppError::ImageProcessing(_))
        ));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let payload = ImagePayload::new(BASE64.encode(b"hello"), "image/png");
        assert!(matches!(
            ImageProcessor::decode_payload(&payload),
            Err(AppError::ImageProcessing(_))
        ));
    }
}
