//! Conversion between uploaded files and `data:` URLs.
//!
//! The payload stays base64-encoded end to end: it is what the UI keeps in
//! session state and what the Gemini clients send as inline data. Only
//! [`crate::image_processing`] ever decodes it to bytes.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use std::path::Path;

/// Base64 payload plus its declared media type, as carried in a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Renders the payload back into a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Reads an image file and returns it as a data URL.
///
/// The media type is sniffed from the file contents rather than the
/// extension; anything other than PNG, JPEG or WEBP is rejected.
///
/// # Errors
///
/// Returns [`AppError::Read`] if the file cannot be read and
/// [`AppError::UnsupportedMediaType`] if it is not a supported image.
pub async fn encode_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::read(format!("{}: {}", path.display(), e)))?;

    let media_type = sniff_media_type(&bytes)?;
    tracing::debug!(path = %path.display(), media_type, bytes = bytes.len(), "encoded upload");

    Ok(encode_bytes(&bytes, media_type))
}

/// Builds a base64 data URL from raw bytes and a media type.
///
/// Empty `bytes` give a URL with an empty payload, which [`decode`] rejects.
/// [`encode_file`] never produces one since an empty file fails sniffing.
pub fn encode_bytes(bytes: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", media_type, BASE64.encode(bytes))
}

/// Splits a data URL into its base64 payload and media type.
///
/// # Errors
///
/// Returns [`AppError::Format`] when the URL does not split into exactly one
/// prefix and one payload on `,`, when no media type can be found between
/// `:` and `;` in the prefix, or when the payload is empty.
pub fn decode(data_url: &str) -> Result<ImagePayload> {
    let mut parts = data_url.split(',');
    let (Some(prefix), Some(payload), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::format("expected `<prefix>,<payload>`"));
    };

    let mime_type = media_type_token(prefix)
        .ok_or_else(|| AppError::format("could not determine MIME type from data URL"))?;

    if payload.is_empty() {
        return Err(AppError::format("empty payload"));
    }

    Ok(ImagePayload::new(payload, mime_type))
}

/// Text between the first `:` and the next `;`.
fn media_type_token(prefix: &str) -> Option<&str> {
    let (_, rest) = prefix.split_once(':')?;
    let (token, _) = rest.split_once(';')?;
    (!token.is_empty()).then_some(token)
}

/// Maps the detected image format to one of the accepted upload media types.
pub fn sniff_media_type(bytes: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(bytes)
        .map_err(|_| AppError::UnsupportedMediaType("unrecognized file contents".to_string()))?;

    match format {
        ImageFormat::Png => Ok("image/png"),
        ImageFormat::Jpeg => Ok("image/jpeg"),
        ImageFormat::WebP => Ok("image/webp"),
        other => Err(AppError::UnsupportedMediaType(format!("{:?}", other))),
    }
}
