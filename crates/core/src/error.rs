//! Error types for the verdant-core library.
//!
//! Each failure mode of the upload → edit → identify chain has its own
//! variant so callers can tell a backend outage apart from a malformed
//! answer, while the UI only ever shows the rendered message.

use thiserror::Error;

/// Errors that can occur within the verdant-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values, client setup).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The uploaded file could not be read.
    #[error("Failed to read file: {0}")]
    Read(String),

    /// A data URL did not have the `<prefix>,<payload>` shape or lacked a media type.
    #[error("Invalid data URL: {0}")]
    Format(String),

    /// The uploaded file is not a PNG, JPEG or WEBP image.
    #[error("Unsupported image type: {0}")]
    UnsupportedMediaType(String),

    /// The edit model answered without any inline image part.
    #[error("No image was generated in the response.")]
    NoImageReturned,

    /// The extraction model answered with text that does not match the flora schema.
    #[error("Malformed flora response: {0}")]
    MalformedResponse(String),

    /// Transport, authentication or quota failure reported by the Gemini backend.
    #[error("API Error: {0}")]
    Upstream(String),

    /// Decoding a payload into pixels failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a file read error with the given message.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Creates a data URL format error with the given message.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Creates a malformed response error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Creates an upstream (Gemini backend) error with the given message.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
