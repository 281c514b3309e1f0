//! Image editing through an image-capable Gemini model.

use crate::config::Config;
use crate::data_url::ImagePayload;
use crate::error::{AppError, Result};
use crate::gemini::{first_inline_data, inline_part, text_part, GeminiClient};
use async_trait::async_trait;
use gemini_rust::{GenerationConfig, Part};

/// Edits an image according to a natural-language instruction.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Returns the base64 payload of the edited image.
    ///
    /// One attempt only; retrying is the caller's decision.
    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<String>;
}

/// [`ImageEditor`] backed by a Gemini image model.
pub struct GeminiImageEditor {
    client: GeminiClient,
}

impl GeminiImageEditor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config, &config.edit_model)?,
        })
    }
}

/// Image first, then the instruction; the answer is restricted to images.
fn edit_request(image: &ImagePayload, instruction: &str) -> (Vec<Part>, GenerationConfig) {
    let parts = vec![inline_part(image), text_part(instruction)];
    let generation_config = GenerationConfig {
        response_modalities: Some(vec!["IMAGE".to_string()]),
        ..Default::default()
    };
    (parts, generation_config)
}

#[async_trait]
impl ImageEditor for GeminiImageEditor {
    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<String> {
        let (parts, generation_config) = edit_request(image, instruction);
        let response = self.client.generate(parts, generation_config).await?;

        let data = first_inline_data(&response).ok_or(AppError::NoImageReturned)?;
        tracing::info!(model = %self.client.model(), bytes = data.len(), "edited image received");
        Ok(data.to_string())
    }
}
