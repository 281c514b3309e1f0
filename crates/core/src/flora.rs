//! Identification of the plants and trees added by the edit step.
//!
//! The extraction model receives the original and the edited photo and
//! answers with JSON constrained by [`flora_response_schema`]. A legitimate
//! "nothing was added" answer (`{"flora": []}`) is a success; anything that
//! does not match the schema is a hard [`AppError::MalformedResponse`].

use crate::config::Config;
use crate::data_url::ImagePayload;
use crate::error::{AppError, Result};
use crate::gemini::{inline_part, response_text, text_part, GeminiClient};
use crate::overlay::NormalizedRect;
use crate::prompts::{flora_response_schema, EXTRACTION_PROMPT};
use async_trait::async_trait;
use gemini_rust::{GenerationConfig, Part};
use serde::{Deserialize, Serialize};

/// One plant or tree reported as newly added to the edited image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloraDetail {
    pub name: String,
    pub description: String,
    pub care_tips: String,
    #[serde(rename = "boundingBox")]
    pub bounding_box: NormalizedRect,
}

#[derive(Deserialize)]
struct FloraEnvelope {
    flora: Vec<FloraDetail>,
}

/// Parses the raw extraction answer.
///
/// Bounding boxes are clamped into the unit square since the model does not
/// reliably honor the range it is asked for.
///
/// # Errors
///
/// Returns [`AppError::MalformedResponse`] if the text is not JSON, if
/// `flora` is missing or not an array, or if an item lacks a required field.
pub fn parse_flora_response(text: &str) -> Result<Vec<FloraDetail>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::malformed("empty response"));
    }

    let envelope: FloraEnvelope =
        serde_json::from_str(trimmed).map_err(|e| AppError::malformed(e.to_string()))?;

    Ok(envelope
        .flora
        .into_iter()
        .map(|mut detail| {
            detail.bounding_box = detail.bounding_box.clamped();
            detail
        })
        .collect())
}

/// Identifies flora present in `edited` but not in `original`.
#[async_trait]
pub trait FloraExtractor: Send + Sync {
    async fn extract_flora(
        &self,
        original: &ImagePayload,
        edited: &ImagePayload,
    ) -> Result<Vec<FloraDetail>>;
}

/// [`FloraExtractor`] backed by a Gemini model with structured output.
pub struct GeminiFloraExtractor {
    client: GeminiClient,
}

impl GeminiFloraExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config, &config.extraction_model)?,
        })
    }
}

/// Prompt, original, edited, in that order, with JSON constrained to the
/// flora schema.
fn extraction_request(
    original: &ImagePayload,
    edited: &ImagePayload,
) -> (Vec<Part>, GenerationConfig) {
    let parts = vec![
        text_part(EXTRACTION_PROMPT),
        inline_part(original),
        inline_part(edited),
    ];
    let generation_config = GenerationConfig {
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(flora_response_schema()),
        ..Default::default()
    };
    (parts, generation_config)
}

#[async_trait]
impl FloraExtractor for GeminiFloraExtractor {
    async fn extract_flora(
        &self,
        original: &ImagePayload,
        edited: &ImagePayload,
    ) -> Result<Vec<FloraDetail>> {
        let (parts, generation_config) = extraction_request(original, edited);
        let response = self.client.generate(parts, generation_config).await?;
        let flora = parse_flora_response(&response_text(&response))?;

        tracing::info!(model = %self.client.model(), count = flora.len(), "flora identified");
        Ok(flora)
    }
}
