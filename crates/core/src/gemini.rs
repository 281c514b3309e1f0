use crate::config::Config;
use crate::data_url::ImagePayload;
use crate::error::{AppError, Result};
use gemini_rust::{Blob, Content, Gemini, GenerationConfig, Message, Part, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Thin wrapper around one Gemini model.
///
/// The API key comes from the injected [`Config`]; nothing here reads the
/// process environment.
pub struct GeminiClient {
    client: Gemini,
    model: String,
}

impl GeminiClient {
    /// Builds a client for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Upstream`] when the configuration carries no API
    /// key, the same way the backend would reject an unauthenticated call.
    pub fn new(config: &Config, model: &str) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| AppError::upstream("missing API key"))?;

        // Explicit base URL avoids the BadScheme error from the default builder
        let base_url = url::Url::parse(API_BASE)
            .map_err(|e| AppError::config(format!("Invalid base URL: {}", e)))?;

        let model_name = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        let model_url = format!("{}{}", API_BASE, model_name);

        let client = Gemini::with_model_and_base_url(api_key, model_url, base_url)
            .map_err(|e| AppError::config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one user turn and returns the parts of the first candidate.
    ///
    /// An answer without candidates yields an empty list; interpreting that
    /// is up to the caller.
    pub async fn generate(
        &self,
        parts: Vec<Part>,
        generation_config: GenerationConfig,
    ) -> Result<Vec<Part>> {
        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(parts),
            },
        };

        tracing::debug!(model = %self.model, "sending Gemini request");

        let response = self
            .client
            .generate_content()
            .with_messages(vec![message])
            .with_generation_config(generation_config)
            .execute()
            .await
            .map_err(|e| AppError::upstream(e.to_string()))?;

        Ok(response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts)
            .unwrap_or_default())
    }
}

pub fn inline_part(payload: &ImagePayload) -> Part {
    Part::InlineData {
        inline_data: Blob {
            mime_type: payload.mime_type.clone(),
            data: payload.data.clone(),
        },
    }
}

pub fn text_part(text: impl Into<String>) -> Part {
    Part::Text {
        text: text.into(),
        thought: None,
        thought_signature: None,
    }
}

/// Base64 data of the first inline part, in response order.
pub fn first_inline_data(parts: &[Part]) -> Option<&str> {
    parts.iter().find_map(|part| match part {
        Part::InlineData { inline_data, .. } => Some(inline_data.data.as_str()),
        _ => None,
    })
}

/// Concatenated answer text, skipping thought summaries.
pub fn response_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Text { text, thought, .. } if !thought.unwrap_or(false) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(data: &str) -> Part {
        inline_part(&ImagePayload::new(data, "image/png"))
    }

    #[test]
    fn missing_api_key_is_an_upstream_error() {
        let config = Config::builder().with_api_key("  ").build();
        let result = GeminiClient::new(&config, "gemini-2.5-flash");
        assert!(matches!(result, Err(AppError::Upstream(message)) if message.contains("API key")));
    }

    #[test]
    fn first_inline_data_skips_leading_text() {
        let parts = vec![text_part("Here you go"), image("first"), image("second")];
        assert_eq!(first_inline_data(&parts), Some("first"));
    }

    #[test]
    fn first_inline_data_is_none_for_text_only() {
        let parts = vec![text_part("I can't edit this photo.")];
        assert_eq!(first_inline_data(&parts), None);
        assert_eq!(first_inline_data(&[]), None);
    }

    #[test]
    fn response_text_ignores_thoughts_and_images() {
        let thought = Part::Text {
            text: "thinking...".to_string(),
            thought: Some(true),
            thought_signature: None,
        };
        let parts = vec![thought, text_part("{\"flora\":"), image("x"), text_part("[]}")];
        assert_eq!(response_text(&parts), "{\"flora\":[]}");
    }
}
