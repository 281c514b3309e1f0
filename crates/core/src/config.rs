use dotenvy::dotenv;
use std::env;

/// Model used for the image edit step unless overridden.
pub const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image";

/// Model used for the flora identification step unless overridden.
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-2.5-flash";

/// Runtime configuration.
///
/// The API key may be absent. The Gemini clients turn that into an
/// [`AppError::Upstream`](crate::error::AppError::Upstream) when a run
/// starts, so the window still opens.
#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub edit_model: String,
    pub extraction_model: String,
}

impl Config {
    pub fn load() -> Self {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            tracing::warn!("GEMINI_API_KEY is not set, every run will fail");
        }

        let edit_model =
            env::var("GEMINI_EDIT_MODEL").unwrap_or_else(|_| DEFAULT_EDIT_MODEL.to_string());
        let extraction_model = env::var("GEMINI_EXTRACTION_MODEL")
            .unwrap_or_else(|_| DEFAULT_EXTRACTION_MODEL.to_string());

        Self::builder()
            .with_api_key(api_key)
            .with_edit_model(edit_model)
            .with_extraction_model(extraction_model)
            .build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The API key, or `None` when it is missing or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref()
    }
}

/// Explicit construction of a [`Config`] without touching the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    edit_model: Option<String>,
    extraction_model: Option<String>,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_edit_model(mut self, model: impl Into<String>) -> Self {
        self.edit_model = Some(model.into());
        self
    }

    pub fn with_extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = Some(model.into());
        self
    }

    pub fn build(self) -> Config {
        Config {
            gemini_api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            edit_model: non_empty_or(self.edit_model, DEFAULT_EDIT_MODEL),
            extraction_model: non_empty_or(self.extraction_model, DEFAULT_EXTRACTION_MODEL),
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
