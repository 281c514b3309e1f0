//! Verdant Core Library
//!
//! This library provides the core functionality for Verdant, a tool that
//! adds AI-placed plants and trees to a photo and explains what was added.
//!
//! # Overview
//!
//! A photo goes through two Gemini calls: an image edit that adds flora,
//! then a structured-output request that names each added item and locates
//! it with a normalized bounding box. The library handles:
//!
//! - **Uploads**: file to data URL conversion via [`data_url`]
//! - **AI Integration**: the edit and identification clients in [`editor`] and [`flora`]
//! - **Processing**: the session state machine and run sequencing in [`flow`]
//! - **Presentation**: overlay geometry in [`overlay`] and the window in [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use verdant_core::Verdant;
//!
//! let app = Verdant::new();
//! app.run_interactive(None)?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading and management
//! - [`data_url`]: File/data URL codec
//! - [`editor`]: Generative edit client
//! - [`error`]: Error types and result aliases
//! - [`flora`]: Flora extraction client and response parsing
//! - [`flow`]: Processing flow controller
//! - [`gemini`]: Shared Gemini client plumbing
//! - [`image_processing`]: Payload decoding for display
//! - [`overlay`]: Bounding box and zoom geometry
//! - [`prompts`]: Fixed instructions and response schema
//! - [`ui`]: User interface

pub mod config;
pub mod data_url;
pub mod editor;
pub mod error;
pub mod flora;
pub mod flow;
pub mod gemini;
pub mod image_processing;
pub mod overlay;
pub mod prompts;
pub mod ui;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use flora::FloraDetail;
pub use flow::{ProcessingFlow, ProcessingState, Session, UploadedImage};
pub use overlay::NormalizedRect;

use flow::GeminiFlow;
use std::path::{Path, PathBuf};

/// Main entry point for the Verdant application.
///
/// Holds the configuration and wires it into the Gemini-backed flow or
/// the interactive window.
pub struct Verdant {
    config: Config,
}

impl Verdant {
    /// Creates an instance from environment configuration (`.env` included).
    ///
    /// A missing `GEMINI_API_KEY` is not an error here; runs fail with
    /// [`AppError::Upstream`] instead.
    pub fn new() -> Self {
        Self {
            config: Config::load(),
        }
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Opens the window, optionally processing `initial` right away.
    pub fn run_interactive(&self, initial: Option<PathBuf>) -> Result<()> {
        ui::run_app(self.config.clone(), initial)
    }

    /// Runs the whole flow for one file without a window.
    ///
    /// `on_state` is called after every state change so callers can show
    /// progress. The returned session holds the edited image and the flora
    /// details; on failure the error is returned and nothing is kept.
    pub async fn process_file<F>(&self, path: &Path, mut on_state: F) -> Result<Session>
    where
        F: FnMut(&ProcessingState),
    {
        let flow = GeminiFlow::from_config(&self.config)?;
        let image = UploadedImage::from_path(path).await?;

        let mut session = Session::new();
        let run = session.start(image.clone());
        on_state(session.state());

        flow.run(run, &image, |event| {
            if session.apply(event) {
                on_state(session.state());
            }
        })
        .await?;

        Ok(session)
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Loads `.env` files if present. Call once at startup.
pub fn init() {
    let _ = dotenvy::dotenv();
}
