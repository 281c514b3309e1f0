//! User interface for verdant.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: hover/zoom interaction state and worker messages
//! - [`rendering`]: drawing helpers for panels, overlays and the zoom view
//! - [`garden_view`]: the `eframe::App` tying session state to the screen
//!
//! # Usage
//!
//! ```ignore
//! use verdant_core::{ui, Config};
//!
//! let config = Config::load();
//! ui::run_app(config, None)?;
//! ```

mod garden_view;
mod rendering;
mod state;

pub use garden_view::GardenView;
pub use state::{Interaction, ZoomState};

use crate::config::Config;
use crate::error::{AppError, Result};
use eframe::egui;
use std::path::PathBuf;

/// Opens the application window and blocks until it is closed.
///
/// # Arguments
/// * `config` - Credentials and model names for the Gemini clients
/// * `initial` - A photo to start processing right away
pub fn run_app(config: Config, initial: Option<PathBuf>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Verdant")
            .with_inner_size([1200.0, 900.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Verdant",
        options,
        Box::new(move |_cc| Ok(Box::new(GardenView::new(config, initial)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
