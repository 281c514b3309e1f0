use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use termimad::crossterm::style::Color;
use termimad::MadSkin;
use tracing_subscriber::EnvFilter;
use verdant_core::{init, Config, FloraDetail, ProcessingState, Verdant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to process right away (PNG, JPEG or WEBP)
    image: Option<PathBuf>,

    /// Override the image edit model defined in .env
    #[arg(long)]
    edit_model: Option<String>,

    /// Override the flora identification model defined in .env
    #[arg(long)]
    extraction_model: Option<String>,

    /// Process IMAGE in the terminal instead of opening a window
    #[arg(long, requires = "image")]
    headless: bool,

    /// With --headless, print the flora details as JSON
    #[arg(long, requires = "headless")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    // Load config and apply CLI overrides
    let mut config = Config::load();
    if let Some(model) = args.edit_model {
        config.edit_model = model;
    }
    if let Some(model) = args.extraction_model {
        config.extraction_model = model;
    }

    let app = Verdant::with_config(config);

    if !args.headless {
        return app
            .run_interactive(args.image)
            .context("Failed to run the Verdant window");
    }

    let Some(path) = args.image else {
        bail!("--headless needs an image path");
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = app
        .process_file(&path, |state| {
            if let ProcessingState::Loading(stage) = state {
                spinner.set_message(stage.message());
            }
        })
        .await;

    spinner.finish_and_clear();

    let session = result.with_context(|| format!("Generation failed for {}", path.display()))?;
    let flora = session.flora().unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(flora)?);
    } else {
        print_markdown(&flora_markdown(flora));
    }

    Ok(())
}

fn flora_markdown(flora: &[FloraDetail]) -> String {
    if flora.is_empty() {
        return "*AI added plants, but could not identify them with confidence.*\n".to_string();
    }

    let mut text = String::from("# Added Flora Details\n\n");
    for detail in flora {
        let pct = detail.bounding_box.to_percent();
        text.push_str(&format!(
            "## {}\n{}\n\n**Care Tips:** {}\n\n",
            detail.name, detail.description, detail.care_tips
        ));
        text.push_str(&format!(
            "*Location:* left {:.0}%, top {:.0}%, {:.0}% × {:.0}%\n\n",
            pct.left, pct.top, pct.width, pct.height
        ));
    }
    text
}

/// Helper to print markdown
fn print_markdown(text: &str) {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.italic.set_fg(Color::Magenta);
    skin.headers[0].set_fg(Color::Green);
    skin.headers[1].set_fg(Color::Green);

    skin.print_text(text);
}
