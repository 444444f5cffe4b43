use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod floorplan;
mod gemini;
mod handler;
mod model;
mod session;
mod tui;
mod ui;

use app::App;
use config::Config;
use gemini::GeminiClient;

#[derive(Parser)]
#[command(name = "architect")]
#[command(version, about = "Terminal design console for architectural consultation with Gemini")]
struct Cli {
    /// Gemini model to consult
    #[arg(short, long)]
    model: Option<String>,

    /// API base URL (defaults to the public Gemini endpoint)
    #[arg(long)]
    base_url: Option<String>,

    /// Where to write logs
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Persist --model and --base-url to the config file
    #[arg(long)]
    save: bool,
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("architect=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(path) => path,
        None => Config::default_log_path()?,
    };
    init_logging(&log_path)?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "could not load config, using defaults");
            Config::default()
        }
    };
    let config = config.with_overrides(cli.model, cli.base_url);
    if cli.save {
        config.save()?;
        info!(path = %Config::get_config_path()?.display(), "saved config");
    }

    let gemini = GeminiClient::new(config.base_url(), config.model(), config.api_key.clone());
    if !gemini.has_api_key() {
        warn!("no API key found in API_KEY, GEMINI_API_KEY or the config file");
    }
    info!(model = gemini.model(), "starting architect");

    let mut app = App::new(gemini);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!("shutting down");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
