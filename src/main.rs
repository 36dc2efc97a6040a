use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use simplelog::WriteLogger;

use pvd::app::{ViewerController, ViewerHost};
use pvd::config::{Config, LogConfig};
use pvd::error::{AppError, AppResult};
use pvd::presenter::{PresenterKind, create_presenter};
use pvd::render::Viewport;
use pvd::render::worker::RenderWorker;

const FALLBACK_VIEWPORT: Viewport = Viewport::new(800, 600);

#[derive(Parser, Debug)]
#[command(name = "pvd")]
#[command(version)]
#[command(about = "Minimal full-window PDF and EPUB viewer", long_about = None)]
struct Cli {
    /// Document to open (.pdf or .epub)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Where rendered pages are written as PNG
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Fixed viewport in pixels, e.g. 1280x720; follows the terminal otherwise
    #[arg(long, value_name = "WxH", value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Config file to use instead of the default lookup
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    init_logging(&config.log)?;

    let viewport = match cli.viewport {
        Some(viewport) => viewport,
        None => crossterm::terminal::size()
            .map(|(columns, rows)| {
                Viewport::new(
                    u32::from(columns) * u32::from(config.host.cell_px.0),
                    u32::from(rows) * u32::from(config.host.cell_px.1),
                )
            })
            .unwrap_or(FALLBACK_VIEWPORT),
    };
    let controller = ViewerController::open(&cli.file, viewport, &config)?;
    info!(
        "opened {} ({} policy, background render {})",
        cli.file.display(),
        config.render.policy.as_str(),
        config.render.background
    );

    let worker = if config.render.background {
        Some(RenderWorker::spawn(cli.file.clone(), config.render.clone())?)
    } else {
        None
    };
    let out = cli
        .out
        .unwrap_or_else(|| std::env::temp_dir().join("pvd-current.png"));
    let presenter = create_presenter(PresenterKind::File, out);

    let mut host = ViewerHost::new(controller, presenter, worker, &config.host);
    if cli.viewport.is_some() {
        host = host.with_fixed_viewport();
    }
    host.run().await
}

fn init_logging(log: &LogConfig) -> AppResult<()> {
    let path = log.resolved_file();
    let file = File::create(&path).map_err(|err| {
        AppError::io_with_context(err, format!("failed to create log file {}", path.display()))
    })?;
    WriteLogger::init(log.level_filter(), simplelog::Config::default(), file)
        .map_err(|err| AppError::invalid_argument(format!("failed to install logger: {err}")))
}

fn parse_viewport(value: &str) -> Result<Viewport, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid width {width:?}: {err}"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid height {height:?}: {err}"))?;
    let viewport = Viewport::new(width, height);
    if viewport.is_degenerate() {
        return Err("viewport must be at least 1x1".to_string());
    }
    Ok(viewport)
}
