use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{error, info};

use anigrid::controller::Controller;
use anigrid::domain::{AppConfig, GridError, Message};
use anigrid::logging;
use anigrid::model::{Model, Status};
use anigrid::source::FileCatalog;
use anigrid::theme::{ThemeChoice, ThemeKind};
use anigrid::ui::TableUI;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

/// Browse an anime catalog and its download links in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Catalog file with the columns id, title, synopsis and poster (csv, parquet or arrow)
    catalog: String,

    /// Episode file with the columns anime_id, episode, server and url
    #[arg(short, long)]
    episodes: Option<String>,

    #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
    theme: ThemeArg,

    /// Do not alternate row backgrounds
    #[arg(long)]
    no_stripes: bool,

    /// Column the filter prompt matches against
    #[arg(long, default_value = "Title")]
    filter_column: String,

    #[arg(long, default_value_t = 12)]
    min_column_width: u16,

    /// Event poll timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Attempts per catalog search
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Pause between search attempts in milliseconds
    #[arg(long, default_value_t = 250)]
    retry_delay_ms: u64,

    #[arg(long, default_value = "anigrid.log")]
    log_file: String,
}

fn expand_path(path: &str) -> Result<PathBuf, GridError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| GridError::LoadingFailed(format!("cannot expand {path}: {e}")))
}

fn build_config(args: &Args) -> Result<AppConfig, GridError> {
    let kind = match args.theme {
        ThemeArg::Light => ThemeKind::Light,
        ThemeArg::Dark => ThemeKind::Dark,
    };
    let mut config = AppConfig::default()
        .catalog_path(expand_path(&args.catalog)?)
        .theme(ThemeChoice {
            kind,
            striped: !args.no_stripes,
        })
        .filter_column(args.filter_column.clone())
        .min_column_width(args.min_column_width)
        .event_poll_time(args.poll_ms)
        .retry_attempts(args.retries.max(1))
        .retry_delay(Duration::from_millis(args.retry_delay_ms));
    if let Some(episodes) = &args.episodes {
        config = config.episodes_path(expand_path(episodes)?);
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: &Args) -> Result<(), GridError> {
    let config = build_config(args)?;
    logging::init(&expand_path(&args.log_file)?)?;
    info!("Starting with {:?}", config);

    let source = FileCatalog::open(&config.catalog_path, config.episodes_path.as_deref())?;
    let mut model = Model::init(&config, Box::new(source));
    let mut ui = TableUI::new();
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .map_err(GridError::from)
        .and_then(|_| event_loop(&mut terminal, &mut model, &mut ui, &controller));
    if let Err(e) = execute!(stdout(), DisableMouseCapture) {
        error!("Could not release the mouse: {e}");
    }
    ratatui::restore();
    info!("Stopped");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
) -> Result<(), GridError> {
    let size = terminal.size()?;
    model.update(Message::Resize(size.width, size.height))?;

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model, ui.hits())? {
            model.update(message)?;
        };
    }
    Ok(())
}
