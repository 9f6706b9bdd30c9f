//! Bubbletui — pop groups of same-coloured bubbles in the terminal.

mod app;
mod board;
mod bubble;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use board::BoardConfig;
use clap::{Parser, ValueEnum};
use std::path::Path;

/// Front-end options derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub seed: Option<u64>,
    pub no_animation: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        log::warn!("falling back to default theme: {err}");
        theme::Theme::default_for_palette(args.palette)
    });
    let config = GameConfig {
        board: BoardConfig {
            width: args.width as usize,
            height: args.height as usize,
            kinds: args.colors,
            min_group: args.min_group,
            adjacency: args.adjacency,
        },
        seed: args.seed,
        no_animation: args.no_animation,
    };
    // Reject a bad board before the terminal is switched to raw mode.
    config.board.validate()?;
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Route `log` output to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    log::info!("bubbletui {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Bubble-popping puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "bubbletui",
    version,
    about = "Bubble-popping puzzle in the terminal. Pop groups of same-coloured bubbles until no group is left.",
    long_about = "Bubbletui is a terminal take on the classic bubble/same-game puzzle.\n\n\
        Point at a bubble to select its group of touching bubbles of the same colour, then pop it. \
        Each popped bubble scores one point; the bubbles above fall down and new ones drop in from \
        the top. The game ends when no group of at least --min-group bubbles is left.\n\n\
        CONTROLS:\n  Mouse       Hover selects, left click pops\n  Arrows/hjkl Move cursor\n  \
        Enter/Space Pop       R          Restart    P          Pause      Q / Esc    Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board width in columns.
    #[arg(long, default_value = "24", value_name = "COLS")]
    pub width: u16,

    /// Board height in rows.
    #[arg(long, default_value = "17", value_name = "ROWS")]
    pub height: u16,

    /// Number of bubble colours in play (1-8).
    #[arg(short, long, default_value = "5", value_name = "N")]
    pub colors: u8,

    /// Smallest group that can be popped.
    #[arg(long, default_value = "2", value_name = "N")]
    pub min_group: usize,

    /// Which neighbours join a group: four (orthogonal) or eight (with diagonals).
    #[arg(long, default_value = "four")]
    pub adjacency: Adjacency,

    /// Seed for board generation (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the pop animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Skip the title screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Write log output to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Adjacency {
    #[default]
    Four,
    Eight,
}
