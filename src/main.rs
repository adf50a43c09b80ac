use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use clap::{ArgAction, Parser, ValueEnum};
use humantime::parse_rfc3339;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use slideshow_wallpaper::config::Configuration;
use slideshow_wallpaper::render::viewer;
use slideshow_wallpaper::scan::{DirectoryLibrary, ImageSource, Orientation};
use slideshow_wallpaper::selector::Selector;

#[derive(Debug, Parser)]
#[command(
    name = "slideshow-wallpaper",
    version,
    about = "Minute-driven wallpaper slideshow with crossfades"
)]
struct Args {
    /// Path to YAML config; defaults apply when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Override the wallpaper directory
    #[arg(long = "dir", value_name = "PATH")]
    dir: Option<PathBuf>,
    /// Force shuffle selection regardless of config
    #[arg(long)]
    shuffle: bool,
    /// Print the images the next N minutes would show without opening a window
    #[arg(long = "dry-run", value_name = "MINUTES")]
    dry_run: Option<usize>,
    /// Start the dry run at this RFC 3339 instant instead of now
    #[arg(long = "now", value_name = "RFC3339")]
    now: Option<String>,
    /// Display shape assumed by the dry run
    #[arg(long, value_enum, default_value_t = OrientationArg::Landscape)]
    orientation: OrientationArg,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{default},winit=warn"))),
        )
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        dir,
        shuffle,
        dry_run,
        now,
        orientation,
        verbose,
    } = Args::parse();
    init_tracing(verbose);

    let mut cfg = match config.as_ref() {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(dir) = dir {
        cfg.wallpaper_path = dir;
    }
    if shuffle {
        cfg.shuffle = true;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::debug!("effective configuration:\n{:#?}", cfg);

    if let Some(minutes) = dry_run {
        let start = match now {
            Some(ts) => {
                let at = parse_rfc3339(&ts).context("failed to parse --now")?;
                DateTime::<Local>::from(at).naive_local()
            }
            None => Local::now().naive_local(),
        };
        return run_dry_run(&cfg, orientation.into(), start, minutes);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; shutting down");
            cancel.cancel();
        });
    }

    viewer::run_windowed(cfg, cancel)
}

fn run_dry_run(
    cfg: &Configuration,
    orientation: Orientation,
    start: NaiveDateTime,
    minutes: usize,
) -> Result<()> {
    let library = DirectoryLibrary::new(cfg.wallpaper_path.clone());
    let images = library
        .list_images(orientation)
        .with_context(|| format!("failed to list {}", cfg.wallpaper_path.display()))?;

    println!(
        "# slideshow dry run\n# images: {}\n# start: {}\n# mode: {:?}\n# orientation: {:?}\n",
        images.len(),
        start.format("%Y-%m-%d %H:%M:%S"),
        cfg.selection_mode(),
        orientation,
    );

    if images.is_empty() {
        println!(
            "(no images discovered under {})",
            library.root().display()
        );
        return Ok(());
    }

    let mut selector = Selector::new(cfg.selection_mode());
    for minute in 0..minutes {
        let at = start + TimeDelta::minutes(minute as i64);
        let selection = selector.select(at, images.len())?;
        let marker = if selection.changed { ' ' } else { '=' };
        println!(
            "  {} {marker} {:>4}: {}",
            at.format("%Y-%m-%d %H:%M"),
            selection.index,
            images[selection.index].display()
        );
        selector.commit(selection.index);
    }

    Ok(())
}
