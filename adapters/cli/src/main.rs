#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Escape the Block experience.

mod session;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use escape_block_core::{Tunables, GAME_TITLE};
use escape_block_rendering::{Presentation, RenderingBackend, Scene};
use escape_block_rendering_macroquad::MacroquadBackend;
use escape_block_world::query;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::session::{Outcome, Session};

/// First-person escape game on a randomly generated block maze.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Side length of the generated map; overrides the config file.
    #[arg(long)]
    size: Option<u32>,

    /// Seed for reproducible maps; a random seed is used when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file with tunables; missing sections keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Synchronise presentation with the display refresh rate.
    #[arg(long, conflicts_with = "no_vsync")]
    vsync: bool,

    /// Render as fast as possible.
    #[arg(long)]
    no_vsync: bool,

    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,

    /// Print the map and simulate the chase without opening a window.
    #[arg(long)]
    headless: bool,

    /// Physics ticks simulated in headless mode.
    #[arg(long, default_value_t = 3_600)]
    ticks: u32,
}

impl Args {
    fn vsync(&self) -> Option<bool> {
        match (self.vsync, self.no_vsync) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Entry point for the Escape the Block command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let tunables = load_tunables(&args)?;

    let rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    info!(size = tunables.grid.size, seed = ?args.seed, "session_configured");
    let mut session = Session::new(tunables, rng)?;

    if args.headless {
        println!("{}", query::grid(session.world()));
        match session.run_headless(args.ticks) {
            Outcome::Caught { ticks, survived } => println!(
                "Caught after {ticks} ticks; survived {:.2} s.",
                survived.as_secs_f64()
            ),
            Outcome::Survived { ticks } => println!("Still free after {ticks} ticks."),
        }
        return Ok(());
    }

    let backend = match args.vsync() {
        Some(enabled) => MacroquadBackend::new().with_vsync(enabled),
        None => MacroquadBackend::new(),
    }
    .with_show_fps(args.show_fps);

    let scene = Scene::default();
    let presentation = Presentation::new(GAME_TITLE, scene.palette.background, scene);
    backend.run(presentation, move |dt, input, scene| {
        session.update_frame(dt, input, scene)
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_tunables(args: &Args) -> Result<Tunables> {
    let mut tunables = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str::<Tunables>(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => Tunables::default(),
    };

    if let Some(size) = args.size {
        tunables.grid.size = size;
    }
    tunables.validate().context("invalid tunables")?;
    Ok(tunables)
}
