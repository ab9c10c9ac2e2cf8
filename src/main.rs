use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::Vec2;
use log::{info, warn};

use banana_barrage::game::{
    DefaultLevel, JsonProgressStore, LevelCatalog, ProgressStore, Session, SessionEvent,
};
use banana_barrage::{FrameClock, GameConfig};

/// Headless run: one throw against the default tower, events to the log
#[derive(Parser, Debug)]
#[command(about = "Simulate a slingshot throw at the banana tower", version)]
struct Args {
    /// RON config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Progress file, created on first completion
    #[arg(long, default_value = JsonProgressStore::DEFAULT_FILE)]
    progress: PathBuf,

    /// Level to play
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Play without a level number; never completes
    #[arg(long)]
    practice: bool,

    /// Number of levels offered at level select
    #[arg(long, default_value_t = 3)]
    levels: u32,

    /// Drag vector from press to release
    #[arg(long, default_value_t = -120.0, allow_hyphen_values = true)]
    drag_x: f32,
    #[arg(long, default_value_t = -40.0, allow_hyphen_values = true)]
    drag_y: f32,

    /// Simulated seconds
    #[arg(long, default_value_t = 6.0)]
    seconds: f32,

    /// Simulated frames per second
    #[arg(long, default_value_t = 60.0)]
    fps: f32,
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::ProjectileLaunched { id, impulse } => {
            info!("Banana #{} away with impulse {:?}", id, impulse)
        }
        SessionEvent::EntityDestroyed(destroyed) => info!(
            "{} #{} destroyed ({:?})",
            destroyed.category.name(),
            destroyed.id,
            destroyed.cause
        ),
        SessionEvent::ProjectileSlowed { id } => info!("Banana #{} slowed", id),
        SessionEvent::LevelComplete { level } => info!("Level {} cleared!", level),
        SessionEvent::ReturnToLevelSelect => info!("Back to level select"),
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    info!("Starting Banana Barrage (headless)...");

    let config = match &args.config {
        Some(path) => GameConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    for problem in config.validate() {
        warn!("Config: {}", problem);
    }

    if !args.fps.is_finite() || args.fps <= 0.0 {
        bail!("--fps must be positive, got {}", args.fps);
    }

    let mut progress = JsonProgressStore::load(&args.progress);
    let catalog = LevelCatalog::new(1..=args.levels);
    for entry in catalog.entries(&progress) {
        info!(
            "Level {}: {}",
            entry.number,
            if entry.unlocked { "unlocked" } else { "locked" }
        );
    }

    let source = DefaultLevel::from_config(&config);
    {
        let mut session = if args.practice {
            Session::practice(&config, &source, &mut progress)?
        } else {
            if !catalog.can_start(args.level, &progress) {
                bail!("Level {} is not available", args.level);
            }
            Session::start_level(&config, args.level, &source, &mut progress)?
        };

        session.on_throw_released(Vec2::ZERO, Vec2::new(args.drag_x, args.drag_y));

        let mut clock = FrameClock::new();
        let frame_time = 1.0 / args.fps;
        let frames = (args.seconds.max(0.0) * args.fps).ceil() as u64;

        for _ in 0..frames {
            for _ in 0..clock.begin_frame(frame_time) {
                session.on_frame(clock.fixed_timestep());
            }
            for event in session.drain_events() {
                log_event(&event);
            }
            if session.should_return_to_menu() {
                break;
            }
        }

        info!(
            "Stopped after {:.2}s: state {}, {} enemies left",
            clock.elapsed_secs(),
            session.state().name(),
            session.active_enemies().len()
        );
    }

    if progress.is_dirty() {
        progress.save().context("Failed to save progress")?;
        info!(
            "Progress saved to {} (unlocked {:?})",
            progress.path().display(),
            progress.unlocked_levels()
        );
    }

    Ok(())
}
