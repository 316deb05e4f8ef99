//! Tumble entry point.
//!
//! Runs the simulation headless for a fixed span of simulated time, replaying
//! a scripted input timeline and logging HUD telemetry.
//!
//! Run with: `cargo run -p tumble-game -- --seconds 8`

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info, warn};
use tumble_config::{CliArgs, Config};
use tumble_game::{GameError, InputScript, ScriptPlayer, Simulation};

/// CLI arguments for the game binary.
#[derive(Parser, Debug)]
#[command(name = "tumble", about = "Tumble 2.5D platformer (headless)")]
struct GameArgs {
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 8.0)]
    seconds: f32,

    /// Frame length in milliseconds.
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_ms: f32,

    /// RON input script to replay instead of the demo script.
    #[arg(long)]
    script: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliArgs,
}

fn main() {
    let args = GameArgs::parse();

    let config_dir = match args.overrides.config.clone() {
        Some(dir) => Ok(dir),
        None => Config::default_dir(),
    };
    let file_config = config_dir
        .as_deref()
        .map_err(|e| e.to_string())
        .and_then(|dir| Config::load_or_create(dir).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            Config::default()
        });
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args.overrides);

    let config_dir = config_dir.ok();
    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    tumble_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    let watch = config_dir.map(|dir| ConfigWatch {
        dir,
        current: file_config,
    });
    if let Err(e) = run(&args, &config, watch) {
        error!("{e}");
        std::process::exit(1);
    }
}

/// The on-disk config as last read, polled for edits while running.
struct ConfigWatch {
    dir: PathBuf,
    current: Config,
}

impl ConfigWatch {
    /// Returns the edited config with CLI overrides reapplied, if the file
    /// changed. Read and validation failures keep the running config.
    fn poll(&mut self, overrides: &CliArgs) -> Option<Config> {
        match self.current.reload(&self.dir) {
            Ok(Some(new_config)) => {
                self.current = new_config.clone();
                let mut config = new_config;
                config.apply_cli_overrides(overrides);
                Some(config)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Config reload from {} failed: {e}", self.dir.display());
                None
            }
        }
    }

    fn dir(&self) -> &Path {
        &self.dir
    }
}

fn run(args: &GameArgs, config: &Config, mut watch: Option<ConfigWatch>) -> Result<(), GameError> {
    let script = match &args.script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::demo(),
    };
    let mut playback = ScriptPlayer::new(script);
    let mut sim = Simulation::from_config(config)?;

    let frame_dt = (args.frame_ms / 1000.0).max(f32::EPSILON);
    let hud_interval = config.debug.hud_interval_s.max(frame_dt);
    let mut next_hud = 0.0;
    let reload_interval = config.debug.reload_interval_s;
    let mut next_reload = reload_interval;
    if let Some(watch) = watch.as_ref().filter(|_| reload_interval > 0.0) {
        info!("Watching {} every {reload_interval:.1}s", watch.dir().display());
    }

    info!(
        "Running {:.1}s at {:.2}ms frames, {} substep(s) max",
        args.seconds, args.frame_ms, config.physics.max_substeps
    );

    let mut wall = 0.0;
    while wall < args.seconds {
        for timed in playback.due(wall) {
            sim.key(timed.event);
        }

        let report = sim.frame(frame_dt)?;
        wall += frame_dt;

        if reload_interval > 0.0 && wall >= next_reload {
            next_reload += reload_interval;
            if let Some(new_config) = watch.as_mut().and_then(|w| w.poll(&args.overrides))
                && let Err(e) = sim.apply_config(&new_config)
            {
                warn!("Reloaded config not applied: {e}");
            }
        }

        for hit in &report.damage {
            warn!(
                "Damage: {:?} at {:.1} m/s (tilt {:.2})",
                hit.cause, hit.impact_speed, hit.tilt
            );
        }
        if report.respawned {
            warn!("Player died; respawned (deaths: {})", sim.deaths());
        }
        if wall >= next_hud {
            next_hud += hud_interval;
            info!("{}", report.hud.status_line());
            match report.hud.to_json() {
                Ok(json) => tracing::debug!(target: "tumble::hud", "{json}"),
                Err(e) => warn!("HUD snapshot not serializable: {e}"),
            }
        }
    }

    info!(
        "Done: {:.2}s simulated, {} death(s), script {}",
        sim.elapsed(),
        sim.deaths(),
        if playback.is_finished() { "finished" } else { "cut short" }
    );
    Ok(())
}
