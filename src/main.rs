//! Headless driver: walks an observer across the terrain and streams chunks around it.
#![forbid(unsafe_code)]

mod app;
mod logging;
mod renderer;
mod scatter;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use app::{App, Motion, load_world_config};

#[derive(Parser, Debug)]
#[command(name = "lumber", about = "Stream terrain chunks around a moving observer")]
struct Args {
    /// World config (TOML); defaults are used when the file does not exist
    #[arg(long, default_value = "lumber.toml")]
    config: PathBuf,
    /// How long to run, in seconds
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,
    /// Observer speed in world units per second
    #[arg(long, default_value_t = 6_000.0)]
    speed: f32,
    /// Direction of travel in degrees, counter-clockwise from +x
    #[arg(long, default_value_t = 0.0)]
    heading: f32,
    /// Override `[world].seed`
    #[arg(long)]
    seed: Option<i32>,
    /// Override `[streaming].render_distance`
    #[arg(long)]
    render_distance: Option<i32>,
    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Reload terrain layers when the config file changes
    #[arg(long)]
    watch_config: bool,
}

const FRAME: Duration = Duration::from_millis(16);

fn main() {
    let args = Args::parse();
    if let Err(e) = logging::init(args.log_file.as_deref()) {
        eprintln!("lumber: cannot set up logging: {e}");
        std::process::exit(2);
    }
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// `--seconds` as a duration; negative, NaN and out-of-range values are errors.
fn run_length(seconds: f32) -> Result<Duration, String> {
    Duration::try_from_secs_f32(seconds)
        .map_err(|e| format!("--seconds must be a non-negative number of seconds, got {seconds}: {e}"))
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let run_for = run_length(args.seconds)?;
    if !(args.speed.is_finite() && args.heading.is_finite()) {
        return Err("--speed and --heading must be finite".into());
    }
    let cfg = load_world_config(&args.config, args.seed, args.render_distance)?;
    let motion = Motion::from_heading(args.heading, args.speed);
    let mut app = App::new(cfg, args.config.clone(), args.seed, motion, args.watch_config)?;

    let start = Instant::now();
    let deadline = start
        .checked_add(run_for)
        .ok_or_else(|| format!("--seconds {} is too far in the future", args.seconds))?;
    let mut last = start;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        app.step(now, (now - last).as_secs_f32());
        last = now;
        std::thread::sleep(FRAME);
    }
    app.finish(Duration::from_secs(30));
    Ok(())
}
