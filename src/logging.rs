use std::error::Error;
use std::fs::File;
use std::path::Path;

use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

/// Level for the file logger. Only bare level names are understood; any
/// other filter comes back as `Err` with the `Info` fallback.
fn file_level(rust_log: Option<&str>) -> Result<LevelFilter, LevelFilter> {
    match rust_log {
        None => Ok(LevelFilter::Info),
        Some(s) => s.trim().parse::<LevelFilter>().map_err(|_| LevelFilter::Info),
    }
}

/// `env_logger` on stderr (`RUST_LOG`, default `info`). With a log file the
/// terminal and the file share one level taken from `RUST_LOG` when it is a
/// bare level name.
pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()?;
        return Ok(());
    };
    let rust_log = std::env::var("RUST_LOG").ok();
    let parsed = file_level(rust_log.as_deref());
    let level = parsed.unwrap_or_else(|fallback| fallback);
    let file = File::create(path)?;
    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), file),
    ])?;
    if parsed.is_err() {
        log::warn!(
            "RUST_LOG={:?} is not a plain level; --log-file logs at {}",
            rust_log.unwrap_or_default(),
            level
        );
    }
    log::info!("logging to {}", path.display());
    Ok(())
}
