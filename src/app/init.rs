use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use lumber_geom::Vec2;
use lumber_stream::{ChunkCenteredObserver, SharedObserver, StreamError, Streamer};
use lumber_world::{ConfigError, HeightSampler, WorldConfig, load_config_from_path};

use super::{App, Motion};
use crate::renderer::HeadlessRenderer;
use crate::scatter::ScatterListener;

/// Reads the world config, falling back to defaults when `path` does not
/// exist, then applies command-line overrides.
pub fn load_world_config(
    path: &Path,
    seed: Option<i32>,
    render_distance: Option<i32>,
) -> Result<WorldConfig, ConfigError> {
    let mut cfg = if path.exists() {
        let cfg = load_config_from_path(path)?;
        log::info!("loaded world config from {}", path.display());
        cfg
    } else {
        log::info!("{} not found; using default world config", path.display());
        WorldConfig::default()
    };
    if let Some(seed) = seed {
        cfg.world.seed = seed;
    }
    if let Some(rd) = render_distance {
        cfg.streaming.render_distance = rd;
    }
    cfg.validate()?;
    Ok(cfg)
}

impl App {
    pub fn new(
        cfg: WorldConfig,
        config_path: PathBuf,
        seed_override: Option<i32>,
        motion: Motion,
        watch_config: bool,
    ) -> Result<Self, StreamError> {
        let sampler = HeightSampler::from_config(&cfg);
        let observer = SharedObserver::new(Vec2::ZERO);
        let centred = ChunkCenteredObserver::new(observer.clone(), cfg.streaming.chunk_world_size());
        let streamer = Streamer::with_terrain(&cfg.streaming, Arc::new(centred), sampler.clone())?;
        let scatter = ScatterListener::new(&cfg.streaming, &cfg.vegetation, sampler);
        log::info!(
            "world '{}' seed {}: {} terrain layers, observer moving at ({:.0}, {:.0}) u/s",
            cfg.world.name,
            cfg.world.seed,
            cfg.terrain.layers.len(),
            motion.velocity.x,
            motion.velocity.y
        );

        // File watcher for the world config
        let (cfg_tx, cfg_rx) = std::sync::mpsc::channel::<()>();
        if watch_config {
            let tx = cfg_tx.clone();
            let path = config_path.clone();
            std::thread::spawn(move || {
                use notify::{EventKind, RecursiveMode, Watcher};
                match notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                    if let Ok(event) = res {
                        match event.kind {
                            EventKind::Modify(_)
                            | EventKind::Create(_)
                            | EventKind::Remove(_)
                            | EventKind::Any => {
                                let _ = tx.send(());
                            }
                            _ => {}
                        }
                    }
                }) {
                    Ok(mut watcher) => {
                        if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
                            log::warn!("cannot watch {}: {}", path.display(), e);
                            return;
                        }
                        loop {
                            std::thread::sleep(std::time::Duration::from_secs(3600));
                        }
                    }
                    Err(e) => log::warn!("config watcher unavailable: {}", e),
                }
            });
        }

        Ok(Self {
            streamer,
            observer,
            renderer: HeadlessRenderer::new(),
            scatter,
            motion,
            position: Vec2::ZERO,
            frames: 0,
            started: Instant::now(),
            config_event_rx: cfg_rx,
            config_path,
            seed_override,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults_with_overrides() {
        let cfg = load_world_config(Path::new("no/such/lumber.toml"), Some(42), Some(3)).unwrap();
        assert_eq!(cfg.world.seed, 42);
        assert_eq!(cfg.streaming.render_distance, 3);
        assert_eq!(cfg.streaming.grid_cell_count, 100);
    }

    #[test]
    fn shipped_config_parses() {
        let cfg = lumber_world::parse_config(include_str!("../../lumber.toml")).unwrap();
        assert_eq!(cfg.world.name, "valley");
        assert_eq!(cfg.terrain.layers.len(), 3);
        assert_eq!(cfg.streaming.target_count(), 121);
    }

    #[test]
    fn negative_render_distance_override_is_rejected() {
        let err = load_world_config(Path::new("no/such/lumber.toml"), None, Some(-1)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
