use lumber_world::{HeightSampler, load_config_from_path};

use super::App;

impl App {
    pub fn process_config_file_events(&mut self) {
        let mut changed = false;
        for _ in self.config_event_rx.try_iter() {
            changed = true;
        }
        if !changed {
            return;
        }
        if !self.config_path.exists() {
            log::warn!("world config missing: {}", self.config_path.display());
            return;
        }
        match load_config_from_path(&self.config_path) {
            Ok(mut cfg) => {
                if let Some(seed) = self.seed_override {
                    cfg.world.seed = seed;
                }
                let sampler = HeightSampler::from_config(&cfg);
                self.streamer.set_terrain(sampler.clone());
                self.scatter.set_sampler(sampler);
                log::info!("world config reloaded from {}", self.config_path.display());
                log::info!("Existing chunks unchanged; new chunks use updated terrain");
                if cfg.streaming != *self.streamer.config() {
                    log::warn!("[streaming] changes take effect on restart");
                }
            }
            Err(e) => {
                log::warn!(
                    "world config reload failed ({}): {}",
                    self.config_path.display(),
                    e
                );
            }
        }
    }
}
