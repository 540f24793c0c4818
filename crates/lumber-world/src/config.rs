use serde::Deserialize;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::quality::{GridResolution, QualityTier};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub world: WorldInfo,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub vegetation: VegetationConfig,
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streaming.validate()?;
        self.vegetation.validate()?;
        for (i, layer) in self.terrain.layers.iter().enumerate() {
            if !(layer.x_scale.is_finite()
                && layer.y_scale.is_finite()
                && layer.x_offset.is_finite()
                && layer.y_offset.is_finite()
                && layer.gain.is_finite())
            {
                return Err(ConfigError::Invalid(format!(
                    "terrain layer {i} has a non-finite parameter"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorldInfo {
    #[serde(default = "default_world_name")]
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: i32,
}

impl Default for WorldInfo {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

fn default_world_name() -> String {
    "default".to_string()
}
fn default_seed() -> i32 {
    1337
}

/// Streaming knobs. Distances in `render_distance`, `deletion_offset` and the
/// LOD cutoffs are in whole chunks.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StreamingConfig {
    #[serde(default = "default_grid_cell_count")]
    pub grid_cell_count: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default = "default_render_distance")]
    pub render_distance: i32,
    #[serde(default = "default_deletion_offset")]
    pub deletion_offset: i32,
    #[serde(default = "default_render_check_period_ms")]
    pub render_check_period_ms: u64,
    #[serde(default = "default_medium_lod_cutoff")]
    pub medium_lod_cutoff: f32,
    #[serde(default = "default_low_lod_cutoff")]
    pub low_lod_cutoff: f32,
    #[serde(default = "default_jobs_per_batch")]
    pub jobs_per_batch: usize,
    #[serde(default = "default_medium_detail_divisor")]
    pub medium_detail_divisor: u32,
    #[serde(default = "default_low_detail_divisor")]
    pub low_detail_divisor: u32,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_material")]
    pub material: String,
}

fn default_grid_cell_count() -> u32 {
    100
}
fn default_tile_size() -> f32 {
    600.0
}
fn default_render_distance() -> i32 {
    5
}
fn default_deletion_offset() -> i32 {
    5
}
fn default_render_check_period_ms() -> u64 {
    1000
}
fn default_medium_lod_cutoff() -> f32 {
    2.0
}
fn default_low_lod_cutoff() -> f32 {
    3.0
}
fn default_jobs_per_batch() -> usize {
    10
}
fn default_medium_detail_divisor() -> u32 {
    5
}
fn default_low_detail_divisor() -> u32 {
    10
}
fn default_material() -> String {
    "terrain/grass".to_string()
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            grid_cell_count: default_grid_cell_count(),
            tile_size: default_tile_size(),
            render_distance: default_render_distance(),
            deletion_offset: default_deletion_offset(),
            render_check_period_ms: default_render_check_period_ms(),
            medium_lod_cutoff: default_medium_lod_cutoff(),
            low_lod_cutoff: default_low_lod_cutoff(),
            jobs_per_batch: default_jobs_per_batch(),
            medium_detail_divisor: default_medium_detail_divisor(),
            low_detail_divisor: default_low_detail_divisor(),
            worker_threads: None,
            material: default_material(),
        }
    }
}

impl StreamingConfig {
    /// Side length of one chunk in world units.
    #[inline]
    pub fn chunk_world_size(&self) -> f32 {
        self.grid_cell_count as f32 * self.tile_size
    }

    #[inline]
    pub fn render_check_period(&self) -> Duration {
        Duration::from_millis(self.render_check_period_ms)
    }

    /// Rendered chunks farther than this from the observer are evicted.
    #[inline]
    pub fn eviction_radius(&self) -> f32 {
        (self.render_distance + self.deletion_offset) as f32
            * self.chunk_world_size()
            * std::f32::consts::SQRT_2
    }

    /// Number of coordinates in the target square around the observer.
    #[inline]
    pub fn target_count(&self) -> usize {
        let side = 2 * self.render_distance.max(0) as usize + 1;
        side * side
    }

    pub fn resolution_for(&self, quality: QualityTier) -> GridResolution {
        let full = GridResolution::new(self.grid_cell_count, self.tile_size);
        match quality {
            QualityTier::High | QualityTier::Collision => full,
            QualityTier::Medium => full.coarsened(self.medium_detail_divisor),
            QualityTier::Low => full.coarsened(self.low_detail_divisor),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_cell_count == 0 {
            return Err(ConfigError::Invalid(
                "streaming.grid_cell_count must be at least 1".into(),
            ));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "streaming.tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.render_distance < 0 || self.deletion_offset < 0 {
            return Err(ConfigError::Invalid(
                "streaming.render_distance and deletion_offset must not be negative".into(),
            ));
        }
        if self.render_check_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "streaming.render_check_period_ms must be at least 1".into(),
            ));
        }
        // NaN on either side compares as None and is rejected.
        if self.medium_lod_cutoff.partial_cmp(&self.low_lod_cutoff) != Some(Ordering::Less) {
            return Err(ConfigError::Invalid(format!(
                "streaming.medium_lod_cutoff ({}) must be below low_lod_cutoff ({})",
                self.medium_lod_cutoff, self.low_lod_cutoff
            )));
        }
        if self.jobs_per_batch == 0 {
            return Err(ConfigError::Invalid(
                "streaming.jobs_per_batch must be at least 1".into(),
            ));
        }
        if self.medium_detail_divisor == 0 || self.low_detail_divisor == 0 {
            return Err(ConfigError::Invalid(
                "streaming detail divisors must be at least 1".into(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "streaming.worker_threads must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CombineOp {
    #[default]
    Additive,
    Multiplicative,
}

/// One noise octave folded into the terrain height.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NoiseLayer {
    #[serde(default = "default_scale")]
    pub x_scale: f32,
    #[serde(default = "default_scale")]
    pub y_scale: f32,
    #[serde(default)]
    pub x_offset: f32,
    #[serde(default)]
    pub y_offset: f32,
    #[serde(default = "default_gain")]
    pub gain: f32,
    #[serde(default)]
    pub op: CombineOp,
}

fn default_scale() -> f32 {
    1.0
}
fn default_gain() -> f32 {
    1.0
}

impl Default for NoiseLayer {
    fn default() -> Self {
        Self {
            x_scale: default_scale(),
            y_scale: default_scale(),
            x_offset: 0.0,
            y_offset: 0.0,
            gain: default_gain(),
            op: CombineOp::Additive,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_layers")]
    pub layers: Vec<NoiseLayer>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            layers: default_layers(),
        }
    }
}

fn default_layers() -> Vec<NoiseLayer> {
    vec![
        NoiseLayer {
            x_scale: 0.000_02,
            y_scale: 0.000_02,
            x_offset: 0.0,
            y_offset: 0.0,
            gain: 12_000.0,
            op: CombineOp::Additive,
        },
        NoiseLayer {
            x_scale: 0.000_15,
            y_scale: 0.000_15,
            x_offset: 913.7,
            y_offset: -271.3,
            gain: 1_500.0,
            op: CombineOp::Additive,
        },
        NoiseLayer {
            x_scale: 0.001,
            y_scale: 0.001,
            x_offset: -57.1,
            y_offset: 402.9,
            gain: 120.0,
            op: CombineOp::Additive,
        },
    ]
}

/// Tree anchor scatter run when a chunk finishes loading.
#[derive(Clone, Debug, Deserialize)]
pub struct VegetationConfig {
    #[serde(default = "default_vegetation_enable")]
    pub enable: bool,
    #[serde(default = "default_vegetation_grid_divisor")]
    pub grid_divisor: u32,
    #[serde(default)]
    pub disc: bool,
    #[serde(default)]
    pub min_height: Option<f32>,
}

fn default_vegetation_enable() -> bool {
    true
}
fn default_vegetation_grid_divisor() -> u32 {
    10
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            enable: default_vegetation_enable(),
            grid_divisor: default_vegetation_grid_divisor(),
            disc: false,
            min_height: None,
        }
    }
}

impl VegetationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_divisor == 0 {
            return Err(ConfigError::Invalid(
                "vegetation.grid_divisor must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub fn parse_config(src: &str) -> Result<WorldConfig, ConfigError> {
    let cfg: WorldConfig = toml::from_str(src)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config_from_path(path: &Path) -> Result<WorldConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg = parse_config(&s)?;
    log::debug!(
        "{}: world '{}', {} terrain layers",
        path.display(),
        cfg.world.name,
        cfg.terrain.layers.len()
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.streaming.grid_cell_count, 100);
        assert_eq!(cfg.streaming.tile_size, 600.0);
        assert_eq!(cfg.streaming.render_distance, 5);
        assert_eq!(cfg.streaming.jobs_per_batch, 10);
        assert_eq!(cfg.streaming.chunk_world_size(), 60_000.0);
        assert_eq!(cfg.streaming.render_check_period(), Duration::from_secs(1));
        assert_eq!(cfg.terrain.layers.len(), 3);
        assert_eq!(cfg.world.name, "default");
    }

    #[test]
    fn parses_layers_and_streaming() {
        let src = r#"
            [world]
            name = "valley"
            seed = 7

            [streaming]
            grid_cell_count = 10
            tile_size = 10.0
            render_distance = 2
            deletion_offset = 1
            jobs_per_batch = 3

            [[terrain.layers]]
            x_scale = 0.5
            gain = 4.0

            [[terrain.layers]]
            op = "multiplicative"
            gain = 2.0
        "#;
        let cfg = parse_config(src).unwrap();
        assert_eq!(cfg.world.seed, 7);
        assert_eq!(cfg.streaming.chunk_world_size(), 100.0);
        assert_eq!(cfg.streaming.target_count(), 25);
        assert_eq!(cfg.terrain.layers.len(), 2);
        assert_eq!(cfg.terrain.layers[0].x_scale, 0.5);
        assert_eq!(cfg.terrain.layers[0].y_scale, 1.0);
        assert_eq!(cfg.terrain.layers[1].op, CombineOp::Multiplicative);
    }

    #[test]
    fn rejects_inverted_lod_cutoffs() {
        let src = "[streaming]\nmedium_lod_cutoff = 3.0\nlow_lod_cutoff = 3.0\n";
        match parse_config(src) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("medium_lod_cutoff")),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn rejects_nan_lod_cutoff() {
        let cfg = StreamingConfig {
            medium_lod_cutoff: f32::NAN,
            ..StreamingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        let cfg = StreamingConfig {
            low_lod_cutoff: f32::NAN,
            ..StreamingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_batch_capacity() {
        let src = "[streaming]\njobs_per_batch = 0\n";
        assert!(matches!(parse_config(src), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn reports_parse_errors() {
        assert!(matches!(
            parse_config("[streaming]\ntile_size = \"wide\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn resolution_per_quality() {
        let cfg = StreamingConfig::default();
        assert_eq!(cfg.resolution_for(QualityTier::High).cells, 100);
        assert_eq!(cfg.resolution_for(QualityTier::Collision).cells, 100);
        assert_eq!(cfg.resolution_for(QualityTier::Medium).cells, 20);
        assert_eq!(cfg.resolution_for(QualityTier::Low).cells, 10);
        assert_eq!(cfg.resolution_for(QualityTier::Low).tile_size, 6000.0);
    }

    #[test]
    fn eviction_radius_matches_formula() {
        let cfg = StreamingConfig {
            grid_cell_count: 10,
            tile_size: 10.0,
            render_distance: 2,
            deletion_offset: 1,
            ..StreamingConfig::default()
        };
        let expected = 300.0 * std::f32::consts::SQRT_2;
        assert!((cfg.eviction_radius() - expected).abs() < 1e-3);
    }
}
