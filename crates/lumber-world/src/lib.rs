//! World grid addressing, level-of-detail tiers, configuration, and height sampling.
#![forbid(unsafe_code)]

pub mod config;
mod coord;
mod error;
pub mod height;
mod quality;

pub use config::{
    CombineOp, NoiseLayer, StreamingConfig, TerrainConfig, VegetationConfig, WorldConfig,
    WorldInfo, load_config_from_path, parse_config,
};
pub use coord::ChunkCoord;
pub use error::ConfigError;
pub use height::HeightSampler;
pub use quality::{GridResolution, QualityTier};
