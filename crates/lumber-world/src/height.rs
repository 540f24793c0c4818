use fastnoise_lite::{FastNoiseLite, NoiseType};
use lumber_geom::Vec2;

use crate::config::{CombineOp, NoiseLayer, WorldConfig};

/// Layered Perlin height field.
///
/// `height` folds the layers in order starting from zero. Each layer samples
/// at `(x * x_scale + x_offset, y * y_scale + y_offset)`, scales by `gain`, and
/// either adds to or multiplies the running value. Sampling reads no mutable
/// state.
pub struct HeightSampler {
    seed: i32,
    layers: Vec<NoiseLayer>,
    noise: FastNoiseLite,
}

impl HeightSampler {
    pub fn new(seed: i32, layers: Vec<NoiseLayer>) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));
        Self {
            seed,
            layers,
            noise,
        }
    }

    pub fn from_config(cfg: &WorldConfig) -> Self {
        Self::new(cfg.world.seed, cfg.terrain.layers.clone())
    }

    /// A sampler with no layers: every point sits at height zero.
    pub fn flat() -> Self {
        Self::new(0, Vec::new())
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    #[inline]
    pub fn layers(&self) -> &[NoiseLayer] {
        &self.layers
    }

    pub fn height(&self, point: Vec2) -> f32 {
        self.layers.iter().fold(0.0, |acc, layer| {
            let sx = point.x * layer.x_scale + layer.x_offset;
            let sy = point.y * layer.y_scale + layer.y_offset;
            let v = self.noise.get_noise_2d(sx, sy) * layer.gain;
            match layer.op {
                CombineOp::Additive => acc + v,
                CombineOp::Multiplicative => acc * v,
            }
        })
    }
}

impl Clone for HeightSampler {
    fn clone(&self) -> Self {
        Self::new(self.seed, self.layers.clone())
    }
}

impl std::fmt::Debug for HeightSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightSampler")
            .field("seed", &self.seed)
            .field("layers", &self.layers.len())
            .finish()
    }
}
