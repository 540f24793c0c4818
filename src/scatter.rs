use hashbrown::HashMap;
use lumber_geom::{Vec2, Vec3};
use lumber_stream::{ChunkListener, Position};
use lumber_world::{ChunkCoord, HeightSampler, StreamingConfig, VegetationConfig};

/// Points on a `2*half` square lattice with spacing `gap`, centred on the
/// origin and kept only when within `half * gap` of it.
pub fn circle_grid(half: i32, gap: f32) -> Vec<Vec2> {
    let radius = half as f32 * gap;
    let mut out = Vec::new();
    for x in -half..half {
        for y in -half..half {
            let p = Vec2::new(x as f32 * gap, y as f32 * gap);
            if p.length() <= radius {
                out.push(p);
            }
        }
    }
    out
}

/// Tree anchor scatter: when a chunk lands, samples a coarse lattice over it
/// and records ground points keyed by the chunk's slot.
pub struct ScatterListener {
    sampler: HeightSampler,
    enabled: bool,
    disc: bool,
    min_height: Option<f32>,
    chunk_world_size: f32,
    per_side: u32,
    anchors: HashMap<Position, Vec<Vec3>>,
}

impl ScatterListener {
    pub fn new(streaming: &StreamingConfig, veg: &VegetationConfig, sampler: HeightSampler) -> Self {
        Self {
            sampler,
            enabled: veg.enable,
            disc: veg.disc,
            min_height: veg.min_height,
            chunk_world_size: streaming.chunk_world_size(),
            per_side: (streaming.grid_cell_count / veg.grid_divisor.max(1)).max(1),
            anchors: HashMap::new(),
        }
    }

    /// Later loads sample the new terrain; anchors already placed stay.
    pub fn set_sampler(&mut self, sampler: HeightSampler) {
        self.sampler = sampler;
    }

    #[cfg(test)]
    pub fn anchors(&self, pos: Position) -> Option<&[Vec3]> {
        self.anchors.get(&pos).map(Vec::as_slice)
    }

    pub fn chunk_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.values().map(Vec::len).sum()
    }

    fn lattice(&self, coord: ChunkCoord) -> Vec<Vec2> {
        let step = self.chunk_world_size / self.per_side as f32;
        if self.disc {
            let centre = coord.center(self.chunk_world_size);
            let half = (self.per_side as i32 / 2).max(1);
            return circle_grid(half, step)
                .into_iter()
                .map(|off| centre + off)
                .collect();
        }
        let origin = coord.origin(self.chunk_world_size);
        let n = self.per_side;
        let mut out = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
        for r in 0..=n {
            for c in 0..=n {
                out.push(origin + Vec2::new(r as f32 * step, c as f32 * step));
            }
        }
        out
    }

    fn scatter(&self, coord: ChunkCoord) -> Vec<Vec3> {
        self.lattice(coord)
            .into_iter()
            .map(|p| p.extend(self.sampler.height(p)))
            .filter(|p| self.min_height.is_none_or(|h| p.z >= h))
            .collect()
    }
}

impl ChunkListener for ScatterListener {
    fn on_chunk_loaded(&mut self, pos: Position, coord: ChunkCoord) {
        if !self.enabled {
            return;
        }
        let points = self.scatter(coord);
        log::trace!(target: "scatter", "chunk {} slot {}: {} anchors", coord, pos, points.len());
        self.anchors.insert(pos, points);
    }

    fn on_chunk_unloaded(&mut self, pos: Position, _coord: ChunkCoord) {
        self.anchors.remove(&pos);
    }
}
