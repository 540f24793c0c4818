use lumber_geom::{Aabb, Vec3};
use lumber_world::{ChunkCoord, GridResolution, QualityTier};

/// CPU-side geometry for one chunk at one quality, ready for submission.
#[derive(Clone, Debug)]
pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    pub quality: QualityTier,
    pub resolution: GridResolution,
    pub bbox: Aabb,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub tangents: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ChunkMeshCPU {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_collision(&self) -> bool {
        self.quality.is_collision()
    }

    /// Physics copy of a full-resolution mesh: positions and triangles only.
    pub fn to_collision(&self) -> ChunkMeshCPU {
        ChunkMeshCPU {
            coord: self.coord,
            quality: QualityTier::Collision,
            resolution: self.resolution,
            bbox: self.bbox,
            positions: self.positions.clone(),
            normals: Vec::new(),
            uvs: Vec::new(),
            tangents: Vec::new(),
            indices: self.indices.clone(),
        }
    }
}
