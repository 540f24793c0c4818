use std::cmp::Ordering;

use lumber_geom::{Aabb, Vec2, Vec3};
use lumber_world::{ChunkCoord, GridResolution, HeightSampler, QualityTier};

use crate::chunk::ChunkMeshCPU;
use crate::shading::{compute_tangents, compute_vertex_normals};

/// Triangle area (squared cross length) below which a triangle is dropped.
const DEGENERATE_AREA_SQ: f32 = 1e-12;

/// Builds the height grid for a chunk.
///
/// Vertex `(r, c)` sits at `origin + (r * tile, c * tile)` and is stored at
/// index `r * (cells + 1) + c`. Heights come from `sampler`.
pub fn build_chunk_mesh(
    coord: ChunkCoord,
    quality: QualityTier,
    origin: Vec2,
    resolution: GridResolution,
    sampler: &HeightSampler,
) -> ChunkMeshCPU {
    let n = resolution.row_len();
    let cells = resolution.cells.max(1) as f32;
    let tile = resolution.tile_size;

    let mut positions = Vec::with_capacity(resolution.vertex_count());
    let mut uvs = Vec::with_capacity(resolution.vertex_count());
    for r in 0..n {
        for c in 0..n {
            let p = origin + Vec2::new(r as f32 * tile, c as f32 * tile);
            positions.push(p.extend(sampler.height(p)));
            uvs.push([r as f32 / cells, c as f32 / cells]);
        }
    }

    let mut indices = grid_indices(resolution.cells);
    let dropped = retain_valid_triangles(&mut indices, &positions);
    if dropped > 0 {
        log::debug!(
            target: "mesh",
            "chunk {} {}: dropped {} degenerate triangles",
            coord,
            quality.label(),
            dropped
        );
    }

    let normals = compute_vertex_normals(&positions, &indices);
    let tangents = compute_tangents(&positions, &uvs, &normals, &indices);
    let bbox = Aabb::from_points(positions.iter().copied());

    ChunkMeshCPU {
        coord,
        quality,
        resolution,
        bbox,
        positions,
        normals,
        uvs,
        tangents,
        indices,
    }
}

/// Two counter-clockwise (seen from +z) triangles per grid quad.
pub fn grid_indices(cells: u32) -> Vec<u32> {
    let cells = cells as usize;
    let n = cells + 1;
    let mut indices = Vec::with_capacity(cells * cells * 6);
    for r in 0..cells {
        for c in 0..cells {
            let i = (r * n + c) as u32;
            let right = i + 1;
            let below = i + n as u32;
            let diag = below + 1;
            indices.extend_from_slice(&[i, diag, right]);
            indices.extend_from_slice(&[i, below, diag]);
        }
    }
    indices
}

/// Removes triangles that reference missing vertices, repeat a vertex, or
/// have no area. Returns how many triangles were removed.
pub fn retain_valid_triangles(indices: &mut Vec<u32>, positions: &[Vec3]) -> usize {
    let before = indices.len() / 3;
    let mut kept = Vec::with_capacity(indices.len());
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        if a == b || b == c || a == c {
            continue;
        }
        let (Some(&pa), Some(&pb), Some(&pc)) = (
            positions.get(a as usize),
            positions.get(b as usize),
            positions.get(c as usize),
        ) else {
            continue;
        };
        let area_sq = {
            let n = (pb - pa).cross(pc - pa);
            n.dot(n)
        };
        // NaN area drops the triangle too.
        if area_sq.partial_cmp(&DEGENERATE_AREA_SQ) != Some(Ordering::Greater) {
            continue;
        }
        kept.extend_from_slice(&[a, b, c]);
    }
    *indices = kept;
    before - indices.len() / 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_quad_indices() {
        assert_eq!(grid_indices(1), vec![0, 3, 1, 0, 2, 3]);
    }

    #[test]
    fn drops_bad_triangles() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        let mut idx = vec![
            0, 1, 2, // ok
            0, 0, 2, // repeated vertex
            0, 1, 9, // out of range
            0, 1, 3, // collinear
        ];
        assert_eq!(retain_valid_triangles(&mut idx, &positions), 3);
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn drops_triangles_with_nan_corners() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, f32::NAN),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mut idx = vec![0, 1, 2];
        assert_eq!(retain_valid_triangles(&mut idx, &positions), 1);
        assert!(idx.is_empty());
    }
}
