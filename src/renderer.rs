use hashbrown::HashMap;
use lumber_mesh::ChunkMeshCPU;
use lumber_stream::{Position, RenderSink};
use lumber_world::QualityTier;

#[derive(Clone, Debug, Default)]
struct Sections {
    quality: Option<QualityTier>,
    render_triangles: usize,
    collision_triangles: usize,
    material: Option<String>,
}

/// Render sink without a GPU: keeps per-slot section bookkeeping so the host
/// can report what a real renderer would be holding.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    sections: HashMap<Position, Sections>,
    submitted: usize,
    released: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderTotals {
    pub chunks: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub with_collision: usize,
    pub with_material: usize,
    pub render_triangles: usize,
    pub collision_triangles: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn released(&self) -> usize {
        self.released
    }

    pub fn totals(&self) -> RenderTotals {
        let mut t = RenderTotals {
            chunks: self.sections.len(),
            ..RenderTotals::default()
        };
        for s in self.sections.values() {
            match s.quality {
                Some(QualityTier::Low) => t.low += 1,
                Some(QualityTier::Medium) => t.medium += 1,
                Some(QualityTier::High) => t.high += 1,
                Some(QualityTier::Collision) | None => {}
            }
            if s.collision_triangles > 0 {
                t.with_collision += 1;
            }
            if s.material.is_some() {
                t.with_material += 1;
            }
            t.render_triangles += s.render_triangles;
            t.collision_triangles += s.collision_triangles;
        }
        t
    }
}

impl RenderSink for HeadlessRenderer {
    fn submit_geometry(&mut self, pos: Position, mesh: &ChunkMeshCPU, is_collision: bool) {
        let s = self.sections.entry(pos).or_default();
        if is_collision {
            s.collision_triangles = mesh.triangle_count();
        } else {
            s.quality = Some(mesh.quality);
            s.render_triangles = mesh.triangle_count();
        }
        self.submitted += 1;
    }

    fn release_geometry(&mut self, pos: Position) {
        if self.sections.remove(&pos).is_some() {
            self.released += 1;
        } else {
            log::debug!(target: "render", "release of empty slot {}", pos);
        }
    }

    fn set_material(&mut self, pos: Position, material: &str) {
        self.sections.entry(pos).or_default().material = Some(material.to_string());
    }
}
