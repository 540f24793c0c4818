/// Geometric detail a chunk is generated at, ordered from coarsest to finest.
///
/// `Collision` samples at the same resolution as `High` but feeds the physics
/// representation instead of the visible mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Collision,
}

impl QualityTier {
    #[inline]
    pub fn is_collision(self) -> bool {
        matches!(self, QualityTier::Collision)
    }

    /// High-detail render geometry also carries a collision pass.
    #[inline]
    pub fn wants_collision(self) -> bool {
        matches!(self, QualityTier::High)
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
            QualityTier::Collision => "collision",
        }
    }
}

/// Sampling grid for one chunk at one quality: `cells` quads per side, each
/// `tile_size` world units wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridResolution {
    pub cells: u32,
    pub tile_size: f32,
}

impl GridResolution {
    #[inline]
    pub const fn new(cells: u32, tile_size: f32) -> Self {
        Self { cells, tile_size }
    }

    /// Vertices along one side.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.cells as usize + 1
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.row_len() * self.row_len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        let c = self.cells as usize;
        c * c * 2
    }

    /// World extent covered by the grid along one side.
    #[inline]
    pub fn span(&self) -> f32 {
        self.cells as f32 * self.tile_size
    }

    /// Coarsens by `divisor`: fewer cells, proportionally wider tiles.
    pub fn coarsened(&self, divisor: u32) -> Self {
        let divisor = divisor.max(1);
        let cells = (self.cells / divisor).max(1);
        Self {
            cells,
            tile_size: self.span() / cells as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarsened_keeps_span_when_divisible() {
        let full = GridResolution::new(100, 600.0);
        let low = full.coarsened(10);
        assert_eq!(low.cells, 10);
        assert_eq!(low.tile_size, 6000.0);
        assert_eq!(low.span(), full.span());
        let med = full.coarsened(5);
        assert_eq!(med.cells, 20);
        assert_eq!(med.tile_size, 3000.0);
    }

    #[test]
    fn coarsened_never_reaches_zero_cells() {
        let tiny = GridResolution::new(3, 10.0).coarsened(10);
        assert_eq!(tiny.cells, 1);
        assert_eq!(tiny.tile_size, 30.0);
        assert_eq!(GridResolution::new(4, 1.0).coarsened(0).cells, 4);
    }

    #[test]
    fn counts() {
        let g = GridResolution::new(4, 1.0);
        assert_eq!(g.row_len(), 5);
        assert_eq!(g.vertex_count(), 25);
        assert_eq!(g.triangle_count(), 32);
    }

    #[test]
    fn only_high_wants_collision() {
        assert!(QualityTier::High.wants_collision());
        assert!(!QualityTier::Medium.wants_collision());
        assert!(!QualityTier::Collision.wants_collision());
        assert!(QualityTier::Low < QualityTier::High);
    }
}
