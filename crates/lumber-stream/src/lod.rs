//! Distance-based level of detail.

use lumber_geom::Vec2;
use lumber_world::{ChunkCoord, QualityTier, StreamingConfig};

use crate::table::{ChunkRecord, RenderState};

/// Cutoffs are in chunk multiples: `>= low` is Low, `>= medium` is Medium,
/// anything nearer is High.
pub fn quality_for(
    distance: f32,
    chunk_world_size: f32,
    medium_cutoff: f32,
    low_cutoff: f32,
) -> QualityTier {
    if distance >= low_cutoff * chunk_world_size {
        QualityTier::Low
    } else if distance >= medium_cutoff * chunk_world_size {
        QualityTier::Medium
    } else {
        QualityTier::High
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodPolicy {
    pub chunk_world_size: f32,
    pub medium_cutoff: f32,
    pub low_cutoff: f32,
}

impl LodPolicy {
    pub fn from_config(cfg: &StreamingConfig) -> Self {
        Self {
            chunk_world_size: cfg.chunk_world_size(),
            medium_cutoff: cfg.medium_lod_cutoff,
            low_cutoff: cfg.low_lod_cutoff,
        }
    }

    #[inline]
    pub fn quality_at(&self, coord: ChunkCoord, observer: Vec2) -> QualityTier {
        quality_for(
            coord.distance_to(observer, self.chunk_world_size),
            self.chunk_world_size,
            self.medium_cutoff,
            self.low_cutoff,
        )
    }

    /// A settled chunk whose quality no longer matches its distance.
    pub fn needs_reload(&self, record: &ChunkRecord, observer: Vec2) -> bool {
        record.state != RenderState::Rendering
            && self.quality_at(record.coord, observer) != record.quality
    }

    /// A live chunk left `NotRendered` by a failed job.
    #[inline]
    pub fn needs_retry(record: &ChunkRecord) -> bool {
        record.is_live() && record.state == RenderState::NotRendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(coord: ChunkCoord, quality: QualityTier, state: RenderState) -> ChunkRecord {
        ChunkRecord {
            coord,
            quality,
            state,
            slot: Some(0),
            has_geometry: state == RenderState::Rendered,
        }
    }

    #[test]
    fn thresholds_for_two_three_hundred() {
        assert_eq!(quality_for(150.0, 100.0, 2.0, 3.0), QualityTier::High);
        assert_eq!(quality_for(250.0, 100.0, 2.0, 3.0), QualityTier::Medium);
        assert_eq!(quality_for(350.0, 100.0, 2.0, 3.0), QualityTier::Low);
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(quality_for(200.0, 100.0, 2.0, 3.0), QualityTier::Medium);
        assert_eq!(quality_for(300.0, 100.0, 2.0, 3.0), QualityTier::Low);
        assert_eq!(quality_for(199.9, 100.0, 2.0, 3.0), QualityTier::High);
        assert_eq!(quality_for(0.0, 100.0, 2.0, 3.0), QualityTier::High);
    }

    #[test]
    fn quality_never_increases_with_distance() {
        let mut prev = QualityTier::High;
        for step in 0..100 {
            let q = quality_for(step as f32 * 7.5, 100.0, 2.0, 3.0);
            assert!(q <= prev);
            prev = q;
        }
    }

    #[test]
    fn reload_ignores_in_flight_chunks() {
        let lod = LodPolicy {
            chunk_world_size: 100.0,
            medium_cutoff: 2.0,
            low_cutoff: 3.0,
        };
        let far = ChunkCoord::new(5, 0);
        let observer = Vec2::ZERO;
        let settled = record(far, QualityTier::High, RenderState::Rendered);
        assert!(lod.needs_reload(&settled, observer));
        let busy = record(far, QualityTier::High, RenderState::Rendering);
        assert!(!lod.needs_reload(&busy, observer));
        let right = record(far, QualityTier::Low, RenderState::Rendered);
        assert!(!lod.needs_reload(&right, observer));
    }

    #[test]
    fn retry_only_for_live_not_rendered() {
        let coord = ChunkCoord::new(0, 0);
        assert!(LodPolicy::needs_retry(&record(
            coord,
            QualityTier::High,
            RenderState::NotRendered
        )));
        assert!(!LodPolicy::needs_retry(&record(
            coord,
            QualityTier::High,
            RenderState::Rendered
        )));
        let mut dead = record(coord, QualityTier::High, RenderState::NotRendered);
        dead.slot = None;
        assert!(!LodPolicy::needs_retry(&dead));
    }
}
