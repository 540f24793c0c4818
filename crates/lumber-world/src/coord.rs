use lumber_geom::Vec2;

/// Integer grid key of a chunk. The chunk covers
/// `[cx * size, (cx + 1) * size) x [cy * size, (cy + 1) * size)` in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Snaps a world point onto the chunk grid (`floor(p / size)` per axis).
    #[inline]
    pub fn containing(point: Vec2, chunk_world_size: f32) -> Self {
        Self {
            cx: (point.x / chunk_world_size).floor() as i32,
            cy: (point.y / chunk_world_size).floor() as i32,
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
        }
    }

    /// World position of the chunk's minimum corner.
    #[inline]
    pub fn origin(self, chunk_world_size: f32) -> Vec2 {
        Vec2::new(
            self.cx as f32 * chunk_world_size,
            self.cy as f32 * chunk_world_size,
        )
    }

    #[inline]
    pub fn center(self, chunk_world_size: f32) -> Vec2 {
        self.origin(chunk_world_size) + Vec2::splat(chunk_world_size * 0.5)
    }

    /// Distance from the chunk origin to `point`, the measure used by LOD and eviction.
    #[inline]
    pub fn distance_to(self, point: Vec2, chunk_world_size: f32) -> f32 {
        self.origin(chunk_world_size).distance(point)
    }

    /// All coordinates of the `(2r+1)^2` square centred on `self`, row by row.
    pub fn square_around(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        let r = radius.max(0);
        (-r..=r).flat_map(move |i| (-r..=r).map(move |j| self.offset(i, j)))
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.cx, self.cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_negative_points_down() {
        assert_eq!(
            ChunkCoord::containing(Vec2::new(-0.5, 99.9), 100.0),
            ChunkCoord::new(-1, 0)
        );
        assert_eq!(
            ChunkCoord::containing(Vec2::new(-100.0, 100.0), 100.0),
            ChunkCoord::new(-1, 1)
        );
    }

    #[test]
    fn square_has_expected_count_and_centre() {
        let c = ChunkCoord::new(4, -2);
        let all: Vec<_> = c.square_around(2).collect();
        assert_eq!(all.len(), 25);
        assert!(all.contains(&c));
        assert!(all.contains(&ChunkCoord::new(2, -4)));
        assert!(all.contains(&ChunkCoord::new(6, 0)));
        assert_eq!(c.square_around(0).count(), 1);
    }

    #[test]
    fn origin_and_center() {
        let c = ChunkCoord::new(-2, 3);
        assert_eq!(c.origin(50.0), Vec2::new(-100.0, 150.0));
        assert_eq!(c.center(50.0), Vec2::new(-75.0, 175.0));
    }
}
