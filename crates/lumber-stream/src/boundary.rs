use std::sync::{Arc, Mutex, PoisonError};

use lumber_geom::Vec2;
use lumber_mesh::ChunkMeshCPU;
use lumber_runtime::Position;
use lumber_world::ChunkCoord;

/// Where the observer stands; polled once per scan from the scan thread.
pub trait ObserverSource: Send + Sync + 'static {
    fn current_position(&self) -> Vec2;
}

/// Consumer of finished geometry. Called only from the owning thread
/// (inside `Streamer::pump`), so implementations need not be `Send`.
pub trait RenderSink {
    fn submit_geometry(&mut self, pos: Position, mesh: &ChunkMeshCPU, is_collision: bool);
    /// Drops every section held at `pos`, render and collision alike.
    fn release_geometry(&mut self, pos: Position);
    fn set_material(&mut self, pos: Position, material: &str);
}

pub trait ChunkListener {
    /// Fired after a load or reload has been applied at `pos`.
    fn on_chunk_loaded(&mut self, pos: Position, coord: ChunkCoord);

    /// Fired after the resources at `pos` were released.
    fn on_chunk_unloaded(&mut self, _pos: Position, _coord: ChunkCoord) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl ChunkListener for NoopListener {
    fn on_chunk_loaded(&mut self, _pos: Position, _coord: ChunkCoord) {}
}

/// Observer position shared between the control loop (writer) and the scan
/// thread (reader).
#[derive(Clone, Debug, Default)]
pub struct SharedObserver {
    pos: Arc<Mutex<Vec2>>,
}

impl SharedObserver {
    pub fn new(start: Vec2) -> Self {
        Self {
            pos: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, p: Vec2) {
        *self.pos.lock().unwrap_or_else(PoisonError::into_inner) = p;
    }
}

impl ObserverSource for SharedObserver {
    fn current_position(&self) -> Vec2 {
        *self.pos.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shifts an observer back by half a chunk, so distances to a chunk's origin
/// corner behave like distances to its centre.
pub struct ChunkCenteredObserver<O> {
    inner: O,
    half_chunk: f32,
}

impl<O: ObserverSource> ChunkCenteredObserver<O> {
    pub fn new(inner: O, chunk_world_size: f32) -> Self {
        Self {
            inner,
            half_chunk: chunk_world_size * 0.5,
        }
    }
}

impl<O: ObserverSource> ObserverSource for ChunkCenteredObserver<O> {
    fn current_position(&self) -> Vec2 {
        self.inner.current_position() - Vec2::splat(self.half_chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_observer_offsets_by_half_chunk() {
        let shared = SharedObserver::new(Vec2::new(150.0, 150.0));
        let centered = ChunkCenteredObserver::new(shared.clone(), 100.0);
        assert_eq!(centered.current_position(), Vec2::new(100.0, 100.0));
        shared.set(Vec2::new(0.0, 50.0));
        assert_eq!(centered.current_position(), Vec2::new(-50.0, 0.0));
    }
}
