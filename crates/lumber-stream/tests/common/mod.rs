#![allow(dead_code)]

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use lumber_mesh::ChunkMeshCPU;
use lumber_stream::{ChunkListener, Position, RenderSink, RenderState, Streamer};
use lumber_world::{ChunkCoord, QualityTier, StreamingConfig};

pub const WAIT: Duration = Duration::from_secs(10);

/// 100-unit chunks (2 cells of 50), render distance 2, deletion offset 1.
pub fn small_config() -> StreamingConfig {
    StreamingConfig {
        grid_cell_count: 2,
        tile_size: 50.0,
        render_distance: 2,
        deletion_offset: 1,
        render_check_period_ms: 50,
        medium_lod_cutoff: 2.0,
        low_lod_cutoff: 3.0,
        jobs_per_batch: 4,
        worker_threads: Some(2),
        material: "test/rock".into(),
        ..StreamingConfig::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SinkEvent {
    Submit {
        pos: Position,
        coord: ChunkCoord,
        quality: QualityTier,
        collision: bool,
    },
    Release(Position),
    Material(Position, String),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub meshes: HashMap<Position, ChunkMeshCPU>,
}

impl RecordingSink {
    pub fn submits(&self, collision: bool) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Submit { collision: c, .. } if *c == collision))
            .count()
    }

    pub fn first_index(&self, pred: impl Fn(&SinkEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }
}

impl RenderSink for RecordingSink {
    fn submit_geometry(&mut self, pos: Position, mesh: &ChunkMeshCPU, is_collision: bool) {
        self.events.push(SinkEvent::Submit {
            pos,
            coord: mesh.coord,
            quality: mesh.quality,
            collision: is_collision,
        });
        if !is_collision {
            self.meshes.insert(pos, mesh.clone());
        }
    }

    fn release_geometry(&mut self, pos: Position) {
        self.events.push(SinkEvent::Release(pos));
        self.meshes.remove(&pos);
    }

    fn set_material(&mut self, pos: Position, material: &str) {
        self.events.push(SinkEvent::Material(pos, material.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingListener {
    pub loaded: Vec<(Position, ChunkCoord)>,
    pub unloaded: Vec<(Position, ChunkCoord)>,
}

impl ChunkListener for RecordingListener {
    fn on_chunk_loaded(&mut self, pos: Position, coord: ChunkCoord) {
        self.loaded.push((pos, coord));
    }

    fn on_chunk_unloaded(&mut self, pos: Position, coord: ChunkCoord) {
        self.unloaded.push((pos, coord));
    }
}

/// Waits for in-flight work, then pumps until no chunk is left `Rendering`.
pub fn settle(streamer: &Streamer, sink: &mut RecordingSink, listener: &mut RecordingListener) {
    assert!(streamer.wait_idle(WAIT), "streamer did not go idle");
    let deadline = Instant::now() + WAIT;
    loop {
        streamer.pump(sink, listener);
        if streamer.table().lock().count_in_state(RenderState::Rendering) == 0 {
            return;
        }
        assert!(Instant::now() < deadline, "chunks stuck in Rendering");
        thread::sleep(Duration::from_millis(1));
    }
}

pub fn state_of(streamer: &Streamer, coord: ChunkCoord) -> Option<RenderState> {
    let pos = streamer.table().lookup(coord)?;
    streamer.table().snapshot(pos).map(|r| r.state)
}
