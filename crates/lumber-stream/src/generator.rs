use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crossbeam_channel::Sender;
use lumber_mesh::{ChunkMeshCPU, build_chunk_mesh};
use lumber_runtime::{Job, JobError, JobHandler, Position};
use lumber_world::{ChunkCoord, HeightSampler, QualityTier, StreamingConfig};

use crate::table::{ChunkTableHandle, RenderState};

/// Work handed back to the owning thread, drained by `Streamer::pump`.
#[derive(Debug)]
pub enum MainTask {
    /// An evicted chunk's resources can go.
    Release { pos: Position, coord: ChunkCoord },
    /// A job finished; submit its geometry and mark the chunk rendered.
    /// Sections the slot already holds are released first.
    Apply {
        pos: Position,
        coord: ChunkCoord,
        render: ChunkMeshCPU,
        collision: Option<ChunkMeshCPU>,
    },
    /// A job failed; the chunk goes back to `NotRendered`.
    Failed { pos: Position, coord: ChunkCoord },
}

/// Everything one job hands to the sink.
#[derive(Clone, Debug)]
pub struct ChunkGeometry {
    pub render: ChunkMeshCPU,
    pub collision: Option<ChunkMeshCPU>,
}

/// Produces chunk geometry on batch workers.
pub trait GeometrySource: Send + Sync + 'static {
    fn build(
        &self,
        pos: Position,
        coord: ChunkCoord,
        quality: QualityTier,
    ) -> Result<ChunkMeshCPU, JobError>;

    /// Render geometry at `quality`, plus collision when the tier wants it.
    /// Sources with mutable inputs override this so both come from one read.
    fn build_chunk(
        &self,
        pos: Position,
        coord: ChunkCoord,
        quality: QualityTier,
    ) -> Result<ChunkGeometry, JobError> {
        let render = self.build(pos, coord, quality)?;
        let collision = if quality.wants_collision() {
            Some(self.build(pos, coord, QualityTier::Collision)?)
        } else {
            None
        };
        Ok(ChunkGeometry { render, collision })
    }
}

/// Height-field terrain. The sampler can be swapped at runtime; a build reads
/// one sampler snapshot for its whole run, and finished chunks keep theirs.
pub struct TerrainGeometry {
    cfg: StreamingConfig,
    sampler: RwLock<Arc<HeightSampler>>,
}

impl TerrainGeometry {
    pub fn new(cfg: &StreamingConfig, sampler: HeightSampler) -> Self {
        Self {
            cfg: cfg.clone(),
            sampler: RwLock::new(Arc::new(sampler)),
        }
    }

    pub fn sampler(&self) -> Arc<HeightSampler> {
        Arc::clone(&self.sampler.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set_sampler(&self, sampler: HeightSampler) {
        *self.sampler.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(sampler);
    }

    fn mesh(
        &self,
        sampler: &HeightSampler,
        pos: Position,
        coord: ChunkCoord,
        quality: QualityTier,
    ) -> Result<ChunkMeshCPU, JobError> {
        let origin = coord.origin(self.cfg.chunk_world_size());
        let res = self.cfg.resolution_for(quality);
        let mesh = build_chunk_mesh(coord, quality, origin, res, sampler);
        if let Some(bad) = mesh.positions.iter().find(|p| !p.z.is_finite()) {
            return Err(JobError::Generation {
                pos,
                reason: format!("non-finite height at ({}, {})", bad.x, bad.y),
            });
        }
        if quality.is_collision() {
            Ok(mesh.to_collision())
        } else {
            Ok(mesh)
        }
    }
}

impl GeometrySource for TerrainGeometry {
    fn build(
        &self,
        pos: Position,
        coord: ChunkCoord,
        quality: QualityTier,
    ) -> Result<ChunkMeshCPU, JobError> {
        self.mesh(&self.sampler(), pos, coord, quality)
    }

    fn build_chunk(
        &self,
        pos: Position,
        coord: ChunkCoord,
        quality: QualityTier,
    ) -> Result<ChunkGeometry, JobError> {
        let sampler = self.sampler();
        let render = self.mesh(&sampler, pos, coord, quality)?;
        let collision = if quality.wants_collision() {
            Some(self.mesh(&sampler, pos, coord, QualityTier::Collision)?)
        } else {
            None
        };
        Ok(ChunkGeometry { render, collision })
    }
}

/// Runs `Load`/`Reload` jobs: builds geometry for the record's current
/// quality (plus collision for High) and posts the result to the owning thread.
pub struct ChunkGenerator {
    table: ChunkTableHandle,
    source: Arc<dyn GeometrySource>,
    tx: Sender<MainTask>,
}

impl ChunkGenerator {
    pub fn new(
        table: ChunkTableHandle,
        source: Arc<dyn GeometrySource>,
        tx: Sender<MainTask>,
    ) -> Self {
        Self { table, source, tx }
    }
}

impl JobHandler for ChunkGenerator {
    fn run(&self, job: Job) -> Result<(), JobError> {
        let pos = job.pos();
        let record = self
            .table
            .snapshot(pos)
            .ok_or(JobError::ChunkVanished { pos })?;
        let t0 = Instant::now();
        let ChunkGeometry { render, collision } =
            self.source.build_chunk(pos, record.coord, record.quality)?;
        log::trace!(
            target: "stream",
            "{} {} {}: {} tris in {}ms",
            job,
            record.coord,
            record.quality.label(),
            render.triangle_count(),
            t0.elapsed().as_millis()
        );
        let _ = self.tx.send(MainTask::Apply {
            pos,
            coord: record.coord,
            render,
            collision,
        });
        Ok(())
    }

    fn on_failure(&self, job: Job, _err: &JobError) {
        let pos = job.pos();
        // A Rendering record cannot be evicted, so it still belongs to this job.
        if let Some(record) = self.table.snapshot(pos) {
            if record.state == RenderState::Rendering {
                let _ = self.tx.send(MainTask::Failed {
                    pos,
                    coord: record.coord,
                });
            }
        }
    }
}
