use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use lumber_runtime::{Job, JobBatcher, Position};
use lumber_world::{ChunkCoord, HeightSampler, StreamingConfig};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::boundary::{ChunkListener, ObserverSource, RenderSink};
use crate::error::StreamError;
use crate::generator::{ChunkGenerator, GeometrySource, MainTask, TerrainGeometry};
use crate::lod::LodPolicy;
use crate::table::{ChunkTable, ChunkTableHandle, RenderState};
use crate::timer::ScanTimer;

/// What one scan did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Evicted chunks that held geometry; their release was queued.
    pub evicted: usize,
    /// Out-of-range chunks that never got geometry (nothing to release).
    pub discarded: usize,
    pub loads: usize,
    pub reloads: usize,
    pub retries: usize,
    /// Targets already present at the right quality, or still in flight.
    pub skipped: usize,
}

impl ScanReport {
    #[inline]
    pub fn jobs(&self) -> usize {
        self.loads + self.reloads + self.retries
    }
}

/// What one `pump` applied on the owning thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub applied: usize,
    pub released: usize,
    pub failed: usize,
    pub stale: usize,
}

impl PumpReport {
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == PumpReport::default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub scans_started: usize,
    pub scans_completed: usize,
    pub scans_skipped: usize,
    pub evicted: usize,
    pub discarded: usize,
    pub loads: usize,
    pub reloads: usize,
    pub retries: usize,
    pub applied: usize,
    pub failures: usize,
}

#[derive(Default)]
struct Counters {
    scans_started: AtomicUsize,
    scans_completed: AtomicUsize,
    scans_skipped: AtomicUsize,
    evicted: AtomicUsize,
    discarded: AtomicUsize,
    loads: AtomicUsize,
    reloads: AtomicUsize,
    retries: AtomicUsize,
    applied: AtomicUsize,
    failures: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> StreamStats {
        let ld = |a: &AtomicUsize| a.load(Ordering::Relaxed);
        StreamStats {
            scans_started: ld(&self.scans_started),
            scans_completed: ld(&self.scans_completed),
            scans_skipped: ld(&self.scans_skipped),
            evicted: ld(&self.evicted),
            discarded: ld(&self.discarded),
            loads: ld(&self.loads),
            reloads: ld(&self.reloads),
            retries: ld(&self.retries),
            applied: ld(&self.applied),
            failures: ld(&self.failures),
        }
    }

    fn record_scan(&self, r: &ScanReport) {
        self.evicted.fetch_add(r.evicted, Ordering::Relaxed);
        self.discarded.fetch_add(r.discarded, Ordering::Relaxed);
        self.loads.fetch_add(r.loads, Ordering::Relaxed);
        self.reloads.fetch_add(r.reloads, Ordering::Relaxed);
        self.retries.fetch_add(r.retries, Ordering::Relaxed);
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything the scan body touches; shared with the scan thread.
struct ScanContext {
    table: ChunkTableHandle,
    batcher: JobBatcher,
    observer: Arc<dyn ObserverSource>,
    tx: Sender<MainTask>,
    scanning: AtomicBool,
    counters: Counters,
    lod: LodPolicy,
    render_distance: i32,
    eviction_radius: f32,
}

/// Holds the single-flight flag; clears it on drop.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScanContext {
    /// Flips Idle -> Scanning. False (and counted as skipped) if already scanning.
    fn claim(&self) -> bool {
        let won = self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !won {
            self.counters.scans_skipped.fetch_add(1, Ordering::Relaxed);
        }
        won
    }

    fn try_begin(&self) -> Option<ScanGuard<'_>> {
        self.claim().then(|| ScanGuard(&self.scanning))
    }

    /// One reconciliation pass. Caller holds the single-flight flag.
    fn scan(&self) -> ScanReport {
        self.counters.scans_started.fetch_add(1, Ordering::Relaxed);
        let t0 = Instant::now();
        let observer = self.observer.current_position();
        let size = self.lod.chunk_world_size;
        let mut report = ScanReport::default();

        let releases: Vec<MainTask> = {
            let mut table = self.table.lock();
            let doomed: Vec<Position> = table
                .iter_live()
                .filter(|(_, r)| {
                    r.state != RenderState::Rendering
                        && r.coord.distance_to(observer, size) > self.eviction_radius
                })
                .map(|(pos, _)| pos)
                .collect();
            let mut out = Vec::with_capacity(doomed.len());
            for pos in doomed {
                let Some(record) = table.evict(pos) else {
                    continue;
                };
                if record.has_geometry {
                    out.push(MainTask::Release {
                        pos,
                        coord: record.coord,
                    });
                    report.evicted += 1;
                } else {
                    report.discarded += 1;
                }
            }
            out
        };
        // Queued ahead of this scan's jobs so a reused slot is released before it is refilled.
        for task in releases {
            let _ = self.tx.send(task);
        }

        let centre = ChunkCoord::containing(observer, size);
        let mut jobs = Vec::new();
        {
            let mut table = self.table.lock();
            for coord in centre.square_around(self.render_distance) {
                let quality = self.lod.quality_at(coord, observer);
                let Some(pos) = table.lookup(coord) else {
                    let pos = table.allocate(coord, quality);
                    table.begin_render(pos, quality);
                    jobs.push(Job::Load { pos });
                    report.loads += 1;
                    continue;
                };
                let Some(record) = table.get(pos).copied() else {
                    continue;
                };
                if self.lod.needs_reload(&record, observer) {
                    report.reloads += 1;
                } else if LodPolicy::needs_retry(&record) {
                    report.retries += 1;
                } else {
                    report.skipped += 1;
                    continue;
                }
                table.begin_render(pos, quality);
                jobs.push(Job::Reload { pos });
            }
        }

        if !jobs.is_empty() {
            self.batcher.add_jobs(jobs);
            self.batcher.run_jobs();
        }
        self.counters.record_scan(&report);
        log::debug!(
            target: "stream",
            "scan at ({:.0}, {:.0}) chunk {}: evicted {} discarded {} load {} reload {} retry {} in {}us",
            observer.x,
            observer.y,
            centre,
            report.evicted,
            report.discarded,
            report.loads,
            report.reloads,
            report.retries,
            t0.elapsed().as_micros()
        );
        report
    }
}

/// Keeps the chunks around one observer streamed in.
///
/// The owning thread calls [`Streamer::update`] every frame: it fires the
/// periodic scan when due and applies finished work through the sink and
/// listener. Scans run on a dedicated thread, at most one at a time; chunk
/// generation runs on the batch pool.
pub struct Streamer {
    cfg: StreamingConfig,
    ctx: Arc<ScanContext>,
    scan_pool: ThreadPool,
    rx: Receiver<MainTask>,
    timer: ScanTimer,
    terrain: Option<Arc<TerrainGeometry>>,
}

impl Streamer {
    pub fn new(
        cfg: &StreamingConfig,
        observer: Arc<dyn ObserverSource>,
        source: Arc<dyn GeometrySource>,
    ) -> Result<Self, StreamError> {
        cfg.validate()?;
        let table = ChunkTableHandle::new(ChunkTable::with_capacity(cfg.target_count()));
        let (tx, rx) = unbounded::<MainTask>();
        let generator = ChunkGenerator::new(table.clone(), source, tx.clone());
        let batcher = JobBatcher::new(cfg.jobs_per_batch, cfg.worker_threads, Arc::new(generator))?;
        let scan_pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("lumber-scan-{i}"))
            .build()?;
        log::info!(
            target: "stream",
            "streaming {} chunks of {} units, evict beyond {:.0}, {} jobs per batch",
            cfg.target_count(),
            cfg.chunk_world_size(),
            cfg.eviction_radius(),
            cfg.jobs_per_batch
        );
        Ok(Self {
            cfg: cfg.clone(),
            ctx: Arc::new(ScanContext {
                table,
                batcher,
                observer,
                tx,
                scanning: AtomicBool::new(false),
                counters: Counters::default(),
                lod: LodPolicy::from_config(cfg),
                render_distance: cfg.render_distance,
                eviction_radius: cfg.eviction_radius(),
            }),
            scan_pool,
            rx,
            timer: ScanTimer::new(cfg.render_check_period()),
            terrain: None,
        })
    }

    /// Streams height-field terrain; the sampler can later be replaced with
    /// [`Streamer::set_terrain`].
    pub fn with_terrain(
        cfg: &StreamingConfig,
        observer: Arc<dyn ObserverSource>,
        sampler: HeightSampler,
    ) -> Result<Self, StreamError> {
        let terrain = Arc::new(TerrainGeometry::new(cfg, sampler));
        let mut streamer = Self::new(cfg, observer, terrain.clone())?;
        streamer.terrain = Some(terrain);
        Ok(streamer)
    }

    /// Swaps the height sampler for jobs that start from now on. Returns
    /// false when this streamer was not built over terrain.
    pub fn set_terrain(&self, sampler: HeightSampler) -> bool {
        match &self.terrain {
            Some(t) => {
                t.set_sampler(sampler);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn config(&self) -> &StreamingConfig {
        &self.cfg
    }

    #[inline]
    pub fn table(&self) -> &ChunkTableHandle {
        &self.ctx.table
    }

    #[inline]
    pub fn batcher(&self) -> &JobBatcher {
        &self.ctx.batcher
    }

    #[inline]
    pub fn is_scanning(&self) -> bool {
        self.ctx.scanning.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StreamStats {
        self.ctx.counters.snapshot()
    }

    /// Periodic trigger: starts a background scan unless one is in flight,
    /// in which case the tick is dropped.
    pub fn trigger(&self) -> bool {
        if !self.ctx.claim() {
            log::trace!(target: "stream", "scan in flight; tick dropped");
            return false;
        }
        let ctx = Arc::clone(&self.ctx);
        self.scan_pool.spawn(move || {
            let _guard = ScanGuard(&ctx.scanning);
            ctx.scan();
        });
        true
    }

    /// Runs one scan on the calling thread. `None` if a scan is in flight.
    pub fn scan_now(&self) -> Option<ScanReport> {
        let _guard = self.ctx.try_begin()?;
        Some(self.ctx.scan())
    }

    /// Per-frame entry point for the owning thread.
    pub fn update(
        &mut self,
        now: Instant,
        sink: &mut dyn RenderSink,
        listener: &mut dyn ChunkListener,
    ) -> PumpReport {
        if self.timer.poll(now) {
            self.trigger();
        }
        self.pump(sink, listener)
    }

    /// Applies everything workers and scans have queued for the owning thread.
    pub fn pump(&self, sink: &mut dyn RenderSink, listener: &mut dyn ChunkListener) -> PumpReport {
        let mut report = PumpReport::default();
        for task in self.rx.try_iter() {
            match task {
                MainTask::Release { pos, coord } => {
                    sink.release_geometry(pos);
                    listener.on_chunk_unloaded(pos, coord);
                    report.released += 1;
                }
                MainTask::Apply {
                    pos,
                    coord,
                    render,
                    collision,
                } => {
                    // Only this thread moves a record out of Rendering, so the
                    // check holds until mark_rendered below.
                    let replaces = {
                        let table = self.ctx.table.lock();
                        if !table.is_rendering(pos, coord) {
                            log::debug!(target: "stream", "dropping stale result for slot {} {}", pos, coord);
                            report.stale += 1;
                            continue;
                        }
                        table.get(pos).is_some_and(|r| r.has_geometry)
                    };
                    if replaces {
                        sink.release_geometry(pos);
                    }
                    sink.submit_geometry(pos, &render, false);
                    if let Some(col) = &collision {
                        sink.submit_geometry(pos, col, true);
                    }
                    sink.set_material(pos, &self.cfg.material);
                    self.ctx.table.lock().mark_rendered(pos, coord);
                    listener.on_chunk_loaded(pos, coord);
                    report.applied += 1;
                }
                MainTask::Failed { pos, coord } => {
                    let mut table = self.ctx.table.lock();
                    let owned = table.get(pos).is_some_and(|r| r.coord == coord);
                    if owned && table.reset_failed(pos) {
                        report.failed += 1;
                    }
                }
            }
        }
        let c = &self.ctx.counters;
        c.applied.fetch_add(report.applied, Ordering::Relaxed);
        c.failures.fetch_add(report.failed, Ordering::Relaxed);
        report
    }

    /// Waits until no scan or batch is in flight. Returns whether that happened
    /// before `timeout`. Results still need a `pump` to be applied.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let batcher = &self.ctx.batcher;
            if !self.is_scanning() && batcher.running_batches() == 0 && batcher.pending_jobs() == 0
            {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
