use std::time::{Duration, Instant};

use super::App;

impl App {
    /// One frame: config hot-reload, observer motion, then the streamer's
    /// timer and result pump.
    pub fn step(&mut self, now: Instant, dt: f32) {
        self.process_config_file_events();
        self.position = self.motion.advance(self.position, dt.max(0.0));
        self.observer.set(self.position);
        let pumped = self
            .streamer
            .update(now, &mut self.renderer, &mut self.scatter);
        if !pumped.is_empty() {
            log::trace!(
                "frame {}: applied {} released {} failed {} stale {}",
                self.frames,
                pumped.applied,
                pumped.released,
                pumped.failed,
                pumped.stale
            );
        }
        self.frames += 1;
    }

    /// Lets in-flight work land, applies it and logs a summary.
    pub fn finish(&mut self, timeout: Duration) {
        if !self.streamer.wait_idle(timeout) {
            log::warn!("streamer still busy after {:?}; reporting partial state", timeout);
        }
        self.streamer.pump(&mut self.renderer, &mut self.scatter);

        let stats = self.streamer.stats();
        let render = self.renderer.totals();
        let (live, free) = {
            let table = self.streamer.table().lock();
            (table.live_count(), table.free_count())
        };
        let batcher = self.streamer.batcher();
        log::info!(
            "{} frames in {:.1}s, observer at ({:.0}, {:.0})",
            self.frames,
            self.started.elapsed().as_secs_f32(),
            self.position.x,
            self.position.y
        );
        log::info!(
            "scans {} done, {} dropped; loads {} reloads {} retries {} evicted {} discarded {}",
            stats.scans_completed,
            stats.scans_skipped,
            stats.loads,
            stats.reloads,
            stats.retries,
            stats.evicted,
            stats.discarded
        );
        log::info!(
            "jobs {} ok, {} failed; table {} live, {} free slots",
            batcher.jobs_completed(),
            batcher.jobs_failed(),
            live,
            free
        );
        log::info!(
            "renderer: {} chunks (high {}, medium {}, low {}), {} with collision, {} render tris, {} collision tris",
            render.chunks,
            render.high,
            render.medium,
            render.low,
            render.with_collision,
            render.render_triangles,
            render.collision_triangles
        );
        log::info!(
            "renderer: {} submits, {} releases, {} chunks without material",
            self.renderer.submitted(),
            self.renderer.released(),
            render.chunks - render.with_material
        );
        log::info!(
            "scatter: {} anchors over {} chunks",
            self.scatter.anchor_count(),
            self.scatter.chunk_count()
        );
    }
}
