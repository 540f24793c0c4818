use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{JobError, RuntimeError};
use crate::job::{Job, JobHandler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    NotRunning,
    Running,
}

#[derive(Debug)]
struct Batch {
    jobs: Vec<Job>,
    status: BatchStatus,
}

struct Counters {
    running: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Groups jobs into bounded batches and runs each batch on a pool worker.
///
/// Batches live in one growable list and are never removed: a finished batch
/// is emptied and returned to `NotRunning` so later `add_job` calls can fill it.
/// Jobs inside a batch run strictly in append order; separate batches run
/// concurrently.
pub struct JobBatcher {
    batches: Arc<Mutex<Vec<Batch>>>,
    jobs_per_batch: usize,
    handler: Arc<dyn JobHandler>,
    pool: Arc<ThreadPool>,
    counters: Arc<Counters>,
}

impl JobBatcher {
    /// `workers` defaults to the machine's available parallelism.
    pub fn new(
        jobs_per_batch: usize,
        workers: Option<usize>,
        handler: Arc<dyn JobHandler>,
    ) -> Result<Self, RuntimeError> {
        let workers = workers.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        });
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("lumber-batch-{i}"))
            .build()?;
        Ok(Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            jobs_per_batch: jobs_per_batch.max(1),
            handler,
            pool: Arc::new(pool),
            counters: Arc::new(Counters {
                running: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
        })
    }

    #[inline]
    pub fn jobs_per_batch(&self) -> usize {
        self.jobs_per_batch
    }

    /// Appends to the first idle batch with room, or opens a new batch.
    pub fn add_job(&self, job: Job) {
        let mut batches = lock(&self.batches);
        let cap = self.jobs_per_batch;
        match batches
            .iter_mut()
            .find(|b| b.status == BatchStatus::NotRunning && b.jobs.len() < cap)
        {
            Some(batch) => batch.jobs.push(job),
            None => {
                let mut jobs = Vec::with_capacity(cap);
                jobs.push(job);
                batches.push(Batch {
                    jobs,
                    status: BatchStatus::NotRunning,
                });
            }
        }
    }

    pub fn add_jobs<I: IntoIterator<Item = Job>>(&self, jobs: I) {
        for job in jobs {
            self.add_job(job);
        }
    }

    /// Dispatches every idle, non-empty batch. Returns how many were started.
    pub fn run_jobs(&self) -> usize {
        let mut batches = lock(&self.batches);
        let mut started = 0;
        for (idx, batch) in batches.iter_mut().enumerate() {
            if batch.status != BatchStatus::NotRunning || batch.jobs.is_empty() {
                continue;
            }
            batch.status = BatchStatus::Running;
            self.counters.running.fetch_add(1, Ordering::Relaxed);
            let jobs = batch.jobs.clone();
            let batches = Arc::clone(&self.batches);
            let handler = Arc::clone(&self.handler);
            let counters = Arc::clone(&self.counters);
            self.pool.spawn(move || {
                run_batch(idx, &jobs, handler.as_ref(), &counters);
                let mut batches = lock(&batches);
                if let Some(batch) = batches.get_mut(idx) {
                    batch.jobs.clear();
                    batch.status = BatchStatus::NotRunning;
                }
                counters.running.fetch_sub(1, Ordering::Relaxed);
            });
            started += 1;
        }
        if started > 0 {
            log::trace!(target: "jobs", "dispatched {} batches", started);
        }
        started
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        lock(&self.batches).iter().map(|b| b.jobs.len()).collect()
    }

    pub fn batch_statuses(&self) -> Vec<BatchStatus> {
        lock(&self.batches).iter().map(|b| b.status).collect()
    }

    /// Jobs waiting in batches that have not been dispatched yet.
    pub fn pending_jobs(&self) -> usize {
        lock(&self.batches)
            .iter()
            .filter(|b| b.status == BatchStatus::NotRunning)
            .map(|b| b.jobs.len())
            .sum()
    }

    #[inline]
    pub fn running_batches(&self) -> usize {
        self.counters.running.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn jobs_completed(&self) -> usize {
        self.counters.completed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn jobs_failed(&self) -> usize {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Blocks until no batch is running or `timeout` elapses. Returns whether idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.running_batches() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

fn run_batch(idx: usize, jobs: &[Job], handler: &dyn JobHandler, counters: &Counters) {
    for &job in jobs {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.run(job)));
        let err = match outcome {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            Ok(Err(err)) => err,
            Err(payload) => JobError::Panicked {
                job,
                message: panic_message(payload.as_ref()),
            },
        };
        counters.failed.fetch_add(1, Ordering::Relaxed);
        log::warn!(target: "jobs", "batch {}: {} failed: {}", idx, job, err);
        handler.on_failure(job, &err);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl JobHandler for Noop {
        fn run(&self, _job: Job) -> Result<(), JobError> {
            Ok(())
        }
    }

    #[test]
    fn seven_jobs_fill_three_batches() {
        let b = JobBatcher::new(3, Some(1), Arc::new(Noop)).unwrap();
        for pos in 0..7 {
            b.add_job(Job::Load { pos });
        }
        assert_eq!(b.batch_sizes(), vec![3, 3, 1]);
        assert_eq!(b.pending_jobs(), 7);
        assert!(
            b.batch_statuses()
                .iter()
                .all(|s| *s == BatchStatus::NotRunning)
        );
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let b = JobBatcher::new(0, Some(1), Arc::new(Noop)).unwrap();
        assert_eq!(b.jobs_per_batch(), 1);
        b.add_jobs([Job::Load { pos: 0 }, Job::Reload { pos: 1 }]);
        assert_eq!(b.batch_sizes(), vec![1, 1]);
    }

    #[test]
    fn run_jobs_skips_empty_batches() {
        let b = JobBatcher::new(2, Some(1), Arc::new(Noop)).unwrap();
        assert_eq!(b.run_jobs(), 0);
        b.add_job(Job::Load { pos: 4 });
        assert_eq!(b.run_jobs(), 1);
        assert!(b.wait_idle(Duration::from_secs(5)));
        assert_eq!(b.batch_sizes(), vec![0]);
        assert_eq!(b.run_jobs(), 0);
        assert_eq!(b.jobs_completed(), 1);
    }

    #[test]
    fn panic_message_reads_both_string_kinds() {
        let a: Box<dyn Any + Send> = Box::new("static");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
    }
}
