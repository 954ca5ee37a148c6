//! A fixed-size cooperative thread pool serving jobs for one client at a time.
//!
//! Workers spin on a start/end barrier pair built from `std::sync::Condvar`
//! (mirroring the teacher's own `ThreadPool` sleep/wake protocol in its
//! pre-refactor `search/threading.rs`); the short, high-contention critical
//! section around `client.get_next_job()`/`client.job_done()` instead uses
//! the [`crate::util::spinlock`] lock, since it is held for only a handful
//! of instructions at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::solver_job::{JobStatus, SolverJob};
use crate::util::spinlock::SpinMutex;

/// A client submits jobs to a [`WorkerPool`] through this trait. The pool
/// serialises every call into a single client across all workers, so a
/// client's own fields never need their own synchronisation.
pub trait WorkerPoolClient: Send + Sync {
    /// Returns the next job to run, or `None` if there is currently none.
    fn get_next_job(&self) -> Option<Arc<dyn SolverJob>>;
    /// Called when a job completes normally (not on cancellation).
    fn job_done(&self, job: Arc<dyn SolverJob>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    WorkingSynchronous,
    WorkingAsynchronous,
    WaitingForClient,
    Stopping,
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
    client_lock: SpinMutex<()>,
    /// Bumped every time new work is submitted or the pool is asked to stop,
    /// so a parked worker's wait wakes exactly once per such transition
    /// rather than spuriously on every `idle_count` update.
    generation: AtomicU64,
}

struct State {
    phase: Phase,
    client: Option<Arc<dyn WorkerPoolClient>>,
    in_flight: Vec<Arc<dyn SolverJob>>,
    idle_count: usize,
}

/// A fixed-size pool of worker threads. Created once; reused across many
/// `work_synchronous`/`work_asynchronous` rounds against different clients.
pub struct WorkerPool {
    size: usize,
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads, each idling until work is submitted.
    pub fn new(size: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State { phase: Phase::Idle, client: None, in_flight: Vec::new(), idle_count: 0 }),
            cond: Condvar::new(),
            client_lock: SpinMutex::new(()),
            generation: AtomicU64::new(0),
        });
        let handles = (0..size)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || worker_loop(&shared))
            })
            .collect();
        WorkerPool { size, shared, handles }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `client`'s jobs using both the pool's worker threads and the
    /// calling thread, returning only once every job has been served (or the
    /// client has none left to give).
    pub fn work_synchronous(&self, client: Arc<dyn WorkerPoolClient>) {
        self.start(client, Phase::WorkingSynchronous);
        // Participate as an additional worker until the whole pool, including
        // this thread, has nothing left to do.
        loop {
            match self.try_take_job() {
                Some(job) => self.run_and_report(job),
                None => {
                    if self.is_finished() {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        }
        self.set_phase(Phase::Idle);
    }

    /// Starts `client`'s jobs on the pool's worker threads and returns
    /// immediately. Requires at least one worker thread.
    pub fn work_asynchronous(&self, client: Arc<dyn WorkerPoolClient>) -> Result<(), NoWorkerThreads> {
        if self.size == 0 {
            return Err(NoWorkerThreads);
        }
        self.start(client, Phase::WorkingAsynchronous);
        Ok(())
    }

    fn start(&self, client: Arc<dyn WorkerPoolClient>, phase: Phase) {
        let mut state = self.shared.state.lock().unwrap();
        state.phase = phase;
        state.client = Some(client);
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        drop(state);
        self.shared.cond.notify_all();
    }

    fn set_phase(&self, phase: Phase) {
        self.shared.state.lock().unwrap().phase = phase;
    }

    /// Cancels every in-flight job, waits for the pool to settle, and stops
    /// delivering `job_done` callbacks for whatever jobs were still running.
    pub fn release_asynchronous(&self) {
        let in_flight = {
            let mut state = self.shared.state.lock().unwrap();
            state.phase = Phase::WaitingForClient;
            std::mem::take(&mut state.in_flight)
        };
        for job in &in_flight {
            job.stop();
        }
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.cond.notify_all();
        self.wait_for_idle();
        self.set_phase(Phase::Idle);
    }

    /// Waits for the asynchronous round to finish without cancelling it.
    pub fn wait_asynchronous(&self) {
        self.wait_for_idle();
    }

    fn wait_for_idle(&self) {
        let state = self.shared.state.lock().unwrap();
        let _unused = self
            .shared
            .cond
            .wait_while(state, |s| s.idle_count < self.size && !matches!(s.phase, Phase::Idle))
            .unwrap();
    }

    /// Whether every worker thread (and, for `work_synchronous`, the
    /// participating caller) is currently idle.
    pub fn is_finished(&self) -> bool {
        self.shared.state.lock().unwrap().idle_count >= self.size
    }

    fn try_take_job(&self) -> Option<Arc<dyn SolverJob>> {
        let _lock = self.shared.client_lock.lock();
        let client = self.shared.state.lock().unwrap().client.clone()?;
        let job = client.get_next_job()?;
        self.shared.state.lock().unwrap().in_flight.push(job.clone());
        Some(job)
    }

    fn run_and_report(&self, job: Arc<dyn SolverJob>) {
        let status = job.do_job();
        let mut state = self.shared.state.lock().unwrap();
        state.in_flight.retain(|j| !Arc::ptr_eq(j, &job));
        let still_working = matches!(state.phase, Phase::WorkingSynchronous | Phase::WorkingAsynchronous);
        let client = state.client.clone();
        drop(state);
        if status == JobStatus::Finished && still_working {
            if let Some(client) = client {
                let _lock = self.shared.client_lock.lock();
                client.job_done(job);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.phase = Phase::Stopping;
        }
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.cond.notify_all();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// `work_asynchronous` was called on a pool with zero worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoWorkerThreads;

impl std::fmt::Display for NoWorkerThreads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot work asynchronously with zero worker threads")
    }
}

impl std::error::Error for NoWorkerThreads {}

fn worker_loop(shared: &Arc<Shared>) {
    loop {
        let job = {
            let _lock = shared.client_lock.lock();
            let client = shared.state.lock().unwrap().client.clone();
            client.and_then(|c| c.get_next_job())
        };
        match job {
            Some(job) => {
                shared.state.lock().unwrap().in_flight.push(job.clone());
                let status = job.do_job();
                let mut state = shared.state.lock().unwrap();
                state.in_flight.retain(|j| !Arc::ptr_eq(j, &job));
                let still_working = matches!(state.phase, Phase::WorkingSynchronous | Phase::WorkingAsynchronous);
                let client = state.client.clone();
                drop(state);
                if status == JobStatus::Finished && still_working {
                    if let Some(client) = client {
                        let _lock = shared.client_lock.lock();
                        client.job_done(job);
                    }
                }
            }
            None => {
                let mut state = shared.state.lock().unwrap();
                if state.phase == Phase::Stopping {
                    return;
                }
                let generation = shared.generation.load(Ordering::SeqCst);
                state.idle_count += 1;
                shared.cond.notify_all();
                let state = shared
                    .cond
                    .wait_while(state, |_| shared.generation.load(Ordering::SeqCst) == generation)
                    .unwrap();
                let mut state = state;
                state.idle_count -= 1;
                if state.phase == Phase::Stopping {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level_data::LevelData;
    use crate::solver_job::FewestPushesJob;
    use std::sync::Mutex as StdMutex;

    struct OneShotClient {
        jobs: StdMutex<Vec<Arc<dyn SolverJob>>>,
        done: StdMutex<Vec<Arc<dyn SolverJob>>>,
    }

    impl WorkerPoolClient for OneShotClient {
        fn get_next_job(&self) -> Option<Arc<dyn SolverJob>> {
            self.jobs.lock().unwrap().pop()
        }
        fn job_done(&self, job: Arc<dyn SolverJob>) {
            self.done.lock().unwrap().push(job);
        }
    }

    fn one_push_level() -> LevelData {
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 1, true);
        l
    }

    #[test]
    fn synchronous_round_runs_every_job_and_reports_each() {
        let pool = WorkerPool::new(2);
        let jobs: Vec<Arc<dyn SolverJob>> = (0..5).map(|_| Arc::new(FewestPushesJob::new(one_push_level())) as _).collect();
        let client = Arc::new(OneShotClient { jobs: StdMutex::new(jobs), done: StdMutex::new(Vec::new()) });
        pool.work_synchronous(client.clone());
        assert!(pool.is_finished());
        assert_eq!(client.done.lock().unwrap().len(), 5);
    }

    #[test]
    fn asynchronous_round_eventually_reports_all_jobs() {
        let pool = WorkerPool::new(2);
        let jobs: Vec<Arc<dyn SolverJob>> = (0..4).map(|_| Arc::new(FewestPushesJob::new(one_push_level())) as _).collect();
        let client = Arc::new(OneShotClient { jobs: StdMutex::new(jobs), done: StdMutex::new(Vec::new()) });
        pool.work_asynchronous(client.clone()).unwrap();
        pool.wait_asynchronous();
        assert_eq!(client.done.lock().unwrap().len(), 4);
    }

    #[test]
    fn zero_worker_pool_rejects_asynchronous_work() {
        let pool = WorkerPool::new(0);
        let client = Arc::new(OneShotClient { jobs: StdMutex::new(Vec::new()), done: StdMutex::new(Vec::new()) });
        assert!(pool.work_asynchronous(client).is_err());
    }

    #[test]
    fn release_asynchronous_stops_reporting_further_jobs() {
        let pool = WorkerPool::new(1);
        let jobs: Vec<Arc<dyn SolverJob>> = (0..50).map(|_| Arc::new(FewestPushesJob::new(one_push_level())) as _).collect();
        let client = Arc::new(OneShotClient { jobs: StdMutex::new(jobs), done: StdMutex::new(Vec::new()) });
        pool.work_asynchronous(client.clone()).unwrap();
        pool.release_asynchronous();
        assert!(pool.is_finished());
    }
}
