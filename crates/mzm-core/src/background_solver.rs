//! Keeps exactly one level solved in the background, replacing it whenever
//! the caller edits it (the designer's live "is this solvable" readout).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::level_data::LevelData;
use crate::multi_solver::{MultiSolver, RequestFlags, SolutionCollector};
use crate::worker_pool::WorkerPool;

/// Wraps a [`MultiSolver`] to present a single hot-swappable level instead of
/// a stream: every [`BackgroundSolver::set_new_level`] cancels whatever
/// asynchronous work is outstanding and starts fresh.
pub struct BackgroundSolver<C: SolutionCollector + 'static> {
    pool: Arc<WorkerPool>,
    solver: Arc<MultiSolver<C>>,
    /// Each edit gets its own number so the collector never confuses a new
    /// round's results with a stale one still draining.
    generation: AtomicU64,
}

impl<C: SolutionCollector + 'static> BackgroundSolver<C> {
    pub fn new(pool: Arc<WorkerPool>, collector: Arc<C>) -> Self {
        BackgroundSolver { pool, solver: Arc::new(MultiSolver::new(collector)), generation: AtomicU64::new(0) }
    }

    /// Cancels any work in flight for the previous level, then submits
    /// `level` for whichever searches `flags` calls for.
    pub fn set_new_level(&self, level: LevelData, flags: RequestFlags) {
        self.pool.release_asynchronous();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.solver.submit(generation, level, flags);
        let _ = self.pool.work_asynchronous(self.solver.clone());
    }

    /// Cancels whatever is currently running without submitting a
    /// replacement, e.g. when the editor is closing.
    pub fn stop(&self) {
        self.pool.release_asynchronous();
    }

    /// The generation number of the most recently submitted level.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use crate::multi_solver::SolutionCategory;
    use crate::types::Path;

    #[derive(Default)]
    struct RecordingCollector {
        solutions: StdMutex<Vec<(u64, SolutionCategory, Option<Path>)>>,
    }

    impl SolutionCollector for RecordingCollector {
        fn collect_solution(&self, level_number: u64, category: SolutionCategory, path: Option<Path>) {
            self.solutions.lock().unwrap().push((level_number, category, path));
        }
        fn collect_rating(&self, _level_number: u64, _rating: f64, _push_count: Option<usize>) {}
    }

    fn one_push_level() -> LevelData {
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 1, true);
        l
    }

    #[test]
    fn replacing_the_level_eventually_reports_the_new_one() {
        let pool = Arc::new(WorkerPool::new(2));
        let collector = Arc::new(RecordingCollector::default());
        let bg = BackgroundSolver::new(pool, collector.clone());
        bg.set_new_level(one_push_level(), RequestFlags::PUSHES);
        bg.set_new_level(one_push_level(), RequestFlags::PUSHES);
        bg.stop();
        assert_eq!(bg.current_generation(), 2);
    }
}
