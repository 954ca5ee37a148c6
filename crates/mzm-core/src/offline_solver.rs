//! Solves a whole stream of levels, either one at a time (so a copy of the
//! source text can be interleaved with its solution) or all at once, letting
//! [`crate::ordered_collector::OrderedCollector`] restore level-number order.

use std::sync::Arc;

use crate::level_data::LevelData;
use crate::multi_solver::{MultiSolver, RequestFlags, SolutionCollector};
use crate::search::SearchType;
use crate::worker_pool::WorkerPool;

/// Drives a [`MultiSolver`] over many levels instead of one.
pub struct OfflineSolver<C: SolutionCollector + 'static> {
    pool: Arc<WorkerPool>,
    solver: Arc<MultiSolver<C>>,
}

impl<C: SolutionCollector + 'static> OfflineSolver<C> {
    pub fn new(pool: Arc<WorkerPool>, collector: Arc<C>) -> Self {
        OfflineSolver { pool, solver: Arc::new(MultiSolver::new(collector)) }
    }

    /// Like [`OfflineSolver::new`], but runs the optimal searches with
    /// `search_type` instead of breadth-first (`mzm-solve`'s `-A` flag).
    pub fn with_search_type(pool: Arc<WorkerPool>, collector: Arc<C>, search_type: SearchType) -> Self {
        OfflineSolver { pool, solver: Arc::new(MultiSolver::with_search_type(collector, search_type)) }
    }

    /// Submits every level up front and drains them through the pool
    /// together; jobs across different levels run concurrently and the
    /// collector is relied on to restore ordering.
    pub fn solve_batch(&self, levels: impl IntoIterator<Item = (u64, LevelData)>, flags: RequestFlags) {
        for (number, level) in levels {
            self.solver.submit(number, level, flags);
        }
        self.pool.work_synchronous(self.solver.clone());
    }

    /// Solves one level at a time, calling `on_level` with its number before
    /// (possibly) submitting it so a caller can echo the original source text
    /// ahead of the solution that is about to be written for it. Used by copy
    /// mode, where a level's solution must appear immediately after its own
    /// source block rather than being reshuffled by the collector.
    ///
    /// Every level in `levels` is passed to `on_level`, regardless of
    /// `should_solve`, so a level filter (`mzm-solve -l`) only decides which
    /// levels get solved — the source text of every level, selected or not,
    /// is still copied through.
    pub fn solve_copying(
        &self,
        levels: impl IntoIterator<Item = (u64, LevelData, bool)>,
        flags: RequestFlags,
        mut on_level: impl FnMut(u64),
    ) {
        for (number, level, should_solve) in levels {
            on_level(number);
            if should_solve {
                self.solver.submit(number, level, flags);
                self.pool.work_synchronous(self.solver.clone());
            }
        }
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
    fn batch_mode_solves_every_submitted_level() {
        let pool = Arc::new(WorkerPool::new(2));
        let collector = Arc::new(RecordingCollector::default());
        let offline = OfflineSolver::new(pool, collector.clone());
        let levels = (1..=5).map(|n| (n, one_push_level()));
        offline.solve_batch(levels, RequestFlags::PUSHES);
        assert_eq!(collector.solutions.lock().unwrap().len(), 5);
    }

    #[test]
    fn copy_mode_calls_on_level_before_each_level_is_submitted() {
        let pool = Arc::new(WorkerPool::new(1));
        let collector = Arc::new(RecordingCollector::default());
        let offline = OfflineSolver::new(pool, collector.clone());
        let seen = StdMutex::new(Vec::new());
        let levels = (1..=3).map(|n| (n, one_push_level(), true));
        offline.solve_copying(levels, RequestFlags::PUSHES, |n| seen.lock().unwrap().push(n));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(collector.solutions.lock().unwrap().len(), 3);
    }

    #[test]
    fn copy_mode_still_visits_levels_excluded_from_solving() {
        let pool = Arc::new(WorkerPool::new(1));
        let collector = Arc::new(RecordingCollector::default());
        let offline = OfflineSolver::new(pool, collector.clone());
        let seen = StdMutex::new(Vec::new());
        let levels = vec![(1, one_push_level(), false), (2, one_push_level(), true), (3, one_push_level(), false)];
        offline.solve_copying(levels, RequestFlags::PUSHES, |n| seen.lock().unwrap().push(n));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(collector.solutions.lock().unwrap().len(), 1);
        assert_eq!(collector.solutions.lock().unwrap()[0].0, 2);
    }
}
