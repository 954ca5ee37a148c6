//! Dispatches a level to the searches a client actually asked for, and routes
//! each finished job to a [`SolutionCollector`] by category.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::level_data::LevelData;
use crate::search::SearchType;
use crate::solver_job::{FastestJob, FewestMovesJob, FewestPushesJob, SolverJob};
use crate::types::Path;
use crate::worker_pool::WorkerPoolClient;

/// Which solver category produced a result. Mirrors the three job kinds in
/// [`crate::solver_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SolutionCategory {
    FewestMoves,
    FewestPushes,
    Fastest,
}

impl SolutionCategory {
    pub(crate) fn flag(self) -> RequestFlags {
        match self {
            SolutionCategory::FewestMoves => RequestFlags::MOVES,
            SolutionCategory::FewestPushes => RequestFlags::PUSHES,
            SolutionCategory::Fastest => RequestFlags::FASTEST,
        }
    }

    /// Label used in the `Solution(...)` output line; empty for the
    /// unqualified any-solution category.
    pub fn label(self) -> &'static str {
        match self {
            SolutionCategory::FewestMoves => "(Moves)",
            SolutionCategory::FewestPushes => "(Pushes)",
            SolutionCategory::Fastest => "",
        }
    }
}

/// Which outputs a caller wants for a level, packed into a single byte in the
/// style of the teacher's hand-rolled `AtomicBitSet` (plain, non-atomic here,
/// since every access happens while already serialised behind
/// [`crate::worker_pool::WorkerPool`]'s client lock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestFlags(u8);



impl RequestFlags {
    pub const NONE: RequestFlags = RequestFlags(0);
    pub const MOVES: RequestFlags = RequestFlags(1 << 0);
    pub const PUSHES: RequestFlags = RequestFlags(1 << 1);
    pub const FASTEST: RequestFlags = RequestFlags(1 << 2);
    pub const RATING: RequestFlags = RequestFlags(1 << 3);

    pub fn from_flag(flag: RequestFlags) -> RequestFlags {
        flag
    }

    pub fn union(self, other: RequestFlags) -> RequestFlags {
        RequestFlags(self.0 | other.0)
    }

    pub fn without(self, other: RequestFlags) -> RequestFlags {
        RequestFlags(self.0 & !other.0)
    }

    pub fn contains(self, other: RequestFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Which searches must run to satisfy this output request: a rating or a
    /// push count requires the fewest-pushes search even if the path itself
    /// wasn't asked for.
    pub fn searches(self) -> [Option<SolutionCategory>; 3] {
        [
            self.contains(RequestFlags::MOVES).then_some(SolutionCategory::FewestMoves),
            (self.contains(RequestFlags::PUSHES) || self.contains(RequestFlags::RATING))
                .then_some(SolutionCategory::FewestPushes),
            self.contains(RequestFlags::FASTEST).then_some(SolutionCategory::Fastest),
        ]
    }
}

/// Receives dispatched solver results, keyed by level number, in whatever
/// order jobs happen to finish. [`crate::ordered_collector::OrderedCollector`]
/// is the implementor that re-sequences them for output.
pub trait SolutionCollector: Send + Sync {
    /// Called once per level before any job for it is submitted, so the
    /// collector knows what it is still owed.
    fn begin_level(&self, _level_number: u64, _requested: RequestFlags) {}
    fn collect_solution(&self, level_number: u64, category: SolutionCategory, path: Option<Path>);
    fn collect_rating(&self, level_number: u64, rating: f64, push_count: Option<usize>);
    /// Reserves a level number in the output sequence without attaching any
    /// solution to it yet.
    fn collect_level_number(&self, _level_number: u64) {}
}

enum ConcreteJob {
    Moves(Arc<FewestMovesJob>),
    Pushes(Arc<FewestPushesJob>),
    Fastest(Arc<FastestJob>),
}

impl ConcreteJob {
    fn as_dyn(&self) -> Arc<dyn SolverJob> {
        match self {
            ConcreteJob::Moves(j) => j.clone() as Arc<dyn SolverJob>,
            ConcreteJob::Pushes(j) => j.clone() as Arc<dyn SolverJob>,
            ConcreteJob::Fastest(j) => j.clone() as Arc<dyn SolverJob>,
        }
    }

    fn category(&self) -> SolutionCategory {
        match self {
            ConcreteJob::Moves(_) => SolutionCategory::FewestMoves,
            ConcreteJob::Pushes(_) => SolutionCategory::FewestPushes,
            ConcreteJob::Fastest(_) => SolutionCategory::Fastest,
        }
    }

    fn ptr_key(&self) -> usize {
        match self {
            ConcreteJob::Moves(j) => Arc::as_ptr(j) as *const () as usize,
            ConcreteJob::Pushes(j) => Arc::as_ptr(j) as *const () as usize,
            ConcreteJob::Fastest(j) => Arc::as_ptr(j) as *const () as usize,
        }
    }
}

struct Entry {
    level_number: u64,
    job: ConcreteJob,
    want_rating: bool,
}

/// Submits every search a level's [`RequestFlags`] calls for to a
/// [`crate::worker_pool::WorkerPool`], and forwards each finished job's
/// result to a [`SolutionCollector`].
pub struct MultiSolver<C: SolutionCollector> {
    collector: Arc<C>,
    /// Strategy used for the optimal (fewest-moves / fewest-pushes)
    /// searches; `Fastest` always runs depth-first regardless, since it is
    /// defined as an any-solution search rather than an optimal one.
    search_type: SearchType,
    queue: Mutex<VecDeque<Entry>>,
    in_flight: Mutex<HashMap<usize, Entry>>,
}

impl<C: SolutionCollector> MultiSolver<C> {
    pub fn new(collector: Arc<C>) -> Self {
        Self::with_search_type(collector, SearchType::BreadthFirst)
    }

    /// Like [`MultiSolver::new`], but runs the optimal searches with
    /// `search_type` instead of breadth-first (`mzm-solve`'s `-A` flag).
    pub fn with_search_type(collector: Arc<C>, search_type: SearchType) -> Self {
        MultiSolver { collector, search_type, queue: Mutex::new(VecDeque::new()), in_flight: Mutex::new(HashMap::new()) }
    }

    /// Enqueues the searches `requested` calls for against `level`, numbered
    /// `level_number` for the collector's output ordering.
    pub fn submit(&self, level_number: u64, level: LevelData, requested: RequestFlags) {
        self.collector.collect_level_number(level_number);
        self.collector.begin_level(level_number, requested);
        let want_rating = requested.contains(RequestFlags::RATING);
        let mut queue = self.queue.lock().unwrap();
        for category in requested.searches().into_iter().flatten() {
            let job = match category {
                SolutionCategory::FewestMoves => {
                    ConcreteJob::Moves(Arc::new(FewestMovesJob::with_search_type(level.clone(), self.search_type)))
                }
                SolutionCategory::FewestPushes => {
                    ConcreteJob::Pushes(Arc::new(FewestPushesJob::with_search_type(level.clone(), self.search_type)))
                }
                SolutionCategory::Fastest => ConcreteJob::Fastest(Arc::new(FastestJob::new(level.clone()))),
            };
            queue.push_back(Entry { level_number, job, want_rating: want_rating && category == SolutionCategory::FewestPushes });
        }
    }

    /// Number of searches submitted but not yet taken by a worker.
    pub fn pending_count(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl<C: SolutionCollector> WorkerPoolClient for MultiSolver<C> {
    fn get_next_job(&self) -> Option<Arc<dyn SolverJob>> {
        let entry = self.queue.lock().unwrap().pop_front()?;
        let dyn_job = entry.job.as_dyn();
        self.in_flight.lock().unwrap().insert(entry.job.ptr_key(), entry);
        Some(dyn_job)
    }

    fn job_done(&self, job: Arc<dyn SolverJob>) {
        let key = Arc::as_ptr(&job) as *const () as usize;
        let Some(entry) = self.in_flight.lock().unwrap().remove(&key) else { return };
        let solved = job.is_solvable();
        let path = solved.then(|| job.get_path());
        self.collector.collect_solution(entry.level_number, entry.job.category(), path);
        if entry.want_rating {
            if let ConcreteJob::Pushes(pushes_job) = &entry.job {
                self.collector.collect_rating(entry.level_number, pushes_job.rating(), pushes_job.push_count());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingCollector {
        solutions: StdMutex<Vec<(u64, SolutionCategory, Option<Path>)>>,
        ratings: StdMutex<Vec<(u64, f64, Option<usize>)>>,
    }

    impl SolutionCollector for RecordingCollector {
        fn collect_solution(&self, level_number: u64, category: SolutionCategory, path: Option<Path>) {
            self.solutions.lock().unwrap().push((level_number, category, path));
        }
        fn collect_rating(&self, level_number: u64, rating: f64, push_count: Option<usize>) {
            self.ratings.lock().unwrap().push((level_number, rating, push_count));
        }
    }

    fn one_push_level() -> LevelData {
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 1, true);
        l
    }

    #[test]
    fn submit_enqueues_exactly_the_requested_searches() {
        let collector = Arc::new(RecordingCollector::default());
        let solver = MultiSolver::new(collector);
        solver.submit(1, one_push_level(), RequestFlags::MOVES.union(RequestFlags::PUSHES));
        assert_eq!(solver.pending_count(), 2);
    }

    #[test]
    fn rating_request_pulls_in_the_fewest_pushes_search_even_alone() {
        let collector = Arc::new(RecordingCollector::default());
        let solver = MultiSolver::new(collector);
        solver.submit(1, one_push_level(), RequestFlags::RATING);
        assert_eq!(solver.pending_count(), 1);
    }

    #[test]
    fn running_every_job_reports_solution_and_rating_to_the_collector() {
        let collector = Arc::new(RecordingCollector::default());
        let solver = MultiSolver::new(collector.clone());
        solver.submit(7, one_push_level(), RequestFlags::PUSHES.union(RequestFlags::RATING));
        while let Some(job) = solver.get_next_job() {
            job.do_job();
            solver.job_done(job);
        }
        let solutions = collector.solutions.lock().unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].0, 7);
        assert_eq!(solutions[0].1, SolutionCategory::FewestPushes);
        assert!(solutions[0].2.is_some());
        let ratings = collector.ratings.lock().unwrap();
        assert_eq!(ratings.len(), 1);
        assert!(ratings[0].1 > 0.0);
    }
}
