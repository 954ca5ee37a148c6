//! A cancellable unit of work: an initial [`Config`](crate::config::Config)
//! plus a search strategy, producing a concrete [`Direction`] path.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{Config, MoveConfig, PushConfig};
use crate::level_data::LevelData;
use crate::search::{SearchType, Searcher, SolverResult};
use crate::types::{Direction, Path};

/// The outcome of running a [`SolverJob`]'s [`SolverJob::do_job`], distinct
/// from whether the level itself turned out to be solvable: a cancelled job
/// never reaches an opinion about solvability at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Finished,
    Interrupted,
}

/// Snapshot of a finished job's result, behind a lock so [`SolverJob::do_job`]
/// (running on a worker thread) can publish it for [`SolverJob::is_solvable`]
/// and [`SolverJob::get_path`] (read from the pool's client thread) to see.
#[derive(Debug, Clone, Default)]
struct Outcome {
    solved: bool,
    path: Path,
}

/// A unit of solver work a [`crate::worker_pool::WorkerPool`] can run and
/// cancel. Each concrete job owns its own copy of the level being solved, so
/// it can be moved onto a worker thread independently of whatever created it.
pub trait SolverJob: Send + Sync {
    /// Runs the search to completion or cancellation.
    fn do_job(&self) -> JobStatus;
    /// Flips the job's cancellation flag; safe to call from another thread
    /// while `do_job` is executing.
    fn stop(&self);
    /// Whether the level was found solvable. Meaningless before `do_job` runs.
    fn is_solvable(&self) -> bool;
    /// The solution path found. Empty if the level was unsolvable or `do_job`
    /// hasn't completed.
    fn get_path(&self) -> Path;
}

/// Reconstructs a concrete [`Direction`] path from a [`MoveConfig`] path
/// returned by [`Searcher`], by walking the move-optimal search's own
/// adjacent-step bookkeeping.
fn reconstruct_move_path(configs: &[MoveConfig<'_>]) -> Path {
    let mut path = Path::new();
    let Some(first) = configs.first() else { return path };
    let (mut x, mut y) = first.add_initial_moves(&mut path);
    for pair in configs.windows(2) {
        pair[0]
            .add_moves(&pair[1], &mut path, &mut x, &mut y)
            .expect("adjacent search-path configs must be directly reachable");
    }
    if let Some(last) = configs.last() {
        last.add_final_moves(&mut path);
    }
    path
}

/// Reconstructs a concrete [`Direction`] path from a [`PushConfig`] path,
/// interleaving a walk-then-push for every abstract push transition.
fn reconstruct_push_path(configs: &[PushConfig<'_>]) -> Path {
    let mut path = Path::new();
    let Some(first) = configs.first() else { return path };
    let (mut x, mut y) = first.add_initial_moves(&mut path);
    for pair in configs.windows(2) {
        pair[0]
            .add_moves(&pair[1], &mut path, &mut x, &mut y)
            .expect("adjacent search-path configs must be connected by a single push");
    }
    if let Some(last) = configs.last() {
        last.add_final_moves(&mut path, &mut x, &mut y)
            .expect("the final push-optimal config must be able to walk out to the exit");
    }
    path
}

fn push_count(path: &Path) -> usize {
    path.0
        .iter()
        .filter(|d| matches!(d, Direction::PushEast | Direction::PushWest))
        .count()
}

/// The move-optimal solution category: [`MoveConfig`] expanded breadth-first
/// (or, with `-A`, A* against the same admissible heuristic — either
/// strategy returns a path of the same optimal length).
pub struct FewestMovesJob {
    level: LevelData,
    flag: Arc<AtomicBool>,
    search_type: SearchType,
    outcome: Mutex<Outcome>,
}

impl FewestMovesJob {
    pub fn new(level: LevelData) -> Self {
        Self::with_search_type(level, SearchType::BreadthFirst)
    }

    pub fn with_search_type(level: LevelData, search_type: SearchType) -> Self {
        FewestMovesJob { level, flag: Arc::new(AtomicBool::new(true)), search_type, outcome: Mutex::new(Outcome::default()) }
    }

    /// The move count of the solution found, or `None` if unsolved.
    pub fn move_count(&self) -> Option<usize> {
        let outcome = self.outcome.lock().unwrap();
        outcome.solved.then(|| outcome.path.len())
    }
}

impl SolverJob for FewestMovesJob {
    fn do_job(&self) -> JobStatus {
        let init = MoveConfig::new(&self.level);
        let searcher = Searcher::with_flag(self.flag.clone());
        let (result, configs) = searcher.find_solution(self.search_type, init);
        match result {
            SolverResult::Interrupted => JobStatus::Interrupted,
            SolverResult::FoundSolution => {
                *self.outcome.lock().unwrap() = Outcome { solved: true, path: reconstruct_move_path(&configs) };
                JobStatus::Finished
            }
            SolverResult::NoSolution => {
                *self.outcome.lock().unwrap() = Outcome::default();
                JobStatus::Finished
            }
        }
    }

    fn stop(&self) {
        self.flag.store(false, Ordering::Release);
    }

    fn is_solvable(&self) -> bool {
        self.outcome.lock().unwrap().solved
    }

    fn get_path(&self) -> Path {
        self.outcome.lock().unwrap().path.clone()
    }
}

/// The push-optimal solution category: [`PushConfig`] expanded breadth-first.
/// The only category that also produces a [`FewestPushesJob::rating`].
pub struct FewestPushesJob {
    level: LevelData,
    flag: Arc<AtomicBool>,
    search_type: SearchType,
    outcome: Mutex<Outcome>,
}

impl FewestPushesJob {
    pub fn new(level: LevelData) -> Self {
        Self::with_search_type(level, SearchType::BreadthFirst)
    }

    pub fn with_search_type(level: LevelData, search_type: SearchType) -> Self {
        FewestPushesJob { level, flag: Arc::new(AtomicBool::new(true)), search_type, outcome: Mutex::new(Outcome::default()) }
    }

    /// The push count of the solution found, or `None` if unsolved.
    pub fn push_count(&self) -> Option<usize> {
        let outcome = self.outcome.lock().unwrap();
        outcome.solved.then(|| push_count(&outcome.path))
    }

    /// Push count divided by the level's diagonal length; `-1.0` if unsolved.
    pub fn rating(&self) -> f64 {
        let outcome = self.outcome.lock().unwrap();
        if !outcome.solved {
            return -1.0;
        }
        let pushes = push_count(&outcome.path) as f64;
        let (w, h) = (self.level.width() as f64, self.level.height() as f64);
        pushes / (w * w + h * h).sqrt()
    }
}

impl SolverJob for FewestPushesJob {
    fn do_job(&self) -> JobStatus {
        let init = PushConfig::new(&self.level);
        let searcher = Searcher::with_flag(self.flag.clone());
        let (result, configs) = searcher.find_solution(self.search_type, init);
        match result {
            SolverResult::Interrupted => JobStatus::Interrupted,
            SolverResult::FoundSolution => {
                *self.outcome.lock().unwrap() = Outcome { solved: true, path: reconstruct_push_path(&configs) };
                JobStatus::Finished
            }
            SolverResult::NoSolution => {
                *self.outcome.lock().unwrap() = Outcome::default();
                JobStatus::Finished
            }
        }
    }

    fn stop(&self) {
        self.flag.store(false, Ordering::Release);
    }

    fn is_solvable(&self) -> bool {
        self.outcome.lock().unwrap().solved
    }

    fn get_path(&self) -> Path {
        self.outcome.lock().unwrap().path.clone()
    }
}

/// The any-solution category: [`PushConfig`] expanded depth-first. Fast to
/// answer "is this solvable at all" without optimality.
pub struct FastestJob {
    level: LevelData,
    flag: Arc<AtomicBool>,
    outcome: Mutex<Outcome>,
}

impl FastestJob {
    pub fn new(level: LevelData) -> Self {
        FastestJob { level, flag: Arc::new(AtomicBool::new(true)), outcome: Mutex::new(Outcome::default()) }
    }
}

impl SolverJob for FastestJob {
    fn do_job(&self) -> JobStatus {
        let init = PushConfig::new(&self.level);
        let searcher = Searcher::with_flag(self.flag.clone());
        let (result, configs) = searcher.find_solution(SearchType::DepthFirst, init);
        match result {
            SolverResult::Interrupted => JobStatus::Interrupted,
            SolverResult::FoundSolution => {
                *self.outcome.lock().unwrap() = Outcome { solved: true, path: reconstruct_push_path(&configs) };
                JobStatus::Finished
            }
            SolverResult::NoSolution => {
                *self.outcome.lock().unwrap() = Outcome::default();
                JobStatus::Finished
            }
        }
    }

    fn stop(&self) {
        self.flag.store(false, Ordering::Release);
    }

    fn is_solvable(&self) -> bool {
        self.outcome.lock().unwrap().solved
    }

    fn get_path(&self) -> Path {
        self.outcome.lock().unwrap().path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_push_level() -> LevelData {
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 1, true);
        l
    }

    #[test]
    fn fewest_pushes_solves_the_one_push_level() {
        let job = FewestPushesJob::new(one_push_level());
        assert_eq!(job.do_job(), JobStatus::Finished);
        assert!(job.is_solvable());
        assert_eq!(job.push_count(), Some(1));
        assert!(job.rating() > 0.0);
        assert_eq!(job.get_path().0.first(), Some(&Direction::East));
        assert_eq!(job.get_path().0.last(), Some(&Direction::East));
    }

    #[test]
    fn fewest_moves_counts_every_step() {
        let job = FewestMovesJob::new(one_push_level());
        assert_eq!(job.do_job(), JobStatus::Finished);
        assert!(job.is_solvable());
        assert_eq!(job.move_count(), Some(job.get_path().len()));
    }

    #[test]
    fn fastest_finds_some_solution() {
        let job = FastestJob::new(one_push_level());
        assert_eq!(job.do_job(), JobStatus::Finished);
        assert!(job.is_solvable());
    }

    #[test]
    fn unsolvable_level_reports_no_solution_and_negative_rating() {
        let mut l = LevelData::new(2, 4, 0, 1).unwrap();
        l.set_block(1, 0, true);
        l.set_block(1, 1, true);
        l.set_block(1, 2, true);
        l.set_block(1, 3, true);
        let job = FewestPushesJob::new(l);
        assert_eq!(job.do_job(), JobStatus::Finished);
        assert!(!job.is_solvable());
        assert_eq!(job.rating(), -1.0);
    }

    #[test]
    fn stopping_before_do_job_interrupts_it() {
        let job = FewestPushesJob::new(one_push_level());
        job.stop();
        assert_eq!(job.do_job(), JobStatus::Interrupted);
    }
}
