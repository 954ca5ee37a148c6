//! Enumerates bounded-radius block-flip neighbours of a level, keeping the
//! best-rated solvable one seen so far.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::level_data::LevelData;
use crate::selection::Selection;
use crate::solver_job::{FewestPushesJob, SolverJob};
use crate::types::{Coord, Path};
use crate::worker_pool::{WorkerPool, WorkerPoolClient};

/// Receives every strict rating improvement the [`Improver`] finds, in the
/// order jobs happen to finish (there is no level-number sequencing need
/// here, unlike [`crate::multi_solver::SolutionCollector`]).
pub trait ImprovementCollector: Send + Sync {
    fn collect_improvement(&self, rating: f64, push_count: usize, path: Path, level: LevelData);
}

/// Every cell eligible to be flipped: every cell except the one directly in
/// front of the entrance, further restricted to `selection` if given.
fn allowed_cells(level: &LevelData, selection: Option<&Selection>) -> Vec<(Coord, Coord)> {
    let mut cells = Vec::new();
    for y in 0..level.height() {
        for x in 0..level.width() {
            if y == level.start() && x == 0 {
                continue;
            }
            if let Some(sel) = selection {
                if !sel.is_selected(y, x) {
                    continue;
                }
            }
            cells.push((y, x));
        }
    }
    cells
}

fn flipped(base: &LevelData, cells: &[(Coord, Coord)]) -> LevelData {
    let mut level = base.clone();
    for &(y, x) in cells {
        let blocked = level.get_block(y, x);
        level.set_block(y, x, !blocked);
    }
    level
}

/// Advances the strictly-increasing index combinations of length `1..=radius`
/// drawn from `0..n`, in the mixed-radix-odometer order spec.md describes:
/// all length-1 combinations, then all length-2, and so on.
struct Odometer {
    n: usize,
    radius: usize,
    k: usize,
    pending: Option<Vec<usize>>,
}

impl Odometer {
    fn new(n: usize, radius: usize) -> Self {
        let mut odometer = Odometer { n, radius: radius.min(n), k: 0, pending: None };
        odometer.advance_k();
        odometer
    }

    fn advance_k(&mut self) {
        loop {
            self.k += 1;
            if self.k > self.radius {
                self.pending = None;
                return;
            }
            if self.k <= self.n {
                self.pending = Some((0..self.k).collect());
                return;
            }
        }
    }

    fn advance_neighbour(&mut self) -> Option<Vec<usize>> {
        let combo = self.pending.clone()?;
        let mut next = combo.clone();
        if next_combination(&mut next, self.n) {
            self.pending = Some(next);
        } else {
            self.advance_k();
        }
        Some(combo)
    }
}

/// Next strictly-increasing combination of `c.len()` indices drawn from
/// `0..n`, in colexicographic order. Returns `false` once `c` is the last
/// combination of its length.
fn next_combination(c: &mut [usize], n: usize) -> bool {
    let k = c.len();
    for i in (0..k).rev() {
        if c[i] < n - k + i {
            c[i] += 1;
            for j in i + 1..k {
                c[j] = c[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

struct InFlight {
    level: LevelData,
    job: Arc<FewestPushesJob>,
}

/// Searches every reachable block-flip neighbour of a starting level (up to
/// `radius` simultaneous flips) for one with a strictly better fewest-pushes
/// rating, reporting each new best to an [`ImprovementCollector`].
pub struct Improver<I: ImprovementCollector + 'static> {
    pool: Arc<WorkerPool>,
    collector: Arc<I>,
    base: LevelData,
    best_rating: Mutex<f64>,
    allowed: Vec<(Coord, Coord)>,
    odometer: Mutex<Odometer>,
    in_flight: Mutex<HashMap<usize, InFlight>>,
}

impl<I: ImprovementCollector + 'static> Improver<I> {
    pub fn new(
        pool: Arc<WorkerPool>,
        collector: Arc<I>,
        base: LevelData,
        starting_rating: f64,
        radius: usize,
        selection: Option<Selection>,
    ) -> Self {
        let allowed = allowed_cells(&base, selection.as_ref());
        let odometer = Odometer::new(allowed.len(), radius);
        Improver {
            pool,
            collector,
            base,
            best_rating: Mutex::new(starting_rating),
            allowed,
            odometer: Mutex::new(odometer),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn best_rating(&self) -> f64 {
        *self.best_rating.lock().unwrap()
    }

    /// Runs to completion, exploring every candidate neighbour before
    /// returning.
    pub fn improve(self: &Arc<Self>) {
        self.pool.work_synchronous(self.clone());
    }

    /// Starts exploring in the background; call [`Improver::stop`] or
    /// [`Improver::wait`] to settle it.
    pub fn improve_asynchronously(self: &Arc<Self>) {
        let _ = self.pool.work_asynchronous(self.clone());
    }

    pub fn stop(&self) {
        self.pool.release_asynchronous();
    }

    pub fn wait(&self) {
        self.pool.wait_asynchronous();
    }
}

impl<I: ImprovementCollector + 'static> WorkerPoolClient for Improver<I> {
    fn get_next_job(&self) -> Option<Arc<dyn SolverJob>> {
        let indices = self.odometer.lock().unwrap().advance_neighbour()?;
        let cells: Vec<(Coord, Coord)> = indices.into_iter().map(|i| self.allowed[i]).collect();
        let level = flipped(&self.base, &cells);
        let job = Arc::new(FewestPushesJob::new(level.clone()));
        let key = Arc::as_ptr(&job) as *const () as usize;
        self.in_flight.lock().unwrap().insert(key, InFlight { level, job: job.clone() });
        Some(job as Arc<dyn SolverJob>)
    }

    fn job_done(&self, job: Arc<dyn SolverJob>) {
        let key = Arc::as_ptr(&job) as *const () as usize;
        let Some(in_flight) = self.in_flight.lock().unwrap().remove(&key) else { return };
        if !job.is_solvable() {
            return;
        }
        let rating = in_flight.job.rating();
        let mut best = self.best_rating.lock().unwrap();
        if rating > *best {
            *best = rating;
            let push_count = in_flight.job.push_count().unwrap_or(0);
            drop(best);
            self.collector.collect_improvement(rating, push_count, job.get_path(), in_flight.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn next_combination_enumerates_all_pairs_from_four() {
        let mut c = vec![0, 1];
        let mut seen = vec![c.clone()];
        while next_combination(&mut c, 4) {
            seen.push(c.clone());
        }
        assert_eq!(seen, vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]);
    }

    #[test]
    fn odometer_visits_every_length_before_growing() {
        let mut odometer = Odometer::new(3, 2);
        let mut lengths = Vec::new();
        while let Some(combo) = odometer.advance_neighbour() {
            lengths.push(combo.len());
        }
        // radius=2 over n=3: three singles, then three pairs.
        assert_eq!(lengths, vec![1, 1, 1, 2, 2, 2]);
    }

    #[derive(Default)]
    struct RecordingCollector {
        improvements: StdMutex<Vec<(f64, usize)>>,
    }

    impl ImprovementCollector for RecordingCollector {
        fn collect_improvement(&self, rating: f64, push_count: usize, _path: Path, _level: LevelData) {
            self.improvements.lock().unwrap().push((rating, push_count));
        }
    }

    fn flat_level() -> LevelData {
        LevelData::new(2, 4, 0, 0).unwrap()
    }

    #[test]
    fn flipping_a_block_into_the_path_improves_on_a_zero_rating_start() {
        let pool = Arc::new(WorkerPool::new(2));
        let collector = Arc::new(RecordingCollector::default());
        let improver =
            Arc::new(Improver::new(pool, collector.clone(), flat_level(), -1.0, 1, None));
        improver.improve();
        assert!(improver.best_rating() > -1.0);
        assert!(!collector.improvements.lock().unwrap().is_empty());
    }

    #[test]
    fn a_selection_excluding_every_cell_finds_nothing() {
        let pool = Arc::new(WorkerPool::new(1));
        let collector = Arc::new(RecordingCollector::default());
        let selection = Selection::new(2, 4);
        let improver = Arc::new(Improver::new(pool, collector.clone(), flat_level(), -1.0, 2, Some(selection)));
        improver.improve();
        assert_eq!(improver.best_rating(), -1.0);
        assert!(collector.improvements.lock().unwrap().is_empty());
    }
}
