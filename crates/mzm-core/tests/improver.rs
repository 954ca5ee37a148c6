use std::sync::{Arc, Mutex};

use mzm_core::improver::{Improver, ImprovementCollector};
use mzm_core::level_data::LevelData;
use mzm_core::selection::Selection;
use mzm_core::types::Path;
use mzm_core::worker_pool::WorkerPool;

#[derive(Default)]
struct RecordingCollector {
    improvements: Mutex<Vec<(f64, usize, LevelData)>>,
}

impl ImprovementCollector for RecordingCollector {
    fn collect_improvement(&self, rating: f64, push_count: usize, _path: Path, level: LevelData) {
        self.improvements.lock().unwrap().push((rating, push_count, level));
    }
}

fn flat_level() -> LevelData {
    LevelData::new(2, 4, 0, 0).unwrap()
}

/// An empty level has a fewest-pushes rating of -1.0 (unsolvable by that
/// job's own `rating()` convention when there's nothing to push); any block
/// flip that places an obstacle in the walkable row ought to improve on it.
#[test]
fn radius_one_search_finds_a_single_block_flip_improvement() {
    let pool = Arc::new(WorkerPool::new(2));
    let collector = Arc::new(RecordingCollector::default());
    let improver = Arc::new(Improver::new(pool, collector.clone(), flat_level(), -1.0, 1, None));
    improver.improve();

    assert!(improver.best_rating() > -1.0);
    let improvements = collector.improvements.lock().unwrap();
    assert!(!improvements.is_empty());
    // Every reported improvement must be strictly better than the one before
    // it, since the improver only ever calls back on a new best.
    let mut last = f64::NEG_INFINITY;
    for (rating, _, _) in improvements.iter() {
        assert!(*rating > last);
        last = *rating;
    }
}

/// A selection that excludes every cell must leave the level untouched: no
/// flips are legal, so no improvement can ever be found.
#[test]
fn empty_selection_finds_no_improvement() {
    let pool = Arc::new(WorkerPool::new(2));
    let collector = Arc::new(RecordingCollector::default());
    let selection = Selection::new(2, 4);
    let improver = Arc::new(Improver::new(pool, collector.clone(), flat_level(), -1.0, 3, Some(selection)));
    improver.improve();

    assert_eq!(improver.best_rating(), -1.0);
    assert!(collector.improvements.lock().unwrap().is_empty());
}

/// Restricting the selection to a single cell still finds that cell's
/// improvement if it helps, proving the selection mask (not just the radius)
/// is actually applied to the search space.
#[test]
fn single_selected_cell_is_still_searched() {
    let pool = Arc::new(WorkerPool::new(2));
    let collector = Arc::new(RecordingCollector::default());
    let mut selection = Selection::new(2, 4);
    selection.select(0, 1);
    let improver = Arc::new(Improver::new(pool, collector.clone(), flat_level(), -1.0, 1, Some(selection)));
    improver.improve();

    assert!(improver.best_rating() > -1.0);
    let improvements = collector.improvements.lock().unwrap();
    assert_eq!(improvements.len(), 1);
    assert!(improvements[0].2.get_block(0, 1));
}

/// `stop` on an asynchronous run must return promptly rather than letting the
/// odometer exhaust every neighbour at every radius.
#[test]
fn asynchronous_run_can_be_stopped() {
    let pool = Arc::new(WorkerPool::new(2));
    let collector = Arc::new(RecordingCollector::default());
    let mut base = LevelData::new(20, 60, 0, 0).unwrap();
    base.set_block(0, 1, true);
    let improver = Arc::new(Improver::new(pool, collector.clone(), base, 0.0, 4, None));
    improver.improve_asynchronously();
    improver.stop();
    // No assertion beyond "this returns and the process doesn't hang" --
    // `stop` racing a still-running search is the behaviour under test.
}
