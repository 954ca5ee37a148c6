//! Re-orders out-of-order solver callbacks and emits them in level-number order.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io::Write;
use std::sync::Mutex;

use crate::multi_solver::{RequestFlags, SolutionCategory, SolutionCollector};
use crate::types::Path;

/// A single level's accumulated, possibly-still-incomplete result set.
#[derive(Default)]
struct Pending {
    outstanding: RequestFlags,
    /// `None` once a category has reported back as unsolvable, `Some(path)`
    /// once it has reported a solution; absent entirely while still awaited.
    solutions: BTreeMap<SolutionCategory, Option<Path>>,
    rating: Option<(f64, Option<usize>)>,
}

/// Buffers solver callbacks keyed by level number and writes them to a sink
/// in strictly increasing order, regardless of the order jobs actually finish
/// in (see [`crate::worker_pool::WorkerPool`]'s no-ordering-between-clients
/// guarantee).
pub struct OrderedCollector<W: Write> {
    sink: Mutex<Inner<W>>,
    /// `mzm-solve -c`: solution lines are prefixed with `;;` so they read as
    /// comments when the output is re-parsed as a `.mzm` file, and the
    /// `Level N` header is omitted since the level's own text already marks
    /// where it begins.
    copy_mode: bool,
}

struct Inner<W: Write> {
    /// FIFO of level numbers in the order they were first reserved (via
    /// [`SolutionCollector::begin_level`] or [`SolutionCollector::collect_level_number`]),
    /// not the order in which their jobs happen to finish. `drain` only ever
    /// looks at the front of this queue, so a gap in the numbering itself
    /// (e.g. `mzm-solve -l 6,9-10`, where levels 7 and 8 were never
    /// reserved at all) never stalls emission of the levels that follow it.
    order: VecDeque<u64>,
    pending: BTreeMap<u64, Pending>,
    /// Level numbers already emitted, so a stray repeat reservation (there
    /// should be none in normal operation) doesn't resurrect a finished level.
    emitted: HashSet<u64>,
    writer: W,
}

impl<W: Write> Inner<W> {
    /// Reserves `level_number`'s place in the output sequence if it isn't
    /// already reserved, emitted, or mid-flight, then returns its (possibly
    /// freshly created) pending entry.
    fn reserve(&mut self, level_number: u64) -> &mut Pending {
        if !self.pending.contains_key(&level_number) && !self.emitted.contains(&level_number) {
            self.order.push_back(level_number);
        }
        self.pending.entry(level_number).or_default()
    }
}

impl<W: Write> OrderedCollector<W> {
    pub fn new(writer: W) -> Self {
        Self::with_copy_mode(writer, false)
    }

    pub fn with_copy_mode(writer: W, copy_mode: bool) -> Self {
        OrderedCollector {
            sink: Mutex::new(Inner {
                order: VecDeque::new(),
                pending: BTreeMap::new(),
                emitted: HashSet::new(),
                writer,
            }),
            copy_mode,
        }
    }

    /// Writes `text` straight through to the underlying sink, ahead of
    /// whatever solution lines this level's jobs will produce. Used by
    /// `mzm-solve -c` to echo a level's own source before its solutions.
    pub fn write_raw(&self, text: &str) {
        let mut inner = self.sink.lock().unwrap();
        let _ = inner.writer.write_all(text.as_bytes());
    }

    /// Emits every level at the front of `order` whose outstanding mask has
    /// been fully satisfied, stopping at the first one that is still
    /// incomplete (or, for a level that was never reserved through
    /// `begin_level`/`collect_level_number`, the first one not yet known at
    /// all) rather than a numeric successor that may never arrive.
    fn drain(inner: &mut Inner<W>, copy_mode: bool) {
        let prefix = if copy_mode { ";;" } else { "" };
        while let Some(&level_number) = inner.order.front() {
            let Some(pending) = inner.pending.get(&level_number) else { break };
            if !pending.outstanding.is_empty() {
                break;
            }
            inner.order.pop_front();
            let pending = inner.pending.remove(&level_number).unwrap();
            inner.emitted.insert(level_number);
            if !copy_mode {
                let _ = writeln!(inner.writer, "Level {level_number}");
            }
            let mut any_solution = false;
            for (category, path) in &pending.solutions {
                if let Some(path) = path {
                    any_solution = true;
                    let _ = writeln!(inner.writer, "{prefix}Solution{}: {}", category.label(), path);
                }
            }
            if !any_solution && !pending.solutions.is_empty() {
                let _ = writeln!(inner.writer, "{prefix}No solution");
            }
            if let Some((rating, _)) = pending.rating {
                let _ = writeln!(inner.writer, "{prefix}Rating: {rating:.2}");
            }
        }
    }
}

impl<W: Write + Send> SolutionCollector for OrderedCollector<W> {
    fn begin_level(&self, level_number: u64, requested: RequestFlags) {
        let mut inner = self.sink.lock().unwrap();
        let entry = inner.reserve(level_number);
        entry.outstanding = entry.outstanding.union(requested);
    }

    fn collect_level_number(&self, level_number: u64) {
        let mut inner = self.sink.lock().unwrap();
        inner.reserve(level_number);
    }

    fn collect_solution(&self, level_number: u64, category: SolutionCategory, path: Option<Path>) {
        let mut inner = self.sink.lock().unwrap();
        let entry = inner.reserve(level_number);
        entry.solutions.insert(category, path);
        entry.outstanding = entry.outstanding.without(category.flag());
        Self::drain(&mut inner, self.copy_mode);
    }

    fn collect_rating(&self, level_number: u64, rating: f64, push_count: Option<usize>) {
        let mut inner = self.sink.lock().unwrap();
        let entry = inner.reserve(level_number);
        entry.rating = Some((rating, push_count));
        entry.outstanding = entry.outstanding.without(RequestFlags::RATING);
        Self::drain(&mut inner, self.copy_mode);
    }
}
