//! Generic graph search over [`Config`] nodes.
//!
//! All four strategies share the same "closed set maps config to parent"
//! architecture as the original solver: a [`BTreeMap`] ordered by each
//! `Config`'s own [`Ord`] rather than a hash table, so the representation
//! doubles as a natural duplicate-detector (mirrors the original's
//! `std::map<C*, C*, CompareConfigurationPointers>`).

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use crate::config::Config;

/// Which search strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    BreadthFirst,
    DepthFirst,
    BestFirst,
    AStar,
}

/// The outcome of running a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResult {
    FoundSolution,
    NoSolution,
    Interrupted,
}

trait Frontier<C> {
    fn push(&mut self, c: C);
    fn pop(&mut self) -> Option<C>;
}

struct Fifo<C>(VecDeque<C>);
impl<C> Frontier<C> for Fifo<C> {
    fn push(&mut self, c: C) {
        self.0.push_back(c);
    }
    fn pop(&mut self) -> Option<C> {
        self.0.pop_front()
    }
}

struct Lifo<C>(Vec<C>);
impl<C> Frontier<C> for Lifo<C> {
    fn push(&mut self, c: C) {
        self.0.push(c);
    }
    fn pop(&mut self) -> Option<C> {
        self.0.pop()
    }
}

/// Orders configurations by `get_estimated_distance` alone, for best-first search.
struct ByDistance<C>(C);

impl<C: Config> PartialEq for ByDistance<C> {
    fn eq(&self, other: &Self) -> bool {
        self.0.get_estimated_distance() == other.0.get_estimated_distance()
    }
}
impl<C: Config> Eq for ByDistance<C> {}
impl<C: Config> PartialOrd for ByDistance<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<C: Config> Ord for ByDistance<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.get_estimated_distance().cmp(&other.0.get_estimated_distance())
    }
}

struct BestFirst<C>(BinaryHeap<Reverse<ByDistance<C>>>);
impl<C: Config> Frontier<C> for BestFirst<C> {
    fn push(&mut self, c: C) {
        self.0.push(Reverse(ByDistance(c)));
    }
    fn pop(&mut self) -> Option<C> {
        self.0.pop().map(|Reverse(ByDistance(c))| c)
    }
}

/// An A* open-set entry: a configuration plus the cost-so-far (`g`) and
/// parent needed to reconstruct the path once the goal is popped.
struct HeapEntry<C> {
    f: u32,
    g: u32,
    config: C,
    parent: Option<C>,
}

impl<C: Config> PartialEq for HeapEntry<C> {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}
impl<C: Config> Eq for HeapEntry<C> {}
impl<C: Config> PartialOrd for HeapEntry<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<C: Config> Ord for HeapEntry<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f.cmp(&other.f)
    }
}

/// Runs graph searches over `Config` nodes, polling a shared cancellation
/// flag every iteration so a [`crate::worker_pool::WorkerPool`] can
/// interrupt a long-running search from another thread.
pub struct Searcher {
    keep_solving: Arc<AtomicBool>,
}

impl Default for Searcher {
    fn default() -> Self {
        Searcher::new()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Searcher::with_flag(Arc::new(AtomicBool::new(true)))
    }

    /// Builds a searcher whose cancellation flag is shared with the caller,
    /// so clearing it from another thread interrupts an in-progress search.
    pub fn with_flag(flag: Arc<AtomicBool>) -> Self {
        Searcher { keep_solving: flag }
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        self.keep_solving.clone()
    }

    pub fn go(&self) {
        self.keep_solving.store(true, AtomicOrdering::Release);
    }

    pub fn stop(&self) {
        self.keep_solving.store(false, AtomicOrdering::Release);
    }

    fn keep_going(&self) -> bool {
        self.keep_solving.load(AtomicOrdering::Acquire)
    }

    pub fn find_solution<C: Config>(&self, search_type: SearchType, init: C) -> (SolverResult, Vec<C>) {
        match search_type {
            SearchType::BreadthFirst => self.find_solution_breadth_first(init),
            SearchType::DepthFirst => self.find_solution_depth_first(init),
            SearchType::BestFirst => self.find_solution_best_first(init),
            SearchType::AStar => self.find_solution_a_star(init),
        }
    }

    pub fn find_solution_breadth_first<C: Config>(&self, init: C) -> (SolverResult, Vec<C>) {
        self.find_solution_queued(init, Fifo(VecDeque::new()))
    }

    pub fn find_solution_depth_first<C: Config>(&self, init: C) -> (SolverResult, Vec<C>) {
        self.find_solution_queued(init, Lifo(Vec::new()))
    }

    pub fn find_solution_best_first<C: Config>(&self, init: C) -> (SolverResult, Vec<C>) {
        self.find_solution_queued(init, BestFirst(BinaryHeap::new()))
    }

    /// Shared BFS/DFS/best-first body: only the frontier's push/pop order differs.
    fn find_solution_queued<C: Config>(&self, init: C, mut frontier: impl Frontier<C>) -> (SolverResult, Vec<C>) {
        let mut encountered: BTreeMap<C, Option<C>> = BTreeMap::new();
        encountered.insert(init.clone(), None);
        frontier.push(init.clone());

        let mut result = SolverResult::NoSolution;
        let mut goal: Option<C> = None;

        while self.keep_going() {
            let Some(top) = frontier.pop() else { break };
            if top.is_goal() {
                result = SolverResult::FoundSolution;
                goal = Some(top);
                break;
            }
            for n in top.get_neighbours() {
                if let std::collections::btree_map::Entry::Vacant(e) = encountered.entry(n.clone()) {
                    e.insert(Some(top.clone()));
                    frontier.push(n);
                }
            }
        }

        if !self.keep_going() {
            result = SolverResult::Interrupted;
        }

        if result != SolverResult::FoundSolution {
            return (result, vec![init]);
        }

        let path = reconstruct(&encountered, goal.unwrap());
        (result, path)
    }

    /// A* assuming `get_estimated_distance` is an admissible, consistent heuristic.
    ///
    /// The original walks a `make_heap`/`push_heap`/`pop_heap` triple kept in
    /// sync with an open-set map so an improved `g` can be written in place
    /// and the heap re-sorted; `BinaryHeap` has no decrease-key operation, so
    /// this pushes a fresh entry on every improvement and discards stale pops
    /// by comparing against the best known `g` recorded in `best_g` — a
    /// standard lazy-deletion translation of the same algorithm.
    pub fn find_solution_a_star<C: Config>(&self, init: C) -> (SolverResult, Vec<C>) {
        let mut open_heap: BinaryHeap<Reverse<HeapEntry<C>>> = BinaryHeap::new();
        let mut best_g: BTreeMap<C, u32> = BTreeMap::new();
        let mut closed: BTreeMap<C, Option<C>> = BTreeMap::new();

        best_g.insert(init.clone(), 0);
        open_heap.push(Reverse(HeapEntry {
            f: init.get_estimated_distance(),
            g: 0,
            config: init.clone(),
            parent: None,
        }));

        let mut result = SolverResult::NoSolution;
        let mut goal: Option<C> = None;

        while self.keep_going() {
            let Some(Reverse(entry)) = open_heap.pop() else { break };
            if closed.contains_key(&entry.config) {
                continue;
            }
            if let Some(&best) = best_g.get(&entry.config) {
                if entry.g > best {
                    continue;
                }
            }
            closed.insert(entry.config.clone(), entry.parent.clone());
            if entry.config.is_goal() {
                result = SolverResult::FoundSolution;
                goal = Some(entry.config);
                break;
            }
            for n in entry.config.get_neighbours() {
                if closed.contains_key(&n) {
                    continue;
                }
                let new_g = entry.g + 1;
                let improves = best_g.get(&n).is_none_or(|&g| new_g < g);
                if improves {
                    best_g.insert(n.clone(), new_g);
                    let h = n.get_estimated_distance();
                    open_heap.push(Reverse(HeapEntry {
                        f: new_g + h,
                        g: new_g,
                        config: n,
                        parent: Some(entry.config.clone()),
                    }));
                }
            }
        }

        if !self.keep_going() {
            result = SolverResult::Interrupted;
        }

        if result != SolverResult::FoundSolution {
            return (result, vec![init]);
        }

        let path = reconstruct(&closed, goal.unwrap());
        (result, path)
    }

    pub fn is_solvable_breadth_first<C: Config>(&self, init: C) -> SolverResult {
        self.find_solution_breadth_first(init).0
    }

    pub fn is_solvable_depth_first<C: Config>(&self, init: C) -> SolverResult {
        self.find_solution_depth_first(init).0
    }

    pub fn is_solvable_best_first<C: Config>(&self, init: C) -> SolverResult {
        self.find_solution_best_first(init).0
    }
}

/// Walks `closed[goal] -> parent -> ... -> None` back to the root and
/// returns the path from root to `goal`.
fn reconstruct<C: Config>(closed: &BTreeMap<C, Option<C>>, goal: C) -> Vec<C> {
    let mut path = vec![goal.clone()];
    let mut cur = goal;
    while let Some(parent) = closed.get(&cur).cloned().flatten() {
        path.push(parent.clone());
        cur = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkConfig;
    use crate::level_data::LevelData;

    #[test]
    fn breadth_first_finds_shortest_walk() {
        let l = LevelData::new(3, 4, 0, 0).unwrap();
        let init = WalkConfig::new(&l, 0, 0, 3, 2);
        let searcher = Searcher::new();
        let (result, path) = searcher.find_solution_breadth_first(init);
        assert_eq!(result, SolverResult::FoundSolution);
        assert_eq!(path.len(), 1 + 3 + 2);
        assert!(path.first().unwrap().get_neighbours().iter().any(|n| n == path.get(1).unwrap()));
        assert!(path.last().unwrap().is_goal());
    }

    #[test]
    fn depth_first_and_best_first_also_find_a_solution() {
        let l = LevelData::new(3, 4, 0, 0).unwrap();
        let searcher = Searcher::new();
        let (r1, p1) = searcher.find_solution_depth_first(WalkConfig::new(&l, 0, 0, 3, 2));
        assert_eq!(r1, SolverResult::FoundSolution);
        assert!(p1.last().unwrap().is_goal());
        let (r2, p2) = searcher.find_solution_best_first(WalkConfig::new(&l, 0, 0, 3, 2));
        assert_eq!(r2, SolverResult::FoundSolution);
        assert!(p2.last().unwrap().is_goal());
    }

    #[test]
    fn a_star_finds_the_optimal_path_length() {
        let l = LevelData::new(3, 4, 0, 0).unwrap();
        let searcher = Searcher::new();
        let (bfs_result, bfs_path) = searcher.find_solution_breadth_first(WalkConfig::new(&l, 0, 0, 3, 2));
        let (astar_result, astar_path) = searcher.find_solution_a_star(WalkConfig::new(&l, 0, 0, 3, 2));
        assert_eq!(bfs_result, SolverResult::FoundSolution);
        assert_eq!(astar_result, SolverResult::FoundSolution);
        assert_eq!(bfs_path.len(), astar_path.len());
    }

    #[test]
    fn unreachable_goal_reports_no_solution() {
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        // Wall the player into column 0 by blocking every escape.
        l.set_block(0, 1, true);
        l.set_block(1, 0, true);
        let searcher = Searcher::new();
        let (result, path) = searcher.find_solution_breadth_first(WalkConfig::new(&l, 0, 0, 3, 1));
        assert_eq!(result, SolverResult::NoSolution);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn stopping_the_flag_interrupts_a_search() {
        let l = LevelData::new(3, 4, 0, 0).unwrap();
        let searcher = Searcher::new();
        searcher.stop();
        let (result, _) = searcher.find_solution_breadth_first(WalkConfig::new(&l, 0, 0, 3, 2));
        assert_eq!(result, SolverResult::Interrupted);
    }
}
