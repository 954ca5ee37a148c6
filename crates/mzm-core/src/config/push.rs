use std::cmp::Ordering;

use crate::config::{Config, NoSuchMoves};
use crate::config::walk::WalkConfig;
use crate::level_data::LevelData;
use crate::search::{SearchType, Searcher, SolverResult};
use crate::types::{Coord, Direction, Path, Row};

/// A search node tracking only each row's inset and the set of rows/columns
/// the player can currently reach ("zone"), abstracting away the player's
/// exact position. Used for push-optimal search: the zone collapses every
/// configuration reachable by pure walking into a single node, so the only
/// edges are actual pushes.
#[derive(Debug, Clone)]
pub struct PushConfig<'a> {
    level: &'a LevelData,
    inset: Vec<Coord>,
    zone: Vec<Row>,
}

impl<'a> PushConfig<'a> {
    pub fn new(level: &'a LevelData) -> Self {
        let inset: Vec<Coord> = (0..level.height()).map(|y| level.inset(y)).collect();
        let zone = vec![0; level.height() as usize];
        let mut c = PushConfig { level, inset, zone };
        c.build_zone(1 << (level.width() - 1), level.start());
        c
    }

    fn row(&self, y: Coord) -> Row {
        self.level.row(y) >> self.inset[y as usize]
    }

    fn pushed(&self, xxx: Row, y: Coord, was_left: bool) -> Self {
        let mut inset = self.inset.clone();
        if was_left {
            inset[y as usize] -= 1;
        } else {
            inset[y as usize] += 1;
        }
        let zone = vec![0; self.level.height() as usize];
        let mut c = PushConfig { level: self.level, inset, zone };
        c.build_zone(xxx, y);
        c
    }

    /// Floods the zone bitmap with every position reachable from `(xxx, y)`
    /// by walking alone (no pushes). Iterative rather than the original's
    /// recursion, since a maximally-tall level would otherwise overflow the
    /// stack.
    fn build_zone(&mut self, xxx: Row, y: Coord) {
        let width = self.level.width();
        let height = self.level.height();
        let mut stack = vec![(xxx, y)];
        while let Some((xxx, y)) = stack.pop() {
            debug_assert!(self.row(y) & xxx == 0);
            if self.zone[y as usize] & xxx != 0 {
                continue;
            }
            self.zone[y as usize] |= xxx;
            if y > 0 && self.row(y - 1) & xxx == 0 {
                stack.push((xxx, y - 1));
            }
            if y < height - 1 && self.row(y + 1) & xxx == 0 {
                stack.push((xxx, y + 1));
            }
            if xxx > 1 && self.row(y) & (xxx >> 1) == 0 {
                stack.push((xxx >> 1, y));
            }
            if xxx < (1 << (width - 1)) && self.row(y) & (xxx << 1) == 0 {
                stack.push((xxx << 1, y));
            }
        }
    }

    /// Finds the `(x, y, is_left)` of the single push that turns `self`
    /// into `other`, by locating the one row whose inset changed and then
    /// the column within it whose push lands in `other`'s zone.
    fn find_push(&self, other: &Self) -> Result<(Coord, Coord, bool), NoSuchMoves> {
        let height = self.level.height();
        let width = self.level.width();
        let mut y = 0;
        while y < height && self.inset[y as usize] == other.inset[y as usize] {
            y += 1;
        }
        if y == height {
            return Err(NoSuchMoves);
        }
        let yi = y as usize;
        if self.inset[yi] + 1 == other.inset[yi] {
            debug_assert!(self.row(y) & 1 == 0);
            let mut pushes = self.row(y) & (self.zone[yi] >> 1);
            let mut x = width - 1;
            while pushes > 0 {
                if pushes & 1 != 0 && other.zone[yi] & (1 << (width - x - 1)) != 0 {
                    return Ok((x - 1, y, false));
                }
                pushes >>= 1;
                x -= 1;
            }
        } else if self.inset[yi] - 1 == other.inset[yi] {
            debug_assert!(self.inset[yi] > 0);
            let mut pushes = self.row(y) & (self.zone[yi] << 1);
            let mut x = width - 1;
            while pushes > 0 {
                if pushes & 1 != 0 && other.zone[yi] & (1 << (width - x - 1)) != 0 {
                    return Ok((x + 1, y, true));
                }
                pushes >>= 1;
                x -= 1;
            }
        }
        Err(NoSuchMoves)
    }

    /// The opening move of any solution path.
    pub fn add_initial_moves(&self, path: &mut Path) -> (Coord, Coord) {
        path.push(Direction::East);
        (0, self.level.start())
    }

    /// Adds the walk-then-push steps that carry the player from `(x, y)` to
    /// the push that turns `self` into `other`, updating `(x, y)` in place.
    ///
    /// Walks a [`WalkConfig`] breadth-first search over a level re-aligned to
    /// this configuration's (possibly mid-solve) insets, since the player's
    /// exact path between pushes isn't tracked by the zone abstraction.
    pub fn add_moves(&self, other: &Self, path: &mut Path, x: &mut Coord, y: &mut Coord) -> Result<(), NoSuchMoves> {
        let (tx, ty, is_left) = self.find_push(other)?;
        let walk_level = self.level.with_insets(&self.inset);
        let init = WalkConfig::new(&walk_level, *x, *y, tx, ty);
        let searcher = Searcher::new();
        let (result, walk) = searcher.find_solution(SearchType::BreadthFirst, init);
        if result != SolverResult::FoundSolution {
            return Err(NoSuchMoves);
        }
        for pair in walk.windows(2) {
            pair[0].add_moves(&pair[1], path, x, y).map_err(|_| NoSuchMoves)?;
        }
        if is_left {
            path.push(Direction::PushWest);
            *x -= 1;
        } else {
            path.push(Direction::PushEast);
            *x += 1;
        }
        Ok(())
    }

    /// The walk from wherever the last push left the player out to the exit,
    /// plus the final move through it.
    pub fn add_final_moves(&self, path: &mut Path, x: &mut Coord, y: &mut Coord) -> Result<(), NoSuchMoves> {
        let walk_level = self.level.with_insets(&self.inset);
        let init = WalkConfig::new(&walk_level, *x, *y, self.level.width() - 1, self.level.finish());
        let searcher = Searcher::new();
        let (result, walk) = searcher.find_solution(SearchType::BreadthFirst, init);
        if result != SolverResult::FoundSolution {
            return Err(NoSuchMoves);
        }
        for pair in walk.windows(2) {
            pair[0].add_moves(&pair[1], path, x, y).map_err(|_| NoSuchMoves)?;
        }
        path.push(Direction::East);
        Ok(())
    }
}

impl PartialEq for PushConfig<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PushConfig<'_> {}

impl PartialOrd for PushConfig<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PushConfig<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inset.cmp(&other.inset).then_with(|| self.zone.cmp(&other.zone))
    }
}

impl<'a> Config for PushConfig<'a> {
    fn get_neighbours(&self) -> Vec<Self> {
        let mut v = Vec::new();
        for i in 0..self.level.height() {
            let yi = i as usize;
            if self.row(i) & 1 == 0 {
                let mut pushes = self.row(i) & (self.zone[yi] >> 1);
                let mut xxx: Row = 1;
                while pushes > 0 {
                    if pushes & 1 != 0 {
                        v.push(self.pushed(xxx, i, false));
                    }
                    pushes >>= 1;
                    xxx <<= 1;
                }
            }
            if self.inset[yi] > 0 {
                let mut pushes = self.row(i) & (self.zone[yi] << 1);
                let mut xxx: Row = 1;
                while pushes > 0 {
                    if pushes & 1 != 0 {
                        v.push(self.pushed(xxx, i, true));
                    }
                    pushes >>= 1;
                    xxx <<= 1;
                }
            }
        }
        v
    }

    fn is_goal(&self) -> bool {
        self.zone[self.level.finish() as usize] & 1 != 0
    }

    /// Not consistently better than a flat 0/1 without tracking player
    /// position, which this abstraction deliberately discards; matches the
    /// original's own admission that this heuristic is weak.
    fn get_estimated_distance(&self) -> u32 {
        if self.is_goal() { 0 } else { 1 }
    }
}
