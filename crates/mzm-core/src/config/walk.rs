use std::cmp::Ordering;

use crate::config::{Config, NoSuchMoves};
use crate::level_data::LevelData;
use crate::types::{Coord, Direction, Path};

/// A search node for walking from `(x, y)` to `(tx, ty)` without pushing any
/// block. Used internally by [`MoveConfig`](crate::config::MoveConfig)'s and
/// [`PushConfig`](crate::config::PushConfig)'s path reconstruction to find
/// the concrete steps that carry the player from wherever a push left them
/// to the cell the next push requires.
#[derive(Debug, Clone)]
pub struct WalkConfig<'a> {
    level: &'a LevelData,
    x: Coord,
    y: Coord,
    tx: Coord,
    ty: Coord,
}

impl<'a> WalkConfig<'a> {
    pub fn new(level: &'a LevelData, x: Coord, y: Coord, tx: Coord, ty: Coord) -> Self {
        WalkConfig { level, x, y, tx, ty }
    }

    pub fn x(&self) -> Coord {
        self.x
    }

    pub fn y(&self) -> Coord {
        self.y
    }

    /// Adds the single step that carries the player from `self` to the
    /// adjacent configuration `other`.
    pub fn add_moves(&self, other: &Self, path: &mut Path, x: &mut Coord, y: &mut Coord) -> Result<(), NoSuchMoves> {
        if other.x == self.x - 1 {
            path.push(Direction::West);
            *x -= 1;
        } else if other.x == self.x + 1 {
            path.push(Direction::East);
            *x += 1;
        } else if other.y == self.y - 1 {
            path.push(Direction::North);
            *y -= 1;
        } else if other.y == self.y + 1 {
            path.push(Direction::South);
            *y += 1;
        } else {
            return Err(NoSuchMoves);
        }
        Ok(())
    }
}

impl PartialEq for WalkConfig<'_> {
    fn eq(&self, other: &Self) -> bool {
        (self.x, self.y) == (other.x, other.y)
    }
}

impl Eq for WalkConfig<'_> {}

impl PartialOrd for WalkConfig<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WalkConfig<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.x, self.y).cmp(&(other.x, other.y))
    }
}

impl<'a> Config for WalkConfig<'a> {
    fn get_neighbours(&self) -> Vec<Self> {
        let mut v = Vec::with_capacity(4);
        if self.x < self.level.width() - 1 && !self.level.get_block(self.y, self.x + 1) {
            v.push(WalkConfig::new(self.level, self.x + 1, self.y, self.tx, self.ty));
        }
        if self.y > 0 && !self.level.get_block(self.y - 1, self.x) {
            v.push(WalkConfig::new(self.level, self.x, self.y - 1, self.tx, self.ty));
        }
        if self.y < self.level.height() - 1 && !self.level.get_block(self.y + 1, self.x) {
            v.push(WalkConfig::new(self.level, self.x, self.y + 1, self.tx, self.ty));
        }
        if self.x > 0 && !self.level.get_block(self.y, self.x - 1) {
            v.push(WalkConfig::new(self.level, self.x - 1, self.y, self.tx, self.ty));
        }
        v
    }

    fn is_goal(&self) -> bool {
        self.x == self.tx && self.y == self.ty
    }

    fn get_estimated_distance(&self) -> u32 {
        self.tx.abs_diff(self.x) as u32 + self.ty.abs_diff(self.y) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_avoid_blocks_and_walls() {
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 1, true);
        let c = WalkConfig::new(&l, 0, 0, 3, 1);
        let neighbours = c.get_neighbours();
        // East is blocked by the block at (0,1); south and... west is a wall.
        assert!(neighbours.iter().all(|n| !(n.x == 1 && n.y == 0)));
        assert!(neighbours.iter().any(|n| n.x == 0 && n.y == 1));
    }

    #[test]
    fn goal_and_distance() {
        let l = LevelData::new(2, 4, 0, 0).unwrap();
        let c = WalkConfig::new(&l, 0, 0, 2, 1);
        assert!(!c.is_goal());
        assert_eq!(c.get_estimated_distance(), 3);
        let goal = WalkConfig::new(&l, 2, 1, 2, 1);
        assert!(goal.is_goal());
    }
}
