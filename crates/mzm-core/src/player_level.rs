//! [`LevelData`] plus a player position, with move/push predicates.

use crate::level_data::LevelData;
use crate::types::{Coord, Direction};

/// A [`LevelData`] with a player at `(x, y)`.
///
/// `x` ranges over `[-1, width]`: `-1` is the entrance column (only valid
/// when `y == start`), `width` is the exit column (only valid when
/// `y == finish`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLevel {
    level: LevelData,
    x: Coord,
    y: Coord,
}

impl PlayerLevel {
    /// Places the player at the entrance of `level`.
    pub fn new(level: LevelData) -> Self {
        let y = level.start();
        PlayerLevel { level, x: -1, y }
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    /// Mutable access to the underlying level, for callers (such as
    /// [`crate::history_level::HistoryLevel`]'s undo logic) that shift a row
    /// directly instead of going through a push.
    pub fn level_mut(&mut self) -> &mut LevelData {
        &mut self.level
    }

    pub fn x(&self) -> Coord {
        self.x
    }

    pub fn y(&self) -> Coord {
        self.y
    }

    pub fn at_entrance(&self) -> bool {
        self.x == -1 && self.y == self.level.start()
    }

    pub fn at_exit(&self) -> bool {
        self.x == self.level.width() && self.y == self.level.finish()
    }

    pub fn can_move_north(&self) -> bool {
        !self.at_entrance() && !self.at_exit() && self.y > 0 && !self.level.get_block(self.y - 1, self.x)
    }

    pub fn can_move_south(&self) -> bool {
        !self.at_entrance()
            && !self.at_exit()
            && self.y < self.level.height() - 1
            && !self.level.get_block(self.y + 1, self.x)
    }

    pub fn can_move_east(&self) -> bool {
        (self.x < self.level.width() - 1 && !self.level.get_block(self.y, self.x + 1))
            || (self.y == self.level.finish() && self.x == self.level.width() - 1)
    }

    pub fn can_move_west(&self) -> bool {
        (self.x > 0 && !self.level.get_block(self.y, self.x - 1))
            || (self.y == self.level.start() && self.x == 0)
    }

    pub fn can_push_east(&self) -> bool {
        self.x < self.level.width() - 1
            && !self.level.get_block(self.y, self.level.width() - 1)
            && self.level.get_block(self.y, self.x + 1)
    }

    pub fn can_push_west(&self) -> bool {
        self.x > 0 && !self.level.get_block(self.y, 0) && self.level.get_block(self.y, self.x - 1)
    }

    pub fn move_north(&mut self) {
        debug_assert!(self.can_move_north());
        self.y -= 1;
    }

    pub fn move_south(&mut self) {
        debug_assert!(self.can_move_south());
        self.y += 1;
    }

    pub fn move_east(&mut self) {
        debug_assert!(self.can_move_east());
        self.x += 1;
    }

    pub fn move_west(&mut self) {
        debug_assert!(self.can_move_west());
        self.x -= 1;
    }

    pub fn push_east(&mut self) {
        debug_assert!(self.can_push_east());
        self.x += 1;
        self.level.shift_east(self.y);
    }

    pub fn push_west(&mut self) {
        debug_assert!(self.can_push_west());
        self.x -= 1;
        self.level.shift_west(self.y);
    }

    /// Applies `d`, dispatching to the matching `move_*`/`push_*` method.
    pub fn move_in_direction(&mut self, d: Direction) {
        match d {
            Direction::North => self.move_north(),
            Direction::South => self.move_south(),
            Direction::East => self.move_east(),
            Direction::West => self.move_west(),
            Direction::PushEast => self.push_east(),
            Direction::PushWest => self.push_west(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_push_level() -> PlayerLevel {
        // H=2, W=4, start=0, finish=0, block at (0,1).
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 1, true);
        PlayerLevel::new(l)
    }

    #[test]
    fn starts_at_entrance() {
        let p = one_push_level();
        assert!(p.at_entrance());
        assert_eq!(p.x(), -1);
    }

    #[test]
    fn can_push_block_directly_ahead() {
        let mut p = one_push_level();
        p.move_east(); // enter at (0,0)
        assert!(p.can_push_east());
        p.push_east();
        assert_eq!(p.x(), 1);
        assert_eq!(p.level().inset(0), 1);
    }

    #[test]
    fn cannot_push_off_the_east_wall() {
        // Block flush against the east wall: no room to push further east.
        let mut l = LevelData::new(2, 4, 0, 0).unwrap();
        l.set_block(0, 3, true);
        l.set_block(0, 1, true);
        let mut p = PlayerLevel::new(l);
        p.move_east();
        assert!(!p.can_push_east());
    }

    #[test]
    fn exit_cell_reachable_from_adjacent_column() {
        let mut l = LevelData::new(2, 4, 0, 1).unwrap();
        l.set_block(0, 1, true);
        let mut p = PlayerLevel::new(l);
        p.move_east(); // (-1,0) -> (0,0)
        p.push_east(); // (0,0) -> (1,0), block now at column 2
        p.move_south(); // (1,0) -> (1,1), row 1 (finish row) is empty
        while p.x() < p.level().width() - 1 {
            p.move_east();
        }
        assert!(p.can_move_east());
        p.move_east();
        assert!(p.at_exit());
    }
}
