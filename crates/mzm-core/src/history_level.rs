//! [`PlayerLevel`] plus a move log supporting undo, redo, and reset.

use crate::level_data::LevelData;
use crate::player_level::PlayerLevel;
use crate::types::{Direction, Path};

/// A [`PlayerLevel`] that records every move, supporting undo/redo/reset.
///
/// `path` is the full sequence of moves ever made; `cursor` marks how far
/// into it the player currently stands. Any new move truncates `path` at
/// `cursor` before appending, discarding any previously-undone tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLevel {
    player: PlayerLevel,
    path: Path,
    cursor: usize,
}

impl HistoryLevel {
    pub fn new(level: LevelData) -> Self {
        HistoryLevel {
            player: PlayerLevel::new(level),
            path: Path::new(),
            cursor: 0,
        }
    }

    /// Replays `path` (or a prefix of it, if `index` is given) onto a fresh
    /// player placed at the entrance of `level`.
    pub fn with_path(level: LevelData, path: Path, index: Option<usize>) -> Self {
        let target = index.unwrap_or(path.len());
        let mut history = HistoryLevel {
            player: PlayerLevel::new(level),
            path,
            cursor: 0,
        };
        for _ in 0..target {
            history.redo();
        }
        history
    }

    pub fn player(&self) -> &PlayerLevel {
        &self.player
    }

    pub fn level(&self) -> &LevelData {
        self.player.level()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.path.len()
    }

    fn record(&mut self, d: Direction) {
        self.path.0.truncate(self.cursor);
        self.path.push(d);
        self.cursor = self.path.len();
    }

    pub fn move_north(&mut self) {
        self.player.move_north();
        self.record(Direction::North);
    }

    pub fn move_south(&mut self) {
        self.player.move_south();
        self.record(Direction::South);
    }

    pub fn move_east(&mut self) {
        self.player.move_east();
        self.record(Direction::East);
    }

    pub fn move_west(&mut self) {
        self.player.move_west();
        self.record(Direction::West);
    }

    pub fn push_east(&mut self) {
        self.player.push_east();
        self.record(Direction::PushEast);
    }

    pub fn push_west(&mut self) {
        self.player.push_west();
        self.record(Direction::PushWest);
    }

    /// Pulls the block at the player's west one cell east (the inverse of
    /// [`HistoryLevel::push_west`]); used only by `undo`. Does not touch `path`.
    fn pull_east(&mut self) {
        debug_assert!(self.player.x() > 0);
        debug_assert!(self.player.level().get_block(self.player.y(), self.player.x() - 1));
        let y = self.player.y();
        self.player.level_mut().shift_east(y);
        self.player.move_east();
    }

    /// Pulls the block at the player's east one cell west (the inverse of
    /// [`HistoryLevel::push_east`]); used only by `undo`. Does not touch `path`.
    fn pull_west(&mut self) {
        debug_assert!(self.player.x() < self.player.level().width());
        debug_assert!(self.player.level().get_block(self.player.y(), self.player.x() + 1));
        let y = self.player.y();
        self.player.level_mut().shift_west(y);
        self.player.move_west();
    }

    /// Undoes the most recent move, moving `cursor` back by one.
    pub fn undo(&mut self) {
        debug_assert!(self.can_undo());
        self.cursor -= 1;
        match self.path.0[self.cursor] {
            Direction::North => self.player.move_south(),
            Direction::South => self.player.move_north(),
            Direction::East => self.player.move_west(),
            Direction::West => self.player.move_east(),
            Direction::PushEast => self.pull_west(),
            Direction::PushWest => self.pull_east(),
        }
    }

    /// Re-applies the move just past `cursor`, advancing it by one.
    pub fn redo(&mut self) {
        debug_assert!(self.can_redo());
        match self.path.0[self.cursor] {
            Direction::North => self.player.move_north(),
            Direction::South => self.player.move_south(),
            Direction::East => self.player.move_east(),
            Direction::West => self.player.move_west(),
            Direction::PushEast => self.player.push_east(),
            Direction::PushWest => self.player.push_west(),
        }
        self.cursor += 1;
    }

    /// Undoes every move, restoring the level to its state at `path[0]`.
    pub fn reset(&mut self) {
        while self.can_undo() {
            self.undo();
        }
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
    fn undo_redo_round_trip_on_a_push() {
        let mut h = HistoryLevel::new(one_push_level());
        h.move_east();
        h.push_east();
        let after_push = h.player().clone();
        assert!(h.can_undo());
        h.undo();
        h.undo();
        assert!(!h.can_undo());
        assert!(h.player().at_entrance());
        assert!(h.can_redo());
        h.redo();
        h.redo();
        assert_eq!(*h.player(), after_push);
    }

    #[test]
    fn new_move_truncates_redo_tail() {
        let mut h = HistoryLevel::new(one_push_level());
        h.move_east();
        h.undo();
        assert_eq!(h.path().len(), 1);
        h.move_east();
        assert_eq!(h.path().len(), 1);
        assert!(!h.can_redo());
    }

    #[test]
    fn reset_returns_to_start() {
        let mut h = HistoryLevel::new(one_push_level());
        h.move_east();
        h.push_east();
        h.reset();
        assert!(h.player().at_entrance());
        assert!(!h.can_undo());
        assert!(h.can_redo());
    }
}
