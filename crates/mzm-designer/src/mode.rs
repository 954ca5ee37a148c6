//! Tagged-variant mode dispatch for the editor's play/playback/improver
//! states (spec.md §9's "virtual Mode dispatch" design note): composition
//! plus an explicit parent-mode link, rather than a class hierarchy.

use std::sync::Arc;
use std::time::Instant;

use mzm_core::history_level::HistoryLevel;
use mzm_core::improver::Improver;
use mzm_core::level_data::LevelData;
use mzm_core::types::Path;

use crate::solver::AppImprovementCollector;

pub enum Mode {
    Edit,
    Play(PlayMode),
    Playback(PlaybackMode),
    Improver(ImproverMode),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Edit => "Edit",
            Mode::Play(_) => "Play",
            Mode::Playback(_) => "Playback",
            Mode::Improver(_) => "Improve",
        }
    }
}

pub struct PlayMode {
    pub history: HistoryLevel,
    pub parent: Box<Mode>,
}

impl PlayMode {
    pub fn new(level: LevelData, parent: Mode) -> Self {
        PlayMode { history: HistoryLevel::new(level), parent: Box::new(parent) }
    }
}

pub struct PlaybackMode {
    pub history: HistoryLevel,
    pub playing: bool,
    pub step_ms: u64,
    pub last_step: Instant,
    pub parent: Box<Mode>,
}

impl PlaybackMode {
    /// Replays `path` onto a fresh player at `level`'s entrance, cursor
    /// parked at the start so the whole solution can be stepped through.
    pub fn new(level: LevelData, path: Path, parent: Mode) -> Self {
        PlaybackMode {
            history: HistoryLevel::with_path(level, path, Some(0)),
            playing: false,
            step_ms: 250,
            last_step: Instant::now(),
            parent: Box::new(parent),
        }
    }

    pub fn step_forward(&mut self) {
        if self.history.can_redo() {
            self.history.redo();
        } else {
            self.playing = false;
        }
    }

    pub fn step_back(&mut self) {
        if self.history.can_undo() {
            self.history.undo();
        }
    }

    pub fn reset(&mut self) {
        self.history.reset();
        self.playing = false;
    }

    pub fn faster(&mut self) {
        self.step_ms = (self.step_ms / 2).max(25);
    }

    pub fn slower(&mut self) {
        self.step_ms = (self.step_ms * 2).min(4000);
    }
}

pub struct ImproverMode {
    pub improver: Arc<Improver<AppImprovementCollector>>,
    pub starting_rating: f64,
    pub best_level: LevelData,
    pub best_rating: f64,
    pub best_push_count: Option<usize>,
    pub parent: Box<Mode>,
}

impl ImproverMode {
    pub fn new(
        improver: Arc<Improver<AppImprovementCollector>>,
        starting_level: LevelData,
        starting_rating: f64,
        parent: Mode,
    ) -> Self {
        ImproverMode {
            improver,
            starting_rating,
            best_level: starting_level,
            best_rating: starting_rating,
            best_push_count: None,
            parent: Box::new(parent),
        }
    }

    /// Records a strictly-better neighbour reported by the background improver.
    pub fn record_improvement(&mut self, rating: f64, push_count: usize, level: LevelData) {
        self.best_rating = rating;
        self.best_push_count = Some(push_count);
        self.best_level = level;
    }
}
