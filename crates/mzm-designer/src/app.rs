//! The designer's application state: the level under edit, the live
//! background-solver readout, and the current [`Mode`]. Modeled on the
//! teacher's `tui/app.rs` — a field-heavy `App` plus an `mpsc` channel
//! draining background solver results into the render loop — generalised
//! from one Reversi game to the editor/play/playback/improver mode chain.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyCode;

use mzm_core::background_solver::BackgroundSolver;
use mzm_core::improver::Improver;
use mzm_core::level_data::LevelData;
use mzm_core::multi_solver::{RequestFlags, SolutionCategory};
use mzm_core::mzm_format::write_level_with_header;
use mzm_core::selection::Selection;
use mzm_core::types::{Coord, Path};
use mzm_core::worker_pool::WorkerPool;

use crate::mode::{ImproverMode, Mode, PlayMode, PlaybackMode};
use crate::rng::Xorshift64;
use crate::solver::{AppImprovementCollector, AppSolutionCollector, SolverEvent};

/// The background solver's latest opinion of the level under edit. `None`
/// means "still computing"; `Some(None)` means "computed: no solution".
#[derive(Default)]
pub struct LiveStatus {
    pub moves_path: Option<Option<Path>>,
    pub pushes_path: Option<Option<Path>>,
    pub rating: Option<f64>,
}

pub struct App {
    level: LevelData,
    cursor: (Coord, Coord),
    selection: Selection,
    mode: Mode,

    background: Arc<BackgroundSolver<AppSolutionCollector>>,
    improver_pool: Arc<WorkerPool>,
    solver_tx: Sender<SolverEvent>,
    solver_rx: Receiver<SolverEvent>,
    current_generation: u64,
    live: LiveStatus,
    last_pushes_path: Option<Path>,

    improver_radius: usize,
    output_path: PathBuf,
    level_number: u64,
    monochrome: bool,
    should_quit: bool,
    status: String,
}

impl App {
    pub fn new(level: LevelData, level_number: u64, output_path: PathBuf, threads: usize, monochrome: bool) -> Self {
        let bg_threads = (threads / 2).max(1);
        let improver_threads = threads.saturating_sub(bg_threads).max(1);

        let (tx, rx) = mpsc::channel();
        let bg_collector = Arc::new(AppSolutionCollector { tx: tx.clone() });
        let background = Arc::new(BackgroundSolver::new(Arc::new(WorkerPool::new(bg_threads)), bg_collector));

        let (height, width) = (level.height(), level.width());
        let mut app = App {
            level,
            cursor: (0, 0),
            selection: Selection::new(height, width),
            mode: Mode::Edit,
            background,
            improver_pool: Arc::new(WorkerPool::new(improver_threads)),
            solver_tx: tx,
            solver_rx: rx,
            current_generation: 0,
            live: LiveStatus::default(),
            last_pushes_path: None,
            improver_radius: 1,
            output_path,
            level_number,
            monochrome,
            should_quit: false,
            status: String::new(),
        };
        app.refresh_background();
        app
    }

    // -- Read-only accessors for the renderer --------------------------------

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn cursor(&self) -> (Coord, Coord) {
        self.cursor
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn live(&self) -> &LiveStatus {
        &self.live
    }

    pub fn monochrome(&self) -> bool {
        self.monochrome
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn level_number(&self) -> u64 {
        self.level_number
    }

    pub fn improver_radius(&self) -> usize {
        self.improver_radius
    }

    // -- Main loop ------------------------------------------------------------

    pub fn run(mut self, mut terminal: ratatui::DefaultTerminal) -> std::io::Result<()> {
        loop {
            self.tick();
            terminal.draw(|frame| crate::render::render(frame, &self))?;

            let playing = matches!(&self.mode, Mode::Playback(m) if m.playing);
            let timeout = if playing { Duration::from_millis(30) } else { Duration::from_millis(120) };
            if let Some(crate::event::Event::Key(code)) = crate::event::poll_event(timeout)? {
                self.handle_key(code);
            }
            if self.should_quit {
                break;
            }
        }
        self.background.stop();
        if let Mode::Improver(m) = &self.mode {
            m.improver.stop();
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.drain_solver_events();
        if let Mode::Playback(m) = &mut self.mode {
            if m.playing && m.last_step.elapsed() >= Duration::from_millis(m.step_ms) {
                m.step_forward();
                m.last_step = std::time::Instant::now();
            }
        }
    }

    fn drain_solver_events(&mut self) {
        while let Ok(event) = self.solver_rx.try_recv() {
            match event {
                SolverEvent::Solution { generation, category, path } => {
                    if generation != self.current_generation {
                        continue;
                    }
                    match category {
                        SolutionCategory::FewestMoves => self.live.moves_path = Some(path),
                        SolutionCategory::FewestPushes => {
                            self.last_pushes_path = path.clone();
                            self.live.pushes_path = Some(path);
                        }
                        SolutionCategory::Fastest => {}
                    }
                }
                SolverEvent::Rating { generation, rating } => {
                    if generation == self.current_generation {
                        self.live.rating = Some(rating);
                    }
                }
                SolverEvent::Improvement { rating, push_count, level } => {
                    if let Mode::Improver(m) = &mut self.mode {
                        m.record_improvement(rating, push_count, level);
                    }
                }
            }
        }
    }

    fn refresh_background(&mut self) {
        self.live = LiveStatus::default();
        let flags = RequestFlags::MOVES.union(RequestFlags::PUSHES).union(RequestFlags::RATING);
        self.background.set_new_level(self.level.clone(), flags);
        self.current_generation = self.background.current_generation();
    }

    // -- Key dispatch -----------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyCode) {
        let mode = std::mem::replace(&mut self.mode, Mode::Edit);
        self.mode = match mode {
            Mode::Edit => self.handle_edit_key(key),
            Mode::Play(m) => self.handle_play_key(key, m),
            Mode::Playback(m) => self.handle_playback_key(key, m),
            Mode::Improver(m) => self.handle_improver_key(key, m),
        };
    }

    fn handle_edit_key(&mut self, key: KeyCode) -> Mode {
        let (height, width) = (self.level.height(), self.level.width());
        match key {
            KeyCode::Up => self.cursor.0 = (self.cursor.0 - 1).max(0),
            KeyCode::Down => self.cursor.0 = (self.cursor.0 + 1).min(height - 1),
            KeyCode::Left => self.cursor.1 = (self.cursor.1 - 1).max(0),
            KeyCode::Right => self.cursor.1 = (self.cursor.1 + 1).min(width - 1),
            KeyCode::Home => self.cursor.1 = 0,
            KeyCode::End => self.cursor.1 = width - 1,
            KeyCode::Char(' ') => {
                let (y, x) = self.cursor;
                let block = !self.level.get_block(y, x);
                self.level.set_block(y, x, block);
                self.refresh_background();
            }
            KeyCode::Char('b') => {
                let (y, x) = self.cursor;
                self.level.set_block(y, x, true);
                self.refresh_background();
            }
            KeyCode::Char('g') | KeyCode::Backspace | KeyCode::Delete => {
                let (y, x) = self.cursor;
                self.level.set_block(y, x, false);
                self.refresh_background();
            }
            KeyCode::Char('<') => {
                let y = self.cursor.0;
                if self.level.can_shift_west(y) {
                    self.level.shift_west(y);
                    self.refresh_background();
                } else {
                    self.status = "no room to shift that row west".into();
                }
            }
            KeyCode::Char('>') => {
                let y = self.cursor.0;
                if self.level.can_shift_east(y) {
                    self.level.shift_east(y);
                    self.refresh_background();
                } else {
                    self.status = "no room to shift that row east".into();
                }
            }
            KeyCode::Char('[') => self.resize(height, width - 1),
            KeyCode::Char(']') => self.resize(height, width + 1),
            KeyCode::Char('{') => self.resize(height - 1, width),
            KeyCode::Char('}') => self.resize(height + 1, width),
            KeyCode::Char('m') => {
                let (y, x) = self.cursor;
                self.selection.select(y, x);
            }
            KeyCode::Char('M') => {
                let (y, x) = self.cursor;
                self.selection.deselect(y, x);
            }
            KeyCode::Char('a') => self.selection.select_all(),
            KeyCode::Char('A') => self.selection.clear(),
            KeyCode::Char('C') => {
                self.level.clear();
                self.refresh_background();
            }
            KeyCode::Char('R') => {
                self.randomise();
                self.refresh_background();
            }
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('p') => return Mode::Play(PlayMode::new(self.level.clone(), Mode::Edit)),
            KeyCode::Char('v') => return self.enter_playback(),
            KeyCode::Char('I') => return self.enter_improver(),
            KeyCode::Char('+') => self.improver_radius = (self.improver_radius + 1).min(4),
            KeyCode::Char('-') => self.improver_radius = self.improver_radius.saturating_sub(1).max(1),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
        Mode::Edit
    }

    fn resize(&mut self, height: Coord, width: Coord) {
        use mzm_core::types::{MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH};
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) || !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return;
        }
        if !self.level.can_set_dimensions(height, width) {
            self.status = format!("cannot resize to {height}x{width}: blocks or the start/finish row are in the way");
            return;
        }
        let _ = self.level.set_dimensions(height, width);
        self.cursor.0 = self.cursor.0.min(self.level.height() - 1);
        self.cursor.1 = self.cursor.1.min(self.level.width() - 1);
        // A resize invalidates any in-progress selection; its bitmap is sized
        // to the old dimensions.
        self.selection = Selection::new(self.level.height(), self.level.width());
        self.refresh_background();
    }

    fn randomise(&mut self) {
        let (height, width, start) = (self.level.height(), self.level.width(), self.level.start());
        let mut rng = Xorshift64::seeded_from_time();
        self.level.clear();
        for y in 0..height {
            for x in 0..width {
                if y == start && x == 0 {
                    // Directly in front of the entrance: never blocked, same
                    // exclusion the improver applies to its own flips.
                    continue;
                }
                if rng.next_bool(35) {
                    self.level.set_block(y, x, true);
                }
            }
        }
    }

    fn save(&mut self) {
        let date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let result = (|| -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&self.output_path)?;
            write_level_with_header(&mut file, &self.level, self.level_number, &date)
        })();
        match result {
            Ok(()) => {
                self.status = format!("saved level {} to {}", self.level_number, self.output_path.display());
                self.level_number += 1;
            }
            Err(err) => self.status = format!("save failed: {err}"),
        }
    }

    fn enter_playback(&mut self) -> Mode {
        match self.last_pushes_path.clone() {
            Some(path) => Mode::Playback(PlaybackMode::new(self.level.clone(), path, Mode::Edit)),
            None => {
                self.status = "no known solution to view yet".into();
                Mode::Edit
            }
        }
    }

    fn enter_improver(&mut self) -> Mode {
        let Some(rating) = self.live.rating else {
            self.status = "waiting for the solver to rate this level first".into();
            return Mode::Edit;
        };
        let selection = if self.selection.is_empty() { None } else { Some(self.selection.clone()) };
        let collector = Arc::new(AppImprovementCollector { tx: self.solver_tx.clone() });
        let improver = Arc::new(Improver::new(
            self.improver_pool.clone(),
            collector,
            self.level.clone(),
            rating,
            self.improver_radius,
            selection,
        ));
        improver.improve_asynchronously();
        self.status = format!("improving (radius {})...", self.improver_radius);
        Mode::Improver(ImproverMode::new(improver, self.level.clone(), rating, Mode::Edit))
    }

    fn handle_play_key(&mut self, key: KeyCode, mut m: PlayMode) -> Mode {
        match key {
            KeyCode::Up if m.history.player().can_move_north() => m.history.move_north(),
            KeyCode::Down if m.history.player().can_move_south() => m.history.move_south(),
            KeyCode::Right => {
                if m.history.player().can_move_east() {
                    m.history.move_east();
                } else if m.history.player().can_push_east() {
                    m.history.push_east();
                }
            }
            KeyCode::Left => {
                if m.history.player().can_move_west() {
                    m.history.move_west();
                } else if m.history.player().can_push_west() {
                    m.history.push_west();
                }
            }
            KeyCode::Backspace if m.history.can_undo() => m.history.undo(),
            KeyCode::Enter if m.history.can_redo() => m.history.redo(),
            KeyCode::Char('r') => m.history.reset(),
            KeyCode::Char('q') | KeyCode::Esc => return *m.parent,
            _ => {}
        }
        if m.history.player().at_exit() {
            self.status = "solved!".into();
            return *m.parent;
        }
        Mode::Play(m)
    }

    fn handle_playback_key(&mut self, key: KeyCode, mut m: PlaybackMode) -> Mode {
        match key {
            KeyCode::Char('p') => {
                m.playing = !m.playing;
                m.last_step = std::time::Instant::now();
            }
            KeyCode::Char(' ') => m.step_forward(),
            KeyCode::Char('b') => m.step_back(),
            KeyCode::Char('i') => m.faster(),
            KeyCode::Char('d') => m.slower(),
            KeyCode::Char('r') => m.reset(),
            KeyCode::Char('x') | KeyCode::Esc => return *m.parent,
            _ => {}
        }
        Mode::Playback(m)
    }

    fn handle_improver_key(&mut self, key: KeyCode, m: ImproverMode) -> Mode {
        match key {
            KeyCode::Char('x') => {
                m.improver.stop();
                let improved = m.best_rating > m.starting_rating;
                self.level = m.best_level;
                self.status = if improved {
                    format!("accepted improvement: rating {:.2}", m.best_rating)
                } else {
                    "no improvement found; level unchanged".into()
                };
                self.refresh_background();
                *m.parent
            }
            KeyCode::Char('a') | KeyCode::Esc => {
                m.improver.stop();
                self.status = "improvement abandoned".into();
                *m.parent
            }
            _ => Mode::Improver(m),
        }
    }
}
