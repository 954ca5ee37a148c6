//! Reads and writes the `.mzm` ASCII level text format: a wall row of `#`,
//! `height` interior rows bounded by `#`/`+`/`*`, and a closing wall row.

use std::fmt;
use std::io::{self, BufRead, Write};

use crate::level_data::LevelData;
use crate::types::{CHAR_ENTRANCE, CHAR_EXIT, CHAR_WALL, MAX_HEIGHT, MAX_WIDTH, MIN_WIDTH};

/// Everything that can go wrong parsing a `.mzm` stream. Line numbers are
/// 1-based and count every line read from the source, not just level lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MzmParseError {
    UnexpectedEof,
    BadWallRow { line: u64 },
    BadRow { line: u64 },
    MissingEntrance,
    MissingExit,
    DuplicateEntrance { line: u64 },
    DuplicateExit { line: u64 },
    WidthMismatch { line: u64, expected: usize, actual: usize },
    TooNarrow { line: u64 },
    TooWide { line: u64 },
    TooShort,
    TooTall,
}

impl fmt::Display for MzmParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MzmParseError::UnexpectedEof => write!(f, "unexpected end of input while reading a level"),
            MzmParseError::BadWallRow { line } => write!(f, "line {line}: malformed wall row"),
            MzmParseError::BadRow { line } => write!(f, "line {line}: malformed level row"),
            MzmParseError::MissingEntrance => write!(f, "level has no entrance (`+`)"),
            MzmParseError::MissingExit => write!(f, "level has no exit (`*`)"),
            MzmParseError::DuplicateEntrance { line } => write!(f, "line {line}: a second entrance (`+`)"),
            MzmParseError::DuplicateExit { line } => write!(f, "line {line}: a second exit (`*`)"),
            MzmParseError::WidthMismatch { line, expected, actual } => {
                write!(f, "line {line}: row width {actual} does not match the level's width {expected}")
            }
            MzmParseError::TooNarrow { line } => write!(f, "line {line}: level narrower than the minimum width {MIN_WIDTH}"),
            MzmParseError::TooWide { line } => write!(f, "line {line}: level wider than the maximum width {MAX_WIDTH}"),
            MzmParseError::TooShort => write!(f, "level has no interior rows"),
            MzmParseError::TooTall => write!(f, "level taller than the maximum height {MAX_HEIGHT}"),
        }
    }
}

impl std::error::Error for MzmParseError {}

fn is_wall_row(line: &str) -> bool {
    line.len() >= MIN_WIDTH as usize + 2 && line.chars().all(|c| c == CHAR_WALL)
}

/// Streams levels out of a `.mzm` text source, tracking a 1-based level
/// counter and (in copy mode) the exact source text between levels so a
/// caller can echo it verbatim.
pub struct MzmReader<R> {
    lines: io::Lines<R>,
    copy_mode: bool,
    pending_copy: String,
    current: Option<LevelData>,
    level_number: u64,
    line_no: u64,
}

impl<R: BufRead> MzmReader<R> {
    pub fn new(reader: R, copy_mode: bool) -> Self {
        MzmReader { lines: reader.lines(), copy_mode, pending_copy: String::new(), current: None, level_number: 0, line_no: 0 }
    }

    fn next_line(&mut self) -> Result<Option<String>, MzmParseError> {
        match self.lines.next() {
            None => Ok(None),
            Some(Err(_)) => Err(MzmParseError::UnexpectedEof),
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line))
            }
        }
    }

    fn note_source(&mut self, line: &str) {
        if self.copy_mode {
            self.pending_copy.push_str(line);
            self.pending_copy.push('\n');
        }
    }

    /// Advances to the next level, returning `Ok(false)` at end of input.
    /// On `Ok(true)`, [`MzmReader::get_level`] and [`MzmReader::get_level_number`]
    /// reflect the level just parsed.
    pub fn next(&mut self) -> Result<bool, MzmParseError> {
        loop {
            let Some(line) = self.next_line()? else { return Ok(false) };
            if is_wall_row(&line) {
                self.parse_level(line)?;
                return Ok(true);
            }
            self.note_source(&line);
        }
    }

    fn parse_level(&mut self, opening_wall: String) -> Result<(), MzmParseError> {
        let opening_line_no = self.line_no;
        self.note_source(&opening_wall);
        let width = opening_wall.len() - 2;
        if width < MIN_WIDTH as usize {
            return Err(MzmParseError::TooNarrow { line: opening_line_no });
        }
        if width > MAX_WIDTH as usize {
            return Err(MzmParseError::TooWide { line: opening_line_no });
        }

        let mut grid = Vec::new();
        let mut start = None;
        let mut finish = None;
        loop {
            let Some(line) = self.next_line()? else { return Err(MzmParseError::UnexpectedEof) };
            if is_wall_row(&line) && line.len() == opening_wall.len() {
                self.note_source(&line);
                break;
            }
            let row_line_no = self.line_no;
            let chars: Vec<char> = line.chars().collect();
            if chars.len() != width + 2 {
                return Err(MzmParseError::WidthMismatch { line: row_line_no, expected: width + 2, actual: chars.len() });
            }
            let left = chars[0];
            let right = chars[width + 1];
            match left {
                CHAR_WALL => {}
                CHAR_ENTRANCE => {
                    if start.is_some() {
                        return Err(MzmParseError::DuplicateEntrance { line: row_line_no });
                    }
                    start = Some(grid.len());
                }
                _ => return Err(MzmParseError::BadRow { line: row_line_no }),
            }
            match right {
                CHAR_WALL => {}
                CHAR_EXIT => {
                    if finish.is_some() {
                        return Err(MzmParseError::DuplicateExit { line: row_line_no });
                    }
                    finish = Some(grid.len());
                }
                _ => return Err(MzmParseError::BadRow { line: row_line_no }),
            }
            let mut row = Vec::with_capacity(width);
            for &c in &chars[1..=width] {
                match c {
                    crate::types::CHAR_BLOCK => row.push(true),
                    crate::types::CHAR_SPACE => row.push(false),
                    _ => return Err(MzmParseError::BadRow { line: row_line_no }),
                }
            }
            self.note_source(&line);
            grid.push(row);
        }

        if grid.is_empty() {
            return Err(MzmParseError::TooShort);
        }
        if grid.len() > MAX_HEIGHT as usize {
            return Err(MzmParseError::TooTall);
        }
        let start = start.ok_or(MzmParseError::MissingEntrance)?;
        let finish = finish.ok_or(MzmParseError::MissingExit)?;

        let height = grid.len();
        let level = LevelData::from_bool_grid(&grid, height as _, width as _, start as _, finish as _)
            .map_err(|_| MzmParseError::BadWallRow { line: opening_line_no })?;
        self.current = Some(level);
        self.level_number += 1;
        Ok(())
    }

    pub fn get_level(&self) -> Option<&LevelData> {
        self.current.as_ref()
    }

    pub fn get_level_number(&self) -> u64 {
        self.level_number
    }

    /// Returns (and clears) the verbatim source text for the level just
    /// parsed, including any non-level preface lines that preceded it.
    /// Only meaningful when constructed with `copy_mode = true`.
    pub fn copy_level(&mut self) -> String {
        std::mem::take(&mut self.pending_copy)
    }
}

/// Writes `level` to `w` preceded by the designer's save header.
pub fn write_level_with_header(w: &mut impl Write, level: &LevelData, number: u64, date: &impl fmt::Display) -> io::Result<()> {
    writeln!(w, ";Number: {number}")?;
    writeln!(w, ";Date: {date}")?;
    write!(w, "{level}")
}
