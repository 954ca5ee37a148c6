//! Coordinate, row, and direction primitives shared by every level representation.

use std::fmt;
use std::str::FromStr;

/// A coordinate or dimension within a level: signed so that `-1` can denote
/// "just west of the west wall" (the entrance column) and `width` can denote
/// "just east of the east wall" (the exit column).
///
/// The original implementation stores this as a signed 8-bit `char`, but
/// also defines a maximum height of 255 — a value an `i8` cannot represent.
/// Rather than reproduce that latent overflow, `Coord` is widened to `i16`,
/// which still comfortably satisfies every invariant that wants a small
/// signed integer (entrance/exit sentinels, row/column indices) while
/// actually being able to hold the documented height ceiling.
pub type Coord = i16;

/// A single packed row of level data.
///
/// Bits are stored "left-aligned": if a row is non-zero its
/// `width - 1`-th bit is set and all bits at or above `width` are clear.
pub type Row = u64;

/// Maximum supported level height.
pub const MAX_HEIGHT: Coord = 255;
/// Minimum supported level height.
pub const MIN_HEIGHT: Coord = 2;
/// Minimum supported level width.
pub const MIN_WIDTH: Coord = 4;
/// Maximum supported level width.
///
/// Defined as one less than the number of bits in [`Row`]. The zone
/// representation used by [`crate::config::PushConfig`] cannot safely
/// address a maximal-width row, so the top bit is reserved; this mirrors the
/// original implementation's `MAX_MAZEZAM_WIDTH = sizeof(mzm_row) * CHAR_BIT - 1`
/// exactly and must not be relaxed.
pub const MAX_WIDTH: Coord = (Row::BITS - 1) as Coord;

/// The eight characters used to render and parse level text and direction paths.
pub const CHAR_SPACE: char = ' ';
pub const CHAR_BLOCK: char = '$';
pub const CHAR_WALL: char = '#';
pub const CHAR_ENTRANCE: char = '+';
pub const CHAR_EXIT: char = '*';

/// A direction of player motion or push.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    PushEast,
    PushWest,
}

impl Direction {
    /// The character used for this direction in serialised paths: `u d r l R L`.
    pub fn as_char(self) -> char {
        match self {
            Direction::North => 'u',
            Direction::South => 'd',
            Direction::East => 'r',
            Direction::West => 'l',
            Direction::PushEast => 'R',
            Direction::PushWest => 'L',
        }
    }

    /// Parses a single direction character, returning `None` if it doesn't match.
    pub fn from_char(c: char) -> Option<Direction> {
        match c {
            'u' => Some(Direction::North),
            'd' => Some(Direction::South),
            'r' => Some(Direction::East),
            'l' => Some(Direction::West),
            'R' => Some(Direction::PushEast),
            'L' => Some(Direction::PushWest),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An ordered sequence of [`Direction`]s. Never includes the initial or final
/// entrance/exit East step; those are added by callers that reconstruct a
/// full walk across the level boundary (see [`crate::solver_job`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(pub Vec<Direction>);

impl Path {
    pub fn new() -> Self {
        Path(Vec::new())
    }

    pub fn push(&mut self, d: Direction) {
        self.0.push(d);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Error returned when a path string contains a character that isn't a
/// recognised [`Direction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParseError {
    pub char: char,
    pub position: usize,
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid direction character '{}' at position {}",
            self.char, self.position
        )
    }
}

impl std::error::Error for PathParseError {}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = Path::new();
        for (position, char) in s.chars().enumerate() {
            match Direction::from_char(char) {
                Some(d) => path.push(d),
                None => return Err(PathParseError { char, position }),
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_width_is_63() {
        assert_eq!(MAX_WIDTH, 63);
    }

    #[test]
    fn direction_round_trips_through_char() {
        for d in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::PushEast,
            Direction::PushWest,
        ] {
            assert_eq!(Direction::from_char(d.as_char()), Some(d));
        }
    }

    #[test]
    fn path_parses_and_displays() {
        let p: Path = "uuddrL".parse().unwrap();
        assert_eq!(p.len(), 6);
        assert_eq!(p.to_string(), "uuddrL");
    }

    #[test]
    fn path_rejects_unknown_char() {
        let err = "ux".parse::<Path>().unwrap_err();
        assert_eq!(err.char, 'x');
        assert_eq!(err.position, 1);
    }
}
