use std::fmt::{self, Display};
use std::rc::Rc;

/// A zero-based line and column within some input text.
///
/// Locations order by line first, then by column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn new(line: usize, col: usize) -> Self {
        Location { line, col }
    }

    /// The location just past `s` when `s` starts at this location.
    pub fn advance(self, s: &str) -> Self {
        s.chars().fold(self, |loc, c| {
            if c == '\n' {
                Location::new(loc.line + 1, 0)
            } else {
                Location::new(loc.line, loc.col + 1)
            }
        })
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Keep track of a position within a str. Advancing produces a new position
/// sharing the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    input: Rc<str>,
    idx: usize,
}

impl Position {
    pub fn new(input: &str) -> Self {
        Position {
            input: input.into(),
            idx: 0,
        }
    }

    /// The input that has not been consumed yet.
    pub fn rest(&self) -> &str {
        &self.input[self.idx..]
    }

    pub fn is_empty(&self) -> bool {
        self.idx >= self.input.len()
    }

    /// Check if the remaining input starts with `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Move past `n` bytes. `n` is expected to land on a char boundary, which
    /// holds whenever it is the length of a prefix of `rest`.
    pub fn skip(&self, n: usize) -> Self {
        Position {
            input: self.input.clone(),
            idx: (self.idx + n).min(self.input.len()),
        }
    }
}
