use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Position in source code.
///
/// `offset` counts characters, `byte` counts UTF-8 bytes. Line and column
/// are 0-indexed; columns are measured in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub offset: usize,
    pub byte: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// The part of a location that falls on a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSpan {
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl LineSpan {
    pub fn len(&self) -> usize {
        self.end_col - self.start_col
    }

    pub fn is_empty(&self) -> bool {
        self.start_col == self.end_col
    }
}

/// Immutable source range together with the exact text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    start: Position,
    end: Position,
    text: String,
    lines: Vec<LineSpan>,
}

impl Location {
    pub fn new(start: Position, end: Position, text: impl Into<String>) -> Self {
        let text = text.into();
        debug_assert!(end >= start, "location ends before it starts");
        debug_assert_eq!(
            text.chars().count(),
            end.offset - start.offset,
            "location text does not match its span"
        );
        let lines = split_lines(start, &text);
        Self { start, end, text, lines }
    }

    /// Zero-width location, used for tokens the parser expected but did not find.
    pub fn empty(at: Position) -> Self {
        Self::new(at, at, String::new())
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Per-line pieces of this location, in order. Never empty.
    pub fn lines(&self) -> &[LineSpan] {
        &self.lines
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start.byte..self.end.byte
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// Split after `chars` characters. Both halves keep exact text and positions.
    pub fn split_at(&self, chars: usize) -> (Location, Location) {
        let chars = chars.min(self.len());
        let mut middle = self.start;
        let mut split_byte = 0;
        for ch in self.text.chars().take(chars) {
            middle.offset += 1;
            middle.byte += ch.len_utf8();
            split_byte += ch.len_utf8();
            if ch == '\n' {
                middle.line += 1;
                middle.col = 0;
            } else {
                middle.col += 1;
            }
        }
        let (head, tail) = self.text.split_at(split_byte);
        (
            Location::new(self.start, middle, head),
            Location::new(middle, self.end, tail),
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn split_lines(start: Position, text: &str) -> Vec<LineSpan> {
    let mut lines = Vec::new();
    let mut line = start.line;
    let mut col = start.col;
    let mut byte = start.byte;
    let mut span_col = col;
    let mut span_byte = byte;

    for ch in text.chars() {
        if ch == '\n' {
            lines.push(LineSpan {
                line,
                start_col: span_col,
                end_col: col,
                start_byte: span_byte,
                end_byte: byte,
            });
            byte += 1;
            line += 1;
            col = 0;
            span_col = 0;
            span_byte = byte;
        } else {
            col += 1;
            byte += ch.len_utf8();
        }
    }

    lines.push(LineSpan {
        line,
        start_col: span_col,
        end_col: col,
        start_byte: span_byte,
        end_byte: byte,
    });
    lines
}
