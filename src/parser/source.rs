use crate::syntax::{Location, Position};

/// Returned by every cursor read past the end of the document.
pub const EOF: char = '\0';

/// Character cursor over a fully materialized document.
///
/// `reset` marks a start point; `location` spans everything consumed since.
pub struct Source {
    chars: Vec<char>,
    index: usize,
    position: Position,
    mark: Position,
}

impl Source {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            index: 0,
            position: Position::new(),
            mark: Position::new(),
        }
    }

    pub fn current(&self) -> char {
        self.char_at(self.index)
    }

    pub fn peek(&self) -> char {
        self.char_at(self.index + 1)
    }

    /// Up to `n` characters starting at the current one (fewer near the end).
    pub fn peek_multiple(&self, n: usize) -> String {
        let end = (self.index + n).min(self.chars.len());
        self.chars[self.index.min(end)..end].iter().collect()
    }

    /// Character `n` positions ahead of the current one.
    pub fn peek_at(&self, n: usize) -> char {
        self.char_at(self.index + n)
    }

    /// Character just before the current one, if any.
    pub fn previous(&self) -> Option<char> {
        self.index.checked_sub(1).and_then(|i| self.chars.get(i).copied())
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    pub fn move_next(&mut self) {
        let Some(&ch) = self.chars.get(self.index) else {
            return;
        };
        self.index += 1;
        self.position.offset += 1;
        self.position.byte += ch.len_utf8();
        if ch == '\n' {
            self.position.line += 1;
            self.position.col = 0;
        } else {
            self.position.col += 1;
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Start a new location at the current position.
    pub fn reset(&mut self) {
        self.mark = self.position;
    }

    /// Everything consumed since the last `reset`.
    pub fn location(&self) -> Location {
        let text: String = self.chars[self.mark.offset..self.position.offset].iter().collect();
        Location::new(self.mark, self.position, text)
    }

    fn char_at(&self, index: usize) -> char {
        self.chars.get(index).copied().unwrap_or(EOF)
    }
}
