//! Character offsets to UTF-16 offsets.
//!
//! Positions are tracked in characters internally; editors address text in
//! UTF-16 code units.

use crate::syntax::Position;

/// UTF-16 offset of every character boundary in a document.
#[derive(Debug, Clone)]
pub struct Utf16Offsets {
    offsets: Vec<usize>,
}

impl Utf16Offsets {
    pub fn new(text: &str) -> Self {
        let mut offsets = Vec::with_capacity(text.len() + 1);
        let mut total = 0;
        offsets.push(total);
        for ch in text.chars() {
            total += ch.len_utf16();
            offsets.push(total);
        }
        Self { offsets }
    }

    /// UTF-16 offset of `position`, clamped to the end of the document.
    pub fn at(&self, position: Position) -> usize {
        let last = self.offsets.len() - 1;
        self.offsets[position.offset.min(last)]
    }

    /// UTF-16 column of `position` within its line.
    pub fn column(&self, position: Position) -> usize {
        let line_start = Position {
            offset: position.offset.saturating_sub(position.col),
            ..position
        };
        self.at(position) - self.at(line_start)
    }
}
