use super::ParserOptions;
use super::source::Source;
use crate::error::{Diagnostic, DiagnosticCode};
use crate::syntax::{Location, Position};

/// Mutable parse state for one document: cursor, diagnostics sink, the
/// scratch buffer token parsers accumulate into, and the open-element stack.
pub struct ParserContext {
    source: Source,
    buffer: String,
    diagnostics: Vec<Diagnostic>,
    transition: char,
    open_elements: Vec<String>,
    root_parsed: bool,
    depth: usize,
    max_depth: usize,
    depth_reported: bool,
    /// Elements opened past the depth limit, innermost last.
    flattened: Vec<(String, Option<Location>)>,
}

impl ParserContext {
    pub fn new(text: &str, options: &ParserOptions) -> Self {
        Self {
            source: Source::new(text),
            buffer: String::new(),
            diagnostics: Vec::new(),
            transition: options.transition,
            open_elements: Vec::new(),
            root_parsed: false,
            depth: 0,
            max_depth: options.max_nesting_depth,
            depth_reported: false,
            flattened: Vec::new(),
        }
    }

    // === Cursor ===

    pub fn current(&self) -> char {
        self.source.current()
    }

    pub fn peek(&self) -> char {
        self.source.peek()
    }

    pub fn peek_at(&self, n: usize) -> char {
        self.source.peek_at(n)
    }

    pub fn peek_multiple(&self, n: usize) -> String {
        self.source.peek_multiple(n)
    }

    pub fn previous(&self) -> Option<char> {
        self.source.previous()
    }

    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    pub fn position(&self) -> Position {
        self.source.position()
    }

    pub fn starts_with(&self, expected: &str) -> bool {
        expected.chars().enumerate().all(|(i, ch)| self.source.peek_at(i) == ch)
    }

    pub fn starts_with_ignore_case(&self, expected: &str) -> bool {
        expected
            .chars()
            .enumerate()
            .all(|(i, ch)| self.source.peek_at(i).eq_ignore_ascii_case(&ch))
    }

    // === Token buffer ===

    /// Begin a new token: clear the buffer and mark the location start.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.source.reset();
    }

    /// Append the current character to the buffer and advance.
    pub fn consume(&mut self) {
        if self.source.is_eof() {
            return;
        }
        self.buffer.push(self.source.current());
        self.source.move_next();
    }

    pub fn consume_n(&mut self, n: usize) {
        for _ in 0..n {
            self.consume();
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Location of everything consumed since the last `reset`.
    pub fn location(&self) -> Location {
        self.source.location()
    }

    // === Diagnostics ===

    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::trace!("diagnostic: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // === Grammar state ===

    pub fn transition(&self) -> char {
        self.transition
    }

    pub fn push_element(&mut self, name: &str) {
        self.open_elements.push(name.to_ascii_lowercase());
    }

    pub fn pop_element(&mut self) {
        self.open_elements.pop();
    }

    pub fn is_open(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.open_elements.iter().any(|open| *open == name)
    }

    pub fn current_element(&self) -> Option<&str> {
        self.open_elements.last().map(String::as_str)
    }

    pub fn root_parsed(&self) -> bool {
        self.root_parsed
    }

    pub fn mark_root_parsed(&mut self) {
        self.root_parsed = true;
    }

    // === Nesting ===

    /// True while one more level of elements or braces may be opened.
    pub fn can_nest(&self) -> bool {
        self.depth < self.max_depth
    }

    pub fn enter_nested(&mut self) {
        self.depth += 1;
    }

    pub fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Warn the first time the depth limit is hit. Later hits stay quiet.
    pub fn report_too_deep(&mut self) {
        if self.depth_reported {
            return;
        }
        self.depth_reported = true;
        let max_depth = self.max_depth;
        self.report(Diagnostic::warning(
            DiagnosticCode::NestingTooDeep,
            format!("Nesting deeper than {} levels; deeper content is parsed flat", max_depth),
            Some(Location::empty(self.position())),
        ));
    }

    pub fn push_flattened(&mut self, name: &str, location: Option<Location>) {
        self.flattened.push((name.to_ascii_lowercase(), location));
    }

    pub fn flattened_len(&self) -> usize {
        self.flattened.len()
    }

    /// Index of the innermost flattened element named `name`, at or above `base`.
    pub fn find_flattened(&self, name: &str, base: usize) -> Option<usize> {
        let name = name.to_ascii_lowercase();
        let base = base.min(self.flattened.len());
        self.flattened[base..]
            .iter()
            .rposition(|(open, _)| *open == name)
            .map(|index| base + index)
    }

    /// Remove and return the flattened elements from `len` up, innermost first.
    pub fn truncate_flattened(&mut self, len: usize) -> Vec<(String, Option<Location>)> {
        let len = len.min(self.flattened.len());
        let mut removed = self.flattened.split_off(len);
        removed.reverse();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_accumulates_since_reset() {
        let mut ctx = ParserContext::new("<div>", &ParserOptions::default());
        ctx.reset();
        ctx.consume();
        assert_eq!(ctx.buffer(), "<");
        ctx.reset();
        ctx.consume_n(3);
        assert_eq!(ctx.buffer(), "div");
        assert_eq!(ctx.location().text(), "div");
        assert_eq!(ctx.take_buffer(), "div");
        assert_eq!(ctx.buffer(), "");
    }

    #[test]
    fn test_starts_with_ignore_case() {
        let ctx = ParserContext::new("<!DocType html>", &ParserOptions::default());
        assert!(ctx.starts_with("<!"));
        assert!(!ctx.starts_with("<!doctype"));
        assert!(ctx.starts_with_ignore_case("<!doctype"));
    }

    #[test]
    fn test_consume_at_eof_is_noop() {
        let mut ctx = ParserContext::new("", &ParserOptions::default());
        ctx.reset();
        ctx.consume();
        assert!(ctx.is_eof());
        assert_eq!(ctx.buffer(), "");
    }

    #[test]
    fn test_open_elements_case_insensitive() {
        let mut ctx = ParserContext::new("", &ParserOptions::default());
        ctx.push_element("DIV");
        assert!(ctx.is_open("div"));
        assert_eq!(ctx.current_element(), Some("div"));
        ctx.pop_element();
        assert!(!ctx.is_open("div"));
    }

    #[test]
    fn test_depth_limit() {
        let options = ParserOptions { max_nesting_depth: 2, ..ParserOptions::default() };
        let mut ctx = ParserContext::new("", &options);
        ctx.enter_nested();
        assert!(ctx.can_nest());
        ctx.enter_nested();
        assert!(!ctx.can_nest());
        ctx.report_too_deep();
        ctx.report_too_deep();
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].code, DiagnosticCode::NestingTooDeep);
        ctx.leave_nested();
        ctx.leave_nested();
        ctx.leave_nested();
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_flattened_stack() {
        let mut ctx = ParserContext::new("", &ParserOptions::default());
        ctx.push_flattened("b", None);
        ctx.push_flattened("I", None);
        ctx.push_flattened("b", None);
        assert_eq!(ctx.find_flattened("B", 0), Some(2));
        assert_eq!(ctx.find_flattened("i", 0), Some(1));
        assert_eq!(ctx.find_flattened("i", 2), None);
        let removed: Vec<String> = ctx.truncate_flattened(1).into_iter().map(|(name, _)| name).collect();
        assert_eq!(removed, ["b", "i"]);
        assert_eq!(ctx.flattened_len(), 1);
    }
}
