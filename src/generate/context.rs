use super::output::{Output, Range, RangeType};
use super::sourcemap::SourceMapWriter;
use super::utf16::Utf16Offsets;
use crate::syntax::{Location, Position};

/// What the generator is inside of. Decides how a code expression is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Document,
    InsideTag,
    InsideCodeBlock,
}

/// Literal text waiting to be written as one statement.
#[derive(Debug)]
struct PendingLiteral {
    text: String,
    start: Position,
    end: Position,
}

/// Per-compilation state: output buffer, state stack, pending literal and
/// the source-map writer. Created for one `generate` call.
pub struct GeneratorContext<'a> {
    output: Output,
    states: Vec<GeneratorState>,
    max_depth: usize,
    pending: Option<PendingLiteral>,
    writer: &'a mut dyn SourceMapWriter,
    file_path: String,
    offsets: Utf16Offsets,
    collect_ranges: bool,
}

const INDENT: &str = "  ";

impl<'a> GeneratorContext<'a> {
    /// `source` is the template text, used to turn positions into UTF-16
    /// offsets and columns. Ranges are only recorded with `collect_ranges`.
    pub fn new(
        file_path: &str,
        writer: &'a mut dyn SourceMapWriter,
        source: &str,
        collect_ranges: bool,
    ) -> Self {
        Self {
            output: Output::new(),
            states: Vec::new(),
            max_depth: 0,
            pending: None,
            writer,
            file_path: file_path.to_string(),
            offsets: Utf16Offsets::new(source),
            collect_ranges,
        }
    }

    // === State stack ===

    pub fn state(&self) -> Option<GeneratorState> {
        self.states.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Run `f` with `state` pushed. The pop is unconditional, so the stack
    /// is balanced whatever `f` does.
    pub fn with_state<R>(&mut self, state: GeneratorState, f: impl FnOnce(&mut Self) -> R) -> R {
        self.states.push(state);
        self.max_depth = self.max_depth.max(self.states.len());
        let result = f(self);
        self.states.pop();
        result
    }

    // === Emission ===

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Queue literal text. Adjacent pieces coalesce into one statement.
    pub fn append_literal(&mut self, text: &str, location: &Location) {
        if text.is_empty() {
            return;
        }
        if let Some(pending) = &mut self.pending {
            pending.text.push_str(text);
            pending.end = location.end();
            return;
        }
        self.pending = Some(PendingLiteral {
            text: text.to_string(),
            start: location.start(),
            end: location.end(),
        });
    }

    /// Write the pending literal, if any, as a single `writeLiteral` call.
    pub fn flush_literal(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let escaped = serde_json::Value::String(pending.text).to_string();

        self.output.push(INDENT);
        self.map_here(pending.start);
        self.output.push("__writer.writeLiteral(");
        let compiled_start = self.output.position() + 1;
        self.output.push(&escaped);
        let compiled_end = self.output.position() - 1;
        self.output.push(");");
        self.output.newline();

        self.add_range(RangeType::Html, pending.start, pending.end, compiled_start, compiled_end, false);
    }

    /// Emit code text verbatim as its own statement line.
    pub fn write_statement(&mut self, code: &str, location: &Location) {
        if code.trim().is_empty() {
            return;
        }
        self.flush_literal();
        self.output.push(INDENT);
        let compiled_start = self.output.position();
        self.map_here(location.start());
        self.output.push(code);
        let compiled_end = self.output.position();
        self.output.newline();
        let verbatim = location.text() == code;
        self.add_range(RangeType::JavaScript, location.start(), location.end(), compiled_start, compiled_end, verbatim);
    }

    /// Emit code text as an escaped write of its value.
    pub fn write_expression(&mut self, code: &str, location: &Location) {
        if code.trim().is_empty() {
            return;
        }
        self.flush_literal();
        self.output.push(INDENT);
        self.output.push("__writer.write(");
        let compiled_start = self.output.position();
        self.map_here(location.start());
        self.output.push(code);
        let compiled_end = self.output.position();
        self.output.push(");");
        self.output.newline();
        let verbatim = location.text() == code;
        self.add_range(RangeType::JavaScript, location.start(), location.end(), compiled_start, compiled_end, verbatim);
    }

    /// Emit generated scaffolding that has no source counterpart.
    pub fn write_line(&mut self, text: &str) {
        self.flush_literal();
        self.output.push(text);
        self.output.newline();
    }

    fn map_here(&mut self, source: Position) {
        let column = self.offsets.column(source);
        let mapping = self.output.push_mapped("", source.line, column);
        self.writer.add_mapping(&self.file_path, &mapping);
    }

    fn add_range(
        &mut self,
        range_type: RangeType,
        start: Position,
        end: Position,
        compiled_start: usize,
        compiled_end: usize,
        needs_injection: bool,
    ) {
        if !self.collect_ranges {
            return;
        }
        self.output.add_range(Range {
            range_type,
            source_start: self.offsets.at(start),
            source_end: self.offsets.at(end),
            compiled_start,
            compiled_end,
            needs_injection,
        });
    }

    /// Flush and hand back the output. The state stack must be empty.
    pub fn finish(mut self) -> Output {
        self.flush_literal();
        debug_assert!(self.states.is_empty(), "generator state stack left unbalanced");
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::sourcemap::{NoopSourceMapWriter, SourceMap};

    fn loc(start: usize, text: &str) -> Location {
        let len = text.chars().count();
        let at = |offset| Position { offset, byte: offset, line: 0, col: offset };
        Location::new(at(start), at(start + len), text)
    }

    #[test]
    fn test_literals_coalesce() {
        let mut writer = NoopSourceMapWriter;
        let mut ctx = GeneratorContext::new("t.kiln", &mut writer, "<b>x", false);
        ctx.append_literal("<b>", &loc(0, "<b>"));
        ctx.append_literal("x", &loc(3, "x"));
        let (code, mappings, _) = ctx.finish().finish();
        assert_eq!(code, "  __writer.writeLiteral(\"<b>x\");\n");
        assert_eq!(mappings.len(), 1);
    }

    #[test]
    fn test_state_stack_balanced() {
        let mut writer = NoopSourceMapWriter;
        let mut ctx = GeneratorContext::new("t.kiln", &mut writer, "", false);
        ctx.with_state(GeneratorState::Document, |ctx| {
            ctx.with_state(GeneratorState::InsideTag, |ctx| {
                assert_eq!(ctx.state(), Some(GeneratorState::InsideTag));
            });
            assert_eq!(ctx.state(), Some(GeneratorState::Document));
        });
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.max_depth(), 2);
    }

    #[test]
    fn test_expression_flushes_and_maps() {
        let mut map = SourceMap::new();
        let mut ctx = GeneratorContext::new("t.kiln", &mut map, "a\"@x", true);
        ctx.append_literal("a\"", &loc(0, "a\""));
        ctx.write_expression("x", &loc(3, "x"));
        let (code, mappings, ranges) = ctx.finish().finish();
        assert_eq!(code, "  __writer.writeLiteral(\"a\\\"\");\n  __writer.write(x);\n");
        assert_eq!(mappings[1].gen_line, 1);
        assert_eq!(mappings[1].gen_col, 17);
        assert_eq!(mappings[1].src_col, 3);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].source_start, 3);
        assert_eq!(&code[ranges[1].compiled_start..ranges[1].compiled_end], "x");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_whitespace_code_skipped() {
        let mut writer = NoopSourceMapWriter;
        let mut ctx = GeneratorContext::new("t.kiln", &mut writer, "  \n ", false);
        ctx.write_statement("  \n ", &loc(0, "  \n "));
        assert_eq!(ctx.finish().finish().0, "");
    }
}
