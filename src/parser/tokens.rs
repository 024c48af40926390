//! Token-level parsers. Each recognizes exactly one lexical unit.

use super::context::ParserContext;
use crate::error::{Diagnostic, DiagnosticCode};
use crate::syntax::{Location, SyntaxKind, SyntaxNode, Trivia};

/// Accumulate characters until `should_stop` says so or the input ends.
pub(crate) fn parse_until<F>(ctx: &mut ParserContext, kind: SyntaxKind, should_stop: F) -> SyntaxNode
where
    F: Fn(&ParserContext, &str) -> bool,
{
    ctx.reset();
    while !ctx.is_eof() && !should_stop(ctx, ctx.buffer()) {
        ctx.consume();
    }
    let location = ctx.location();
    let text = ctx.take_buffer();
    SyntaxNode::value(kind, Some(text), location)
}

/// Consume a run of whitespace, if there is one.
pub(crate) fn parse_trivia(ctx: &mut ParserContext) -> Option<Trivia> {
    if !ctx.current().is_whitespace() {
        return None;
    }
    ctx.reset();
    while ctx.current().is_whitespace() {
        ctx.consume();
    }
    ctx.take_buffer();
    Some(Trivia::new(ctx.location()))
}

/// Number of whitespace characters starting at the cursor.
pub(crate) fn whitespace_ahead(ctx: &ParserContext) -> usize {
    let mut n = 0;
    while ctx.peek_at(n).is_whitespace() {
        n += 1;
    }
    n
}

/// Consume `expected` as a token of `kind`. When it is absent, report `code`
/// and return a missing node in its place.
pub(crate) fn parse_token(
    ctx: &mut ParserContext,
    kind: SyntaxKind,
    expected: &str,
    code: DiagnosticCode,
) -> SyntaxNode {
    if ctx.starts_with(expected) {
        ctx.reset();
        ctx.consume_n(expected.chars().count());
        let location = ctx.location();
        let text = ctx.take_buffer();
        return SyntaxNode::value(kind, Some(text), location);
    }
    report_expected(ctx, code, expected);
    SyntaxNode::missing(kind, ctx.position())
}

pub(crate) fn parse_brace(ctx: &mut ParserContext, brace: char) -> SyntaxNode {
    parse_token(ctx, SyntaxKind::Brace, brace.encode_utf8(&mut [0; 4]), DiagnosticCode::ExpectedBrace)
}

pub(crate) fn parse_bracket(ctx: &mut ParserContext, bracket: &str) -> SyntaxNode {
    parse_token(ctx, SyntaxKind::Bracket, bracket, DiagnosticCode::ExpectedBracket)
}

pub(crate) fn parse_equals(ctx: &mut ParserContext) -> SyntaxNode {
    parse_token(ctx, SyntaxKind::Equals, "=", DiagnosticCode::ExpectedEquals)
}

pub(crate) fn parse_quote(ctx: &mut ParserContext, quote: char) -> SyntaxNode {
    parse_token(ctx, SyntaxKind::Quote, quote.encode_utf8(&mut [0; 4]), DiagnosticCode::ExpectedQuote)
}

pub(crate) fn report_expected(ctx: &mut ParserContext, code: DiagnosticCode, expected: &str) {
    let found = if ctx.is_eof() {
        "end of input".to_string()
    } else {
        format!("'{}'", ctx.current().escape_debug())
    };
    let location = Location::empty(ctx.position());
    ctx.report(Diagnostic::error(
        code,
        format!("Expected '{}' but found {}", expected, found),
        Some(location),
    ));
}

/// Content text up to the next stop. Surrounding whitespace becomes trivia;
/// a whitespace-only run comes back as a `Trivia` node.
pub(crate) fn parse_literal<F>(ctx: &mut ParserContext, is_stop: F) -> SyntaxNode
where
    F: Fn(&ParserContext) -> bool,
{
    let leading = parse_trivia(ctx);

    if ctx.is_eof() || is_stop(ctx) {
        if let Some(trivia) = leading {
            let text = trivia.text().to_string();
            return SyntaxNode::value(SyntaxKind::Trivia, Some(text), trivia.location().clone());
        }
        // Callers only ask for a literal where one can start; keep moving anyway.
        ctx.reset();
        ctx.consume();
        let location = ctx.location();
        let text = ctx.take_buffer();
        return SyntaxNode::value(SyntaxKind::Literal, Some(text), location);
    }

    ctx.reset();
    while !ctx.is_eof() && !is_stop(ctx) {
        ctx.consume();
    }
    let text = ctx.take_buffer();
    let location = ctx.location();

    let core_len = text.trim_end().chars().count();
    if core_len == text.chars().count() {
        return SyntaxNode::value(SyntaxKind::Literal, Some(text), location).with_leading(leading);
    }

    let (core, tail) = location.split_at(core_len);
    let value = core.text().to_string();
    SyntaxNode::value(SyntaxKind::Literal, Some(value), core)
        .with_trivia(leading, Some(Trivia::new(tail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserOptions;

    fn ctx(text: &str) -> ParserContext {
        ParserContext::new(text, &ParserOptions::default())
    }

    #[test]
    fn test_parse_until_stops_on_predicate() {
        let mut ctx = ctx("div class");
        let node = parse_until(&mut ctx, SyntaxKind::HtmlTagName, |c, _| c.current() == ' ');
        assert_eq!(node.value_str(), Some("div"));
        assert_eq!(ctx.current(), ' ');
    }

    #[test]
    fn test_trivia() {
        let mut ctx = ctx(" \n\tx");
        let trivia = parse_trivia(&mut ctx).unwrap();
        assert_eq!(trivia.text(), " \n\t");
        assert_eq!(ctx.current(), 'x');
        assert!(parse_trivia(&mut ctx).is_none());
    }

    #[test]
    fn test_expected_token_present() {
        let mut ctx = ctx("{x");
        let brace = parse_brace(&mut ctx, '{');
        assert_eq!(brace.value_str(), Some("{"));
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_expected_token_absent() {
        let mut ctx = ctx("x");
        let bracket = parse_bracket(&mut ctx, ">");
        assert!(bracket.is_missing());
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].code, DiagnosticCode::ExpectedBracket);
        assert_eq!(ctx.diagnostics()[0].message, "Expected '>' but found 'x'");
        // Nothing consumed
        assert_eq!(ctx.current(), 'x');
    }

    #[test]
    fn test_expected_token_at_eof() {
        let mut ctx = ctx("");
        let quote = parse_quote(&mut ctx, '"');
        assert!(quote.is_missing());
        assert_eq!(ctx.diagnostics()[0].message, "Expected '\"' but found end of input");
    }

    #[test]
    fn test_literal_splits_trivia() {
        let mut ctx = ctx("  Hello world \n<p>");
        let node = parse_literal(&mut ctx, |c| c.current() == '<');
        assert_eq!(node.kind(), SyntaxKind::Literal);
        assert_eq!(node.value_str(), Some("Hello world"));
        assert_eq!(node.leading_trivia().map(Trivia::text), Some("  "));
        assert_eq!(node.trailing_trivia().map(Trivia::text), Some(" \n"));
        assert_eq!(node.to_source(), "  Hello world \n");
    }

    #[test]
    fn test_whitespace_only_literal_is_trivia() {
        let mut ctx = ctx("\n  <p>");
        let node = parse_literal(&mut ctx, |c| c.current() == '<');
        assert_eq!(node.kind(), SyntaxKind::Trivia);
        assert_eq!(node.to_source(), "\n  ");
    }
}
