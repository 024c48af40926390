//! Embedded-code grammar: transitions, code blocks, code expressions and
//! nested braces. Code text stays opaque; only enough of it is scanned to
//! find where it ends.

use super::context::ParserContext;
use super::markup;
use super::tokens::parse_brace;
use crate::error::{Diagnostic, DiagnosticCode};
use crate::syntax::{Location, NodeBuilder, SyntaxKind, SyntaxNode};

/// True when the cursor sits on a transition that introduces code (or its
/// escape). A transition glued to a preceding letter or digit, as in an
/// e-mail address, is plain text.
pub(crate) fn starts_transition(ctx: &ParserContext) -> bool {
    let transition = ctx.transition();
    if ctx.current() != transition {
        return false;
    }
    ctx.peek() == transition || !ctx.previous().is_some_and(|ch| ch.is_ascii_alphanumeric())
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Markup may open a statement: after nothing, a brace, `;` or `)`.
fn at_statement_boundary(last: Option<char>) -> bool {
    matches!(last, None | Some('{' | '}' | ';' | ')'))
}

fn starts_markup(ctx: &ParserContext, last: Option<char>) -> bool {
    ctx.current() == '<' && ctx.peek().is_ascii_alphabetic() && at_statement_boundary(last)
}

pub(crate) fn parse_transition(ctx: &mut ParserContext) -> SyntaxNode {
    let next = ctx.peek();
    if next == ctx.transition() {
        parse_escaped_transition(ctx)
    } else if next == '{' {
        parse_code_block(ctx)
    } else if is_identifier_start(next) {
        parse_code_expression(ctx)
    } else {
        parse_invalid_transition(ctx)
    }
}

fn parse_escaped_transition(ctx: &mut ParserContext) -> SyntaxNode {
    ctx.reset();
    ctx.consume_n(2);
    ctx.take_buffer();
    SyntaxNode::value(
        SyntaxKind::EscapedTransition,
        Some(ctx.transition().to_string()),
        ctx.location(),
    )
}

fn parse_invalid_transition(ctx: &mut ParserContext) -> SyntaxNode {
    ctx.reset();
    ctx.consume();
    let location = ctx.location();
    let text = ctx.take_buffer();
    let transition = ctx.transition();
    ctx.report(Diagnostic::warning(
        DiagnosticCode::InvalidTransition,
        format!(
            "'{}' must be followed by an identifier, '{{' or another '{}'; treating it as text",
            transition, transition
        ),
        Some(location.clone()),
    ));
    SyntaxNode::value(SyntaxKind::Literal, Some(text), location)
}

fn parse_transition_marker(ctx: &mut ParserContext) -> SyntaxNode {
    ctx.reset();
    ctx.consume();
    ctx.take_buffer();
    SyntaxNode::marker(SyntaxKind::Transition, ctx.location())
}

// === Blocks ===

fn parse_code_block(ctx: &mut ParserContext) -> SyntaxNode {
    let mut block = NodeBuilder::new(SyntaxKind::CodeBlock);
    block.push(parse_transition_marker(ctx));
    block.push(parse_brace(ctx, '{'));
    parse_nested_body(ctx, &mut block);
    block.finish()
}

fn parse_code_brace(ctx: &mut ParserContext) -> SyntaxNode {
    let mut brace = NodeBuilder::new(SyntaxKind::CodeBrace);
    brace.push(parse_brace(ctx, '{'));
    parse_nested_body(ctx, &mut brace);
    brace.finish()
}

fn parse_nested_body(ctx: &mut ParserContext, builder: &mut NodeBuilder) {
    ctx.enter_nested();
    if ctx.can_nest() {
        parse_code_body(ctx, builder);
    } else {
        ctx.report_too_deep();
        parse_flat_body(ctx, builder);
    }
    ctx.leave_nested();
}

/// Everything up to and including the closing brace.
fn parse_code_body(ctx: &mut ParserContext, builder: &mut NodeBuilder) {
    let mut last = None;
    loop {
        if ctx.is_eof() || ctx.current() == '}' {
            builder.push(parse_brace(ctx, '}'));
            return;
        }
        if ctx.current() == '{' {
            builder.push(parse_code_brace(ctx));
            last = Some('}');
        } else if starts_markup(ctx, last) {
            builder.push(markup::parse_element(ctx));
            last = None;
        } else {
            let (value, new_last) = parse_code_value(ctx, last);
            builder.push(value);
            last = new_last;
        }
    }
}

/// Body past the depth limit: one opaque value up to the matching brace.
/// Inner braces are counted but get no nodes, and markup is not recognized.
fn parse_flat_body(ctx: &mut ParserContext, builder: &mut NodeBuilder) {
    ctx.reset();
    let mut open = 0usize;
    loop {
        let ch = ctx.current();
        if ctx.is_eof() || (ch == '}' && open == 0) {
            break;
        }
        match ch {
            '"' | '\'' | '`' => consume_string(ctx, ch),
            '/' if ctx.peek() == '/' => consume_line_comment(ctx),
            '/' if ctx.peek() == '*' => consume_block_comment(ctx),
            '{' => {
                open += 1;
                ctx.consume();
            }
            '}' => {
                open -= 1;
                ctx.consume();
            }
            _ => ctx.consume(),
        }
    }
    if !ctx.buffer().is_empty() {
        let location = ctx.location();
        let text = ctx.take_buffer();
        builder.push(SyntaxNode::value(SyntaxKind::CodeValue, Some(text), location));
    }
    builder.push(parse_brace(ctx, '}'));
}

/// Opaque code text up to the next brace or markup. Returns the last
/// significant character seen so the caller can keep tracking statements.
fn parse_code_value(ctx: &mut ParserContext, mut last: Option<char>) -> (SyntaxNode, Option<char>) {
    ctx.reset();
    loop {
        let ch = ctx.current();
        if ctx.is_eof() || ch == '{' || ch == '}' || starts_markup(ctx, last) {
            break;
        }
        match ch {
            '"' | '\'' | '`' => {
                consume_string(ctx, ch);
                last = Some(ch);
            }
            '/' if ctx.peek() == '/' => consume_line_comment(ctx),
            '/' if ctx.peek() == '*' => consume_block_comment(ctx),
            ch if ch.is_whitespace() => ctx.consume(),
            ch => {
                ctx.consume();
                last = Some(ch);
            }
        }
    }
    let location = ctx.location();
    let text = ctx.take_buffer();
    (SyntaxNode::value(SyntaxKind::CodeValue, Some(text), location), last)
}

fn report_unexpected_eof(ctx: &mut ParserContext, what: &str) {
    ctx.report(Diagnostic::error(
        DiagnosticCode::UnexpectedEndOfInput,
        format!("Unexpected end of input inside {}", what),
        Some(Location::empty(ctx.position())),
    ));
}

fn consume_string(ctx: &mut ParserContext, quote: char) {
    ctx.consume();
    loop {
        if ctx.is_eof() {
            report_unexpected_eof(ctx, "a string literal");
            return;
        }
        let ch = ctx.current();
        ctx.consume();
        if ch == '\\' {
            ctx.consume();
        } else if ch == quote {
            return;
        }
    }
}

fn consume_line_comment(ctx: &mut ParserContext) {
    while !ctx.is_eof() && ctx.current() != '\n' {
        ctx.consume();
    }
}

fn consume_block_comment(ctx: &mut ParserContext) {
    ctx.consume_n(2);
    while !ctx.starts_with("*/") {
        if ctx.is_eof() {
            report_unexpected_eof(ctx, "a block comment");
            return;
        }
        ctx.consume();
    }
    ctx.consume_n(2);
}

// === Expressions ===

fn parse_code_expression(ctx: &mut ParserContext) -> SyntaxNode {
    let mut expression = NodeBuilder::new(SyntaxKind::CodeExpression);
    expression.push(parse_transition_marker(ctx));

    ctx.reset();
    consume_identifier(ctx);
    loop {
        match ctx.current() {
            '.' if is_identifier_start(ctx.peek()) => {
                ctx.consume();
                consume_identifier(ctx);
            }
            '(' => consume_group(ctx, '(', ')'),
            '[' => consume_group(ctx, '[', ']'),
            _ => break,
        }
    }
    let location = ctx.location();
    let text = ctx.take_buffer();
    expression.push(SyntaxNode::value(SyntaxKind::CodeValue, Some(text), location));
    expression.finish()
}

fn consume_identifier(ctx: &mut ParserContext) {
    while is_identifier_char(ctx.current()) {
        ctx.consume();
    }
}

fn consume_group(ctx: &mut ParserContext, open: char, close: char) {
    let mut depth = 0usize;
    loop {
        if ctx.is_eof() {
            report_unexpected_eof(ctx, &format!("'{}' in a code expression", open));
            return;
        }
        let ch = ctx.current();
        if matches!(ch, '"' | '\'' | '`') {
            consume_string(ctx, ch);
            continue;
        }
        ctx.consume();
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return;
            }
        }
    }
}
