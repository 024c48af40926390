//! Raw-text element bodies (`script`, `style`).
//!
//! A `<` is ordinary text here until the matching end tag. Script bodies may
//! still contain code transitions; style bodies may not, since CSS at-rules
//! use the same character.

use super::code::{self, starts_transition};
use super::context::ParserContext;
use super::markup::{is_name_char, parse_end_tag};
use super::tokens::parse_until;
use crate::error::{Diagnostic, DiagnosticCode};
use crate::syntax::{Location, NodeBuilder, SyntaxKind};

fn at_end_tag(ctx: &ParserContext, close: &str) -> bool {
    ctx.starts_with_ignore_case(close) && !is_name_char(ctx.peek_at(close.chars().count()))
}

pub(crate) fn parse_raw_text_content(ctx: &mut ParserContext, name: &str, element: &mut NodeBuilder) {
    let transitions = name.eq_ignore_ascii_case("script");
    let close = format!("</{}", name);
    let stop = |c: &ParserContext| at_end_tag(c, &close) || (transitions && starts_transition(c));

    loop {
        if ctx.is_eof() {
            ctx.report(Diagnostic::error(
                DiagnosticCode::UnterminatedRawText,
                format!("'<{}>' is missing its end tag '</{}>'", name, name),
                Some(Location::empty(ctx.position())),
            ));
            return;
        }
        if at_end_tag(ctx, &close) {
            element.push(parse_end_tag(ctx));
            return;
        }
        if transitions && starts_transition(ctx) {
            element.push(code::parse_transition(ctx));
            continue;
        }
        element.push(parse_until(ctx, SyntaxKind::RawText, |c, _| stop(c)));
    }
}
