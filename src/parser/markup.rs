//! Markup grammar: elements, attributes, end tags, comments, CDATA and
//! declarations.

use super::code::{self, starts_transition};
use super::context::ParserContext;
use super::raw_text;
use super::source::EOF;
use super::tokens::{
    parse_bracket, parse_equals, parse_literal, parse_quote, parse_token, parse_trivia,
    parse_until, report_expected, whitespace_ahead,
};
use crate::error::{Diagnostic, DiagnosticCode};
use crate::html::{is_raw_text_element, is_void_element};
use crate::syntax::{Location, NodeBuilder, SyntaxKind, SyntaxNode, Trivia};

/// The whole document as one `Document` node.
pub(crate) fn parse_document(ctx: &mut ParserContext) -> SyntaxNode {
    let mut document = NodeBuilder::new(SyntaxKind::Document);
    let base = ctx.flattened_len();
    while !ctx.is_eof() {
        if close_flattened(ctx, base, &mut document) {
            continue;
        }
        document.push(parse_node(ctx));
    }
    finish_flattened(ctx, base);
    document.finish()
}

/// One content node: embedded code, markup, or a run of text.
pub(crate) fn parse_node(ctx: &mut ParserContext) -> SyntaxNode {
    if starts_transition(ctx) {
        return code::parse_transition(ctx);
    }
    if ctx.current() == '<' {
        return parse_markup(ctx);
    }
    parse_literal(ctx, |c| c.current() == '<' || starts_transition(c))
}

fn parse_markup(ctx: &mut ParserContext) -> SyntaxNode {
    if ctx.starts_with("<!--") {
        parse_comment(ctx)
    } else if ctx.starts_with("<![CDATA[") {
        parse_cdata(ctx)
    } else if ctx.starts_with("<!") {
        parse_declaration(ctx)
    } else if ctx.starts_with("</") {
        parse_orphan_end_tag(ctx)
    } else {
        parse_element(ctx)
    }
}

pub(crate) fn is_name_char(ch: char) -> bool {
    !(ch.is_whitespace() || matches!(ch, '>' | '/' | '<' | '=' | '"' | '\'' | EOF))
}

fn parse_tag_name(ctx: &mut ParserContext) -> SyntaxNode {
    if !is_name_char(ctx.current()) {
        report_expected(ctx, DiagnosticCode::ExpectedTagName, "tag name");
        return SyntaxNode::missing(SyntaxKind::HtmlTagName, ctx.position());
    }
    parse_until(ctx, SyntaxKind::HtmlTagName, |c, _| !is_name_char(c.current()))
}

/// Name of the end tag at the cursor, without consuming anything.
pub(crate) fn peek_end_tag_name(ctx: &ParserContext) -> Option<String> {
    if !ctx.starts_with("</") {
        return None;
    }
    let mut name = String::new();
    let mut n = 2;
    while is_name_char(ctx.peek_at(n)) {
        name.push(ctx.peek_at(n));
        n += 1;
    }
    Some(name)
}

// === Elements ===

struct StartTag {
    node: SyntaxNode,
    name: Option<String>,
    self_closing: bool,
    terminated: bool,
}

pub(crate) fn parse_element(ctx: &mut ParserContext) -> SyntaxNode {
    if !ctx.can_nest() {
        return parse_flat_element(ctx);
    }
    ctx.enter_nested();
    let element = parse_nested_element(ctx);
    ctx.leave_nested();
    element
}

/// Start tag, plus the element name and its location when content follows.
fn parse_element_start(ctx: &mut ParserContext) -> (NodeBuilder, Option<(String, Option<Location>)>) {
    let start = parse_start_tag(ctx);
    let name_location = start
        .node
        .child(SyntaxKind::HtmlTagName)
        .and_then(SyntaxNode::location)
        .cloned();

    let kind = match start.name.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("script") => SyntaxKind::ScriptTag,
        Some("style") => SyntaxKind::StyleTag,
        _ => SyntaxKind::HtmlTag,
    };
    let mut element = NodeBuilder::new(kind);
    element.push(start.node);

    let open = match start.name {
        Some(name) if start.terminated && !start.self_closing && !is_void_element(&name) => {
            Some((name, name_location))
        }
        _ => None,
    };
    (element, open)
}

fn parse_nested_element(ctx: &mut ParserContext) -> SyntaxNode {
    let (mut element, open) = parse_element_start(ctx);
    if let Some((name, name_location)) = open {
        if is_raw_text_element(&name) {
            raw_text::parse_raw_text_content(ctx, &name, &mut element);
        } else {
            parse_element_content(ctx, &name, name_location, &mut element);
        }
    }
    element.finish()
}

/// Element opened past the depth limit. Only the start tag belongs to the
/// node; what follows is parsed by the enclosing content loop as siblings,
/// and the matching end tag is picked up there by `close_flattened`.
fn parse_flat_element(ctx: &mut ParserContext) -> SyntaxNode {
    ctx.report_too_deep();
    let (mut element, open) = parse_element_start(ctx);
    if let Some((name, name_location)) = open {
        if is_raw_text_element(&name) {
            raw_text::parse_raw_text_content(ctx, &name, &mut element);
        } else {
            ctx.push_flattened(&name, name_location);
        }
    }
    element.finish()
}

fn parse_element_content(
    ctx: &mut ParserContext,
    name: &str,
    name_location: Option<Location>,
    element: &mut NodeBuilder,
) {
    ctx.push_element(name);
    let base = ctx.flattened_len();
    loop {
        if ctx.is_eof() {
            finish_flattened(ctx, base);
            report_missing_end_tag(ctx, name, name_location);
            break;
        }
        if close_flattened(ctx, base, element) {
            continue;
        }
        if let Some(end_name) = peek_end_tag_name(ctx) {
            if end_name.eq_ignore_ascii_case(name) {
                finish_flattened(ctx, base);
                element.push(parse_end_tag(ctx));
                break;
            }
            // Closes an ancestor: this element ends here without its own end tag.
            if ctx.is_open(&end_name) {
                finish_flattened(ctx, base);
                report_missing_end_tag(ctx, name, name_location);
                break;
            }
        }
        element.push(parse_node(ctx));
    }
    ctx.pop_element();
}

/// Consume the end tag at the cursor if it closes a flattened element opened
/// in this loop. Flattened elements inside it are left unclosed.
fn close_flattened(ctx: &mut ParserContext, base: usize, builder: &mut NodeBuilder) -> bool {
    let Some(end_name) = peek_end_tag_name(ctx) else {
        return false;
    };
    let Some(index) = ctx.find_flattened(&end_name, base) else {
        return false;
    };
    finish_flattened(ctx, index + 1);
    ctx.truncate_flattened(index);
    builder.push(parse_end_tag(ctx));
    true
}

/// Report every flattened element from `base` up as missing its end tag.
fn finish_flattened(ctx: &mut ParserContext, base: usize) {
    for (name, location) in ctx.truncate_flattened(base) {
        report_missing_end_tag(ctx, &name, location);
    }
}

fn report_missing_end_tag(ctx: &mut ParserContext, name: &str, location: Option<Location>) {
    let location = location.unwrap_or_else(|| Location::empty(ctx.position()));
    ctx.report(Diagnostic::error(
        DiagnosticCode::MissingEndTag,
        format!("Element '<{}>' is missing its end tag '</{}>'", name, name),
        Some(location),
    ));
}

fn parse_start_tag(ctx: &mut ParserContext) -> StartTag {
    let mut start = NodeBuilder::new(SyntaxKind::HtmlStartTag);
    start.push(parse_bracket(ctx, "<"));

    let name_node = parse_tag_name(ctx);
    let name = name_node.value_str().map(str::to_string);
    start.push(name_node);

    let (attributes, pending) = parse_attributes(ctx);
    start.push(attributes);

    let (close, self_closing, terminated) = if ctx.starts_with("/>") {
        (parse_bracket(ctx, "/>"), true, true)
    } else if ctx.current() == '>' {
        (parse_bracket(ctx, ">"), false, true)
    } else {
        (parse_bracket(ctx, ">"), false, false)
    };
    start.push(close.with_leading(pending));

    StartTag { node: start.finish(), name, self_closing, terminated }
}

/// Attributes up to the closing bracket. Whitespace before the bracket is
/// handed back so it can lead the bracket.
fn parse_attributes(ctx: &mut ParserContext) -> (SyntaxNode, Option<Trivia>) {
    let mut attributes = NodeBuilder::new(SyntaxKind::HtmlAttributes);
    let mut seen: Vec<String> = Vec::new();

    loop {
        let trivia = parse_trivia(ctx);
        if ctx.is_eof() || ctx.current() == '>' || ctx.current() == '<' || ctx.starts_with("/>") {
            return (attributes.finish(), trivia);
        }

        if starts_transition(ctx) {
            attributes.push(code::parse_transition(ctx).with_leading(trivia));
            continue;
        }

        let attribute = parse_attribute(ctx, trivia);
        if let Some(name_node) = attribute.child(SyntaxKind::AttributeName) {
            if let Some(name) = name_node.value_str() {
                let name = name.to_ascii_lowercase();
                if seen.contains(&name) {
                    ctx.report(Diagnostic::warning(
                        DiagnosticCode::DuplicateAttribute,
                        format!("Attribute '{}' is specified more than once", name),
                        name_node.location().cloned(),
                    ));
                } else {
                    seen.push(name);
                }
            }
        }
        attributes.push(attribute);
    }
}

fn is_attribute_name_end(ctx: &ParserContext, buffer: &str) -> bool {
    let ch = ctx.current();
    ch.is_whitespace()
        || ch == '>'
        || ch == '<'
        || ctx.starts_with("/>")
        || (!buffer.is_empty() && matches!(ch, '=' | '"' | '\''))
}

fn parse_attribute(ctx: &mut ParserContext, leading: Option<Trivia>) -> SyntaxNode {
    let mut attribute = NodeBuilder::new(SyntaxKind::HtmlAttribute);

    let name = if matches!(ctx.current(), '=' | '"' | '\'') {
        report_expected(ctx, DiagnosticCode::ExpectedAttributeName, "attribute name");
        SyntaxNode::missing(SyntaxKind::AttributeName, ctx.position())
    } else {
        parse_until(ctx, SyntaxKind::AttributeName, is_attribute_name_end)
    };
    let has_name = !name.is_missing();
    attribute.push(name.with_leading(leading));

    if ctx.peek_at(whitespace_ahead(ctx)) == '=' {
        let before = parse_trivia(ctx);
        let equals = parse_equals(ctx);
        let after = parse_trivia(ctx);
        attribute.push(equals.with_trivia(before, after));
        parse_attribute_value(ctx, &mut attribute);
    } else if matches!(ctx.current(), '"' | '\'') {
        if has_name {
            attribute.push(parse_equals(ctx));
        }
        parse_attribute_value(ctx, &mut attribute);
    }

    attribute.finish()
}

fn parse_attribute_value(ctx: &mut ParserContext, attribute: &mut NodeBuilder) {
    let quote = ctx.current();
    if quote == '"' || quote == '\'' {
        attribute.push(parse_quote(ctx, quote));
        attribute.push(parse_value_content(ctx, |c| c.current() == quote));
        if ctx.is_eof() {
            ctx.report(Diagnostic::error(
                DiagnosticCode::UnterminatedAttribute,
                format!("Attribute value is missing its closing {}", quote),
                Some(Location::empty(ctx.position())),
            ));
            attribute.push(SyntaxNode::missing(SyntaxKind::Quote, ctx.position()));
        } else {
            attribute.push(parse_quote(ctx, quote));
        }
        return;
    }

    let ends_unquoted =
        |c: &ParserContext| c.current().is_whitespace() || c.current() == '>' || c.current() == '<' || c.starts_with("/>");
    if ctx.is_eof() || ends_unquoted(ctx) {
        // `name=` with nothing after it
        attribute.push(parse_quote(ctx, '"'));
        return;
    }
    attribute.push(parse_value_content(ctx, ends_unquoted));
}

/// Attribute value text, with embedded code and escaped transitions.
fn parse_value_content<F>(ctx: &mut ParserContext, is_end: F) -> SyntaxNode
where
    F: Fn(&ParserContext) -> bool,
{
    let mut value = NodeBuilder::new(SyntaxKind::AttributeValue);
    while !ctx.is_eof() && !is_end(ctx) {
        if starts_transition(ctx) {
            value.push(code::parse_transition(ctx));
            continue;
        }
        value.push(parse_until(ctx, SyntaxKind::Literal, |c, _| is_end(c) || starts_transition(c)));
    }
    value.finish()
}

// === End tags ===

pub(crate) fn parse_end_tag(ctx: &mut ParserContext) -> SyntaxNode {
    let mut end = NodeBuilder::new(SyntaxKind::HtmlEndTag);
    end.push(parse_bracket(ctx, "</"));
    end.push(parse_tag_name(ctx));
    let trivia = parse_trivia(ctx);
    end.push(parse_bracket(ctx, ">").with_leading(trivia));
    end.finish()
}

fn parse_orphan_end_tag(ctx: &mut ParserContext) -> SyntaxNode {
    let end = parse_end_tag(ctx);
    let name = end.tag_name().unwrap_or_default().to_string();
    let location = end
        .child(SyntaxKind::HtmlTagName)
        .and_then(SyntaxNode::location)
        .cloned();

    let diagnostic = if is_void_element(&name) {
        Diagnostic::warning(
            DiagnosticCode::VoidElementEndTag,
            format!("'<{}>' is a void element and takes no end tag", name),
            location,
        )
    } else if let Some(open) = ctx.current_element() {
        Diagnostic::error(
            DiagnosticCode::MismatchedEndTag,
            format!("End tag '</{}>' does not match the open element '<{}>'", name, open),
            location,
        )
    } else {
        Diagnostic::error(
            DiagnosticCode::UnexpectedEndTag,
            format!("End tag '</{}>' has no matching start tag", name),
            location,
        )
    };
    ctx.report(diagnostic);
    end
}

// === Comments, CDATA, declarations ===

fn parse_comment(ctx: &mut ParserContext) -> SyntaxNode {
    parse_delimited(
        ctx,
        [SyntaxKind::Comment, SyntaxKind::CommentStart, SyntaxKind::CommentContent, SyntaxKind::CommentEnd],
        ("<!--", "-->"),
        DiagnosticCode::UnterminatedComment,
        "Comment is missing its closing '-->'",
    )
}

fn parse_cdata(ctx: &mut ParserContext) -> SyntaxNode {
    parse_delimited(
        ctx,
        [SyntaxKind::CData, SyntaxKind::CDataStart, SyntaxKind::CDataContent, SyntaxKind::CDataEnd],
        ("<![CDATA[", "]]>"),
        DiagnosticCode::UnterminatedCData,
        "CDATA section is missing its closing ']]>'",
    )
}

/// Opening delimiter, raw content, closing delimiter. Content never contains code.
fn parse_delimited(
    ctx: &mut ParserContext,
    [kind, start_kind, content_kind, end_kind]: [SyntaxKind; 4],
    (open, close): (&str, &str),
    code: DiagnosticCode,
    message: &str,
) -> SyntaxNode {
    let mut node = NodeBuilder::new(kind);
    node.push(parse_token(ctx, start_kind, open, DiagnosticCode::ExpectedBracket));
    node.push(parse_until(ctx, content_kind, |c, _| c.starts_with(close)));
    if ctx.is_eof() {
        ctx.report(Diagnostic::error(code, message, Some(Location::empty(ctx.position()))));
        node.push(SyntaxNode::missing(end_kind, ctx.position()));
    } else {
        node.push(parse_token(ctx, end_kind, close, DiagnosticCode::ExpectedBracket));
    }
    node.finish()
}

fn parse_declaration(ctx: &mut ParserContext) -> SyntaxNode {
    let is_doctype = ctx.starts_with_ignore_case("<!doctype");
    let node = parse_until(ctx, SyntaxKind::Doctype, |_, buffer| buffer.ends_with('>'));
    let location = node.location().cloned();

    if !node.value_str().is_some_and(|text| text.ends_with('>')) {
        ctx.report(Diagnostic::error(
            DiagnosticCode::UnterminatedDoctype,
            "Declaration is missing its closing '>'",
            location.clone(),
        ));
    }
    if !is_doctype {
        ctx.report(Diagnostic::warning(
            DiagnosticCode::UnknownDeclaration,
            "Unknown declaration; only '<!doctype ...>' is recognized",
            location,
        ));
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserOptions;

    fn parse(text: &str) -> (SyntaxNode, Vec<Diagnostic>) {
        let mut ctx = ParserContext::new(text, &ParserOptions::default());
        let document = parse_document(&mut ctx);
        (document, ctx.take_diagnostics())
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_simple_element() {
        let (doc, diagnostics) = parse("<div>Hi</div>");
        assert!(diagnostics.is_empty());
        let div = &doc.children()[0];
        assert_eq!(div.kind(), SyntaxKind::HtmlTag);
        assert_eq!(div.tag_name(), Some("div"));
        assert_eq!(div.children()[1].value_str(), Some("Hi"));
        assert_eq!(div.children()[2].kind(), SyntaxKind::HtmlEndTag);
    }

    #[test]
    fn test_attributes_quoted_and_unquoted() {
        let (doc, diagnostics) = parse("<a href='x' id=main hidden>");
        assert!(diagnostics.iter().all(|d| d.code == DiagnosticCode::MissingEndTag));
        let start = doc.children()[0].child(SyntaxKind::HtmlStartTag).unwrap();
        let attributes = start.child(SyntaxKind::HtmlAttributes).unwrap();
        assert_eq!(attributes.children().len(), 3);
        let names: Vec<_> = attributes
            .children()
            .iter()
            .filter_map(|a| a.child(SyntaxKind::AttributeName)?.value_str())
            .collect();
        assert_eq!(names, ["href", "id", "hidden"]);
        assert_eq!(attributes.children()[1].child(SyntaxKind::AttributeValue).unwrap().to_source(), "main");
    }

    #[test]
    fn test_spaces_around_equals_are_trivia() {
        let source = "<p class = \"x\"  >t</p>";
        let (doc, diagnostics) = parse(source);
        assert!(diagnostics.is_empty());
        assert_eq!(doc.to_source(), source);
        let start = doc.children()[0].child(SyntaxKind::HtmlStartTag).unwrap();
        let close = start.children().last().unwrap();
        assert_eq!(close.leading_trivia().map(Trivia::text), Some("  "));
    }

    #[test]
    fn test_void_element_takes_no_content() {
        let (doc, diagnostics) = parse("<br>text");
        assert!(diagnostics.is_empty());
        assert_eq!(doc.children().len(), 2);
        assert_eq!(doc.children()[0].children().len(), 1);
    }

    #[test]
    fn test_void_element_end_tag_warns() {
        let (_, diagnostics) = parse("<input></input>");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::VoidElementEndTag]);
    }

    #[test]
    fn test_end_tag_for_ancestor_closes_implicitly() {
        let (doc, diagnostics) = parse("<div><span>x</div>");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::MissingEndTag]);
        let div = &doc.children()[0];
        assert_eq!(div.children().last().unwrap().kind(), SyntaxKind::HtmlEndTag);
        assert_eq!(div.children()[1].tag_name(), Some("span"));
    }

    #[test]
    fn test_orphan_end_tags() {
        let (_, diagnostics) = parse("</p>");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnexpectedEndTag]);
        let (_, diagnostics) = parse("<div></p></div>");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::MismatchedEndTag]);
    }

    #[test]
    fn test_unterminated_attribute() {
        let source = "<div class=\"a>";
        let (doc, diagnostics) = parse(source);
        assert_eq!(
            codes(&diagnostics),
            [DiagnosticCode::UnterminatedAttribute, DiagnosticCode::ExpectedBracket]
        );
        assert_eq!(doc.to_source(), source);
    }

    #[test]
    fn test_duplicate_attribute() {
        let (_, diagnostics) = parse("<p id=a ID=b></p>");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::DuplicateAttribute]);
    }

    #[test]
    fn test_comment_and_cdata() {
        let (doc, diagnostics) = parse("<!-- <b>@x</b> --><![CDATA[a<b]]>");
        assert!(diagnostics.is_empty());
        let comment = &doc.children()[0];
        assert_eq!(comment.kind(), SyntaxKind::Comment);
        assert_eq!(comment.children()[1].value_str(), Some(" <b>@x</b> "));
        assert_eq!(doc.children()[1].kind(), SyntaxKind::CData);
    }

    #[test]
    fn test_unterminated_comment() {
        let (doc, diagnostics) = parse("<!-- open");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnterminatedComment]);
        assert!(doc.children()[0].children()[2].is_missing());
    }

    #[test]
    fn test_doctype() {
        let (doc, diagnostics) = parse("<!DOCTYPE html>\n<html></html>");
        assert!(diagnostics.is_empty());
        assert_eq!(doc.children()[0].kind(), SyntaxKind::Doctype);
        assert_eq!(doc.children()[0].value_str(), Some("<!DOCTYPE html>"));

        let (_, diagnostics) = parse("<!ENTITY x>");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnknownDeclaration]);

        let (_, diagnostics) = parse("<!doctype html");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnterminatedDoctype]);
    }

    #[test]
    fn test_lone_angle_bracket_starts_tag() {
        let (doc, diagnostics) = parse("a < b");
        assert!(codes(&diagnostics).contains(&DiagnosticCode::ExpectedTagName));
        assert_eq!(doc.to_source(), "a < b");
    }

    #[test]
    fn test_peek_end_tag_name() {
        let ctx = ParserContext::new("</Div >", &ParserOptions::default());
        assert_eq!(peek_end_tag_name(&ctx).as_deref(), Some("Div"));
        let ctx = ParserContext::new("<div>", &ParserOptions::default());
        assert_eq!(peek_end_tag_name(&ctx), None);
    }
}
