use super::context::{GeneratorContext, GeneratorState};
use super::output::compute_injections;
use super::sourcemap::SourceMapWriter;
use super::{GenerateOptions, GenerateResult, Generator};
use crate::parser::ParserResult;
use crate::syntax::{SyntaxKind, SyntaxNode, Trivia};

/// Lowers a template to an ES module exporting one render function:
///
/// ```text
/// export default function render(model, __writer) {
///   __writer.writeLiteral("<p>");
///   __writer.write(model.name);
///   __writer.writeLiteral("</p>");
/// }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaScriptGenerator;

impl JavaScriptGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Lower one node (and everything below it) into `ctx`.
    pub fn emit(&self, node: &SyntaxNode, ctx: &mut GeneratorContext) {
        self.emit_trivia(node.leading_trivia(), ctx);

        match node.kind() {
            SyntaxKind::Document => {
                ctx.with_state(GeneratorState::Document, |ctx| self.emit_children(node, ctx))
            }
            SyntaxKind::HtmlTag | SyntaxKind::ScriptTag | SyntaxKind::StyleTag => {
                ctx.with_state(GeneratorState::InsideTag, |ctx| self.emit_children(node, ctx))
            }
            SyntaxKind::CodeBlock => {
                ctx.with_state(GeneratorState::InsideCodeBlock, |ctx| self.emit_code_block(node, ctx))
            }
            SyntaxKind::CodeBrace => self.emit_code_brace(node, ctx),
            SyntaxKind::CodeExpression => self.emit_code_expression(node, ctx),
            SyntaxKind::CodeValue => {
                if let (Some(code), Some(location)) = (node.value_str(), node.location()) {
                    ctx.write_statement(code, location);
                }
            }
            SyntaxKind::EscapedTransition => {
                if let (Some(value), Some(location)) = (node.value_str(), node.location()) {
                    ctx.append_literal(value, location);
                }
            }
            SyntaxKind::EndOfFile | SyntaxKind::Transition => {}
            SyntaxKind::HtmlStartTag
            | SyntaxKind::HtmlAttributes
            | SyntaxKind::HtmlAttribute
            | SyntaxKind::AttributeValue
            | SyntaxKind::HtmlEndTag
            | SyntaxKind::Comment
            | SyntaxKind::CData => self.emit_children(node, ctx),
            SyntaxKind::Trivia
            | SyntaxKind::Literal
            | SyntaxKind::Brace
            | SyntaxKind::Bracket
            | SyntaxKind::Equals
            | SyntaxKind::Quote
            | SyntaxKind::Doctype
            | SyntaxKind::CommentStart
            | SyntaxKind::CommentContent
            | SyntaxKind::CommentEnd
            | SyntaxKind::CDataStart
            | SyntaxKind::CDataContent
            | SyntaxKind::CDataEnd
            | SyntaxKind::HtmlTagName
            | SyntaxKind::AttributeName
            | SyntaxKind::RawText => {
                if let Some(location) = node.location() {
                    ctx.append_literal(location.text(), location);
                }
            }
        }

        self.emit_trivia(node.trailing_trivia(), ctx);
    }

    fn emit_trivia(&self, trivia: Option<&Trivia>, ctx: &mut GeneratorContext) {
        if let Some(trivia) = trivia {
            ctx.append_literal(trivia.text(), trivia.location());
        }
    }

    fn emit_children(&self, node: &SyntaxNode, ctx: &mut GeneratorContext) {
        for child in node.children() {
            self.emit(child, ctx);
        }
    }

    /// The transition and the block's own braces are template syntax, not code.
    fn emit_code_block(&self, node: &SyntaxNode, ctx: &mut GeneratorContext) {
        for child in node.children() {
            match child.kind() {
                SyntaxKind::Transition | SyntaxKind::Brace => {}
                _ => self.emit(child, ctx),
            }
        }
    }

    /// Nested braces belong to the code. A missing closing brace is still
    /// emitted so the generated function stays balanced.
    fn emit_code_brace(&self, node: &SyntaxNode, ctx: &mut GeneratorContext) {
        let children = node.children();
        for (index, child) in children.iter().enumerate() {
            if child.kind() != SyntaxKind::Brace {
                self.emit(child, ctx);
                continue;
            }
            let fallback = if index == 0 { "{" } else { "}" };
            let brace = child.value_str().unwrap_or(fallback);
            if let Some(location) = child.location() {
                ctx.write_statement(brace, location);
            }
        }
    }

    /// Inside an element an expression's value is written. Anywhere else it
    /// runs as a statement for its side effects and its value is dropped, so
    /// `Hello @name!` at the top level emits `name` on its own line. Text
    /// that should show a value belongs inside an element.
    fn emit_code_expression(&self, node: &SyntaxNode, ctx: &mut GeneratorContext) {
        let Some(value) = node.child(SyntaxKind::CodeValue) else {
            return;
        };
        let (Some(code), Some(location)) = (value.value_str(), value.location()) else {
            return;
        };
        if ctx.state() == Some(GeneratorState::InsideTag) {
            ctx.write_expression(code, location);
        } else {
            ctx.write_statement(code, location);
        }
    }
}

impl Generator for JavaScriptGenerator {
    fn generate_with_writer(
        &self,
        result: &ParserResult,
        options: &GenerateOptions,
        writer: &mut dyn SourceMapWriter,
    ) -> GenerateResult {
        let source = result.to_source();
        let mut ctx = GeneratorContext::new(options.file_path(), writer, &source, options.include_ranges);

        ctx.write_line(&format!(
            "export default function {}(model, __writer) {{",
            options.function_name()
        ));
        for node in result.nodes() {
            self.emit(node, &mut ctx);
        }
        ctx.write_line("}");

        let (code, mappings, ranges) = ctx.finish().finish();
        let injections = if options.include_ranges {
            compute_injections(&code, &ranges)
        } else {
            Vec::new()
        };

        log::debug!(
            "generated {} lines for {} ({} mappings, {} ranges)",
            code.lines().count(),
            options.file_path(),
            mappings.len(),
            ranges.len()
        );

        GenerateResult { code, mappings, ranges, injections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{NoopSourceMapWriter, SourceMap};
    use crate::parser::{Parser, TemplateParser};

    fn generate(source: &str) -> String {
        let result = TemplateParser::default().parse(source).unwrap();
        JavaScriptGenerator.generate(&result, &GenerateOptions::default()).code
    }

    fn body(source: &str) -> Vec<String> {
        let code = generate(source);
        let lines: Vec<String> = code.lines().map(str::to_string).collect();
        assert_eq!(lines.first().map(String::as_str), Some("export default function render(model, __writer) {"));
        assert_eq!(lines.last().map(String::as_str), Some("}"));
        lines[1..lines.len() - 1].to_vec()
    }

    #[test]
    fn test_single_literal() {
        assert_eq!(body("<div>Hi</div>"), ["  __writer.writeLiteral(\"<div>Hi</div>\");"]);
    }

    #[test]
    fn test_code_block_is_bare_statement() {
        assert_eq!(body("@{ x = 1; }"), ["   x = 1; "]);
    }

    #[test]
    fn test_attribute_expression_is_written() {
        assert_eq!(
            body("<input value=\"@name\" />"),
            [
                "  __writer.writeLiteral(\"<input value=\\\"\");",
                "  __writer.write(name);",
                "  __writer.writeLiteral(\"\\\" />\");",
            ]
        );
    }

    #[test]
    fn test_top_level_expression_is_statement() {
        assert_eq!(body("@init()"), ["  init()"]);
    }

    #[test]
    fn test_top_level_text_expression_is_not_written() {
        assert_eq!(
            body("Hello @name!"),
            [
                "  __writer.writeLiteral(\"Hello \");",
                "  name",
                "  __writer.writeLiteral(\"!\");",
            ]
        );
        assert_eq!(
            body("<p>Hello @name!</p>"),
            [
                "  __writer.writeLiteral(\"<p>Hello \");",
                "  __writer.write(name);",
                "  __writer.writeLiteral(\"!</p>\");",
            ]
        );
    }

    #[test]
    fn test_escaped_transition_is_literal() {
        assert_eq!(body("a@@b"), ["  __writer.writeLiteral(\"a@b\");"]);
    }

    #[test]
    fn test_markup_inside_code() {
        assert_eq!(
            body("@{ for (const x of xs) { <li>@x</li> } }"),
            [
                "   for (const x of xs) ",
                "  {",
                "  __writer.writeLiteral(\"<li>\");",
                "  __writer.write(x);",
                "  __writer.writeLiteral(\"</li>\");",
                "  }",
            ]
        );
    }

    #[test]
    fn test_missing_brace_still_balanced() {
        let lines = body("@{ if (a) { b();");
        assert_eq!(lines.last().map(String::as_str), Some("  }"));
    }

    #[test]
    fn test_custom_function_name() {
        let result = TemplateParser::default().parse("x").unwrap();
        let options = GenerateOptions { function_name: Some("page".into()), ..Default::default() };
        let code = JavaScriptGenerator.generate(&result, &options).code;
        assert!(code.starts_with("export default function page(model, __writer) {\n"));
    }

    #[test]
    fn test_mappings_point_at_source() {
        let result = TemplateParser::default().parse("<p>\n  @user.name\n</p>").unwrap();
        let mut map = SourceMap::new();
        let generated = JavaScriptGenerator.generate_with_writer(&result, &GenerateOptions::default(), &mut map);
        let expression = generated.mappings.iter().find(|m| m.src_line == 1).unwrap();
        assert_eq!(expression.src_col, 3);
        assert_eq!(map.len(), generated.mappings.len());
        assert_eq!(map.sources(), ["template.kiln"]);
    }

    #[test]
    fn test_ranges_only_when_requested() {
        let result = TemplateParser::default().parse("<p>@x</p>").unwrap();
        let plain = JavaScriptGenerator.generate(&result, &GenerateOptions::default());
        assert!(plain.ranges.is_empty());
        assert!(plain.injections.is_empty());

        let options = GenerateOptions { include_ranges: true, ..Default::default() };
        let mut writer = NoopSourceMapWriter;
        let ranged = JavaScriptGenerator.generate_with_writer(&result, &options, &mut writer);
        assert_eq!(ranged.injections.len(), 1);
        assert_eq!(ranged.injections[0].start, 4);
        assert_eq!(ranged.injections[0].end, 5);
    }
}
