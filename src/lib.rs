//! Kiln template front end: a trivia-preserving parser for HTML with embedded
//! JavaScript, and a generator that lowers templates to ES module render
//! functions with source maps.

pub mod error;
pub mod generate;
pub mod html;
pub mod ide;
pub mod parser;
pub mod syntax;

pub use error::{CompileError, Diagnostic, DiagnosticCode, ParseError, Severity};
pub use generate::{
    GenerateOptions, GenerateResult, Generator, Injection, JavaScriptGenerator, Mapping,
    NoopSourceMapWriter, Range, RangeType, SourceMap, SourceMapWriter,
};
pub use parser::{
    DEFAULT_MAX_NESTING_DEPTH, GrammarRegistry, Parser, ParserOptions, ParserResult, TemplateParser,
};
pub use syntax::{Location, Position, SyntaxKind, SyntaxNode};

use serde::Serialize;

/// Generated code together with the diagnostics of the parse it came from.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    #[serde(flatten)]
    pub generated: GenerateResult,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parser and generator wired together. Shareable across threads; each call
/// works on its own contexts.
pub struct Pipeline {
    parser: TemplateParser,
    generator: Box<dyn Generator + Send + Sync>,
}

impl Pipeline {
    pub fn new(parser: TemplateParser, generator: Box<dyn Generator + Send + Sync>) -> Self {
        Self { parser, generator }
    }

    /// Template grammar with the default transition, JavaScript output.
    pub fn standard() -> Self {
        Self::new(TemplateParser::default(), Box::new(JavaScriptGenerator))
    }

    pub fn parser(&self) -> &TemplateParser {
        &self.parser
    }

    pub fn parse(&self, source: &str) -> Result<ParserResult, ParseError> {
        self.parser.parse(source)
    }

    pub fn compile(&self, source: &str, options: &GenerateOptions) -> Result<CompileOutput, ParseError> {
        self.compile_with_writer(source, options, &mut NoopSourceMapWriter)
    }

    pub fn compile_with_writer(
        &self,
        source: &str,
        options: &GenerateOptions,
        writer: &mut dyn SourceMapWriter,
    ) -> Result<CompileOutput, ParseError> {
        let parsed = self.parser.parse(source)?;
        let generated = self.generator.generate_with_writer(&parsed, options, writer);
        Ok(CompileOutput { generated, diagnostics: parsed.into_diagnostics() })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse `source` with the standard template grammar.
pub fn parse(source: &str) -> Result<ParserResult, ParseError> {
    TemplateParser::default().parse(source)
}

/// Generate the render module for an already parsed template.
pub fn generate(result: &ParserResult, file_path: &str) -> String {
    let options = GenerateOptions { file_path: Some(file_path.to_string()), ..Default::default() };
    JavaScriptGenerator.generate(result, &options).code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_compiles_with_diagnostics() {
        let output = Pipeline::standard()
            .compile("<div class=\"a>", &GenerateOptions::default())
            .unwrap();
        assert!(output.has_errors());
        assert!(output.generated.code.contains("__writer.writeLiteral(\"<div class=\\\"a>\");"));
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_free_functions() {
        let result = parse("<p>@@</p>").unwrap();
        let code = generate(&result, "p.kiln");
        assert!(code.contains("writeLiteral(\"<p>@</p>\")"));
    }
}
