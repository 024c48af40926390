mod code;
mod context;
mod markup;
mod raw_text;
mod source;
mod tokens;

pub use context::ParserContext;
pub use source::EOF;

use crate::error::{Diagnostic, ParseError};
use crate::syntax::{Location, SyntaxKind, SyntaxNode};
use std::sync::Arc;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Character that introduces embedded code.
    pub transition: char,
    /// Grammar used by `Parser::parse`.
    pub language: String,
    /// Elements and code braces nested deeper than this are parsed flat:
    /// deeper elements become siblings closed by their own end tags, deeper
    /// code is kept as opaque text. Keeps recursion over the tree bounded.
    pub max_nesting_depth: usize,
}

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            transition: '@',
            language: TemplateGrammar::LANGUAGE.to_string(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Grammar entry point driven by the parse loop.
///
/// Each call returns the next top-level node. A grammar signals completion by
/// returning an `EndOfFile` node.
pub trait Grammar: Send + Sync {
    fn language(&self) -> &str;
    fn parse_node(&self, ctx: &mut ParserContext) -> SyntaxNode;
}

/// Markup with embedded code.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGrammar;

impl TemplateGrammar {
    pub const LANGUAGE: &'static str = "kiln";
}

impl Grammar for TemplateGrammar {
    fn language(&self) -> &str {
        Self::LANGUAGE
    }

    fn parse_node(&self, ctx: &mut ParserContext) -> SyntaxNode {
        if ctx.root_parsed() {
            return SyntaxNode::marker(SyntaxKind::EndOfFile, Location::empty(ctx.position()));
        }
        ctx.mark_root_parsed();
        markup::parse_document(ctx)
    }
}

/// Grammars available to a parser, keyed by language name.
#[derive(Clone, Default)]
pub struct GrammarRegistry {
    grammars: Vec<Arc<dyn Grammar>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the template grammar.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TemplateGrammar));
        registry
    }

    /// Add a grammar, replacing any grammar for the same language.
    pub fn register(&mut self, grammar: Arc<dyn Grammar>) {
        self.grammars.retain(|g| g.language() != grammar.language());
        self.grammars.push(grammar);
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn Grammar>> {
        self.grammars.iter().find(|g| g.language() == language).cloned()
    }

    pub fn languages(&self) -> Vec<&str> {
        self.grammars.iter().map(|g| g.language()).collect()
    }
}

impl std::fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarRegistry").field("languages", &self.languages()).finish()
    }
}

/// Output of one parse: top-level nodes and every diagnostic found.
/// Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserResult {
    nodes: Vec<SyntaxNode>,
    diagnostics: Vec<Diagnostic>,
}

impl ParserResult {
    pub fn new(nodes: Vec<SyntaxNode>, diagnostics: Vec<Diagnostic>) -> Self {
        Self { nodes, diagnostics }
    }

    /// Top-level nodes: the document, then `EndOfFile`.
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Give up the tree and keep the diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// The document node.
    pub fn root(&self) -> Option<&SyntaxNode> {
        self.nodes.iter().find(|n| n.kind() == SyntaxKind::Document)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Reassembled source text. Equal to the parsed input.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_source(&mut out);
        }
        out
    }

    /// Indented tree dump of every top-level node.
    pub fn dump(&self) -> String {
        self.nodes.iter().map(SyntaxNode::dump).collect()
    }
}

/// Parser trait - converts template source to a syntax tree
pub trait Parser {
    fn parse(&self, source: &str) -> Result<ParserResult, ParseError>;
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    Parsing,
    Done,
}

/// Template parser. Holds configuration only; every call gets a fresh context.
#[derive(Debug, Clone)]
pub struct TemplateParser {
    registry: GrammarRegistry,
    options: ParserOptions,
}

impl TemplateParser {
    pub fn new(registry: GrammarRegistry, options: ParserOptions) -> Self {
        Self { registry, options }
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self::new(GrammarRegistry::standard(), options)
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    /// Parse with the grammar registered for `language`.
    pub fn parse_language(&self, source: &str, language: &str) -> Result<ParserResult, ParseError> {
        let grammar = self
            .registry
            .get(language)
            .ok_or_else(|| ParseError::NoGrammar { language: language.to_string() })?;

        let mut ctx = ParserContext::new(source, &self.options);
        let mut nodes = Vec::new();
        let mut state = State::Parsing;

        while state == State::Parsing {
            let before = ctx.position().offset;
            let node = grammar.parse_node(&mut ctx);
            log::trace!("produced {} at offset {}", node.kind().as_str(), before);

            if node.kind() == SyntaxKind::EndOfFile {
                state = State::Done;
            } else if ctx.position().offset == before {
                // No progress: stop here rather than spin.
                log::trace!("grammar '{}' made no progress, ending parse", grammar.language());
                nodes.push(node);
                nodes.push(SyntaxNode::marker(SyntaxKind::EndOfFile, Location::empty(ctx.position())));
                break;
            }
            nodes.push(node);
        }

        let diagnostics = ctx.take_diagnostics();
        log::debug!(
            "parsed {} chars as '{}': {} top-level nodes, {} diagnostics",
            ctx.position().offset,
            language,
            nodes.len(),
            diagnostics.len()
        );
        Ok(ParserResult::new(nodes, diagnostics))
    }
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::with_options(ParserOptions::default())
    }
}

impl Parser for TemplateParser {
    fn parse(&self, source: &str) -> Result<ParserResult, ParseError> {
        self.parse_language(source, &self.options.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_shape() {
        let result = TemplateParser::default().parse("<p>x</p>").unwrap();
        let kinds: Vec<_> = result.nodes().iter().map(SyntaxNode::kind).collect();
        assert_eq!(kinds, [SyntaxKind::Document, SyntaxKind::EndOfFile]);
        assert!(result.diagnostics().is_empty());
        assert_eq!(result.to_source(), "<p>x</p>");
    }

    #[test]
    fn test_empty_input() {
        let result = TemplateParser::default().parse("").unwrap();
        assert_eq!(result.nodes().len(), 2);
        assert!(result.root().unwrap().children().is_empty());
        assert_eq!(result.nodes()[1].kind(), SyntaxKind::EndOfFile);
    }

    #[test]
    fn test_unknown_language() {
        let err = TemplateParser::default().parse_language("x", "pug").unwrap_err();
        assert_eq!(err, ParseError::NoGrammar { language: "pug".into() });
    }

    #[test]
    fn test_custom_transition() {
        let options = ParserOptions { transition: '#', ..ParserOptions::default() };
        let result = TemplateParser::with_options(options).parse("<b>#name @x</b>").unwrap();
        let root = result.root().unwrap();
        let kinds: Vec<_> = root.descendants().iter().map(|n| n.kind()).collect();
        assert!(kinds.contains(&SyntaxKind::CodeExpression));
        assert!(result.diagnostics().is_empty());
    }

    struct Stalling;

    impl Grammar for Stalling {
        fn language(&self) -> &str {
            "stall"
        }

        fn parse_node(&self, ctx: &mut ParserContext) -> SyntaxNode {
            SyntaxNode::marker(SyntaxKind::Literal, Location::empty(ctx.position()))
        }
    }

    #[test]
    fn test_loop_stops_without_progress() {
        let mut registry = GrammarRegistry::standard();
        registry.register(Arc::new(Stalling));
        let parser = TemplateParser::new(registry, ParserOptions::default());
        let result = parser.parse_language("abc", "stall").unwrap();
        assert_eq!(result.nodes().last().map(SyntaxNode::kind), Some(SyntaxKind::EndOfFile));
    }

    #[test]
    fn test_register_replaces_language() {
        let mut registry = GrammarRegistry::standard();
        registry.register(Arc::new(TemplateGrammar));
        assert_eq!(registry.languages(), ["kiln"]);
    }
}
