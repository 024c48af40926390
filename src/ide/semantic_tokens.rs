use crate::parser::ParserResult;
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxVisitor, walk_all};
use serde::Serialize;

/// Highlighting class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Tag,
    Attribute,
    String,
    Keyword,
    Comment,
    Operator,
    Code,
    Text,
}

impl TokenType {
    /// Legend order; a token's index here is its wire type id.
    pub const LEGEND: [TokenType; 8] = [
        TokenType::Tag,
        TokenType::Attribute,
        TokenType::String,
        TokenType::Keyword,
        TokenType::Comment,
        TokenType::Operator,
        TokenType::Code,
        TokenType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Tag => "tag",
            TokenType::Attribute => "attribute",
            TokenType::String => "string",
            TokenType::Keyword => "keyword",
            TokenType::Comment => "comment",
            TokenType::Operator => "operator",
            TokenType::Code => "code",
            TokenType::Text => "text",
        }
    }

    fn index(&self) -> u32 {
        Self::LEGEND.iter().position(|t| t == self).unwrap_or_default() as u32
    }
}

/// One classified span on a single line. Columns are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SemanticToken {
    pub line: usize,
    pub start_col: usize,
    pub length: usize,
    pub token_type: TokenType,
}

/// Semantic-token visitor: classifies every leaf, splitting multi-line
/// leaves into one token per line.
#[derive(Debug, Default)]
pub struct SemanticTokens {
    tokens: Vec<SemanticToken>,
    attribute_value_depth: usize,
}

impl SemanticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(result: &ParserResult) -> Vec<SemanticToken> {
        let mut visitor = Self::new();
        walk_all(result.nodes(), &mut visitor);
        visitor.finish()
    }

    pub fn finish(self) -> Vec<SemanticToken> {
        self.tokens
    }

    fn classify(&self, node: &SyntaxNode) -> Option<TokenType> {
        let token_type = match node.kind() {
            SyntaxKind::HtmlTagName => TokenType::Tag,
            SyntaxKind::AttributeName => TokenType::Attribute,
            SyntaxKind::Quote => TokenType::String,
            SyntaxKind::Literal if self.attribute_value_depth > 0 => TokenType::String,
            SyntaxKind::Literal | SyntaxKind::CDataContent => TokenType::Text,
            SyntaxKind::Doctype | SyntaxKind::CDataStart | SyntaxKind::CDataEnd => TokenType::Keyword,
            SyntaxKind::CommentStart | SyntaxKind::CommentContent | SyntaxKind::CommentEnd => {
                TokenType::Comment
            }
            SyntaxKind::Bracket
            | SyntaxKind::Equals
            | SyntaxKind::Brace
            | SyntaxKind::Transition
            | SyntaxKind::EscapedTransition => TokenType::Operator,
            SyntaxKind::CodeValue | SyntaxKind::RawText => TokenType::Code,
            _ => return None,
        };
        Some(token_type)
    }
}

impl SyntaxVisitor for SemanticTokens {
    fn enter(&mut self, node: &SyntaxNode) -> bool {
        if node.kind() == SyntaxKind::AttributeValue {
            self.attribute_value_depth += 1;
        }
        let Some(token_type) = self.classify(node) else {
            return true;
        };
        if let Some(location) = node.location() {
            for span in location.lines().iter().filter(|span| !span.is_empty()) {
                self.tokens.push(SemanticToken {
                    line: span.line,
                    start_col: span.start_col,
                    length: span.len(),
                    token_type,
                });
            }
        }
        true
    }

    fn leave(&mut self, node: &SyntaxNode) {
        if node.kind() == SyntaxKind::AttributeValue {
            self.attribute_value_depth -= 1;
        }
    }
}

/// Relative encoding used by editor protocols: five integers per token
/// (delta line, delta start, length, type index, modifiers). Tokens are
/// encoded in document order whatever order they arrive in.
pub fn encode_relative(tokens: &[SemanticToken]) -> Vec<u32> {
    let mut ordered: Vec<&SemanticToken> = tokens.iter().collect();
    ordered.sort_by_key(|token| (token.line, token.start_col));

    let mut data = Vec::with_capacity(tokens.len() * 5);
    let mut prev_line = 0;
    let mut prev_col = 0;
    for token in ordered {
        let delta_line = token.line - prev_line;
        let delta_col = if delta_line == 0 { token.start_col - prev_col } else { token.start_col };
        data.extend([
            delta_line as u32,
            delta_col as u32,
            token.length as u32,
            token.token_type.index(),
            0,
        ]);
        prev_line = token.line;
        prev_col = token.start_col;
    }
    data
}
