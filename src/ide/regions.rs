use crate::parser::ParserResult;
use crate::syntax::{Location, Position, SyntaxKind, SyntaxNode, SyntaxVisitor, Trivia, walk_all};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Html,
    JavaScript,
    Css,
}

/// Contiguous stretch of the document written in one embedded language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRegion {
    pub language: Language,
    pub start: Position,
    pub end: Position,
}

/// Embedded-language region visitor. Template syntax itself (transitions
/// and code block delimiters) belongs to no region.
#[derive(Debug, Default)]
pub struct LanguageRegions {
    regions: Vec<LanguageRegion>,
    parents: Vec<SyntaxKind>,
}

impl LanguageRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(result: &ParserResult) -> Vec<LanguageRegion> {
        let mut visitor = Self::new();
        walk_all(result.nodes(), &mut visitor);
        visitor.finish()
    }

    pub fn finish(self) -> Vec<LanguageRegion> {
        self.regions
    }

    fn parent(&self) -> Option<SyntaxKind> {
        self.parents.last().copied()
    }

    fn language_of(&self, node: &SyntaxNode) -> Option<Language> {
        match node.kind() {
            SyntaxKind::CodeValue => Some(Language::JavaScript),
            SyntaxKind::RawText => match self.parents.iter().rev().find(|k| k.is_element()) {
                Some(SyntaxKind::StyleTag) => Some(Language::Css),
                _ => Some(Language::JavaScript),
            },
            SyntaxKind::Brace if self.parent() == Some(SyntaxKind::CodeBrace) => Some(Language::JavaScript),
            SyntaxKind::Brace | SyntaxKind::Transition | SyntaxKind::EscapedTransition => None,
            _ if node.children().is_empty() => Some(Language::Html),
            _ => None,
        }
    }

    fn add(&mut self, language: Language, location: &Location) {
        if location.is_empty() {
            return;
        }
        if let Some(last) = self.regions.last_mut() {
            if last.language == language && last.end == location.start() {
                last.end = location.end();
                return;
            }
        }
        self.regions.push(LanguageRegion {
            language,
            start: location.start(),
            end: location.end(),
        });
    }
}

impl SyntaxVisitor for LanguageRegions {
    fn visit_trivia(&mut self, trivia: &Trivia) {
        let language = match self.parent() {
            Some(SyntaxKind::CodeBlock | SyntaxKind::CodeBrace) => Language::JavaScript,
            _ => Language::Html,
        };
        self.add(language, trivia.location());
    }

    fn enter(&mut self, node: &SyntaxNode) -> bool {
        if let (Some(language), Some(location)) = (self.language_of(node), node.location()) {
            self.add(language, location);
        }
        self.parents.push(node.kind());
        true
    }

    fn leave(&mut self, _node: &SyntaxNode) {
        self.parents.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, TemplateParser};

    fn regions(source: &str) -> Vec<(Language, usize, usize)> {
        let result = TemplateParser::default().parse(source).unwrap();
        LanguageRegions::collect(&result)
            .into_iter()
            .map(|r| (r.language, r.start.offset, r.end.offset))
            .collect()
    }

    #[test]
    fn test_markup_is_one_html_region() {
        assert_eq!(regions("<p class=\"a\">Hi</p>"), [(Language::Html, 0, 19)]);
    }

    #[test]
    fn test_script_and_style_bodies() {
        assert_eq!(
            regions("<script>go()</script><style>p{}</style>"),
            [
                (Language::Html, 0, 8),
                (Language::JavaScript, 8, 12),
                (Language::Html, 12, 28),
                (Language::Css, 28, 31),
                (Language::Html, 31, 39),
            ]
        );
    }

    #[test]
    fn test_code_excludes_transition() {
        assert_eq!(
            regions("<b>@x</b>"),
            [(Language::Html, 0, 3), (Language::JavaScript, 4, 5), (Language::Html, 5, 9)]
        );
    }

    #[test]
    fn test_code_block_braces() {
        assert_eq!(
            regions("@{ if (a) { b(); } }"),
            [(Language::JavaScript, 2, 19)]
        );
    }
}
